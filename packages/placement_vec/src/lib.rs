//! A growable contiguous sequence with explicit control over storage and element lifetime.
//!
//! The crate is built from two strictly layered types:
//!
//! - [`StorageBlock<T>`] owns a single contiguous, uninitialized region with room for a fixed
//!   number of `T`. It allocates and releases raw memory and nothing else. It never knows
//!   which slots hold live values and never drops any.
//! - [`Sequence<T>`] owns a storage block plus the count of live elements occupying a prefix
//!   of it. Every element is written into and dropped from its slot explicitly. When the block
//!   is exhausted, a fresh block is populated and swapped in.
//!
//! # Key Features
//!
//! - **Value semantics**: clone, assignment, insertion, erasure and resizing behave like a
//!   standard dynamic array
//! - **Documented unwind guarantees**: growth never modifies the sequence until the new storage
//!   is complete, so a panicking constructor or failed allocation leaves it untouched
//! - **Fallible allocation**: [`Sequence::try_reserve()`], [`StorageBlock::try_allocate()`] and
//!   [`SequenceBuilder::try_build()`] report allocation failure as an [`Error`]
//! - **Exact-capacity clones**: a clone has no spare capacity
//! - **Amortized O(1) append**: capacity doubles whenever an insertion finds the storage full
//! - **Flexible drop policies**: optionally forbid dropping a sequence that still holds elements
//!
//! # Examples
//!
//! ```rust
//! use placement_vec::Sequence;
//!
//! let mut sequence = Sequence::new();
//!
//! for value in 1..=3 {
//!     sequence.push(value);
//! }
//!
//! sequence.insert(1, 9);
//! assert_eq!(sequence, [1, 9, 2, 3]);
//!
//! sequence.erase(2);
//! assert_eq!(sequence, [1, 9, 3]);
//!
//! // Clones are exactly sized.
//! let clone = sequence.clone();
//! assert_eq!(clone.capacity(), 3);
//! ```
//!
//! Working directly with raw storage:
//!
//! ```rust
//! use placement_vec::StorageBlock;
//!
//! let block = StorageBlock::<u64>::allocate(4);
//!
//! // SAFETY: Slot 3 is within capacity. u64 needs no drop, so we can let the block go.
//! unsafe {
//!     block.slot(3).write(42);
//!     assert_eq!(block.slot(3).read(), 42);
//! }
//! ```
//!
//! # Thread safety
//!
//! There is no internal synchronization. A sequence is [`Send`] if `T` is [`Send`] and
//! [`Sync`] if `T` is [`Sync`]; mutation always requires an exclusive reference.

mod builder;
mod drop_policy;
mod error;
mod into_iter;
mod sequence;
mod storage_block;

pub use builder::*;
pub use drop_policy::*;
pub use error::Error;
pub(crate) use error::Result;
pub use into_iter::IntoIter;
pub use sequence::Sequence;
pub use storage_block::StorageBlock;
