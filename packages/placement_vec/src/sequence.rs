use std::any::type_name;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::{fmt, iter, mem, slice, thread};

use crate::storage_block::relocate;
use crate::{DropPolicy, IntoIter, Result, SequenceBuilder, StorageBlock};

/// A growable contiguous sequence of `T` that explicitly manages the lifetime of every
/// element it holds.
///
/// The sequence owns a [`StorageBlock`] and keeps its live elements in a prefix of that block:
/// slots `0..len()` hold live values, slots `len()..capacity()` are uninitialized. Values are
/// written into and dropped from individual slots by the sequence itself; the block only
/// ever allocates and releases raw memory.
///
/// # Growth
///
/// When an insertion finds the block full, a new block with twice the capacity (or 1, when
/// empty) is allocated, the existing elements are relocated into it around the new element
/// and only then is the old block released. [`reserve()`][Self::reserve] takes an absolute
/// capacity and allocates exactly that much.
///
/// # Unwind guarantees
///
/// Rust moves are bitwise and cannot fail, so relocating elements into new storage never
/// fails either. Operations that build a new block leave the sequence untouched when an
/// element constructor (`Default`, `Clone` or a user closure) panics or allocation fails:
///
/// * [`reserve()`][Self::reserve] and [`try_reserve()`][Self::try_reserve]
/// * [`insert()`][Self::insert], [`emplace_with()`][Self::emplace_with] and
///   [`push()`][Self::push] when they need to grow
/// * [`clone()`][Clone::clone] (the source is never touched)
/// * [`clone_from()`][Clone::clone_from] when the receiver lacks capacity
///
/// The in-place path of [`clone_from()`][Clone::clone_from] only offers the basic guarantee:
/// a panicking `Clone` leaves a valid sequence with a mix of updated and stale elements. Every
/// path keeps each live element owned exactly once, so nothing is leaked or dropped twice.
///
/// # Examples
///
/// ```
/// use placement_vec::Sequence;
///
/// let mut sequence = Sequence::new();
/// sequence.push(1);
/// sequence.push(2);
/// sequence.push(3);
///
/// sequence.insert(1, 9);
/// assert_eq!(sequence, [1, 9, 2, 3]);
///
/// sequence.erase(2);
/// assert_eq!(sequence, [1, 9, 3]);
///
/// sequence.resize(1);
/// assert_eq!(sequence, [1]);
///
/// sequence.resize(3);
/// assert_eq!(sequence, [1, 0, 0]);
/// ```
pub struct Sequence<T> {
    storage: StorageBlock<T>,

    /// Number of live elements, all of them at the start of `storage`.
    len: usize,

    drop_policy: DropPolicy,
}

impl<T> Sequence<T> {
    /// Creates an empty sequence. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            storage: StorageBlock::new(),
            len: 0,
            drop_policy: DropPolicy::MayDropItems,
        }
    }

    /// Creates a builder to customize the initial capacity or [drop policy][DropPolicy].
    ///
    /// # Examples
    ///
    /// ```
    /// use placement_vec::{DropPolicy, Sequence};
    ///
    /// let sequence = Sequence::<String>::builder()
    ///     .capacity(16)
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    ///
    /// assert_eq!(sequence.capacity(), 16);
    /// ```
    #[inline]
    pub fn builder() -> SequenceBuilder<T> {
        SequenceBuilder::new()
    }

    pub(crate) fn from_storage(storage: StorageBlock<T>, drop_policy: DropPolicy) -> Self {
        Self {
            storage,
            len: 0,
            drop_policy,
        }
    }

    /// Creates an empty sequence with room for exactly `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow. Allocator failure is handled by
    /// [`handle_alloc_error`][std::alloc::handle_alloc_error].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_storage(StorageBlock::allocate(capacity), DropPolicy::default())
    }

    /// Creates a sequence of `len` elements, each produced by calling `f`.
    ///
    /// The capacity of the new sequence equals its length. If `f` panics, the elements
    /// constructed so far are dropped and the storage is released before the panic continues.
    #[must_use]
    pub fn with_len_with(len: usize, f: impl FnMut() -> T) -> Self {
        let mut sequence = Self::with_capacity(len);
        sequence.construct_tail(iter::repeat_with(f).take(len));
        sequence
    }

    /// Creates a sequence of `len` default-constructed elements.
    ///
    /// The capacity of the new sequence equals its length.
    ///
    /// # Examples
    ///
    /// ```
    /// use placement_vec::Sequence;
    ///
    /// let sequence = Sequence::<u8>::with_len(4);
    /// assert_eq!(sequence, [0, 0, 0, 0]);
    /// assert_eq!(sequence.capacity(), 4);
    /// ```
    #[must_use]
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        Self::with_len_with(len, T::default)
    }

    /// Number of live elements.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the sequence holds no live elements.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the sequence can hold without reallocating.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// The drop policy the sequence was created with.
    #[must_use]
    #[inline]
    pub fn drop_policy(&self) -> DropPolicy {
        self.drop_policy
    }

    /// Ensures there is room for at least `capacity` elements in total.
    ///
    /// Unlike `Vec::reserve()`, the argument is the total capacity, not an additional amount.
    /// If the current capacity already suffices, this does nothing. Otherwise a block of
    /// exactly `capacity` slots is allocated and the elements are relocated into it.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow. Allocator failure is handled by
    /// [`handle_alloc_error`][std::alloc::handle_alloc_error]. The sequence is unchanged
    /// in either case.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }

        self.relocate_into(StorageBlock::allocate(capacity), "reserve");
    }

    /// Ensures there is room for at least `capacity` elements in total, reporting
    /// allocation failure as an error.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`][crate::Error] if the storage cannot be allocated. The sequence is
    /// unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use placement_vec::{Error, Sequence};
    ///
    /// let mut sequence = Sequence::<u64>::new();
    /// sequence.push(7);
    ///
    /// let result = sequence.try_reserve(usize::MAX);
    /// assert!(matches!(result, Err(Error::CapacityOverflow { .. })));
    /// assert_eq!(sequence, [7]);
    ///
    /// sequence.try_reserve(10).unwrap();
    /// assert_eq!(sequence.capacity(), 10);
    /// ```
    pub fn try_reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        self.relocate_into(StorageBlock::try_allocate(capacity)?, "try_reserve");
        Ok(())
    }

    /// Resizes the sequence to `len` elements, producing new elements by calling `f`.
    ///
    /// Growing first reserves exactly `len` slots (if needed) and then constructs the new
    /// tail. Shrinking drops the surplus tail and never reallocates.
    ///
    /// If `f` panics while growing, the elements constructed so far remain in the sequence.
    pub fn resize_with(&mut self, len: usize, f: impl FnMut() -> T) {
        if len > self.len {
            self.reserve(len);

            // Cannot underflow, guarded by the comparison above.
            let additional = len.wrapping_sub(self.len);
            self.construct_tail(iter::repeat_with(f).take(additional));
        } else {
            self.truncate(len);
        }
    }

    /// Resizes the sequence to `len` elements, default-constructing any new elements.
    pub fn resize(&mut self, len: usize)
    where
        T: Default,
    {
        self.resize_with(len, T::default);
    }

    /// Drops every element at index `len` and beyond. Does nothing if the sequence is not
    /// longer than `len`. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        // Cannot underflow, guarded by the comparison above.
        let tail_len = self.len.wrapping_sub(len);

        // Forget the tail before dropping it, so a panicking destructor cannot lead to a
        // double drop. `drop_in_place` keeps dropping the rest of the slice if one panics.
        self.len = len;

        // SAFETY: Slots `len..len + tail_len` held live elements that the sequence no
        // longer tracks, so we are their only owner and drop each exactly once.
        unsafe {
            ptr::drop_in_place(
                NonNull::slice_from_raw_parts(self.storage.slot(len), tail_len).as_ptr(),
            );
        }
    }

    /// Drops all elements. Capacity is unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Appends `value` and returns a reference to it in its final position.
    ///
    /// Amortized O(1): when the sequence is full, the capacity doubles.
    #[inline]
    pub fn push(&mut self, value: T) -> &mut T {
        self.emplace_back_with(|| value)
    }

    /// Appends a value constructed by `f` and returns a reference to it.
    ///
    /// If the sequence has to grow, `f` is called after the new storage has been allocated
    /// and the value is written directly into its final slot. If `f` panics, the sequence is
    /// unchanged.
    pub fn emplace_back_with(&mut self, f: impl FnOnce() -> T) -> &mut T {
        let index = self.emplace_with(self.len, f);

        // SAFETY: We just placed a live element at this index.
        unsafe { self.get_unchecked_mut(index) }
    }

    /// Inserts `value` at `index`, shifting every element after it one position to the right.
    ///
    /// Returns the index of the inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    #[inline]
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        self.emplace_with(index, || value)
    }

    /// Inserts a value constructed by `f` at `index`, shifting every element after it one
    /// position to the right.
    ///
    /// Returns the index of the inserted element.
    ///
    /// When the sequence is full, a new block of `max(1, 2 * len())` slots is allocated and
    /// populated in order: the prefix before `index`, then the new element, then the suffix.
    /// The old block is only released once the new one is complete, so a panic in `f` leaves
    /// the sequence unchanged.
    ///
    /// Otherwise the value is constructed first, after which the suffix is shifted one slot
    /// to the right in place and the value is written into the gap. Once `f` has returned,
    /// nothing can fail.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn emplace_with(&mut self, index: usize, f: impl FnOnce() -> T) -> usize {
        assert!(
            index <= self.len,
            "insertion index {index} is out of bounds in sequence of length {}",
            self.len
        );

        if self.len == self.capacity() {
            self.emplace_reallocate(index, f);
        } else {
            self.emplace_in_place(index, f);
        }

        index
    }

    fn emplace_reallocate(&mut self, index: usize, f: impl FnOnce() -> T) {
        let new_storage = StorageBlock::allocate(self.grown_capacity());

        // Cannot underflow because the caller checked `index <= len`.
        let suffix_len = self.len.wrapping_sub(index);

        // SAFETY: The prefix `0..index` is live in the current block and the new block is at
        // least one slot larger than the current length, so the prefix fits. The regions
        // belong to different allocations, so they cannot overlap.
        unsafe {
            relocate(self.storage.as_non_null(), new_storage.as_non_null(), index);
        }

        // If this panics, `new_storage` is released without dropping anything (blocks never
        // drop their contents) and the current block still owns every element.
        let value = f();

        // SAFETY: `index <= len < new capacity`, and nothing has been written to this slot.
        unsafe {
            new_storage.slot(index).write(value);
        }

        // SAFETY: The suffix `index..len` is live in the current block and lands at
        // `index + 1..len + 1`, which fits the new block because its capacity exceeds `len`.
        // Cannot overflow because `index < new capacity`.
        unsafe {
            relocate(
                self.storage.slot(index),
                new_storage.slot(index.wrapping_add(1)),
                suffix_len,
            );
        }

        self.replace_storage(new_storage, "insert");

        // Cannot overflow because the new capacity exceeds the old length.
        self.len = self.len.wrapping_add(1);
    }

    fn emplace_in_place(&mut self, index: usize, f: impl FnOnce() -> T) {
        // Construct the value before touching the existing elements.
        let value = f();

        // Cannot underflow because the caller checked `index <= len`.
        let suffix_len = self.len.wrapping_sub(index);

        // SAFETY: `len < capacity`, so the suffix `index..len` can move to `index + 1..len + 1`
        // within the block. The copy handles the overlap by transferring the last element into
        // the uninitialized slot at `len` first and then shifting the rest backwards. Afterwards
        // the slot at `index` holds stale bits of an element that now lives one slot further
        // right, so we overwrite it without dropping.
        unsafe {
            let gap = self.storage.slot(index);
            ptr::copy(gap.as_ptr(), gap.add(1).as_ptr(), suffix_len);
            gap.write(value);
        }

        // Cannot overflow because `len < capacity`.
        self.len = self.len.wrapping_add(1);
    }

    /// Removes and returns the element at `index`, shifting every element after it one
    /// position to the left. Capacity is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index {index} is out of bounds in sequence of length {}",
            self.len
        );

        // Cannot underflow because `index < len`.
        let suffix_len = self.len.wrapping_sub(index).wrapping_sub(1);

        // SAFETY: The slot at `index` is live, so we can move the value out. The suffix
        // `index + 1..len` is live and moves to `index..len - 1`, which leaves the slot at
        // `len - 1` holding stale bits that we stop tracking by decrementing the length.
        let value = unsafe {
            let gap = self.storage.slot(index);
            let value = gap.read();
            ptr::copy(gap.add(1).as_ptr(), gap.as_ptr(), suffix_len);
            value
        };

        // Cannot underflow because the sequence was not empty.
        self.len = self.len.wrapping_sub(1);

        value
    }

    /// Drops the element at `index`, shifting every element after it one position to the
    /// left. Capacity is unchanged.
    ///
    /// Returns `index`, which now refers to the element that followed the erased one (or is
    /// equal to `len()` if the last element was erased).
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn erase(&mut self, index: usize) -> usize {
        // The element is only dropped after the sequence is consistent again.
        drop(self.remove(index));
        index
    }

    /// Removes the last element and returns it, or `None` if the sequence is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        // Cannot underflow because the sequence is not empty.
        self.len = self.len.wrapping_sub(1);

        // SAFETY: The slot at the old `len - 1` is live and no longer tracked, so we take
        // ownership of its value.
        Some(unsafe { self.storage.slot(self.len).read() })
    }

    /// Drops the last element. Does nothing if the sequence is empty.
    #[inline]
    pub fn pop_back(&mut self) {
        drop(self.pop());
    }

    /// Returns a reference to the element at `index` without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must be less than `len()`. Debug builds assert this.
    #[must_use]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(
            index < self.len,
            "index {index} is out of bounds in sequence of length {}",
            self.len
        );

        // SAFETY: The caller guarantees `index < len`, so the slot holds a live element.
        unsafe { self.storage.slot(index).as_ref() }
    }

    /// Returns an exclusive reference to the element at `index` without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must be less than `len()`. Debug builds assert this.
    #[must_use]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(
            index < self.len,
            "index {index} is out of bounds in sequence of length {}",
            self.len
        );

        // SAFETY: The caller guarantees `index < len`, so the slot holds a live element, and
        // we hold an exclusive borrow of the sequence.
        unsafe { self.storage.slot(index).as_mut() }
    }

    /// The live elements as a slice.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` slots hold live elements; the pointer is non-null and
        // aligned even when nothing is allocated.
        unsafe { slice::from_raw_parts(self.storage.as_non_null().as_ptr(), self.len) }
    }

    /// The live elements as an exclusive slice.
    #[must_use]
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: As in `as_slice()`, plus we hold an exclusive borrow of the sequence.
        unsafe { slice::from_raw_parts_mut(self.storage.as_non_null().as_ptr(), self.len) }
    }

    /// Pointer to the first element. Dangling if nothing is allocated.
    #[must_use]
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_non_null().as_ptr()
    }

    /// Exchanges storage and elements with `other` in O(1). Drop policies stay in place.
    pub fn swap(&mut self, other: &mut Self) {
        self.storage.swap(&mut other.storage);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Transfers the storage and all elements into a new sequence, leaving this one empty
    /// with no storage. The new sequence keeps this sequence's drop policy. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use placement_vec::Sequence;
    ///
    /// let mut source = Sequence::from([1, 2, 3]);
    /// let target = source.take();
    ///
    /// assert_eq!(target, [1, 2, 3]);
    /// assert!(source.is_empty());
    /// assert_eq!(source.capacity(), 0);
    /// ```
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            storage: self.storage.take(),
            len: mem::replace(&mut self.len, 0),
            drop_policy: self.drop_policy,
        }
    }

    /// Exchanges contents with `source` in O(1), which is how this sequence adopts the
    /// contents of `source` without copying.
    ///
    /// `source` receives the previous contents of this sequence and releases them whenever it
    /// is cleared or dropped.
    pub fn move_assign(&mut self, source: &mut Self) {
        self.swap(source);
    }

    /// Replaces the contents of this sequence with clones of the elements of `source`.
    ///
    /// If the capacity is too small for `source`, a new exactly-sized block is populated
    /// first and only then are the current elements dropped; a panicking `Clone` leaves this
    /// sequence unchanged.
    ///
    /// Otherwise the storage is reused: the overlapping prefix is updated through
    /// [`Clone::clone_from`], any extra elements of `source` are cloned into the spare
    /// capacity and any surplus elements of this sequence are dropped. A panicking `Clone`
    /// here may leave a mix of updated and stale elements.
    pub fn assign_from(&mut self, source: &Self)
    where
        T: Clone,
    {
        if source.len > self.capacity() {
            let mut replacement =
                Self::from_storage(StorageBlock::allocate(source.len), self.drop_policy);
            replacement.construct_tail(source.iter().cloned());

            tracing::trace!(
                element_type = type_name::<T>(),
                old_capacity = self.capacity(),
                new_capacity = replacement.capacity(),
                len = source.len,
                "sequence storage replaced by assignment"
            );

            self.clear();
            self.swap(&mut replacement);
            return;
        }

        for (target, value) in self.iter_mut().zip(source.iter()) {
            target.clone_from(value);
        }

        let assigned = self.len;

        if source.len > assigned {
            self.construct_tail(source.iter().skip(assigned).cloned());
        } else {
            self.truncate(source.len);
        }
    }

    /// Writes values into the uninitialized slots after the live prefix, stopping when either
    /// the values or the capacity run out.
    ///
    /// The length is committed even if producing a value panics, so every element written so
    /// far stays owned by the sequence.
    fn construct_tail(&mut self, values: impl IntoIterator<Item = T>) {
        let Self { storage, len, .. } = self;

        // Cannot underflow because the length never exceeds the capacity.
        let room = storage.capacity().wrapping_sub(*len);

        let mut constructed = scopeguard::guard(*len, |constructed| *len = constructed);

        for value in values.into_iter().take(room) {
            // SAFETY: `take(room)` keeps us within capacity and every slot past the live
            // prefix is uninitialized.
            unsafe {
                storage.slot(*constructed).write(value);
            }

            // Cannot overflow because we stay within capacity.
            *constructed = constructed.wrapping_add(1);
        }
    }

    /// Relocates every element into `new_storage` and adopts it.
    fn relocate_into(&mut self, new_storage: StorageBlock<T>, cause: &'static str) {
        debug_assert!(new_storage.capacity() >= self.len);

        // SAFETY: The live prefix fits into the new block, checked above, and the two blocks
        // are distinct allocations. The old copies are released below without being dropped.
        unsafe {
            relocate(self.storage.as_non_null(), new_storage.as_non_null(), self.len);
        }

        self.replace_storage(new_storage, cause);
    }

    /// Swaps in a fully populated block. The previous block holds only relocated (stale)
    /// copies at this point and is released without dropping anything.
    fn replace_storage(&mut self, mut new_storage: StorageBlock<T>, cause: &'static str) {
        tracing::trace!(
            element_type = type_name::<T>(),
            old_capacity = self.capacity(),
            new_capacity = new_storage.capacity(),
            len = self.len,
            cause,
            "sequence storage reallocated"
        );

        self.storage.swap(&mut new_storage);
    }

    #[cfg_attr(test, mutants::skip)] // Mutations break memory safety instead of observable behavior.
    fn grown_capacity(&self) -> usize {
        if self.len == 0 {
            1
        } else {
            self.len
                .checked_mul(2)
                .expect("capacity overflow: sequence length cannot be doubled")
        }
    }
}

impl<T> Drop for Sequence<T> {
    fn drop(&mut self) {
        let original_len = self.len;

        self.clear();
        self.storage.deallocate();

        // We check at the end so the memory is cleaned up first.
        //
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if !thread::panicking() && matches!(self.drop_policy, DropPolicy::MustNotDropItems) {
            assert!(
                original_len == 0,
                "dropped a non-empty Sequence with {original_len} items - this is forbidden by DropPolicy::MustNotDropItems"
            );
        }
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Sequence<T> {
    /// Clones every element into a new block of exactly `len()` slots.
    fn clone(&self) -> Self {
        let mut clone = Self::from_storage(StorageBlock::allocate(self.len), self.drop_policy);
        clone.construct_tail(self.iter().cloned());
        clone
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign_from(source);
    }
}

impl<T> Deref for Sequence<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for Sequence<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for Sequence<T> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsMut<[T]> for Sequence<T> {
    #[inline]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U> PartialEq<Sequence<U>> for Sequence<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Sequence<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U> PartialEq<[U]> for Sequence<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U> PartialEq<&[U]> for Sequence<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U, const N: usize> PartialEq<[U; N]> for Sequence<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Sequence<T> {}

impl<T: PartialOrd> PartialOrd for Sequence<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord> Ord for Sequence<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash> Hash for Sequence<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T> Extend<T> for Sequence<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();

        // Repeated small extensions must still grow geometrically.
        let (lower_bound, _) = iter.size_hint();
        let required = self.len.saturating_add(lower_bound);

        if required > self.capacity() {
            self.reserve(required.max(self.len.saturating_mul(2)));
        }

        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T: Clone + 'a> Extend<&'a T> for Sequence<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().cloned());
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut sequence = Self::new();
        sequence.extend(iter);
        sequence
    }
}

impl<T, const N: usize> From<[T; N]> for Sequence<T> {
    fn from(values: [T; N]) -> Self {
        let mut sequence = Self::with_capacity(N);
        sequence.construct_tail(values);
        sequence
    }
}

impl<T: Clone> From<&[T]> for Sequence<T> {
    fn from(values: &[T]) -> Self {
        let mut sequence = Self::with_capacity(values.len());
        sequence.construct_tail(values.iter().cloned());
        sequence
    }
}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> Self::IntoIter {
        let len = mem::replace(&mut self.len, 0);
        IntoIter::new(self.storage.take(), len, self.drop_policy)
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Sequence<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::indexing_slicing,
    reason = "test code doesn't need the same safety rigor as production code"
)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(Sequence<u32>: Send, Sync);
    assert_impl_all!(Sequence<Cell<u32>>: Send);
    assert_not_impl_any!(Sequence<Cell<u32>>: Sync);
    assert_not_impl_any!(Sequence<Rc<u32>>: Send, Sync);

    #[test]
    fn smoke_test() {
        let mut sequence = Sequence::new();

        sequence.push(1);
        sequence.push(2);
        sequence.push(3);

        assert_eq!(sequence.len(), 3);
        assert!(sequence.capacity() >= 3);
        assert_eq!(sequence, [1, 2, 3]);

        assert_eq!(sequence.insert(1, 9), 1);
        assert_eq!(sequence, [1, 9, 2, 3]);

        assert_eq!(sequence.erase(2), 2);
        assert_eq!(sequence, [1, 9, 3]);

        sequence.resize(1);
        assert_eq!(sequence, [1]);
        assert_eq!(sequence.len(), 1);

        sequence.resize(3);
        assert_eq!(sequence, [1, 0, 0]);
    }

    #[test]
    fn new_does_not_allocate() {
        let sequence = Sequence::<u64>::new();

        assert_eq!(sequence.len(), 0);
        assert_eq!(sequence.capacity(), 0);
        assert!(sequence.is_empty());
    }

    #[test]
    fn with_len_has_exact_capacity() {
        for len in [0, 1, 2, 7, 64] {
            let sequence = Sequence::<String>::with_len(len);

            assert_eq!(sequence.len(), len);
            assert_eq!(sequence.capacity(), len);
            assert!(sequence.iter().all(String::is_empty));
        }
    }

    #[test]
    fn with_len_with_calls_in_order() {
        let mut next = 0;
        let sequence = Sequence::with_len_with(4, || {
            next += 1;
            next
        });

        assert_eq!(sequence, [1, 2, 3, 4]);
    }

    #[test]
    fn growth_doubles_from_one() {
        let mut sequence = Sequence::new();
        let mut observed = Vec::new();

        for value in 0..9 {
            sequence.push(value);
            observed.push(sequence.capacity());
        }

        assert_eq!(observed, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
    }

    #[test]
    fn extend_sizes_exactly_when_empty_and_doubles_after() {
        let mut sequence = Sequence::new();

        sequence.extend([1, 2, 3]);
        assert_eq!(sequence.capacity(), 3);

        sequence.extend([4]);
        assert_eq!(sequence.capacity(), 6);

        sequence.extend([5, 6]);
        assert_eq!(sequence.capacity(), 6);

        sequence.extend([7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19]);
        assert_eq!(sequence.capacity(), 19);
        assert_eq!(sequence.len(), 19);
    }

    #[test]
    fn push_returns_reference_to_new_element() {
        let mut sequence = Sequence::new();

        *sequence.push(10) += 5;
        *sequence.emplace_back_with(|| 20) += 5;

        assert_eq!(sequence, [15, 25]);
    }

    #[test]
    fn insert_at_every_position_while_growing() {
        let mut sequence = Sequence::<i32>::new();

        assert_eq!(sequence.insert(0, 2), 0); // [2], growth
        assert_eq!(sequence.insert(0, 0), 0); // [0, 2], growth
        assert_eq!(sequence.insert(1, 1), 1); // [0, 1, 2], growth
        assert_eq!(sequence.insert(3, 3), 3); // [0, 1, 2, 3], in place

        assert_eq!(sequence, [0, 1, 2, 3]);
        assert_eq!(sequence.capacity(), 4);
    }

    #[test]
    fn insert_in_place_shifts_suffix() {
        let mut sequence = Sequence::with_capacity(8);
        sequence.extend([1, 2, 3, 4]);

        sequence.insert(1, 10);
        sequence.insert(0, 20);
        sequence.insert(6, 30);

        assert_eq!(sequence, [20, 1, 10, 2, 3, 4, 30]);
        assert_eq!(sequence.capacity(), 8);
    }

    #[test]
    #[should_panic]
    fn insert_past_end_panics() {
        let mut sequence = Sequence::from([1, 2]);
        sequence.insert(3, 0);
    }

    #[test]
    fn remove_returns_value_and_shifts() {
        let mut sequence = Sequence::from(["a", "b", "c", "d"]);

        assert_eq!(sequence.remove(1), "b");
        assert_eq!(sequence, ["a", "c", "d"]);

        assert_eq!(sequence.remove(2), "d");
        assert_eq!(sequence, ["a", "c"]);

        assert_eq!(sequence.capacity(), 4);
    }

    #[test]
    fn erase_last_returns_len() {
        let mut sequence = Sequence::from([1, 2, 3]);

        assert_eq!(sequence.erase(2), 2);
        assert_eq!(sequence.len(), 2);
    }

    #[test]
    #[should_panic]
    fn erase_at_len_panics() {
        let mut sequence = Sequence::from([1, 2]);
        sequence.erase(2);
    }

    #[test]
    fn pop_on_empty_is_noop() {
        let mut sequence = Sequence::<u8>::new();

        assert_eq!(sequence.pop(), None);
        sequence.pop_back();

        assert!(sequence.is_empty());
    }

    #[test]
    fn pop_takes_from_back() {
        let mut sequence = Sequence::from([1, 2, 3]);

        assert_eq!(sequence.pop(), Some(3));
        sequence.pop_back();

        assert_eq!(sequence, [1]);
        assert_eq!(sequence.capacity(), 3);
    }

    #[test]
    fn reserve_smaller_is_noop() {
        let mut sequence = Sequence::<u32>::with_capacity(10);
        let ptr = sequence.as_ptr();

        sequence.reserve(4);
        sequence.reserve(10);

        assert_eq!(sequence.capacity(), 10);
        assert_eq!(sequence.as_ptr(), ptr);
    }

    #[test]
    fn reserve_allocates_exactly() {
        let mut sequence = Sequence::from([1, 2, 3]);

        sequence.reserve(17);

        assert_eq!(sequence.capacity(), 17);
        assert_eq!(sequence, [1, 2, 3]);
    }

    #[test]
    fn resize_grows_to_exact_capacity_and_shrinks_in_place() {
        let mut sequence = Sequence::<u16>::new();

        sequence.resize(5);
        assert_eq!(sequence.capacity(), 5);

        sequence.resize(2);
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.capacity(), 5);

        sequence.resize_with(4, || 7);
        assert_eq!(sequence, [0, 0, 7, 7]);
        assert_eq!(sequence.capacity(), 5);
    }

    #[test]
    fn clone_has_no_spare_capacity() {
        let mut source = Sequence::with_capacity(10);
        source.extend(["x".to_string(), "y".to_string()]);

        let clone = source.clone();

        assert_eq!(clone, source);
        assert_eq!(clone.capacity(), 2);
        assert_eq!(source.capacity(), 10);
    }

    #[test]
    fn clone_from_grows_when_needed() {
        let source = Sequence::from([1, 2, 3, 4, 5]);
        let mut target = Sequence::from([9]);

        target.clone_from(&source);

        assert_eq!(target, source);
        assert_eq!(target.capacity(), 5);
    }

    #[test]
    fn clone_from_reuses_storage_when_longer() {
        let source = Sequence::from([1, 2, 3]);
        let mut target = Sequence::with_capacity(8);
        target.extend([7, 8]);
        let ptr = target.as_ptr();

        target.clone_from(&source);

        assert_eq!(target, [1, 2, 3]);
        assert_eq!(target.as_ptr(), ptr);
        assert_eq!(target.capacity(), 8);
    }

    #[test]
    fn clone_from_reuses_storage_when_shorter() {
        let source = Sequence::from([1]);
        let mut target = Sequence::from([7, 8, 9]);
        let ptr = target.as_ptr();

        target.clone_from(&source);

        assert_eq!(target, [1]);
        assert_eq!(target.as_ptr(), ptr);
        assert_eq!(target.capacity(), 3);
    }

    #[test]
    fn take_leaves_canonical_empty() {
        let mut source = Sequence::from([1, 2, 3]);
        let ptr = source.as_ptr();

        let target = source.take();

        assert_eq!(target, [1, 2, 3]);
        assert_eq!(target.as_ptr(), ptr);
        assert_eq!(source.len(), 0);
        assert_eq!(source.capacity(), 0);

        // The source remains fully usable.
        source.push(4);
        assert_eq!(source, [4]);
    }

    #[test]
    fn move_assign_exchanges_contents() {
        let mut target = Sequence::from([1]);
        let mut source = Sequence::from([2, 3]);

        target.move_assign(&mut source);

        assert_eq!(target, [2, 3]);
        assert_eq!(source, [1]);
    }

    #[test]
    fn swap_keeps_drop_policies() {
        let mut a = Sequence::<u8>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();
        let mut b = Sequence::from([1_u8]);

        a.swap(&mut b);

        assert_eq!(a, [1]);
        assert_eq!(a.drop_policy(), DropPolicy::MustNotDropItems);
        assert_eq!(b.drop_policy(), DropPolicy::MayDropItems);

        a.clear();
    }

    #[test]
    fn unchecked_access_reads_live_elements() {
        let mut sequence = Sequence::from([5, 6]);

        unsafe {
            assert_eq!(*sequence.get_unchecked(1), 6);
            *sequence.get_unchecked_mut(0) = 50;
        }

        assert_eq!(sequence, [50, 6]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn unchecked_access_beyond_len_panics_in_debug() {
        let mut sequence = Sequence::with_capacity(4);
        sequence.push(1);

        _ = unsafe { sequence.get_unchecked(1) };
    }

    #[test]
    fn checked_access_through_slice() {
        let mut sequence = Sequence::from([1, 2, 3]);

        assert_eq!(sequence.get(2), Some(&3));
        assert_eq!(sequence.get(3), None);
        assert_eq!(sequence.first(), Some(&1));

        sequence[0] = 10;
        assert_eq!(sequence[0], 10);
    }

    #[test]
    #[should_panic]
    fn index_beyond_len_panics() {
        let sequence = Sequence::<u32>::with_capacity(4);
        assert_eq!(sequence[0], 0);
    }

    #[test]
    fn traversal_visits_live_range() {
        let mut sequence = Sequence::from([1, 2, 3]);

        for value in &mut sequence {
            *value *= 2;
        }

        let collected: Vec<_> = (&sequence).into_iter().copied().collect();
        assert_eq!(collected, [2, 4, 6]);
    }

    #[test]
    fn zero_sized_elements() {
        let mut sequence = Sequence::new();

        for _ in 0..100 {
            sequence.push(());
        }

        sequence.insert(50, ());
        sequence.erase(0);

        assert_eq!(sequence.len(), 100);
        assert!(sequence.capacity() >= 100);

        // No memory is ever allocated for zero-sized elements.
        assert_eq!(sequence.as_ptr(), NonNull::<()>::dangling().as_ptr().cast_const());

        sequence.reserve(10_000);
        let clone = sequence.clone();

        assert_eq!(sequence.as_ptr(), NonNull::<()>::dangling().as_ptr().cast_const());
        assert_eq!(clone.as_ptr(), NonNull::<()>::dangling().as_ptr().cast_const());
    }

    #[test]
    fn debug_lists_elements() {
        let sequence = Sequence::from([1, 2]);
        assert_eq!(format!("{sequence:?}"), "[1, 2]");
    }

    #[test]
    #[should_panic]
    fn drop_with_items_under_must_not_drop_panics() {
        let mut sequence = Sequence::<u32>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        sequence.push(1);
    }

    #[test]
    fn drop_empty_under_must_not_drop_is_fine() {
        let mut sequence = Sequence::<u32>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        sequence.push(1);
        sequence.pop_back();
    }
}
