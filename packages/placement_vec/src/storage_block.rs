use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::any::type_name;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::{fmt, mem};

use crate::{Error, Result};

/// An owned, uninitialized, fixed-capacity region of memory with room for `capacity`
/// values of type `T`.
///
/// The block does not know which of its slots hold live objects. Liveness is tracked by
/// whoever owns the block (typically a [`Sequence`][crate::Sequence]), which must destroy
/// any objects it placed into the block before the block is released. Dropping or
/// deallocating the block never runs any `T` destructor.
///
/// The block is move-only. Copies of the contents go through `T`'s own `Clone` logic, one
/// element at a time, by the owner.
///
/// # Zero-sized requests
///
/// A block with capacity 0 performs no allocation. Neither does a block of a zero-sized `T`
/// of any capacity; such a block reports the requested capacity and hands out dangling but
/// well-aligned slot addresses, which is all a zero-sized value needs.
///
/// # Examples
///
/// ```
/// use placement_vec::StorageBlock;
///
/// let mut block = StorageBlock::<String>::allocate(2);
/// assert_eq!(block.capacity(), 2);
///
/// // SAFETY: Index 0 is within capacity and the slot is uninitialized, so writing is fine.
/// // We drop the value again before releasing the block.
/// unsafe {
///     let slot = block.slot(0);
///     slot.write("hello".to_string());
///     assert_eq!(slot.as_ref(), "hello");
///     slot.drop_in_place();
/// }
///
/// block.deallocate();
/// assert_eq!(block.capacity(), 0);
/// ```
pub struct StorageBlock<T> {
    /// Start of the region. Dangling (but aligned) when nothing is allocated.
    ptr: NonNull<T>,

    capacity: usize,

    // The block may contain `T` values placed there by its owner.
    _owns: PhantomData<T>,
}

impl<T> StorageBlock<T> {
    /// Creates an empty block that owns no memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            _owns: PhantomData,
        }
    }

    /// Allocates a block with room for exactly `capacity` values of `T`.
    ///
    /// # Panics
    ///
    /// Panics if the total size overflows the maximum allocation size. Allocator failure is
    /// reported through [`handle_alloc_error`], which aborts the process by default.
    /// Use [`try_allocate()`][Self::try_allocate] to receive these conditions as errors.
    #[must_use]
    pub fn allocate(capacity: usize) -> Self {
        match Self::try_allocate(capacity) {
            Ok(block) => block,
            Err(Error::CapacityOverflow {
                requested,
                type_name,
            }) => panic!("capacity overflow: cannot allocate {requested} elements of {type_name}"),
            Err(Error::AllocationFailed { layout, .. }) => handle_alloc_error(layout),
        }
    }

    /// Allocates a block with room for exactly `capacity` values of `T`, reporting failure
    /// as an [`Error`] instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityOverflow`] if the total size does not fit the maximum
    /// allocation size and [`Error::AllocationFailed`] if the allocator refuses the request.
    pub fn try_allocate(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Ok(Self::new());
        }

        let layout = Self::layout_for(capacity)?;

        if layout.size() == 0 {
            // Zero-sized T. Nothing to allocate, any aligned address will do.
            return Ok(Self {
                ptr: NonNull::dangling(),
                capacity,
                _owns: PhantomData,
            });
        }

        // SAFETY: The layout has a non-zero size, checked above.
        let raw = unsafe { alloc(layout) };

        let Some(ptr) = NonNull::new(raw.cast::<T>()) else {
            tracing::debug!(
                element_type = type_name::<T>(),
                capacity,
                bytes = layout.size(),
                "storage allocation failed"
            );

            return Err(Error::AllocationFailed {
                requested: capacity,
                layout,
            });
        };

        Ok(Self {
            ptr,
            capacity,
            _owns: PhantomData,
        })
    }

    fn layout_for(capacity: usize) -> Result<Layout> {
        Layout::array::<T>(capacity).map_err(|_layout_error| Error::CapacityOverflow {
            requested: capacity,
            type_name: type_name::<T>(),
        })
    }

    /// Releases the memory region and leaves the block empty.
    ///
    /// Does not run any `T` destructor. Calling this on an empty block is a no-op.
    pub fn deallocate(&mut self) {
        if self.capacity == 0 {
            return;
        }

        // The layout was already validated when the region was allocated.
        let layout = Self::layout_for(self.capacity)
            .expect("layout was valid when the block was allocated, so it is still valid");

        if layout.size() != 0 {
            // SAFETY: The pointer was returned by `alloc()` for this exact layout and has not
            // been released yet - after this we reset the block so it cannot be released twice.
            unsafe {
                dealloc(self.ptr.as_ptr().cast(), layout);
            }
        }

        self.ptr = NonNull::dangling();
        self.capacity = 0;
    }

    /// Number of `T` slots in the region.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pointer to the first slot. Dangling if the block owns no memory.
    #[must_use]
    #[inline]
    pub fn as_non_null(&self) -> NonNull<T> {
        self.ptr
    }

    /// Returns the address of the slot at `index`, without any regard for whether the slot
    /// holds a live object.
    ///
    /// The one-past-the-end address (`index == capacity`) is permitted but must never be
    /// read from or written to.
    ///
    /// # Safety
    ///
    /// `index` must be in `0..=capacity`. Debug builds assert this.
    #[must_use]
    pub unsafe fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(
            index <= self.capacity,
            "slot {index} is out of bounds in storage block of capacity {}",
            self.capacity
        );

        // SAFETY: The caller guarantees the index is at most one past the end of the region,
        // so the resulting pointer stays within (or one past) the same allocated object.
        unsafe { self.ptr.add(index) }
    }

    /// Exchanges the regions owned by two blocks. Never fails.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Transfers the region out of this block, leaving this block empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }
}

/// Relocates `count` values from `source` to `target` by bitwise transfer.
///
/// Rust moves are always bitwise and can never fail, so this is the transfer strategy for
/// every element type. After the call both regions contain the same bits and exactly one of
/// them may be treated as owning the values. The source keeps ownership until the caller
/// commits to the target.
///
/// # Safety
///
/// Both ranges must be valid for `count` values of `T`, properly aligned and not overlapping.
pub(crate) unsafe fn relocate<T>(source: NonNull<T>, target: NonNull<T>, count: usize) {
    // SAFETY: Forwarding the requirements to the caller.
    unsafe {
        ptr::copy_nonoverlapping(source.as_ptr(), target.as_ptr(), count);
    }
}

impl<T> Default for StorageBlock<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for StorageBlock<T> {
    fn drop(&mut self) {
        self.deallocate();
    }
}

impl<T> fmt::Debug for StorageBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageBlock")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish()
    }
}

// SAFETY: The block exclusively owns its region and any `T` placed in it, so moving the block
// to another thread is equivalent to moving the `T` values, which is fine if `T: Send`.
unsafe impl<T: Send> Send for StorageBlock<T> {}

// SAFETY: Shared access to the block only yields addresses, never references that bypass the
// owner's borrow. Sharing is therefore as safe as sharing `T`.
unsafe impl<T: Sync> Sync for StorageBlock<T> {}

#[cfg(test)]
#[allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    reason = "test code doesn't need the same safety rigor as production code"
)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(StorageBlock<u32>: Send, Sync);
    assert_not_impl_any!(StorageBlock<Rc<u32>>: Send, Sync);
    assert_not_impl_any!(StorageBlock<Cell<u32>>: Sync);
    assert_not_impl_any!(StorageBlock<u32>: Clone);

    #[test]
    fn new_is_empty() {
        let block = StorageBlock::<u64>::new();
        assert_eq!(block.capacity(), 0);
        assert_eq!(block.as_non_null(), NonNull::dangling());
    }

    #[test]
    fn zero_capacity_allocates_nothing() {
        let block = StorageBlock::<u64>::allocate(0);
        assert_eq!(block.capacity(), 0);
        assert_eq!(block.as_non_null(), NonNull::dangling());
    }

    #[test]
    fn slots_are_writable_and_readable() {
        let block = StorageBlock::<u64>::allocate(3);
        assert_eq!(block.capacity(), 3);

        unsafe {
            for index in 0..3_usize {
                block.slot(index).write(index as u64 * 10);
            }

            for index in 0..3_usize {
                assert_eq!(block.slot(index).read(), index as u64 * 10);
            }
        }
    }

    #[test]
    fn one_past_end_slot_is_addressable() {
        let block = StorageBlock::<u32>::allocate(4);

        let first = unsafe { block.slot(0) };
        let end = unsafe { block.slot(4) };

        assert_eq!(
            end.as_ptr() as usize - first.as_ptr() as usize,
            4 * size_of::<u32>()
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn slot_beyond_end_panics_in_debug() {
        let block = StorageBlock::<u32>::allocate(4);
        _ = unsafe { block.slot(5) };
    }

    #[test]
    fn deallocate_twice_is_noop() {
        let mut block = StorageBlock::<u32>::allocate(8);

        block.deallocate();
        assert_eq!(block.capacity(), 0);

        block.deallocate();
        assert_eq!(block.capacity(), 0);
    }

    #[test]
    fn swap_exchanges_regions() {
        let mut a = StorageBlock::<u32>::allocate(2);
        let mut b = StorageBlock::<u32>::allocate(5);

        let a_ptr = a.as_non_null();
        let b_ptr = b.as_non_null();

        a.swap(&mut b);

        assert_eq!(a.capacity(), 5);
        assert_eq!(b.capacity(), 2);
        assert_eq!(a.as_non_null(), b_ptr);
        assert_eq!(b.as_non_null(), a_ptr);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source = StorageBlock::<u32>::allocate(6);
        let ptr = source.as_non_null();

        let target = source.take();

        assert_eq!(target.capacity(), 6);
        assert_eq!(target.as_non_null(), ptr);
        assert_eq!(source.capacity(), 0);
    }

    #[test]
    #[cfg_attr(miri, ignore = "intentionally leaks the value placed into the block")]
    fn drop_does_not_drop_contents() {
        struct Tracked(Rc<Cell<usize>>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));

        {
            let block = StorageBlock::<Tracked>::allocate(1);
            unsafe {
                block.slot(0).write(Tracked(Rc::clone(&drops)));
            }
            // The block forgets about the value, as documented.
        }

        assert_eq!(drops.get(), 0);
        // The Rc held by the leaked value is the only other strong reference.
        assert_eq!(Rc::strong_count(&drops), 2);
    }

    #[test]
    fn zero_sized_type_reports_requested_capacity() {
        let block = StorageBlock::<()>::allocate(1000);
        assert_eq!(block.capacity(), 1000);

        unsafe {
            block.slot(999).write(());
        }
    }

    #[test]
    fn overflowing_capacity_is_error() {
        let result = StorageBlock::<u64>::try_allocate(usize::MAX);

        assert!(matches!(
            result,
            Err(Error::CapacityOverflow {
                requested: usize::MAX,
                ..
            })
        ));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri reports the oversized allocation as unsupported")]
    fn allocator_refusal_is_error() {
        // Larger than any real address space, yet a valid layout.
        let requested = isize::MAX.unsigned_abs();

        let result = StorageBlock::<u8>::try_allocate(requested);

        assert!(matches!(
            result,
            Err(Error::AllocationFailed { requested: r, .. }) if r == requested
        ));
    }

    #[test]
    #[should_panic]
    fn overflowing_capacity_panics_in_infallible_path() {
        drop(StorageBlock::<u64>::allocate(usize::MAX));
    }

    #[test]
    fn relocate_copies_values() {
        let source = StorageBlock::<String>::allocate(2);
        let target = StorageBlock::<String>::allocate(2);

        unsafe {
            source.slot(0).write("a".to_string());
            source.slot(1).write("b".to_string());

            relocate(source.as_non_null(), target.as_non_null(), 2);

            // Ownership now lives in the target only.
            assert_eq!(target.slot(0).as_ref(), "a");
            assert_eq!(target.slot(1).as_ref(), "b");

            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                target.as_non_null().as_ptr(),
                2,
            ));
        }
    }
}
