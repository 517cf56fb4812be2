use std::iter::FusedIterator;
use std::ptr::{self, NonNull};
use std::{fmt, slice, thread};

use crate::{DropPolicy, StorageBlock};

/// An owning iterator over the elements of a [`Sequence`][crate::Sequence].
///
/// Holds on to the sequence's storage until iteration ends. Elements that were not yielded
/// are dropped together with the iterator, subject to the [drop policy][DropPolicy] of the
/// sequence the iterator came from.
///
/// # Examples
///
/// ```
/// use placement_vec::Sequence;
///
/// let sequence = Sequence::from(["a".to_string(), "b".to_string(), "c".to_string()]);
/// let mut iter = sequence.into_iter();
///
/// assert_eq!(iter.next().as_deref(), Some("a"));
/// assert_eq!(iter.next_back().as_deref(), Some("c"));
/// assert_eq!(iter.len(), 1);
/// ```
pub struct IntoIter<T> {
    storage: StorageBlock<T>,

    /// Slots `front..back` hold the elements not yet yielded.
    front: usize,
    back: usize,

    drop_policy: DropPolicy,
}

impl<T> IntoIter<T> {
    /// The first `len` slots of `storage` must hold live elements.
    pub(crate) fn new(storage: StorageBlock<T>, len: usize, drop_policy: DropPolicy) -> Self {
        debug_assert!(len <= storage.capacity());

        Self {
            storage,
            front: 0,
            back: len,
            drop_policy,
        }
    }

    /// The elements not yet yielded, as a slice.
    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: Slots `front..back` hold live elements and `front <= back <= capacity`.
        unsafe { slice::from_raw_parts(self.storage.slot(self.front).as_ptr(), self.remaining()) }
    }

    fn remaining(&self) -> usize {
        // Cannot underflow, `front` never passes `back`.
        self.back.wrapping_sub(self.front)
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        // SAFETY: `front < back`, so the slot holds a live element. Advancing `front` hands
        // ownership of it to the caller.
        let value = unsafe { self.storage.slot(self.front).read() };

        // Cannot overflow because `front < back`.
        self.front = self.front.wrapping_add(1);

        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        // Cannot underflow because `front < back`.
        self.back = self.back.wrapping_sub(1);

        // SAFETY: The slot at the old `back - 1` holds a live element that is no longer
        // tracked, so we take ownership of it.
        Some(unsafe { self.storage.slot(self.back).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let remaining = self.remaining();

        // SAFETY: `front <= capacity`, as maintained by the iterator.
        let first = unsafe { self.storage.slot(self.front) };

        // Stop tracking the elements before dropping them so a panicking destructor cannot
        // lead to a double drop.
        self.front = self.back;

        // SAFETY: These slots held live elements that nobody else owns any more.
        unsafe {
            ptr::drop_in_place(NonNull::slice_from_raw_parts(first, remaining).as_ptr());
        }

        self.storage.deallocate();

        // We check at the end so the memory is cleaned up first. Never while already
        // panicking, so the original panic is not obscured.
        if !thread::panicking() && matches!(self.drop_policy, DropPolicy::MustNotDropItems) {
            assert!(
                remaining == 0,
                "dropped a Sequence iterator with {remaining} unyielded items - this is forbidden by DropPolicy::MustNotDropItems"
            );
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use crate::{DropPolicy, Sequence};

    struct Counted(Rc<Cell<usize>>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn yields_in_order_from_both_ends() {
        let sequence = Sequence::from([1, 2, 3, 4]);
        let mut iter = sequence.into_iter();

        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(4));
        assert_eq!(iter.as_slice(), [2, 3]);
        assert_eq!(iter.next(), Some(2));
        assert_eq!(iter.next(), Some(3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn collect_round_trip() {
        let sequence: Sequence<_> = (0..10).collect();
        let collected: Vec<_> = sequence.into_iter().collect();

        assert_eq!(collected, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn drops_unyielded_elements() {
        let drops = Rc::new(Cell::new(0));

        let sequence: Sequence<_> = (0..5).map(|_| Counted(Rc::clone(&drops))).collect();
        let mut iter = sequence.into_iter();

        drop(iter.next());
        assert_eq!(drops.get(), 1);

        drop(iter);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    #[should_panic]
    fn drop_with_unyielded_items_under_must_not_drop_panics() {
        let mut sequence = Sequence::<u32>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        sequence.push(1);
        sequence.push(2);

        let mut iter = sequence.into_iter();
        assert_eq!(iter.next(), Some(1));

        drop(iter);
    }

    #[test]
    fn drop_exhausted_under_must_not_drop_is_fine() {
        let mut sequence = Sequence::<u32>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        sequence.push(1);
        sequence.push(2);

        let collected: Vec<_> = sequence.into_iter().collect();
        assert_eq!(collected, [1, 2]);
    }

    #[test]
    fn unyielded_items_are_dropped_before_policy_panic() {
        let drops = Rc::new(Cell::new(0));

        let mut sequence = Sequence::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        for _ in 0..3 {
            sequence.push(Counted(Rc::clone(&drops)));
        }

        let iter = sequence.into_iter();
        let result = panic::catch_unwind(AssertUnwindSafe(|| drop(iter)));

        assert!(result.is_err());
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn empty_sequence_yields_nothing() {
        let mut iter = Sequence::<String>::new().into_iter();

        assert_eq!(iter.len(), 0);
        assert!(iter.next().is_none());
    }
}
