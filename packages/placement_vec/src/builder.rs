use std::marker::PhantomData;

use crate::{DropPolicy, Result, Sequence, StorageBlock};

/// Builder for creating an instance of [`Sequence`].
///
/// You only need to use this builder if you want to customize the initial capacity or the
/// drop policy. [`Sequence::new()`] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use placement_vec::{DropPolicy, Sequence};
///
/// let sequence = Sequence::<u32>::builder()
///     .capacity(8)
///     .drop_policy(DropPolicy::MayDropItems)
///     .build();
///
/// assert_eq!(sequence.capacity(), 8);
/// assert!(sequence.is_empty());
/// ```
#[must_use]
pub struct SequenceBuilder<T> {
    capacity: usize,
    drop_policy: DropPolicy,

    _item: PhantomData<T>,
}

impl<T> std::fmt::Debug for SequenceBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceBuilder")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("capacity", &self.capacity)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> SequenceBuilder<T> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            capacity: 0,
            drop_policy: DropPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the exact number of elements the sequence has room for when created.
    ///
    /// Defaults to 0, in which case nothing is allocated until the first insertion.
    #[inline]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the [drop policy][DropPolicy] for the sequence. This governs how
    /// to treat remaining elements when the sequence is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use placement_vec::{DropPolicy, Sequence};
    ///
    /// let sequence = Sequence::<u32>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    /// ```
    #[inline]
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the sequence with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow. Allocator failure is handled by
    /// [`handle_alloc_error`][std::alloc::handle_alloc_error].
    #[must_use]
    #[inline]
    pub fn build(self) -> Sequence<T> {
        Sequence::from_storage(StorageBlock::allocate(self.capacity), self.drop_policy)
    }

    /// Builds the sequence with the specified configuration, reporting allocation failure
    /// as an error.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`][crate::Error] if the initial storage cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use placement_vec::{Error, Sequence};
    ///
    /// let result = Sequence::<u64>::builder().capacity(usize::MAX).try_build();
    /// assert!(matches!(result, Err(Error::CapacityOverflow { .. })));
    /// ```
    pub fn try_build(self) -> Result<Sequence<T>> {
        Ok(Sequence::from_storage(
            StorageBlock::try_allocate(self.capacity)?,
            self.drop_policy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_new() {
        let sequence = Sequence::<u32>::builder().build();

        assert_eq!(sequence.capacity(), 0);
        assert_eq!(sequence.drop_policy(), DropPolicy::MayDropItems);
    }

    #[test]
    fn capacity_is_exact() {
        let sequence = Sequence::<u32>::builder().capacity(13).try_build().unwrap();

        assert_eq!(sequence.capacity(), 13);
        assert!(sequence.is_empty());
    }

    #[test]
    fn debug_names_item_type() {
        let builder = Sequence::<u32>::builder().capacity(3);
        let debug = format!("{builder:?}");

        assert!(debug.contains("u32"));
        assert!(debug.contains("capacity: 3"));
    }
}
