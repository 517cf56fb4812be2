/// Determines what happens to live elements when a [`Sequence`][crate::Sequence] is dropped.
///
/// By default, the sequence drops its elements when it is dropped.
///
/// # Examples
///
/// ```
/// use placement_vec::{DropPolicy, Sequence};
///
/// // The drop policy is set at construction time.
/// let sequence = Sequence::<u32>::builder()
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
///
/// assert_eq!(sequence.drop_policy(), DropPolicy::MustNotDropItems);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The sequence drops its live elements when it is dropped. This is the default.
    #[default]
    MayDropItems,

    /// The sequence panics if it still contains live elements when it is dropped.
    ///
    /// The memory is released before the panic. Useful when the owner is expected to drain
    /// every element explicitly (e.g. because elements must be handed back to some other
    /// system) and forgetting to do so is a bug.
    MustNotDropItems,
}
