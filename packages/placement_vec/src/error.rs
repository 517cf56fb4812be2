use std::alloc::Layout;

use thiserror::Error;

/// Errors that can occur when obtaining storage for a sequence.
///
/// A failed operation leaves the receiver exactly as it was before the call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested number of elements does not fit into the address space.
    #[error("capacity of {requested} elements of type {type_name} overflows the maximum allocation size")]
    CapacityOverflow {
        /// The number of elements the caller asked room for.
        requested: usize,

        /// Name of the element type, for diagnostics.
        type_name: &'static str,
    },

    /// The memory allocator could not provide the requested region.
    #[error("memory allocator failed to provide room for {requested} elements ({layout:?})")]
    AllocationFailed {
        /// The number of elements the caller asked room for.
        requested: usize,

        /// The layout of the region that could not be allocated.
        layout: Layout,
    },
}

/// A specialized `Result` type for storage operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn capacity_overflow_message_names_type() {
        let error = Error::CapacityOverflow {
            requested: usize::MAX,
            type_name: "u64",
        };

        let message = error.to_string();
        assert!(message.contains("u64"));
        assert!(message.contains(&usize::MAX.to_string()));
    }

    #[test]
    fn allocation_failed_is_error() {
        let error = Error::AllocationFailed {
            requested: 4,
            layout: Layout::new::<[u32; 4]>(),
        };

        let result: Result<()> = Err(error);
        assert!(result.is_err());
    }
}
