use std::result;

use thiserror::Error;

/// Errors that can occur when allocating through a strategy or selecting one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The strategy forbids allocation. Returned by [`NoAlloc`][crate::NoAlloc] on every call.
    #[error("allocation of {count} x {element} attempted but this strategy prohibits allocations")]
    AllocationProhibited {
        /// The number of elements that was requested.
        count: usize,

        /// The name of the element type.
        element: &'static str,
    },

    /// The backing memory could not be reserved.
    ///
    /// The raw [`Strategy::alloc`][crate::Strategy::alloc] contract reports this condition as
    /// `Ok(None)`; the owning handles ([`Block`][crate::Block], [`DynBlock`][crate::DynBlock])
    /// turn it into this error.
    #[error("could not reserve memory for {count} x {element}")]
    AllocationExhausted {
        /// The number of elements that was requested.
        count: usize,

        /// The name of the element type.
        element: &'static str,
    },

    /// A strategy name did not match any known strategy.
    #[error("unknown allocation strategy '{name}'")]
    UnknownStrategy {
        /// The name as provided by the caller.
        name: String,
    },
}

/// A specialized `Result` type for allocation strategy operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = result::Result<T, Error>;
