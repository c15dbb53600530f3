use thiserror::Error;

/// Errors returned by the fallible map operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested key is not present in the map.
    #[error("key not found")]
    KeyNotFound,
    /// An absent node handle was passed to a handle-based operation.
    #[error("invalid input")]
    InvalidInput,
}
