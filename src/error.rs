//! Error taxonomy shared by every table operation.

use std::collections::TryReserveError;

/// Errors returned by table operations.
///
/// Every variant is detected before the table is mutated, so a failed call
/// leaves the table exactly as it was.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error {
    /// The table handle is null, destroyed, or otherwise stale
    InvalidHandle,

    /// The key is the null string
    InvalidKey,

    /// Growing would overflow `usize` or pass the entry ceiling
    CapacityExceeded,

    /// The allocator refused a key copy or slot array
    AllocFailed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StrtabError: {self:?}")
    }
}

impl std::error::Error for Error {}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Self::AllocFailed
    }
}

/// Table result
pub type Result<T> = std::result::Result<T, Error>;
