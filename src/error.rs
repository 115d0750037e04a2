//! Error surface (ERROR HANDLING, SPEC_FULL.md).
//!
//! Grounded in the `thiserror`-derived error enums used elsewhere in the
//! retrieved pack (`Luvion1-Fax`'s `faxc-util`/`faxt`, `jafreck-lz4r`): one
//! enum, one variant per failure kind, `#[error(...)]` messages instead of
//! hand-rolled `Display` impls.

use std::fmt;

use thiserror::Error;

/// Everything that can go wrong building or mutating an `automap`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutoMapError<K> {
    /// A lookup (subscript, `get_or` without a default, etc.) found no
    /// matching key.
    #[error("key not found")]
    KeyNotFound,

    /// Construction or a grow-only insert observed the same key twice.
    #[error("duplicate key")]
    DuplicateKey(K),

    /// The backing table's allocation could not be grown or created.
    #[error("allocation failure")]
    AllocationFailure,

    /// Attempted to grow, `add`, `update`, or `extend` a mapping backed by
    /// an immutable typed-array key store.
    #[error("operation not supported on a borrowed, fixed-capacity key store")]
    TypeNotSupported,

    /// A constructor input had the wrong shape (e.g. a non-1D array of
    /// keys).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl<K> AutoMapError<K> {
    /// Drops the carried key, if any, producing an error usable across key
    /// types. Most callers that only need to report failure (not retrieve
    /// the offending key) should use this to avoid threading `K: Clone`
    /// bounds through code that does not need them.
    #[must_use]
    pub fn without_key(self) -> AutoMapError<NoKey> {
        match self {
            AutoMapError::KeyNotFound => AutoMapError::KeyNotFound,
            AutoMapError::DuplicateKey(_) => AutoMapError::DuplicateKey(NoKey),
            AutoMapError::AllocationFailure => AutoMapError::AllocationFailure,
            AutoMapError::TypeNotSupported => AutoMapError::TypeNotSupported,
            AutoMapError::InvalidArgument(msg) => AutoMapError::InvalidArgument(msg),
        }
    }
}

/// Placeholder used by [`AutoMapError::without_key`] in place of a cloned
/// key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoKey;

impl fmt::Display for NoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<key elided>")
    }
}
