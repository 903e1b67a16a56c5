//! Error types for guarded wrapper construction and checked operations.
//!
//! The guarded layer performs no local recovery: errors raised by a backing
//! structure during a guarded call propagate to the caller unchanged (the
//! lock is released by RAII on every exit path). The variants here cover the
//! only failures this layer itself produces.

use thiserror::Error;

/// Errors produced by the guarded wrapper layer itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A constructor that requires an empty backing structure was handed a
    /// populated one.
    ///
    /// Wrappers that take over a caller-supplied backing structure can only
    /// document (not enforce) that the caller stops touching it afterwards;
    /// the one thing that can be validated is that it starts empty.
    #[error("backing structure must be empty at wrap time, found {len} entries")]
    NonEmptyDelegate {
        /// Number of entries found in the delegate.
        len: usize,
    },

    /// A checked bidirectional-map insertion found the value already bound to
    /// a different key. Use `force_insert` to displace the existing binding.
    #[error("value is already bound to a different key")]
    ValueAlreadyBound,
}

/// Result type for guarded wrapper operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is the non-empty construction failure.
    pub fn is_non_empty_delegate(&self) -> bool {
        matches!(self, Error::NonEmptyDelegate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::NonEmptyDelegate { len: 3 };
        assert_eq!(
            err.to_string(),
            "backing structure must be empty at wrap time, found 3 entries"
        );
        assert!(err.is_non_empty_delegate());
        assert!(!Error::ValueAlreadyBound.is_non_empty_delegate());
    }
}
