//! The error taxonomy shared by both codecs.

use std::io;

use thiserror::Error;

use crate::kind::Kind;

/// Everything that can go wrong while reading or writing a document.
///
/// Errors are never recovered internally; the operation that detects one
/// surfaces it, and the reader or writer that produced it is dead from then
/// on.
#[derive(Debug, Error)]
pub enum Error {
    /// Input or output violates the wire format.
    #[error("ill-formed document")]
    IllFormed,

    /// A document was viewed as the wrong kind.
    #[error("expected {expected}, found {found}")]
    KindMismatch {
        /// The kind the caller asked for.
        expected: Kind,
        /// The kind the document actually has.
        found: Kind,
    },

    /// A value does not fit the requested integer width.
    #[error("integer overflow")]
    IntegerOverflow,

    /// A reader or writer was driven out of sequence.
    #[error("reader or writer used out of sequence")]
    LibraryMisused,

    /// The underlying byte source or sink failed.
    #[error("byte stream error")]
    Io(#[from] io::Error),

    /// The byte source ended before the document did.
    #[error("unexpected end of input")]
    Eof,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mismatch_message() {
        let err = Error::KindMismatch {
            expected: Kind::UnsignedInt,
            found: Kind::Text,
        };
        assert_eq!(err.to_string(), "expected unsigned int, found string");
    }

    #[test]
    fn test_io_error_converts() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
