//! The tagged union at the heart of the document model.

use crate::error::{Error, Result};
use crate::kind::Kind;

/// One self-describing item, as produced by a format reader.
///
/// Scalars are carried inline; blob and container kinds hold the sub-reader
/// that streams their content out of the parent's byte stream. The type
/// parameters are the per-codec sub-reader types, so each codec exposes its
/// own instantiation (e.g. [`CborDocument`](crate::cbor::CborDocument),
/// [`JsonDocument`](crate::json::JsonDocument)) while the enum itself — and
/// everything written against it — is codec-agnostic.
///
/// Dispatching is a plain `match`; the typed accessors below are shorthand
/// for the common "I expect this kind" case and fail with
/// [`Error::KindMismatch`] otherwise.
#[derive(Debug)]
pub enum Document<B, T, A, M> {
    /// The null singleton.
    Null,
    /// The absent-value marker, distinct from null.
    Undefined,
    /// A boolean.
    Boolean(bool),
    /// A 64-bit non-negative integer.
    UnsignedInt(u64),
    /// A negative 64-bit integer.
    SignedInt(i64),
    /// An IEEE 754 double.
    FloatingPoint(f64),
    /// A streamed byte blob.
    Binary(B),
    /// A streamed UTF-8 text blob.
    Text(T),
    /// A streamed array.
    Array(A),
    /// A streamed map.
    Map(M),
}

impl<B, T, A, M> Document<B, T, A, M> {
    /// The kind of this document.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Document::Null => Kind::Null,
            Document::Undefined => Kind::Undefined,
            Document::Boolean(_) => Kind::Boolean,
            Document::UnsignedInt(_) => Kind::UnsignedInt,
            Document::SignedInt(_) => Kind::SignedInt,
            Document::FloatingPoint(_) => Kind::FloatingPoint,
            Document::Binary(_) => Kind::Binary,
            Document::Text(_) => Kind::Text,
            Document::Array(_) => Kind::Array,
            Document::Map(_) => Kind::Map,
        }
    }

    /// Whether this is the null singleton.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    /// Whether this is the undefined marker.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Document::Undefined)
    }

    fn mismatch<V>(self, expected: Kind) -> Result<V> {
        Err(Error::KindMismatch {
            expected,
            found: self.kind(),
        })
    }

    /// Views the document as a boolean.
    pub fn into_bool(self) -> Result<bool> {
        match self {
            Document::Boolean(v) => Ok(v),
            other => other.mismatch(Kind::Boolean),
        }
    }

    /// Views the document as an unsigned 64-bit integer.
    ///
    /// A non-negative `signed_int` coerces; a negative one is
    /// [`Error::IntegerOverflow`].
    pub fn into_unsigned(self) -> Result<u64> {
        match self {
            Document::UnsignedInt(v) => Ok(v),
            Document::SignedInt(v) if v >= 0 => Ok(v as u64),
            Document::SignedInt(_) => Err(Error::IntegerOverflow),
            other => other.mismatch(Kind::UnsignedInt),
        }
    }

    /// Views the document as a signed 64-bit integer.
    ///
    /// An `unsigned_int` that fits coerces; a larger one is
    /// [`Error::IntegerOverflow`].
    pub fn into_signed(self) -> Result<i64> {
        match self {
            Document::SignedInt(v) => Ok(v),
            Document::UnsignedInt(v) if v <= i64::MAX as u64 => Ok(v as i64),
            Document::UnsignedInt(_) => Err(Error::IntegerOverflow),
            other => other.mismatch(Kind::SignedInt),
        }
    }

    /// Views the document as a double. Either integer kind coerces.
    pub fn into_float(self) -> Result<f64> {
        match self {
            Document::FloatingPoint(v) => Ok(v),
            Document::UnsignedInt(v) => Ok(v as f64),
            Document::SignedInt(v) => Ok(v as f64),
            other => other.mismatch(Kind::FloatingPoint),
        }
    }

    /// Takes the binary sub-reader.
    pub fn into_binary(self) -> Result<B> {
        match self {
            Document::Binary(b) => Ok(b),
            other => other.mismatch(Kind::Binary),
        }
    }

    /// Takes the text sub-reader.
    pub fn into_text(self) -> Result<T> {
        match self {
            Document::Text(t) => Ok(t),
            other => other.mismatch(Kind::Text),
        }
    }

    /// Takes the array sub-reader.
    pub fn into_array(self) -> Result<A> {
        match self {
            Document::Array(a) => Ok(a),
            other => other.mismatch(Kind::Array),
        }
    }

    /// Takes the map sub-reader.
    pub fn into_map(self) -> Result<M> {
        match self {
            Document::Map(m) => Ok(m),
            other => other.mismatch(Kind::Map),
        }
    }
}
