//! The contracts a document writer must satisfy.
//!
//! Writer handles are single-use: a document writer is consumed by the one
//! item it emits, and container writers hand out one element writer at a
//! time, each borrowing the codec core the same way reader handles do.

use crate::error::Result;

/// A sink for one document.
///
/// Blob and container methods choose the framing: a `Some(len)` /
/// `Some(count)` argument declares the size up front (definite framing, the
/// writer verifies it), `None` streams until `finish` (indefinite framing).
pub trait DocumentWrite: Sized {
    /// Sub-writer for blob content.
    type Blob: BlobWrite;
    /// Sub-writer for array content.
    type Array: ArrayWrite;
    /// Sub-writer for map content.
    type Map: MapWrite;

    /// Emits the null singleton.
    fn write_null(self) -> Result<()>;

    /// Emits the undefined marker.
    fn write_undefined(self) -> Result<()>;

    /// Emits a boolean.
    fn write_bool(self, value: bool) -> Result<()>;

    /// Emits an unsigned 64-bit integer.
    fn write_unsigned(self, value: u64) -> Result<()>;

    /// Emits a signed 64-bit integer. Non-negative values are emitted as
    /// `unsigned_int`.
    fn write_signed(self, value: i64) -> Result<()>;

    /// Emits a double.
    fn write_float(self, value: f64) -> Result<()>;

    /// Opens a binary blob of the given length, or an indefinite one.
    fn begin_binary(self, len: Option<u64>) -> Result<Self::Blob>;

    /// Opens a text blob of the given byte length, or an indefinite one.
    fn begin_text(self, len: Option<u64>) -> Result<Self::Blob>;

    /// Opens an array of the given element count, or an indefinite one.
    fn begin_array(self, count: Option<u64>) -> Result<Self::Array>;

    /// Opens a map of the given pair count, or an indefinite one.
    fn begin_map(self, count: Option<u64>) -> Result<Self::Map>;
}

/// Streams the content of one blob.
pub trait BlobWrite {
    /// Appends a chunk of content.
    fn write(&mut self, chunk: &[u8]) -> Result<()>;

    /// Closes the blob. Verifies a declared length, or emits the break for
    /// indefinite framing.
    fn finish(self) -> Result<()>;
}

/// Streams the elements of one array.
pub trait ArrayWrite {
    /// The element writer, borrowing this writer while alive.
    type Elem<'a>: DocumentWrite
    where
        Self: 'a;

    /// Opens the writer for the next element.
    fn element(&mut self) -> Result<Self::Elem<'_>>;

    /// Closes the array. Verifies a declared count, or emits the break for
    /// indefinite framing.
    fn finish(self) -> Result<()>;
}

/// Streams the pairs of one map, alternating keys and values.
pub trait MapWrite {
    /// The key/value writer, borrowing this writer while alive.
    type Elem<'a>: DocumentWrite
    where
        Self: 'a;

    /// Opens the writer for the next key.
    fn key(&mut self) -> Result<Self::Elem<'_>>;

    /// Opens the writer for the value matching the key just written.
    fn value(&mut self) -> Result<Self::Elem<'_>>;

    /// Closes the map. Verifies a declared count, or emits the break for
    /// indefinite framing. A key without its value is an error.
    fn finish(self) -> Result<()>;
}
