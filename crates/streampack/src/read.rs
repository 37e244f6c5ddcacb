//! The contracts a document reader must satisfy.
//!
//! Sub-readers are lending handles: each one mutably borrows its codec's
//! core, so the borrow checker enforces that at most one descendant is alive
//! and that the parent cannot be touched meanwhile. The `Elem<'a>` generic
//! associated types express exactly that nesting.

use crate::document::Document;
use crate::error::{Error, Result};

/// A streamed byte blob (`binary` or `string` content).
pub trait BlobRead {
    /// Pulls bytes into `buf`. The buffer is filled completely unless the
    /// end of the blob is reached on this call; a short count is the
    /// end-of-blob signal, and later calls return `0`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Consumes and discards up to `n` bytes, returning the count actually
    /// discarded. Short iff the end of the blob was reached.
    fn skip(&mut self, n: u64) -> Result<u64> {
        let mut scratch = [0u8; 256];
        let mut skipped = 0u64;
        while skipped < n {
            let want = scratch.len().min((n - skipped) as usize);
            let got = self.read(&mut scratch[..want])?;
            skipped += got as u64;
            if got < want {
                break;
            }
        }
        Ok(skipped)
    }

    /// Consumes the rest of the blob, observing its end.
    fn finish(&mut self) -> Result<()> {
        self.skip(u64::MAX).map(|_| ())
    }

    /// Drains the whole blob into a vector.
    fn read_to_vec(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let n = self.read(&mut chunk)?;
            out.extend_from_slice(&chunk[..n]);
            if n < chunk.len() {
                return Ok(out);
            }
        }
    }

    /// Drains the whole blob into a string, validating UTF-8.
    fn read_to_string(&mut self) -> Result<String> {
        String::from_utf8(self.read_to_vec()?).map_err(|_| Error::IllFormed)
    }
}

/// A streamed array of documents.
pub trait ArrayRead {
    /// The element document, borrowing this reader while alive.
    type Elem<'a>: DocumentRead
    where
        Self: 'a;

    /// Returns the next element, or `None` at (and consuming) the end of
    /// the array.
    fn read_next(&mut self) -> Result<Option<Self::Elem<'_>>>;

    /// Consumes and discards the rest of the array, observing its end.
    fn finish(&mut self) -> Result<()> {
        while let Some(elem) = self.read_next()? {
            skip_document(elem)?;
        }
        Ok(())
    }
}

/// A streamed map of key/value document pairs.
///
/// Every `read_next_key` that returns `Some` must be answered by exactly one
/// `read_value` before the next key is requested.
pub trait MapRead {
    /// The key/value document, borrowing this reader while alive.
    type Elem<'a>: DocumentRead
    where
        Self: 'a;

    /// Returns the next key, or `None` at (and consuming) the end of the
    /// map.
    fn read_next_key(&mut self) -> Result<Option<Self::Elem<'_>>>;

    /// Returns the value matching the key just read.
    fn read_value(&mut self) -> Result<Self::Elem<'_>>;

    /// Consumes and discards the rest of the map, observing its end.
    fn finish(&mut self) -> Result<()> {
        loop {
            match self.read_next_key()? {
                Some(key) => skip_document(key)?,
                None => break,
            }
            let value = self.read_value()?;
            skip_document(value)?;
        }
        Ok(())
    }
}

/// A document whose streamed kinds resolve to concrete sub-reader types.
///
/// Implemented once, generically, for every instantiation of [`Document`];
/// codec modules only pick the type parameters.
pub trait DocumentRead: Sized {
    /// Sub-reader for `binary` content.
    type Binary: BlobRead;
    /// Sub-reader for `string` content.
    type Text: BlobRead;
    /// Sub-reader for `array` content.
    type Array: ArrayRead;
    /// Sub-reader for `map` content.
    type Map: MapRead;

    /// Destructures into the tagged union.
    fn into_document(self) -> Document<Self::Binary, Self::Text, Self::Array, Self::Map>;
}

impl<B: BlobRead, T: BlobRead, A: ArrayRead, M: MapRead> DocumentRead for Document<B, T, A, M> {
    type Binary = B;
    type Text = T;
    type Array = A;
    type Map = M;

    fn into_document(self) -> Self {
        self
    }
}

/// Consumes a document completely, discarding its content.
///
/// Scalars are already consumed; blobs and containers are drained to their
/// end, so the parent can continue afterwards.
pub fn skip_document<D: DocumentRead>(doc: D) -> Result<()> {
    match doc.into_document() {
        Document::Binary(mut blob) => blob.finish(),
        Document::Text(mut blob) => blob.finish(),
        Document::Array(mut array) => array.finish(),
        Document::Map(mut map) => map.finish(),
        _ => Ok(()),
    }
}

/// An uninhabited blob for codecs that never produce a kind.
///
/// The JSON reader has no `binary` documents; its document type plugs this
/// in so the union stays total without a reachable variant.
#[derive(Debug)]
pub enum NeverBlob {}

impl BlobRead for NeverBlob {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        match *self {}
    }
}
