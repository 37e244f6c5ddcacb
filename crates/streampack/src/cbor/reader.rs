//! Streaming CBOR reader.
//!
//! Decoding is lazy: [`CborReader::read_document`] consumes only the head of
//! the top-level item and hands back a [`CborDocument`] whose blob and
//! container variants pull the rest of their encoding from the same source
//! as the application traverses them.

use streampack_buffers::Source;

use super::constants::{
    half_to_double, AI_FLOAT16, AI_FLOAT32, AI_FLOAT64, AI_INDEFINITE, BREAK, MAJOR_ARRAY,
    MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TEXT, MAJOR_UNSIGNED,
    SIMPLE_FALSE, SIMPLE_NULL, SIMPLE_TRUE, SIMPLE_UNDEFINED,
};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::gate::{sequence_error, DeadEnd, Gate, MapPhase};
use crate::read::{ArrayRead, BlobRead, MapRead};

/// A document decoded from a CBOR byte stream.
pub type CborDocument<'a> =
    Document<CborBlob<'a>, CborBlob<'a>, CborArrayReader<'a>, CborMapReader<'a>>;

/// Pull-reader for the CBOR wire format over any byte [`Source`].
pub struct CborReader<S> {
    src: S,
    gate: Gate,
}

impl<S: Source> CborReader<S> {
    /// Creates a reader over the given source.
    pub fn new(src: S) -> Self {
        Self {
            src,
            gate: Gate::default(),
        }
    }

    /// Decodes the head of the next top-level document.
    ///
    /// Fails with [`Error::Eof`] if the source is already exhausted, and
    /// with [`Error::IllFormed`] if it ends inside the item.
    pub fn read_document(&mut self) -> Result<CborDocument<'_>> {
        self.gate.check()?;
        let mut head = [0u8; 1];
        if self.src.read(&mut head)? == 0 {
            return Err(Error::Eof);
        }
        decode_document(self, head[0])
    }

    /// Verifies that the source holds no further bytes.
    pub fn end(&mut self) -> Result<()> {
        self.gate.check()?;
        if self.src.peek()?.is_some() {
            return Err(Error::IllFormed);
        }
        Ok(())
    }

    /// Unwraps the underlying source.
    pub fn into_inner(self) -> S {
        self.src
    }
}

/// Byte-level access shared by the sub-readers of one [`CborReader`].
trait BinInput {
    fn gate(&mut self) -> &mut Gate;
    /// One byte of an item already being decoded; EOF here is `IllFormed`.
    fn read_byte(&mut self) -> Result<u8>;
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;
    fn skip_bytes(&mut self, n: u64) -> Result<u64>;
}

impl<S: Source> BinInput for CborReader<S> {
    fn gate(&mut self) -> &mut Gate {
        &mut self.gate
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        match self.src.read(&mut b) {
            Ok(1) => Ok(b[0]),
            Ok(_) => Err(self.gate.fail(DeadEnd::IllFormed)),
            Err(e) => Err(self.gate.fail_io(e)),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.src.read(buf) {
            Ok(n) if n == buf.len() => Ok(()),
            Ok(_) => Err(self.gate.fail(DeadEnd::IllFormed)),
            Err(e) => Err(self.gate.fail_io(e)),
        }
    }

    fn skip_bytes(&mut self, n: u64) -> Result<u64> {
        match self.src.skip(n) {
            Ok(actual) => Ok(actual),
            Err(e) => Err(self.gate.fail_io(e)),
        }
    }
}

/// Reads the 1/2/4/8-byte big-endian length field selected by `ai`.
fn read_length(input: &mut dyn BinInput, ai: u8) -> Result<u64> {
    match ai {
        0..=23 => Ok(u64::from(ai)),
        24 => Ok(u64::from(input.read_byte()?)),
        25 => {
            let mut b = [0u8; 2];
            input.read_exact(&mut b)?;
            Ok(u64::from(u16::from_be_bytes(b)))
        }
        26 => {
            let mut b = [0u8; 4];
            input.read_exact(&mut b)?;
            Ok(u64::from(u32::from_be_bytes(b)))
        }
        27 => {
            let mut b = [0u8; 8];
            input.read_exact(&mut b)?;
            Ok(u64::from_be_bytes(b))
        }
        _ => Err(input.gate().fail(DeadEnd::IllFormed)),
    }
}

fn decode_document(input: &mut dyn BinInput, head: u8) -> Result<CborDocument<'_>> {
    let major = head >> 5;
    let ai = head & 0x1f;
    match major {
        MAJOR_UNSIGNED => Ok(Document::UnsignedInt(read_length(input, ai)?)),
        MAJOR_NEGATIVE => {
            let magnitude = read_length(input, ai)?;
            if magnitude > i64::MAX as u64 {
                return Err(input.gate().fail(DeadEnd::IntegerOverflow));
            }
            Ok(Document::SignedInt(-1 - magnitude as i64))
        }
        MAJOR_BYTES | MAJOR_TEXT => {
            let blob = if ai == AI_INDEFINITE {
                CborBlob {
                    input,
                    major,
                    chunk: 0,
                    indefinite: true,
                    done: false,
                }
            } else {
                let len = read_length(input, ai)?;
                CborBlob {
                    input,
                    major,
                    chunk: len,
                    indefinite: false,
                    done: false,
                }
            };
            if major == MAJOR_BYTES {
                Ok(Document::Binary(blob))
            } else {
                Ok(Document::Text(blob))
            }
        }
        MAJOR_ARRAY => {
            let remaining = if ai == AI_INDEFINITE {
                None
            } else {
                Some(read_length(input, ai)?)
            };
            Ok(Document::Array(CborArrayReader {
                input,
                remaining,
                done: false,
            }))
        }
        MAJOR_MAP => {
            let remaining = if ai == AI_INDEFINITE {
                None
            } else {
                Some(read_length(input, ai)?)
            };
            Ok(Document::Map(CborMapReader {
                input,
                remaining,
                phase: MapPhase::Key,
            }))
        }
        MAJOR_SIMPLE => match ai {
            SIMPLE_FALSE => Ok(Document::Boolean(false)),
            SIMPLE_TRUE => Ok(Document::Boolean(true)),
            SIMPLE_NULL => Ok(Document::Null),
            SIMPLE_UNDEFINED => Ok(Document::Undefined),
            AI_FLOAT16 => {
                let mut b = [0u8; 2];
                input.read_exact(&mut b)?;
                Ok(Document::FloatingPoint(half_to_double(u16::from_be_bytes(
                    b,
                ))))
            }
            AI_FLOAT32 => {
                let mut b = [0u8; 4];
                input.read_exact(&mut b)?;
                Ok(Document::FloatingPoint(f64::from(f32::from_be_bytes(b))))
            }
            AI_FLOAT64 => {
                let mut b = [0u8; 8];
                input.read_exact(&mut b)?;
                Ok(Document::FloatingPoint(f64::from_be_bytes(b)))
            }
            // Covers simple values outside the model and a break byte where
            // a document head was expected.
            _ => Err(input.gate().fail(DeadEnd::IllFormed)),
        },
        // Major 6 (tags) is outside the wire subset.
        _ => Err(input.gate().fail(DeadEnd::IllFormed)),
    }
}

/// Streams the content of one CBOR byte or text string.
///
/// Indefinite blobs are a chunk sequence on the wire; the reader hides the
/// chunking and serves the concatenated content.
pub struct CborBlob<'a> {
    input: &'a mut dyn BinInput,
    major: u8,
    /// Bytes left in the current chunk (the whole blob when definite).
    chunk: u64,
    indefinite: bool,
    done: bool,
}

impl CborBlob<'_> {
    /// Consumes the next chunk head of an indefinite blob, or its break.
    fn next_chunk(&mut self) -> Result<()> {
        let head = self.input.read_byte()?;
        if head == BREAK {
            self.done = true;
            return Ok(());
        }
        if head >> 5 != self.major {
            return Err(self.input.gate().fail(DeadEnd::IllFormed));
        }
        let ai = head & 0x1f;
        if ai == AI_INDEFINITE {
            // Chunks of an indefinite blob must themselves be definite.
            return Err(self.input.gate().fail(DeadEnd::IllFormed));
        }
        self.chunk = read_length(self.input, ai)?;
        Ok(())
    }
}

impl BlobRead for CborBlob<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.input.gate().check()?;
        let mut filled = 0;
        while filled < buf.len() {
            if self.done {
                break;
            }
            if self.chunk == 0 {
                if self.indefinite {
                    self.next_chunk()?;
                    continue;
                }
                self.done = true;
                break;
            }
            let want = (buf.len() - filled).min(usize::try_from(self.chunk).unwrap_or(usize::MAX));
            self.input.read_exact(&mut buf[filled..filled + want])?;
            filled += want;
            self.chunk -= want as u64;
        }
        Ok(filled)
    }

    fn skip(&mut self, n: u64) -> Result<u64> {
        self.input.gate().check()?;
        let mut skipped = 0u64;
        while skipped < n {
            if self.done {
                break;
            }
            if self.chunk == 0 {
                if self.indefinite {
                    self.next_chunk()?;
                    continue;
                }
                self.done = true;
                break;
            }
            let want = self.chunk.min(n - skipped);
            if self.input.skip_bytes(want)? < want {
                return Err(self.input.gate().fail(DeadEnd::IllFormed));
            }
            skipped += want;
            self.chunk -= want;
        }
        Ok(skipped)
    }

    fn finish(&mut self) -> Result<()> {
        self.skip(u64::MAX).map(|_| ())
    }
}

impl Drop for CborBlob<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.input.gate().poison();
        }
    }
}

/// Streams the elements of one CBOR array.
pub struct CborArrayReader<'a> {
    input: &'a mut dyn BinInput,
    /// Elements left (definite), or `None` until the break (indefinite).
    remaining: Option<u64>,
    done: bool,
}

impl CborArrayReader<'_> {
    /// Returns the next element, or `None` at the end of the array.
    pub fn read_next(&mut self) -> Result<Option<CborDocument<'_>>> {
        self.input.gate().check()?;
        if self.done {
            return Ok(None);
        }
        let head = match self.remaining {
            Some(0) => {
                self.done = true;
                return Ok(None);
            }
            Some(ref mut n) => {
                *n -= 1;
                self.input.read_byte()?
            }
            None => {
                let b = self.input.read_byte()?;
                if b == BREAK {
                    self.done = true;
                    return Ok(None);
                }
                b
            }
        };
        decode_document(&mut *self.input, head).map(Some)
    }
}

impl ArrayRead for CborArrayReader<'_> {
    type Elem<'a>
        = CborDocument<'a>
    where
        Self: 'a;

    fn read_next(&mut self) -> Result<Option<CborDocument<'_>>> {
        CborArrayReader::read_next(self)
    }
}

impl Drop for CborArrayReader<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.input.gate().poison();
        }
    }
}

/// Streams the key/value pairs of one CBOR map.
pub struct CborMapReader<'a> {
    input: &'a mut dyn BinInput,
    /// Pairs left (definite), or `None` until the break (indefinite).
    remaining: Option<u64>,
    phase: MapPhase,
}

impl CborMapReader<'_> {
    /// Returns the next key, or `None` at the end of the map.
    pub fn read_next_key(&mut self) -> Result<Option<CborDocument<'_>>> {
        self.input.gate().check()?;
        match self.phase {
            MapPhase::Done => return Ok(None),
            MapPhase::Value => sequence_error()?,
            MapPhase::Key => {}
        }
        let head = match self.remaining {
            Some(0) => {
                self.phase = MapPhase::Done;
                return Ok(None);
            }
            Some(ref mut n) => {
                *n -= 1;
                self.input.read_byte()?
            }
            None => {
                let b = self.input.read_byte()?;
                if b == BREAK {
                    self.phase = MapPhase::Done;
                    return Ok(None);
                }
                b
            }
        };
        self.phase = MapPhase::Value;
        decode_document(&mut *self.input, head).map(Some)
    }

    /// Returns the value matching the key just read.
    pub fn read_value(&mut self) -> Result<CborDocument<'_>> {
        self.input.gate().check()?;
        if self.phase != MapPhase::Value {
            sequence_error()?;
        }
        self.phase = MapPhase::Key;
        let head = self.input.read_byte()?;
        // A break here is a key without its value.
        decode_document(&mut *self.input, head)
    }
}

impl MapRead for CborMapReader<'_> {
    type Elem<'a>
        = CborDocument<'a>
    where
        Self: 'a;

    fn read_next_key(&mut self) -> Result<Option<CborDocument<'_>>> {
        CborMapReader::read_next_key(self)
    }

    fn read_value(&mut self) -> Result<CborDocument<'_>> {
        CborMapReader::read_value(self)
    }
}

impl Drop for CborMapReader<'_> {
    fn drop(&mut self) {
        if self.phase != MapPhase::Done {
            self.input.gate().poison();
        }
    }
}
