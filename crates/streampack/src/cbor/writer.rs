//! Streaming CBOR writer.

use std::io;

use streampack_buffers::Sink;

use super::constants::{
    AI_INDEFINITE, BREAK, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TEXT,
    MAJOR_UNSIGNED,
};
use crate::error::{Error, Result};
use crate::gate::MapPhase;
use crate::write::{ArrayWrite, BlobWrite, DocumentWrite, MapWrite};

/// Writer for the CBOR wire format over any byte [`Sink`].
///
/// The first sink failure is latched: every later operation reports the same
/// error without touching the sink again.
pub struct CborWriter<K> {
    sink: K,
    failed: Option<io::ErrorKind>,
}

impl<K: Sink> CborWriter<K> {
    /// Creates a writer over the given sink.
    pub fn new(sink: K) -> Self {
        Self { sink, failed: None }
    }

    /// Opens the writer for one top-level document.
    pub fn document(&mut self) -> CborDocWriter<'_> {
        CborDocWriter { out: self }
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(kind) = self.failed {
            return Err(Error::Io(kind.into()));
        }
        Ok(self.sink.flush()?)
    }

    /// Unwraps the underlying sink.
    pub fn into_inner(self) -> K {
        self.sink
    }
}

/// Byte-level access shared by the sub-writers of one [`CborWriter`].
trait BinOutput {
    fn put(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<K: Sink> BinOutput for CborWriter<K> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(kind) = self.failed {
            return Err(Error::Io(kind.into()));
        }
        match self.sink.write(bytes) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.failed = Some(e.kind());
                Err(Error::Io(e))
            }
        }
    }
}

/// Emits an item head with the minimal-width length encoding.
fn put_head(out: &mut dyn BinOutput, major: u8, value: u64) -> Result<()> {
    let major_bits = major << 5;
    if value <= 23 {
        out.put(&[major_bits | value as u8])
    } else if value <= 0xff {
        out.put(&[major_bits | 24, value as u8])
    } else if value <= 0xffff {
        let mut head = [major_bits | 25, 0, 0];
        head[1..].copy_from_slice(&(value as u16).to_be_bytes());
        out.put(&head)
    } else if value <= 0xffff_ffff {
        let mut head = [major_bits | 26, 0, 0, 0, 0];
        head[1..].copy_from_slice(&(value as u32).to_be_bytes());
        out.put(&head)
    } else {
        let mut head = [major_bits | 27, 0, 0, 0, 0, 0, 0, 0, 0];
        head[1..].copy_from_slice(&value.to_be_bytes());
        out.put(&head)
    }
}

/// Writes one CBOR document into its parent's sink.
pub struct CborDocWriter<'a> {
    out: &'a mut dyn BinOutput,
}

impl<'a> DocumentWrite for CborDocWriter<'a> {
    type Blob = CborBlobWriter<'a>;
    type Array = CborArrayWriter<'a>;
    type Map = CborMapWriter<'a>;

    fn write_null(self) -> Result<()> {
        self.out.put(&[0xf6])
    }

    fn write_undefined(self) -> Result<()> {
        self.out.put(&[0xf7])
    }

    fn write_bool(self, value: bool) -> Result<()> {
        self.out.put(&[if value { 0xf5 } else { 0xf4 }])
    }

    fn write_unsigned(self, value: u64) -> Result<()> {
        put_head(self.out, MAJOR_UNSIGNED, value)
    }

    fn write_signed(self, value: i64) -> Result<()> {
        if value >= 0 {
            put_head(self.out, MAJOR_UNSIGNED, value as u64)
        } else {
            put_head(self.out, MAJOR_NEGATIVE, (-1 - value) as u64)
        }
    }

    fn write_float(self, value: f64) -> Result<()> {
        // Always 64-bit; this wire format does not narrow floats.
        let mut item = [0xfb, 0, 0, 0, 0, 0, 0, 0, 0];
        item[1..].copy_from_slice(&value.to_be_bytes());
        self.out.put(&item)
    }

    fn begin_binary(self, len: Option<u64>) -> Result<CborBlobWriter<'a>> {
        begin_blob(self.out, MAJOR_BYTES, len)
    }

    fn begin_text(self, len: Option<u64>) -> Result<CborBlobWriter<'a>> {
        begin_blob(self.out, MAJOR_TEXT, len)
    }

    fn begin_array(self, count: Option<u64>) -> Result<CborArrayWriter<'a>> {
        match count {
            Some(n) => put_head(self.out, MAJOR_ARRAY, n)?,
            None => self.out.put(&[(MAJOR_ARRAY << 5) | AI_INDEFINITE])?,
        }
        Ok(CborArrayWriter {
            out: self.out,
            remaining: count,
        })
    }

    fn begin_map(self, count: Option<u64>) -> Result<CborMapWriter<'a>> {
        match count {
            Some(n) => put_head(self.out, MAJOR_MAP, n)?,
            None => self.out.put(&[(MAJOR_MAP << 5) | AI_INDEFINITE])?,
        }
        Ok(CborMapWriter {
            out: self.out,
            remaining: count,
            phase: MapPhase::Key,
        })
    }
}

fn begin_blob<'a>(
    out: &'a mut dyn BinOutput,
    major: u8,
    len: Option<u64>,
) -> Result<CborBlobWriter<'a>> {
    match len {
        Some(n) => put_head(out, major, n)?,
        None => out.put(&[(major << 5) | AI_INDEFINITE])?,
    }
    Ok(CborBlobWriter {
        out,
        major,
        expected: len,
        written: 0,
    })
}

/// Streams the content of one blob.
///
/// With a declared length the content follows the head directly and the
/// byte count is verified at [`finish`](BlobWrite::finish). Without one,
/// every [`write`](BlobWrite::write) emits a definite chunk and `finish`
/// emits the break.
pub struct CborBlobWriter<'a> {
    out: &'a mut dyn BinOutput,
    major: u8,
    expected: Option<u64>,
    written: u64,
}

impl BlobWrite for CborBlobWriter<'_> {
    fn write(&mut self, chunk: &[u8]) -> Result<()> {
        match self.expected {
            Some(limit) => {
                self.written += chunk.len() as u64;
                if self.written > limit {
                    return Err(Error::IllFormed);
                }
                self.out.put(chunk)
            }
            None => {
                if chunk.is_empty() {
                    return Ok(());
                }
                put_head(self.out, self.major, chunk.len() as u64)?;
                self.out.put(chunk)
            }
        }
    }

    fn finish(self) -> Result<()> {
        match self.expected {
            Some(limit) => {
                if self.written != limit {
                    return Err(Error::IllFormed);
                }
                Ok(())
            }
            None => self.out.put(&[BREAK]),
        }
    }
}

/// Streams the elements of one array.
pub struct CborArrayWriter<'a> {
    out: &'a mut dyn BinOutput,
    remaining: Option<u64>,
}

impl ArrayWrite for CborArrayWriter<'_> {
    type Elem<'b>
        = CborDocWriter<'b>
    where
        Self: 'b;

    fn element(&mut self) -> Result<CborDocWriter<'_>> {
        if let Some(ref mut n) = self.remaining {
            if *n == 0 {
                return Err(Error::IllFormed);
            }
            *n -= 1;
        }
        Ok(CborDocWriter {
            out: &mut *self.out,
        })
    }

    fn finish(self) -> Result<()> {
        match self.remaining {
            Some(0) => Ok(()),
            Some(_) => Err(Error::IllFormed),
            None => self.out.put(&[BREAK]),
        }
    }
}

/// Streams the key/value pairs of one map.
pub struct CborMapWriter<'a> {
    out: &'a mut dyn BinOutput,
    remaining: Option<u64>,
    phase: MapPhase,
}

impl MapWrite for CborMapWriter<'_> {
    type Elem<'b>
        = CborDocWriter<'b>
    where
        Self: 'b;

    fn key(&mut self) -> Result<CborDocWriter<'_>> {
        if self.phase != MapPhase::Key {
            return Err(Error::LibraryMisused);
        }
        if let Some(ref mut n) = self.remaining {
            if *n == 0 {
                return Err(Error::IllFormed);
            }
            *n -= 1;
        }
        self.phase = MapPhase::Value;
        Ok(CborDocWriter {
            out: &mut *self.out,
        })
    }

    fn value(&mut self) -> Result<CborDocWriter<'_>> {
        if self.phase != MapPhase::Value {
            return Err(Error::LibraryMisused);
        }
        self.phase = MapPhase::Key;
        Ok(CborDocWriter {
            out: &mut *self.out,
        })
    }

    fn finish(self) -> Result<()> {
        if self.phase == MapPhase::Value {
            // A key was written without its value.
            return Err(Error::IllFormed);
        }
        match self.remaining {
            Some(0) => Ok(()),
            Some(_) => Err(Error::IllFormed),
            None => self.out.put(&[BREAK]),
        }
    }
}
