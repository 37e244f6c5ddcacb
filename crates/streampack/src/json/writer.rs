//! Streaming JSON writer.

use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use streampack_buffers::Sink;

use super::escape::{put_escaped, Utf8Check};
use crate::error::{Error, Result};
use crate::gate::MapPhase;
use crate::write::{ArrayWrite, BlobWrite, DocumentWrite, MapWrite};

/// Writer for JSON text over any byte [`Sink`].
///
/// Emits RFC 8259 output: strings are escaped, numbers use the shortest
/// round-trippable decimal form, and values JSON cannot represent
/// (`undefined`, non-finite floats) are rejected as ill-formed. Binary blobs
/// are rendered as base64 strings.
///
/// String content is validated as UTF-8 across chunk boundaries; a writer
/// created with [`with_lenient_utf8`](JsonWriter::with_lenient_utf8) passes
/// invalid bytes through instead.
///
/// The first sink failure is latched, as for the CBOR writer.
pub struct JsonWriter<K> {
    sink: K,
    failed: Option<io::ErrorKind>,
    lenient_utf8: bool,
}

impl<K: Sink> JsonWriter<K> {
    /// Creates a writer over the given sink.
    pub fn new(sink: K) -> Self {
        Self {
            sink,
            failed: None,
            lenient_utf8: false,
        }
    }

    /// Creates a writer that passes invalid UTF-8 string content through.
    pub fn with_lenient_utf8(sink: K) -> Self {
        Self {
            lenient_utf8: true,
            ..Self::new(sink)
        }
    }

    /// Opens the writer for one top-level document.
    pub fn document(&mut self) -> JsonDocWriter<'_> {
        JsonDocWriter {
            out: self,
            key: false,
        }
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

/// Byte-level access shared by the sub-writers of one [`JsonWriter`].
trait TextOutput {
    fn put(&mut self, bytes: &[u8]) -> Result<()>;
    fn lenient_utf8(&self) -> bool;
}

impl<K: Sink> TextOutput for JsonWriter<K> {
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

    fn lenient_utf8(&self) -> bool {
        self.lenient_utf8
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Writes one JSON document into its parent's sink.
pub struct JsonDocWriter<'a> {
    out: &'a mut dyn TextOutput,
    /// Map-key position: only string-shaped output is legal here.
    key: bool,
}

impl JsonDocWriter<'_> {
    fn scalar(self, text: &[u8]) -> Result<()> {
        if self.key {
            return Err(Error::IllFormed);
        }
        self.out.put(text)
    }
}

impl<'a> DocumentWrite for JsonDocWriter<'a> {
    type Blob = JsonBlobWriter<'a>;
    type Array = JsonArrayWriter<'a>;
    type Map = JsonMapWriter<'a>;

    fn write_null(self) -> Result<()> {
        self.scalar(b"null")
    }

    fn write_undefined(self) -> Result<()> {
        // JSON has no undefined.
        Err(Error::IllFormed)
    }

    fn write_bool(self, value: bool) -> Result<()> {
        self.scalar(if value { b"true" } else { b"false" })
    }

    fn write_unsigned(self, value: u64) -> Result<()> {
        self.scalar(value.to_string().as_bytes())
    }

    fn write_signed(self, value: i64) -> Result<()> {
        self.scalar(value.to_string().as_bytes())
    }

    fn write_float(self, value: f64) -> Result<()> {
        if !value.is_finite() {
            // JSON cannot represent NaN or infinities.
            return Err(Error::IllFormed);
        }
        self.scalar(format_float(value).as_bytes())
    }

    fn begin_binary(self, len: Option<u64>) -> Result<JsonBlobWriter<'a>> {
        self.out.put(b"\"")?;
        Ok(JsonBlobWriter {
            out: self.out,
            mode: BlobMode::Binary {
                carry: [0; 3],
                carry_len: 0,
            },
            expected: len,
            written: 0,
        })
    }

    fn begin_text(self, len: Option<u64>) -> Result<JsonBlobWriter<'a>> {
        self.out.put(b"\"")?;
        let check = if self.out.lenient_utf8() {
            None
        } else {
            Some(Utf8Check::new())
        };
        Ok(JsonBlobWriter {
            out: self.out,
            mode: BlobMode::Text(check),
            expected: len,
            written: 0,
        })
    }

    fn begin_array(self, count: Option<u64>) -> Result<JsonArrayWriter<'a>> {
        if self.key {
            return Err(Error::IllFormed);
        }
        self.out.put(b"[")?;
        Ok(JsonArrayWriter {
            out: self.out,
            remaining: count,
            first: true,
        })
    }

    fn begin_map(self, count: Option<u64>) -> Result<JsonMapWriter<'a>> {
        if self.key {
            return Err(Error::IllFormed);
        }
        self.out.put(b"{")?;
        Ok(JsonMapWriter {
            out: self.out,
            remaining: count,
            phase: MapPhase::Key,
            first: true,
        })
    }
}

enum BlobMode {
    /// String content; carries the validator unless the writer is lenient.
    Text(Option<Utf8Check>),
    /// Binary content, rendered as base64 with a 3-byte group carry.
    Binary { carry: [u8; 3], carry_len: u8 },
}

/// Streams the content of one JSON string, quoted and escaped.
///
/// The definite/indefinite distinction is invisible in the output; a
/// declared length is still verified at [`finish`](BlobWrite::finish).
pub struct JsonBlobWriter<'a> {
    out: &'a mut dyn TextOutput,
    mode: BlobMode,
    expected: Option<u64>,
    written: u64,
}

impl BlobWrite for JsonBlobWriter<'_> {
    fn write(&mut self, chunk: &[u8]) -> Result<()> {
        if let Some(limit) = self.expected {
            self.written += chunk.len() as u64;
            if self.written > limit {
                return Err(Error::IllFormed);
            }
        }
        match &mut self.mode {
            BlobMode::Text(check) => {
                if let Some(check) = check {
                    check.push_chunk(chunk)?;
                }
                put_escaped(&mut |bytes| self.out.put(bytes), chunk)
            }
            BlobMode::Binary { carry, carry_len } => {
                let mut data = chunk;
                if *carry_len > 0 {
                    while *carry_len < 3 && !data.is_empty() {
                        carry[usize::from(*carry_len)] = data[0];
                        *carry_len += 1;
                        data = &data[1..];
                    }
                    if *carry_len < 3 {
                        return Ok(());
                    }
                    let encoded = STANDARD.encode(&carry[..]);
                    self.out.put(encoded.as_bytes())?;
                    *carry_len = 0;
                }
                let full = data.len() - data.len() % 3;
                if full > 0 {
                    let encoded = STANDARD.encode(&data[..full]);
                    self.out.put(encoded.as_bytes())?;
                }
                for &b in &data[full..] {
                    carry[usize::from(*carry_len)] = b;
                    *carry_len += 1;
                }
                Ok(())
            }
        }
    }

    fn finish(mut self) -> Result<()> {
        if let Some(limit) = self.expected {
            if self.written != limit {
                return Err(Error::IllFormed);
            }
        }
        match &mut self.mode {
            BlobMode::Text(check) => {
                if let Some(check) = check {
                    check.finish()?;
                }
            }
            BlobMode::Binary { carry, carry_len } => {
                if *carry_len > 0 {
                    let encoded = STANDARD.encode(&carry[..usize::from(*carry_len)]);
                    self.out.put(encoded.as_bytes())?;
                }
            }
        }
        self.out.put(b"\"")
    }
}

/// Streams the elements of one JSON array.
pub struct JsonArrayWriter<'a> {
    out: &'a mut dyn TextOutput,
    remaining: Option<u64>,
    first: bool,
}

impl ArrayWrite for JsonArrayWriter<'_> {
    type Elem<'b>
        = JsonDocWriter<'b>
    where
        Self: 'b;

    fn element(&mut self) -> Result<JsonDocWriter<'_>> {
        if let Some(ref mut n) = self.remaining {
            if *n == 0 {
                return Err(Error::IllFormed);
            }
            *n -= 1;
        }
        if self.first {
            self.first = false;
        } else {
            self.out.put(b",")?;
        }
        Ok(JsonDocWriter {
            out: &mut *self.out,
            key: false,
        })
    }

    fn finish(self) -> Result<()> {
        if let Some(n) = self.remaining {
            if n > 0 {
                return Err(Error::IllFormed);
            }
        }
        self.out.put(b"]")
    }
}

/// Streams the key/value pairs of one JSON map.
pub struct JsonMapWriter<'a> {
    out: &'a mut dyn TextOutput,
    remaining: Option<u64>,
    phase: MapPhase,
    first: bool,
}

impl MapWrite for JsonMapWriter<'_> {
    type Elem<'b>
        = JsonDocWriter<'b>
    where
        Self: 'b;

    fn key(&mut self) -> Result<JsonDocWriter<'_>> {
        if self.phase != MapPhase::Key {
            return Err(Error::LibraryMisused);
        }
        if let Some(ref mut n) = self.remaining {
            if *n == 0 {
                return Err(Error::IllFormed);
            }
            *n -= 1;
        }
        if self.first {
            self.first = false;
        } else {
            self.out.put(b",")?;
        }
        self.phase = MapPhase::Value;
        Ok(JsonDocWriter {
            out: &mut *self.out,
            key: true,
        })
    }

    fn value(&mut self) -> Result<JsonDocWriter<'_>> {
        if self.phase != MapPhase::Value {
            return Err(Error::LibraryMisused);
        }
        self.out.put(b":")?;
        self.phase = MapPhase::Key;
        Ok(JsonDocWriter {
            out: &mut *self.out,
            key: false,
        })
    }

    fn finish(self) -> Result<()> {
        if self.phase == MapPhase::Value {
            return Err(Error::IllFormed);
        }
        if let Some(n) = self.remaining {
            if n > 0 {
                return Err(Error::IllFormed);
            }
        }
        self.out.put(b"}")
    }
}
