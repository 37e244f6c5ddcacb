//! Streaming JSON reader.
//!
//! A pull-parser over UTF-8 text with exactly one byte of lookahead,
//! obtained through [`Source::peek`]. Strings are decoded escape-by-escape
//! as the application pulls bytes; arrays and maps parse one element per
//! request, so a document of any size is traversed in constant memory.

use streampack_buffers::Source;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::gate::{sequence_error, DeadEnd, Gate, MapPhase};
use crate::read::{ArrayRead, BlobRead, MapRead, NeverBlob};

/// A document decoded from JSON text. JSON has no `binary` kind.
pub type JsonDocument<'a> =
    Document<NeverBlob, JsonStringReader<'a>, JsonArrayReader<'a>, JsonMapReader<'a>>;

/// Longest accepted number literal. Numbers are the one token that must be
/// buffered whole before parsing.
const NUMBER_LIMIT: usize = 4096;

/// Pull-reader for JSON text over any byte [`Source`].
pub struct JsonReader<S> {
    src: S,
    gate: Gate,
    at_start: bool,
}

impl<S: Source> JsonReader<S> {
    /// Creates a reader over the given source.
    pub fn new(src: S) -> Self {
        Self {
            src,
            gate: Gate::default(),
            at_start: true,
        }
    }

    /// Parses the head of the next top-level document.
    ///
    /// A leading UTF-8 byte-order mark is skipped, at the top level only.
    pub fn read_document(&mut self) -> Result<JsonDocument<'_>> {
        self.gate.check()?;
        if self.at_start {
            self.at_start = false;
            self.skip_bom()?;
        }
        parse_document(self)
    }

    /// Verifies that nothing but whitespace remains in the source.
    pub fn end(&mut self) -> Result<()> {
        self.gate.check()?;
        skip_whitespace(self)?;
        if self.src.peek()?.is_some() {
            return Err(Error::IllFormed);
        }
        Ok(())
    }

    /// Unwraps the underlying source.
    pub fn into_inner(self) -> S {
        self.src
    }

    fn skip_bom(&mut self) -> Result<()> {
        if self.src.peek()? == Some(0xef) {
            let mut bom = [0u8; 3];
            if self.src.read(&mut bom)? != 3 || bom != [0xef, 0xbb, 0xbf] {
                return Err(self.gate.fail(DeadEnd::IllFormed));
            }
        }
        Ok(())
    }
}

/// Byte-level access shared by the sub-readers of one [`JsonReader`].
trait TextInput {
    fn gate(&mut self) -> &mut Gate;
    /// The next byte; running out of input here is a premature end.
    fn next_byte(&mut self) -> Result<u8>;
    fn peek_byte(&mut self) -> Result<Option<u8>>;
}

impl<S: Source> TextInput for JsonReader<S> {
    fn gate(&mut self) -> &mut Gate {
        &mut self.gate
    }

    fn next_byte(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        match self.src.read(&mut b) {
            Ok(1) => Ok(b[0]),
            Ok(_) => Err(self.gate.fail(DeadEnd::Eof)),
            Err(e) => Err(self.gate.fail_io(e)),
        }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        match self.src.peek() {
            Ok(b) => Ok(b),
            Err(e) => Err(self.gate.fail_io(e)),
        }
    }
}

fn skip_whitespace(input: &mut dyn TextInput) -> Result<()> {
    while let Some(b' ' | b'\t' | b'\n' | b'\r') = input.peek_byte()? {
        input.next_byte()?;
    }
    Ok(())
}

fn expect_literal(input: &mut dyn TextInput, literal: &[u8]) -> Result<()> {
    for &expected in literal {
        if input.next_byte()? != expected {
            return Err(input.gate().fail(DeadEnd::IllFormed));
        }
    }
    Ok(())
}

fn parse_document(input: &mut dyn TextInput) -> Result<JsonDocument<'_>> {
    skip_whitespace(input)?;
    let b = input.peek_byte()?.ok_or(Error::Eof)?;
    match b {
        b'n' => {
            expect_literal(input, b"null")?;
            Ok(Document::Null)
        }
        b't' => {
            expect_literal(input, b"true")?;
            Ok(Document::Boolean(true))
        }
        b'f' => {
            expect_literal(input, b"false")?;
            Ok(Document::Boolean(false))
        }
        b'"' => {
            input.next_byte()?;
            Ok(Document::Text(JsonStringReader::new(input)))
        }
        b'-' | b'0'..=b'9' => parse_number(input),
        b'[' => {
            input.next_byte()?;
            Ok(Document::Array(JsonArrayReader {
                input,
                first: true,
                done: false,
            }))
        }
        b'{' => {
            input.next_byte()?;
            Ok(Document::Map(JsonMapReader {
                input,
                phase: MapPhase::Key,
                first: true,
            }))
        }
        _ => Err(Error::IllFormed),
    }
}

fn push_number_byte(input: &mut dyn TextInput, text: &mut Vec<u8>, b: u8) -> Result<()> {
    if text.len() >= NUMBER_LIMIT {
        return Err(input.gate().fail(DeadEnd::IllFormed));
    }
    text.push(b);
    Ok(())
}

fn take_digits(input: &mut dyn TextInput, text: &mut Vec<u8>) -> Result<usize> {
    let mut count = 0;
    while let Some(b @ b'0'..=b'9') = input.peek_byte()? {
        input.next_byte()?;
        push_number_byte(input, text, b)?;
        count += 1;
    }
    Ok(count)
}

fn parse_number(input: &mut dyn TextInput) -> Result<JsonDocument<'_>> {
    let mut text = Vec::new();
    let negative = input.peek_byte()? == Some(b'-');
    if negative {
        let b = input.next_byte()?;
        push_number_byte(input, &mut text, b)?;
    }
    if take_digits(input, &mut text)? == 0 {
        return Err(input.gate().fail(DeadEnd::IllFormed));
    }
    let mut float = false;
    if input.peek_byte()? == Some(b'.') {
        float = true;
        let b = input.next_byte()?;
        push_number_byte(input, &mut text, b)?;
        if take_digits(input, &mut text)? == 0 {
            return Err(input.gate().fail(DeadEnd::IllFormed));
        }
    }
    if let Some(b'e' | b'E') = input.peek_byte()? {
        float = true;
        let b = input.next_byte()?;
        push_number_byte(input, &mut text, b)?;
        if let Some(b'+' | b'-') = input.peek_byte()? {
            let b = input.next_byte()?;
            push_number_byte(input, &mut text, b)?;
        }
        if take_digits(input, &mut text)? == 0 {
            return Err(input.gate().fail(DeadEnd::IllFormed));
        }
    }
    let Ok(text) = std::str::from_utf8(&text) else {
        return Err(input.gate().fail(DeadEnd::IllFormed));
    };
    if float {
        let Ok(value) = text.parse::<f64>() else {
            return Err(input.gate().fail(DeadEnd::IllFormed));
        };
        return Ok(Document::FloatingPoint(value));
    }
    if negative {
        if let Ok(value) = text.parse::<i64>() {
            // "-0" is still the unsigned zero.
            return Ok(if value < 0 {
                Document::SignedInt(value)
            } else {
                Document::UnsignedInt(value as u64)
            });
        }
    } else if let Ok(value) = text.parse::<u64>() {
        return Ok(Document::UnsignedInt(value));
    }
    // Magnitudes beyond the 64-bit integers decay to floating point.
    let Ok(value) = text.parse::<f64>() else {
        return Err(input.gate().fail(DeadEnd::IllFormed));
    };
    Ok(Document::FloatingPoint(value))
}

/// Streams the decoded content of one JSON string.
///
/// Escape sequences (including surrogate pairs) are decoded on the fly; the
/// caller sees raw UTF-8 bytes. The closing quote is consumed and marks the
/// end of the blob.
pub struct JsonStringReader<'a> {
    input: &'a mut dyn TextInput,
    /// Decoded bytes of the last escape not yet handed to the caller.
    pending: [u8; 4],
    pending_len: u8,
    pending_pos: u8,
    done: bool,
}

impl<'a> JsonStringReader<'a> {
    fn new(input: &'a mut dyn TextInput) -> Self {
        Self {
            input,
            pending: [0; 4],
            pending_len: 0,
            pending_pos: 0,
            done: false,
        }
    }

    fn decode_escape(&mut self) -> Result<()> {
        let e = self.input.next_byte()?;
        let decoded = match e {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => return self.decode_unicode_escape(),
            _ => return Err(self.input.gate().fail(DeadEnd::IllFormed)),
        };
        self.pending[0] = decoded;
        self.pending_len = 1;
        self.pending_pos = 0;
        Ok(())
    }

    fn decode_unicode_escape(&mut self) -> Result<()> {
        let first = u32::from(self.read_hex4()?);
        let code_point = if (0xd800..0xdc00).contains(&first) {
            // High surrogate; its partner must follow immediately.
            if self.input.next_byte()? != b'\\' || self.input.next_byte()? != b'u' {
                return Err(self.input.gate().fail(DeadEnd::IllFormed));
            }
            let low = u32::from(self.read_hex4()?);
            if !(0xdc00..0xe000).contains(&low) {
                return Err(self.input.gate().fail(DeadEnd::IllFormed));
            }
            0x10000 + ((first - 0xd800) << 10) + (low - 0xdc00)
        } else if (0xdc00..0xe000).contains(&first) {
            return Err(self.input.gate().fail(DeadEnd::IllFormed));
        } else {
            first
        };
        let Some(ch) = char::from_u32(code_point) else {
            return Err(self.input.gate().fail(DeadEnd::IllFormed));
        };
        let len = ch.encode_utf8(&mut self.pending).len();
        self.pending_len = len as u8;
        self.pending_pos = 0;
        Ok(())
    }

    fn read_hex4(&mut self) -> Result<u16> {
        let mut value = 0u16;
        for _ in 0..4 {
            let digit = match self.input.next_byte()? {
                b @ b'0'..=b'9' => b - b'0',
                b @ b'a'..=b'f' => b - b'a' + 10,
                b @ b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(self.input.gate().fail(DeadEnd::IllFormed)),
            };
            value = (value << 4) | u16::from(digit);
        }
        Ok(value)
    }
}

impl BlobRead for JsonStringReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.input.gate().check()?;
        let mut filled = 0;
        while filled < buf.len() {
            if self.pending_pos < self.pending_len {
                buf[filled] = self.pending[usize::from(self.pending_pos)];
                self.pending_pos += 1;
                filled += 1;
                continue;
            }
            if self.done {
                break;
            }
            match self.input.next_byte()? {
                b'"' => {
                    self.done = true;
                    break;
                }
                b'\\' => self.decode_escape()?,
                // Raw control characters must be escaped in JSON.
                0x00..=0x1f => return Err(self.input.gate().fail(DeadEnd::IllFormed)),
                b => {
                    buf[filled] = b;
                    filled += 1;
                }
            }
        }
        Ok(filled)
    }
}

impl Drop for JsonStringReader<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.input.gate().poison();
        }
    }
}

/// Streams the elements of one JSON array.
pub struct JsonArrayReader<'a> {
    input: &'a mut dyn TextInput,
    first: bool,
    done: bool,
}

impl JsonArrayReader<'_> {
    /// Returns the next element, or `None` at the end of the array.
    pub fn read_next(&mut self) -> Result<Option<JsonDocument<'_>>> {
        self.input.gate().check()?;
        if self.done {
            return Ok(None);
        }
        skip_whitespace(self.input)?;
        let b = self.input.peek_byte()?.ok_or(Error::Eof)?;
        if b == b']' {
            self.input.next_byte()?;
            self.done = true;
            return Ok(None);
        }
        if self.first {
            self.first = false;
        } else {
            if b != b',' {
                return Err(Error::IllFormed);
            }
            self.input.next_byte()?;
            skip_whitespace(self.input)?;
            if self.input.peek_byte()?.ok_or(Error::Eof)? == b']' {
                // Trailing comma.
                return Err(self.input.gate().fail(DeadEnd::IllFormed));
            }
        }
        parse_document(&mut *self.input).map(Some)
    }
}

impl ArrayRead for JsonArrayReader<'_> {
    type Elem<'a>
        = JsonDocument<'a>
    where
        Self: 'a;

    fn read_next(&mut self) -> Result<Option<JsonDocument<'_>>> {
        JsonArrayReader::read_next(self)
    }
}

impl Drop for JsonArrayReader<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.input.gate().poison();
        }
    }
}

/// Streams the key/value pairs of one JSON map.
pub struct JsonMapReader<'a> {
    input: &'a mut dyn TextInput,
    phase: MapPhase,
    first: bool,
}

impl JsonMapReader<'_> {
    /// Returns the next key, or `None` at the end of the map. Keys are
    /// always `string` documents.
    pub fn read_next_key(&mut self) -> Result<Option<JsonDocument<'_>>> {
        self.input.gate().check()?;
        match self.phase {
            MapPhase::Done => return Ok(None),
            MapPhase::Value => sequence_error()?,
            MapPhase::Key => {}
        }
        skip_whitespace(self.input)?;
        let b = self.input.peek_byte()?.ok_or(Error::Eof)?;
        if b == b'}' {
            self.input.next_byte()?;
            self.phase = MapPhase::Done;
            return Ok(None);
        }
        if self.first {
            self.first = false;
        } else {
            if b != b',' {
                return Err(Error::IllFormed);
            }
            self.input.next_byte()?;
            skip_whitespace(self.input)?;
            if self.input.peek_byte()?.ok_or(Error::Eof)? == b'}' {
                return Err(self.input.gate().fail(DeadEnd::IllFormed));
            }
        }
        if self.input.peek_byte()?.ok_or(Error::Eof)? != b'"' {
            // JSON keys are strings.
            return Err(Error::IllFormed);
        }
        self.input.next_byte()?;
        self.phase = MapPhase::Value;
        Ok(Some(Document::Text(JsonStringReader::new(
            &mut *self.input,
        ))))
    }

    /// Returns the value matching the key just read.
    pub fn read_value(&mut self) -> Result<JsonDocument<'_>> {
        self.input.gate().check()?;
        if self.phase != MapPhase::Value {
            sequence_error()?;
        }
        skip_whitespace(self.input)?;
        if self.input.next_byte()? != b':' {
            return Err(self.input.gate().fail(DeadEnd::IllFormed));
        }
        self.phase = MapPhase::Key;
        parse_document(&mut *self.input)
    }
}

impl MapRead for JsonMapReader<'_> {
    type Elem<'a>
        = JsonDocument<'a>
    where
        Self: 'a;

    fn read_next_key(&mut self) -> Result<Option<JsonDocument<'_>>> {
        JsonMapReader::read_next_key(self)
    }

    fn read_value(&mut self) -> Result<JsonDocument<'_>> {
        JsonMapReader::read_value(self)
    }
}

impl Drop for JsonMapReader<'_> {
    fn drop(&mut self) {
        if self.phase != MapPhase::Done {
            self.input.gate().poison();
        }
    }
}
