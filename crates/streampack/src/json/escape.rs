//! String escaping and cross-chunk UTF-8 validation for the JSON writer.

use crate::error::{Error, Result};

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Whether a byte needs escaping inside a JSON string.
fn needs_escape(b: u8) -> bool {
    b == b'"' || b == b'\\' || b < 0x20
}

/// Writes one chunk of string content through `put`, escaping as required:
/// `"` and `\` get a backslash, control characters become `\uXXXX`.
pub(crate) fn put_escaped(
    put: &mut dyn FnMut(&[u8]) -> Result<()>,
    chunk: &[u8],
) -> Result<()> {
    let mut plain = 0;
    for (i, &b) in chunk.iter().enumerate() {
        if !needs_escape(b) {
            continue;
        }
        if plain < i {
            put(&chunk[plain..i])?;
        }
        match b {
            b'"' => put(b"\\\"")?,
            b'\\' => put(b"\\\\")?,
            c => {
                let seq = [
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[usize::from(c >> 4)],
                    HEX[usize::from(c & 0xf)],
                ];
                put(&seq)?;
            }
        }
        plain = i + 1;
    }
    if plain < chunk.len() {
        put(&chunk[plain..])?;
    }
    Ok(())
}

/// Incremental UTF-8 validator.
///
/// Content arrives in arbitrary chunks, so a multi-byte character can be
/// split across calls; the validator carries the continuation state over.
/// The first continuation byte after a leading byte has a narrowed range
/// (rejecting overlong forms and surrogate code points), the rest are plain
/// `80..BF`.
#[derive(Debug)]
pub(crate) struct Utf8Check {
    need: u8,
    min: u8,
    max: u8,
}

impl Utf8Check {
    pub(crate) fn new() -> Self {
        Self {
            need: 0,
            min: 0x80,
            max: 0xbf,
        }
    }

    /// Feeds one byte; fails on the first byte that cannot extend a valid
    /// UTF-8 sequence.
    pub(crate) fn push(&mut self, b: u8) -> Result<()> {
        if self.need > 0 {
            if b < self.min || b > self.max {
                return Err(Error::IllFormed);
            }
            self.need -= 1;
            self.min = 0x80;
            self.max = 0xbf;
            return Ok(());
        }
        match b {
            0x00..=0x7f => {}
            0xc2..=0xdf => self.expect(1, 0x80, 0xbf),
            0xe0 => self.expect(2, 0xa0, 0xbf),
            0xe1..=0xec | 0xee..=0xef => self.expect(2, 0x80, 0xbf),
            0xed => self.expect(2, 0x80, 0x9f),
            0xf0 => self.expect(3, 0x90, 0xbf),
            0xf1..=0xf3 => self.expect(3, 0x80, 0xbf),
            0xf4 => self.expect(3, 0x80, 0x8f),
            _ => return Err(Error::IllFormed),
        }
        Ok(())
    }

    /// Feeds a whole chunk.
    pub(crate) fn push_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        for &b in chunk {
            self.push(b)?;
        }
        Ok(())
    }

    /// Fails if the content ended in the middle of a character.
    pub(crate) fn finish(&self) -> Result<()> {
        if self.need > 0 {
            return Err(Error::IllFormed);
        }
        Ok(())
    }

    fn expect(&mut self, need: u8, min: u8, max: u8) {
        self.need = need;
        self.min = min;
        self.max = max;
    }
}
