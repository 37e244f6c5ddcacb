//! Pull-side byte stream contract and adapters.

use std::io::{self, Read};

/// A pull-based byte stream with single-byte lookahead.
///
/// The contract mirrors what the codec layer needs and nothing more:
///
/// * [`read`](Source::read) fills as much of `buf` as the stream allows. A
///   short count means end-of-stream was reached on that call; every later
///   call returns `0`.
/// * [`peek`](Source::peek) exposes the next byte without consuming it;
///   `None` at end-of-stream.
/// * [`skip`](Source::skip) discards up to `n` bytes and reports how many
///   were actually discarded. There is no backward seek.
pub trait Source {
    /// Reads into `buf`, returning the number of bytes placed there.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Returns the next byte without consuming it.
    fn peek(&mut self) -> io::Result<Option<u8>>;

    /// Discards up to `n` bytes, returning the count actually discarded.
    fn skip(&mut self, n: u64) -> io::Result<u64>;
}

/// A [`Source`] reading from a byte slice with cursor tracking.
///
/// # Example
///
/// ```
/// use streampack_buffers::{SliceSource, Source};
///
/// let mut src = SliceSource::new(b"abc");
/// assert_eq!(src.peek().unwrap(), Some(b'a'));
/// let mut buf = [0u8; 2];
/// assert_eq!(src.read(&mut buf).unwrap(), 2);
/// assert_eq!(&buf, b"ab");
/// ```
pub struct SliceSource<'a> {
    data: &'a [u8],
    x: usize,
}

impl<'a> SliceSource<'a> {
    /// Creates a source over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, x: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.x
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.x
    }
}

impl Source for SliceSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.x..self.x + n]);
        self.x += n;
        Ok(n)
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        Ok(self.data.get(self.x).copied())
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let actual = (self.remaining() as u64).min(n);
        self.x += actual as usize;
        Ok(actual)
    }
}

/// A [`Source`] adapting any [`std::io::Read`].
///
/// Maintains the one-byte lookahead buffer that `io::Read` lacks, and turns
/// the "short read means try again" convention into the codec contract of
/// "short read means end-of-stream".
pub struct ReadSource<R> {
    inner: R,
    peeked: Option<u8>,
}

impl<R: Read> ReadSource<R> {
    /// Wraps a reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
        }
    }

    /// Unwraps the inner reader. A peeked-but-unconsumed byte is lost.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Source for ReadSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        if let Some(b) = self.peeked.take() {
            if buf.is_empty() {
                self.peeked = Some(b);
                return Ok(0);
            }
            buf[0] = b;
            filled = 1;
        }
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        if self.peeked.is_none() {
            let mut b = [0u8; 1];
            if self.read(&mut b)? == 1 {
                self.peeked = Some(b[0]);
            }
        }
        Ok(self.peeked)
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let mut scratch = [0u8; 512];
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_read_short_at_end() {
        let mut src = SliceSource::new(b"abc");
        let mut buf = [0u8; 8];
        assert_eq!(src.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(src.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_slice_peek_does_not_consume() {
        let mut src = SliceSource::new(b"xy");
        assert_eq!(src.peek().unwrap(), Some(b'x'));
        assert_eq!(src.peek().unwrap(), Some(b'x'));
        let mut buf = [0u8; 2];
        assert_eq!(src.read(&mut buf).unwrap(), 2);
        assert_eq!(src.peek().unwrap(), None);
    }

    #[test]
    fn test_slice_skip_clamps() {
        let mut src = SliceSource::new(b"hello");
        assert_eq!(src.skip(2).unwrap(), 2);
        assert_eq!(src.skip(10).unwrap(), 3);
        assert_eq!(src.skip(1).unwrap(), 0);
    }

    #[test]
    fn test_read_source_fills_across_short_reads() {
        // A reader that doles out one byte at a time.
        struct OneByte<'a>(&'a [u8]);
        impl Read for OneByte<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }
        let mut src = ReadSource::new(OneByte(b"abcd"));
        let mut buf = [0u8; 3];
        assert_eq!(src.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(src.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'd');
    }

    #[test]
    fn test_read_source_peek_then_read() {
        let mut src = ReadSource::new(&b"hi"[..]);
        assert_eq!(src.peek().unwrap(), Some(b'h'));
        let mut buf = [0u8; 2];
        assert_eq!(src.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"hi");
        assert_eq!(src.peek().unwrap(), None);
    }

    #[test]
    fn test_read_source_skip_counts_peeked_byte() {
        let mut src = ReadSource::new(&b"abcde"[..]);
        assert_eq!(src.peek().unwrap(), Some(b'a'));
        assert_eq!(src.skip(3).unwrap(), 3);
        assert_eq!(src.peek().unwrap(), Some(b'd'));
    }
}
