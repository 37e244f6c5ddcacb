//! Push-side byte stream contract and adapters.

use std::io::{self, Write};

/// A push-based byte stream.
///
/// [`write`](Sink::write) either accepts the whole buffer or fails; partial
/// acceptance is an adapter concern (see [`WriteSink`], which retries).
pub trait Sink {
    /// Appends the whole of `buf` to the stream.
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Pushes any buffered bytes through to the destination.
    fn flush(&mut self) -> io::Result<()>;
}

/// A [`Sink`] collecting bytes into a `Vec<u8>`.
///
/// # Example
///
/// ```
/// use streampack_buffers::{Sink, VecSink};
///
/// let mut sink = VecSink::new();
/// sink.write(b"ab").unwrap();
/// sink.write(b"c").unwrap();
/// assert_eq!(sink.into_inner(), b"abc");
/// ```
#[derive(Default)]
pub struct VecSink {
    data: Vec<u8>,
}

impl VecSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the sink, returning the collected bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Sink for VecSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A [`Sink`] adapting any [`std::io::Write`], retrying partial writes to
/// completion.
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    /// Wraps a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwraps the inner writer without flushing.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
