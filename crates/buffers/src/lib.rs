//! Byte source and sink plumbing underneath the streampack codecs.
//!
//! The codec crate never talks to files, sockets or buffers directly; it
//! pulls bytes from a [`Source`] and pushes bytes into a [`Sink`]. This crate
//! defines those two contracts and the stock adapters: in-memory slices and
//! vectors, and anything implementing [`std::io::Read`] / [`std::io::Write`].

mod sink;
mod source;

pub use sink::{Sink, VecSink, WriteSink};
pub use source::{ReadSource, SliceSource, Source};
