//! Streaming, pull-based codecs for two self-describing data formats — a
//! CBOR subset (RFC 8949 framing) and JSON (RFC 8259) — unified under one
//! abstract document model.
//!
//! A format reader decodes only the head of an item and hands back a
//! [`Document`]: scalars arrive as plain values, while strings, byte blobs,
//! arrays and maps arrive as sub-readers that pull the rest of their
//! encoding from the same byte source as the application traverses them.
//! Nothing is materialized, so a terabyte-sized array costs the same memory
//! as an empty one. Writers mirror this with sub-writers that append to a
//! shared sink, using either definite framing (size declared up front) or
//! indefinite framing (streamed until finished).
//!
//! Each sub-reader mutably borrows its parent's byte stream, so the borrow
//! checker enforces the core discipline — one live descendant, parent
//! untouchable meanwhile — at compile time. What borrows cannot express
//! (a child abandoned before its end was observed, broken map key/value
//! alternation) is caught at run time and reported as
//! [`Error::LibraryMisused`] while debug assertions are compiled in.
//!
//! # Reading
//!
//! ```
//! use streampack::cbor::CborReader;
//! use streampack::{BlobRead, Document};
//! use streampack_buffers::SliceSource;
//!
//! // [1, "hi"]
//! let bytes = [0x82, 0x01, 0x62, b'h', b'i'];
//! let mut reader = CborReader::new(SliceSource::new(&bytes));
//! let mut array = reader.read_document()?.into_array()?;
//! assert_eq!(array.read_next()?.unwrap().into_unsigned()?, 1);
//! match array.read_next()?.unwrap() {
//!     Document::Text(mut text) => assert_eq!(text.read_to_string()?, "hi"),
//!     other => panic!("unexpected {:?}", other.kind()),
//! }
//! assert!(array.read_next()?.is_none());
//! # Ok::<(), streampack::Error>(())
//! ```
//!
//! # Writing and transcoding
//!
//! ```
//! use streampack::copy_document;
//! use streampack::json::JsonReader;
//! use streampack::cbor::CborWriter;
//! use streampack_buffers::{SliceSource, VecSink};
//!
//! let mut reader = JsonReader::new(SliceSource::new(b"{\"a\": [1, 2]}"));
//! let mut writer = CborWriter::new(VecSink::new());
//! copy_document(reader.read_document()?, writer.document())?;
//! # Ok::<(), streampack::Error>(())
//! ```

pub mod cbor;
pub mod json;

mod copy;
mod document;
mod error;
mod gate;
mod kind;
mod read;
mod write;

pub use copy::copy_document;
pub use document::Document;
pub use error::{Error, Result};
pub use kind::Kind;
pub use read::{skip_document, ArrayRead, BlobRead, DocumentRead, MapRead, NeverBlob};
pub use write::{ArrayWrite, BlobWrite, DocumentWrite, MapWrite};
