//! The CBOR-subset codec (RFC 8949 framing; see the crate docs for the
//! supported item set).

mod constants;
mod reader;
mod writer;

pub use reader::{CborArrayReader, CborBlob, CborDocument, CborMapReader, CborReader};
pub use writer::{
    CborArrayWriter, CborBlobWriter, CborDocWriter, CborMapWriter, CborWriter,
};
