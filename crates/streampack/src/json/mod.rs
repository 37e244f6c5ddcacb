//! The JSON codec (RFC 8259).

mod escape;
mod reader;
mod writer;

pub use reader::{
    JsonArrayReader, JsonDocument, JsonMapReader, JsonReader, JsonStringReader,
};
pub use writer::{
    JsonArrayWriter, JsonBlobWriter, JsonDocWriter, JsonMapWriter, JsonWriter,
};
