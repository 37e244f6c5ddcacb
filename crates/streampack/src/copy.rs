//! SAX-to-SAX copying between codecs.

use crate::document::Document;
use crate::error::Result;
use crate::read::{ArrayRead, BlobRead, DocumentRead, MapRead};
use crate::write::{ArrayWrite, BlobWrite, DocumentWrite, MapWrite};

const COPY_BUF: usize = 8 * 1024;

/// Re-emits a document read from one codec into a writer for any codec.
///
/// Scalars are forwarded as values. Blobs are pumped through a fixed stack
/// buffer: when the first pull already hits the end of the blob the item is
/// written with definite framing of that exact size, otherwise it is written
/// with indefinite framing whose chunks are the buffered pulls. Containers
/// recurse.
///
/// ```
/// use streampack::cbor::CborReader;
/// use streampack::copy_document;
/// use streampack::json::JsonWriter;
/// use streampack_buffers::{SliceSource, VecSink};
///
/// let mut reader = CborReader::new(SliceSource::new(&[0x82, 0x01, 0x02]));
/// let mut writer = JsonWriter::new(VecSink::new());
/// copy_document(reader.read_document()?, writer.document())?;
/// assert_eq!(writer.into_inner().into_inner(), b"[1,2]");
/// # Ok::<(), streampack::Error>(())
/// ```
pub fn copy_document<D: DocumentRead, W: DocumentWrite>(doc: D, writer: W) -> Result<()> {
    match doc.into_document() {
        Document::Null => writer.write_null(),
        Document::Undefined => writer.write_undefined(),
        Document::Boolean(v) => writer.write_bool(v),
        Document::UnsignedInt(v) => writer.write_unsigned(v),
        Document::SignedInt(v) => writer.write_signed(v),
        Document::FloatingPoint(v) => writer.write_float(v),
        Document::Binary(blob) => copy_blob(blob, writer, false),
        Document::Text(blob) => copy_blob(blob, writer, true),
        Document::Array(mut array) => {
            let mut out = writer.begin_array(None)?;
            while let Some(elem) = array.read_next()? {
                copy_document(elem, out.element()?)?;
            }
            out.finish()
        }
        Document::Map(mut map) => {
            let mut out = writer.begin_map(None)?;
            loop {
                match map.read_next_key()? {
                    Some(key) => copy_document(key, out.key()?)?,
                    None => break,
                }
                copy_document(map.read_value()?, out.value()?)?;
            }
            out.finish()
        }
    }
}

fn copy_blob<B: BlobRead, W: DocumentWrite>(mut blob: B, writer: W, text: bool) -> Result<()> {
    let mut buf = [0u8; COPY_BUF];
    let first = blob.read(&mut buf)?;
    if first < buf.len() {
        // The whole blob fit in one pull; its exact size is known.
        let mut out = if text {
            writer.begin_text(Some(first as u64))?
        } else {
            writer.begin_binary(Some(first as u64))?
        };
        out.write(&buf[..first])?;
        out.finish()
    } else {
        let mut out = if text {
            writer.begin_text(None)?
        } else {
            writer.begin_binary(None)?
        };
        out.write(&buf)?;
        loop {
            let n = blob.read(&mut buf)?;
            out.write(&buf[..n])?;
            if n < buf.len() {
                break;
            }
        }
        out.finish()
    }
}
