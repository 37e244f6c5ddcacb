#![allow(dead_code)]

//! Shared helpers: an owned mirror of the document model so streamed results
//! can be compared with `assert_eq!`.

use streampack::{
    ArrayRead, ArrayWrite, BlobRead, BlobWrite, Document, DocumentRead, DocumentWrite, MapRead,
    MapWrite, Result,
};

/// Owned document, for test assertions only.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Str(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(s.to_owned())
    }

    pub fn map(pairs: &[(&str, Value)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (Value::str(k), v.clone()))
                .collect(),
        )
    }
}

/// Materializes a streamed document.
pub fn read_value<D: DocumentRead>(doc: D) -> Result<Value> {
    Ok(match doc.into_document() {
        Document::Null => Value::Null,
        Document::Undefined => Value::Undefined,
        Document::Boolean(v) => Value::Bool(v),
        Document::UnsignedInt(v) => Value::UInt(v),
        Document::SignedInt(v) => Value::Int(v),
        Document::FloatingPoint(v) => Value::Float(v),
        Document::Binary(mut blob) => Value::Bytes(blob.read_to_vec()?),
        Document::Text(mut blob) => Value::Str(blob.read_to_string()?),
        Document::Array(mut array) => {
            let mut items = Vec::new();
            while let Some(elem) = array.read_next()? {
                items.push(read_value(elem)?);
            }
            Value::Array(items)
        }
        Document::Map(mut map) => {
            let mut pairs = Vec::new();
            loop {
                let key = match map.read_next_key()? {
                    Some(key) => read_value(key)?,
                    None => break,
                };
                let value = read_value(map.read_value()?)?;
                pairs.push((key, value));
            }
            Value::Map(pairs)
        }
    })
}

/// Emits an owned document through any writer, with definite framing.
pub fn write_value<W: DocumentWrite>(writer: W, value: &Value) -> Result<()> {
    match value {
        Value::Null => writer.write_null(),
        Value::Undefined => writer.write_undefined(),
        Value::Bool(v) => writer.write_bool(*v),
        Value::UInt(v) => writer.write_unsigned(*v),
        Value::Int(v) => writer.write_signed(*v),
        Value::Float(v) => writer.write_float(*v),
        Value::Bytes(bytes) => {
            let mut blob = writer.begin_binary(Some(bytes.len() as u64))?;
            blob.write(bytes)?;
            blob.finish()
        }
        Value::Str(s) => {
            let mut blob = writer.begin_text(Some(s.len() as u64))?;
            blob.write(s.as_bytes())?;
            blob.finish()
        }
        Value::Array(items) => {
            let mut out = writer.begin_array(Some(items.len() as u64))?;
            for item in items {
                write_value(out.element()?, item)?;
            }
            out.finish()
        }
        Value::Map(pairs) => {
            let mut out = writer.begin_map(Some(pairs.len() as u64))?;
            for (key, value) in pairs {
                write_value(out.key()?, key)?;
                write_value(out.value()?, value)?;
            }
            out.finish()
        }
    }
}
