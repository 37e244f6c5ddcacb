//! CBOR round-trips, known wire images, and cross-checks against ciborium.

mod common;

use common::{read_value, write_value, Value};
use streampack::cbor::{CborReader, CborWriter};
use streampack::copy_document;
use streampack_buffers::{SliceSource, VecSink};

fn encode(value: &Value) -> Vec<u8> {
    let mut writer = CborWriter::new(VecSink::new());
    write_value(writer.document(), value).unwrap();
    writer.flush().unwrap();
    writer.into_inner().into_inner()
}

fn decode(bytes: &[u8]) -> Value {
    let mut reader = CborReader::new(SliceSource::new(bytes));
    let value = read_value(reader.read_document().unwrap()).unwrap();
    reader.end().unwrap();
    value
}

#[test]
fn encoder_decoder_matrix() {
    let values = vec![
        Value::Null,
        Value::Undefined,
        Value::Bool(true),
        Value::Bool(false),
        Value::UInt(0),
        Value::UInt(23),
        Value::UInt(24),
        Value::UInt(u64::MAX),
        Value::Int(-1),
        Value::Int(-24),
        Value::Int(-25),
        Value::Int(i64::MIN),
        Value::Float(0.1),
        Value::Float(-123.123),
        Value::Bytes(vec![]),
        Value::Bytes(vec![1, 2, 3, 4, 5]),
        Value::str(""),
        Value::str("asdf asfd 😱 asdf asdf 👀 as"),
        Value::Array(vec![Value::UInt(1), Value::str("a"), Value::Int(-2)]),
        Value::map(&[
            ("foo", Value::str("bar")),
            ("baz", Value::UInt(123)),
            ("deep", Value::Array(vec![Value::map(&[("x", Value::Null)])])),
        ]),
    ];
    for value in values {
        let bytes = encode(&value);
        assert_eq!(decode(&bytes), value, "round trip failed for {value:?}");
    }
}

#[test]
fn known_wire_images() {
    // [1, 2]
    assert_eq!(
        encode(&Value::Array(vec![Value::UInt(1), Value::UInt(2)])),
        [0x82, 0x01, 0x02]
    );
    assert_eq!(
        decode(&[0x82, 0x01, 0x02]),
        Value::Array(vec![Value::UInt(1), Value::UInt(2)])
    );
    // {"a": 1, "b": 2}
    assert_eq!(
        decode(&[0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x02]),
        Value::map(&[("a", Value::UInt(1)), ("b", Value::UInt(2))])
    );
}

#[test]
fn indefinite_input_reads_like_definite() {
    // [_ 1, [_ 2], "ab"]
    let bytes = [
        0x9f, 0x01, 0x9f, 0x02, 0xff, 0x62, b'a', b'b', 0xff,
    ];
    assert_eq!(
        decode(&bytes),
        Value::Array(vec![
            Value::UInt(1),
            Value::Array(vec![Value::UInt(2)]),
            Value::str("ab"),
        ])
    );
    // {_ "k": h'6162'}
    let bytes = [0xbf, 0x61, b'k', 0x42, b'a', b'b', 0xff];
    assert_eq!(
        decode(&bytes),
        Value::Map(vec![(Value::str("k"), Value::Bytes(b"ab".to_vec()))])
    );
}

#[test]
fn copy_reframes_but_preserves_document() {
    // Indefinite containers and chunked blobs come out re-framed, but the
    // abstract document survives the copy unchanged.
    let inputs: Vec<Vec<u8>> = vec![
        vec![0x9f, 0x01, 0x02, 0xff],
        vec![0x5f, 0x43, b'a', b'b', b'c', 0x42, b'd', b'e', 0xff],
        vec![0xbf, 0x61, b'a', 0xf5, 0xff],
        vec![0x82, 0xf9, 0x3e, 0x00, 0x03],
    ];
    for input in inputs {
        let mut reader = CborReader::new(SliceSource::new(&input));
        let mut writer = CborWriter::new(VecSink::new());
        copy_document(reader.read_document().unwrap(), writer.document()).unwrap();
        reader.end().unwrap();
        let copied = writer.into_inner().into_inner();
        assert_eq!(decode(&copied), decode(&input), "input {input:02x?}");
    }
}

#[test]
fn float16_survives_copy_as_float64() {
    // f16 1.5 through the copy engine comes out as the 8-byte encoding.
    let mut reader = CborReader::new(SliceSource::new(&[0xf9, 0x3e, 0x00]));
    let mut writer = CborWriter::new(VecSink::new());
    copy_document(reader.read_document().unwrap(), writer.document()).unwrap();
    assert_eq!(
        writer.into_inner().into_inner(),
        [0xfb, 0x3f, 0xf8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn large_blob_copies_with_indefinite_framing() {
    // 20000 bytes exceeds the copy buffer, so the copy switches to
    // indefinite framing; the content must survive unchanged.
    let payload: Vec<u8> = (0..20000u32).map(|i| (i % 251) as u8).collect();
    let mut input = vec![0x5a];
    input.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    input.extend_from_slice(&payload);

    let mut reader = CborReader::new(SliceSource::new(&input));
    let mut writer = CborWriter::new(VecSink::new());
    copy_document(reader.read_document().unwrap(), writer.document()).unwrap();
    let copied = writer.into_inner().into_inner();
    assert_eq!(copied[0], 0x5f, "expected indefinite framing");
    assert_eq!(decode(&copied), Value::Bytes(payload));
}

// ---------------------------------------------------------------- ciborium

fn to_ciborium(value: &Value) -> ciborium::value::Value {
    use ciborium::value::Value as C;
    match value {
        Value::Null => C::Null,
        Value::Bool(v) => C::Bool(*v),
        Value::UInt(v) => C::Integer((*v).into()),
        Value::Int(v) => C::Integer((*v).into()),
        Value::Float(v) => C::Float(*v),
        Value::Bytes(b) => C::Bytes(b.clone()),
        Value::Str(s) => C::Text(s.clone()),
        Value::Array(items) => C::Array(items.iter().map(to_ciborium).collect()),
        Value::Map(pairs) => C::Map(
            pairs
                .iter()
                .map(|(k, v)| (to_ciborium(k), to_ciborium(v)))
                .collect(),
        ),
        Value::Undefined => panic!("no ciborium equivalent"),
    }
}

#[test]
fn byte_images_agree_with_ciborium() {
    // Integer, string, bytes and container encodings are canonical in both
    // implementations, so the byte images must match exactly. (Floats are
    // excluded: ciborium narrows them, this wire format does not.)
    let values = vec![
        Value::Null,
        Value::Bool(true),
        Value::UInt(0),
        Value::UInt(24),
        Value::UInt(1000),
        Value::UInt(u64::MAX),
        Value::Int(-1),
        Value::Int(-1000),
        Value::str("hello"),
        Value::Bytes(vec![0xde, 0xad]),
        Value::Array(vec![Value::UInt(1), Value::str("a")]),
        Value::map(&[("k", Value::UInt(7))]),
    ];
    for value in values {
        let mut expected = Vec::new();
        ciborium::ser::into_writer(&to_ciborium(&value), &mut expected).unwrap();
        assert_eq!(encode(&value), expected, "byte image for {value:?}");
    }
}

#[test]
fn ciborium_output_decodes() {
    let values = vec![
        Value::UInt(42),
        Value::Float(2.5),
        Value::str("streaming"),
        Value::map(&[("nested", Value::Array(vec![Value::Bool(false)]))]),
    ];
    for value in values {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&to_ciborium(&value), &mut bytes).unwrap();
        assert_eq!(decode(&bytes), value, "decoding ciborium {value:?}");
    }
}
