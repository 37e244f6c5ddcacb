//! SAX copies across the two codecs.

mod common;

use common::{read_value, Value};
use streampack::cbor::{CborReader, CborWriter};
use streampack::copy_document;
use streampack::json::{JsonReader, JsonWriter};
use streampack::Error;
use streampack_buffers::{SliceSource, VecSink};

fn json_to_cbor(text: &str) -> Vec<u8> {
    let mut reader = JsonReader::new(SliceSource::new(text.as_bytes()));
    let mut writer = CborWriter::new(VecSink::new());
    copy_document(reader.read_document().unwrap(), writer.document()).unwrap();
    reader.end().unwrap();
    writer.into_inner().into_inner()
}

fn cbor_to_json(bytes: &[u8]) -> String {
    let mut reader = CborReader::new(SliceSource::new(bytes));
    let mut writer = JsonWriter::new(VecSink::new());
    copy_document(reader.read_document().unwrap(), writer.document()).unwrap();
    reader.end().unwrap();
    String::from_utf8(writer.into_inner().into_inner()).unwrap()
}

#[test]
fn json_through_cbor_and_back() {
    // Cross-codec identity for JSON-expressible documents. 2.5 is used for
    // the float so the text form round-trips without renormalization.
    let inputs = [
        "null",
        "true",
        "0",
        "-42",
        "2.5",
        r#""hello""#,
        "[]",
        "[1,[2,[3]]]",
        r#"{"a":1,"b":[true,null],"c":{"d":"x"}}"#,
    ];
    for input in inputs {
        let cbor = json_to_cbor(input);
        assert_eq!(cbor_to_json(&cbor), input, "identity for {input}");
    }
}

#[test]
fn known_wire_images_to_json() {
    assert_eq!(cbor_to_json(&[0x82, 0x01, 0x02]), "[1,2]");
    assert_eq!(
        cbor_to_json(&[0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x02]),
        r#"{"a":1,"b":2}"#
    );
}

#[test]
fn cbor_binary_to_json_is_base64() {
    // h'616263'
    assert_eq!(cbor_to_json(&[0x43, b'a', b'b', b'c']), "\"YWJj\"");
    // Chunked indefinite blob concatenates before encoding.
    assert_eq!(
        cbor_to_json(&[0x5f, 0x43, b'a', b'b', b'c', 0x42, b'd', b'e', 0xff]),
        "\"YWJjZGU=\""
    );
}

#[test]
fn cbor_undefined_to_json_fails() {
    let mut reader = CborReader::new(SliceSource::new(&[0xf7]));
    let mut writer = JsonWriter::new(VecSink::new());
    assert!(matches!(
        copy_document(reader.read_document().unwrap(), writer.document()),
        Err(Error::IllFormed)
    ));
}

#[test]
fn cbor_non_finite_float_to_json_fails() {
    // f64 NaN.
    let mut bytes = vec![0xfb];
    bytes.extend_from_slice(&f64::NAN.to_be_bytes());
    let mut reader = CborReader::new(SliceSource::new(&bytes));
    let mut writer = JsonWriter::new(VecSink::new());
    assert!(matches!(
        copy_document(reader.read_document().unwrap(), writer.document()),
        Err(Error::IllFormed)
    ));
}

#[test]
fn cbor_integer_keys_cannot_reach_json() {
    // {1: 2} is fine in CBOR, not in JSON.
    let mut reader = CborReader::new(SliceSource::new(&[0xa1, 0x01, 0x02]));
    let mut writer = JsonWriter::new(VecSink::new());
    assert!(matches!(
        copy_document(reader.read_document().unwrap(), writer.document()),
        Err(Error::IllFormed)
    ));
}

#[test]
fn long_string_copies_across_codecs() {
    // Longer than the 8 KiB copy buffer, to exercise chunked streaming on
    // both sides of the copy.
    let long = "streampack ".repeat(1200);
    let input = format!("[\"{long}\"]");
    let cbor = json_to_cbor(&input);

    let mut reader = CborReader::new(SliceSource::new(&cbor));
    let value = read_value(reader.read_document().unwrap()).unwrap();
    assert_eq!(value, Value::Array(vec![Value::Str(long)]));
}

#[test]
fn copied_document_equals_source_document() {
    // A document pushed through CBOR and re-rendered as JSON reads back
    // as the same document.
    let inputs = [
        r#"{"k":[1,-2,2.5,"s",true,null]}"#,
        "[[],[{}]]",
    ];
    for input in inputs {
        let mut direct = JsonReader::new(SliceSource::new(input.as_bytes()));
        let expected = read_value(direct.read_document().unwrap()).unwrap();

        let cbor = json_to_cbor(input);
        let json = cbor_to_json(&cbor);
        let mut round = JsonReader::new(SliceSource::new(json.as_bytes()));
        let actual = read_value(round.read_document().unwrap()).unwrap();
        assert_eq!(actual, expected, "through {input}");
    }
}
