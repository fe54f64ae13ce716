//! JSON parsing and roundtrip tests.

use vpack::{BuildError, DumpPolicy, SliceBuf, ValueType};

fn assert_roundtrip(input: &str) {
    let doc = SliceBuf::parse(input).unwrap();
    let dumped = doc.to_json_string(DumpPolicy::Fail).unwrap();

    let original: serde_json::Value = serde_json::from_str(input).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&dumped).unwrap();
    assert_eq!(reparsed, original);
}

#[test]
fn test_scalar_bytes() {
    assert_eq!(SliceBuf::parse("null").unwrap().as_bytes(), [0x01]);
    assert_eq!(SliceBuf::parse("true").unwrap().as_bytes(), [0x03]);
    assert_eq!(SliceBuf::parse("false").unwrap().as_bytes(), [0x02]);

    // integers below 8 collapse into one byte
    assert_eq!(SliceBuf::parse("5").unwrap().as_bytes(), [0x35]);
    assert_eq!(SliceBuf::parse("-3").unwrap().as_bytes(), [0x3d]);
    assert_eq!(SliceBuf::parse("123").unwrap().as_bytes(), [0x18, 0x7b]);
    assert_eq!(SliceBuf::parse("-123").unwrap().as_bytes(), [0x20, 0x7b]);

    assert_eq!(SliceBuf::parse(r#""abc""#).unwrap().as_bytes(), [0x43, 0x61, 0x62, 0x63]);
}

#[test]
fn test_number_mapping() {
    assert_eq!(SliceBuf::parse("7").unwrap().value_type(), ValueType::SmallInt);
    assert_eq!(SliceBuf::parse("8").unwrap().value_type(), ValueType::Int);
    assert_eq!(SliceBuf::parse("-8").unwrap().value_type(), ValueType::SmallInt);
    assert_eq!(SliceBuf::parse("-9").unwrap().value_type(), ValueType::Int);
    assert_eq!(SliceBuf::parse("1.5").unwrap().value_type(), ValueType::Double);

    let doc = SliceBuf::parse("9223372036854775807").unwrap();
    assert_eq!(doc.get_i64().unwrap(), i64::MAX);

    // one above i64::MAX falls back to a lossy double
    let doc = SliceBuf::parse("9223372036854775808").unwrap();
    assert_eq!(doc.value_type(), ValueType::Double);
    assert_eq!(doc.get_double().unwrap(), 9223372036854775808.0);
}

#[test]
fn test_parse_containers() {
    let doc = SliceBuf::parse(r#"{"b":1,"a":[1.5,"x",null,true]}"#).unwrap();
    assert_eq!(doc.value_type(), ValueType::Object);
    assert_eq!(doc.length().unwrap(), 2);

    // keys come back sorted
    assert_eq!(doc.key_at(0).unwrap().get_str().unwrap(), "a");
    let array = doc.value_at(0).unwrap();
    assert_eq!(array.length().unwrap(), 4);
    assert_eq!(array.at(0).unwrap().get_double().unwrap(), 1.5);
    assert_eq!(array.at(1).unwrap().get_str().unwrap(), "x");
    assert!(array.at(2).unwrap().is_null());
    assert!(array.at(3).unwrap().get_bool().unwrap());

    assert_eq!(doc.key_at(1).unwrap().get_str().unwrap(), "b");
    assert_eq!(doc.value_at(1).unwrap().get_small_int().unwrap(), 1);
}

#[test]
fn test_parse_empty_containers() {
    assert_eq!(SliceBuf::parse("[]").unwrap().as_bytes(), [0x05, 0x02]);
    assert_eq!(SliceBuf::parse("{}").unwrap().as_bytes(), [0x07, 0x02]);
}

#[test]
fn test_parse_errors() {
    assert!(matches!(SliceBuf::parse("{invalid"), Err(BuildError::JsonError(_))));
    assert!(matches!(SliceBuf::parse(""), Err(BuildError::JsonError(_))));
}

#[test]
fn test_roundtrip() {
    assert_roundtrip("null");
    assert_roundtrip("true");
    assert_roundtrip("0");
    assert_roundtrip("-1");
    assert_roundtrip("123456789");
    assert_roundtrip("1.5");
    assert_roundtrip("-2.25");
    assert_roundtrip(r#""hello world""#);
    assert_roundtrip(r#""esc \" \\ \n \t  text""#);
    assert_roundtrip(r#""unicode: héllo 日本語 🦀""#);
    assert_roundtrip("[1,2,3]");
    assert_roundtrip("[]");
    assert_roundtrip("{}");
    assert_roundtrip(r#"{"a":1,"b":"two","c":[true,null],"d":{"e":{}}}"#);
    assert_roundtrip(r#"[{"deep":[{"deeper":[null]}]},-7,"end"]"#);
}

#[test]
fn test_dump_orders_keys() {
    let doc = SliceBuf::parse(r#"{"b":1,"a":2}"#).unwrap();
    assert_eq!(doc.to_json_string(DumpPolicy::Fail).unwrap(), r#"{"a":2,"b":1}"#);
}

#[test]
fn test_parse_large_document() {
    let members: Vec<String> = (0..500).map(|i| format!(r#""m{}":{}"#, i, i)).collect();
    let text = format!("{{{}}}", members.join(","));
    let doc = SliceBuf::parse(&text).unwrap();
    assert_eq!(doc.length().unwrap(), 500);

    let reparsed: serde_json::Value =
        serde_json::from_str(&doc.to_json_string(DumpPolicy::Fail).unwrap()).unwrap();
    let original: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reparsed, original);
}
