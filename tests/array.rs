//! Array building tests.

use vpack::{Builder, Value};

fn build_small_ints(count: usize) -> vpack::SliceBuf {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    for i in 0..count {
        builder.add(Value::small_int((i % 8) as i64)).unwrap();
    }
    builder.close().unwrap();
    builder.finish().unwrap()
}

#[test]
fn test_empty_array() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.close().unwrap();
    let doc = builder.finish().unwrap();
    assert_eq!(doc.as_bytes(), [0x05, 0x02]);
    assert_eq!(doc.length().unwrap(), 0);
    assert!(doc.array_iter().unwrap().next().is_none());
}

#[test]
fn test_small_array() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(Value::small_int(1)).unwrap();
    builder.add(Value::small_int(2)).unwrap();
    builder.add(Value::small_int(3)).unwrap();
    builder.close().unwrap();
    let doc = builder.finish().unwrap();

    // tag, length 12, payloads, 2-byte offsets 2..4, count
    assert_eq!(
        doc.as_bytes(),
        [0x05, 0x0c, 0x31, 0x32, 0x33, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x03]
    );
    assert_eq!(doc.length().unwrap(), 3);
    for i in 0..3 {
        assert_eq!(doc.at(i).unwrap().get_small_int().unwrap(), (i + 1) as i64);
    }
    assert!(doc.at(3).is_err());
}

#[test]
fn test_offsets_follow_insertion_order() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(Value::string("c")).unwrap();
    builder.add(Value::string("a")).unwrap();
    builder.add(Value::string("b")).unwrap();
    builder.close().unwrap();
    let doc = builder.finish().unwrap();

    let collected: Vec<&str> = doc
        .array_iter()
        .unwrap()
        .map(|member| member.unwrap().get_str().unwrap())
        .collect();
    assert_eq!(collected, ["c", "a", "b"]);
}

#[test]
fn test_mixed_member_types() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(Value::null()).unwrap();
    builder.add(Value::bool(true)).unwrap();
    builder.add(Value::int(1234)).unwrap();
    builder.add(Value::double(0.5)).unwrap();
    builder.add(Value::string("tail")).unwrap();
    builder.close().unwrap();
    let doc = builder.finish().unwrap();

    assert_eq!(doc.length().unwrap(), 5);
    assert!(doc.at(0).unwrap().is_null());
    assert!(doc.at(1).unwrap().get_bool().unwrap());
    assert_eq!(doc.at(2).unwrap().get_i64().unwrap(), 1234);
    assert_eq!(doc.at(3).unwrap().get_double().unwrap(), 0.5);
    assert_eq!(doc.at(4).unwrap().get_str().unwrap(), "tail");
}

#[test]
fn test_nested_arrays() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.open_array().unwrap();
    builder.add(Value::small_int(1)).unwrap();
    builder.close().unwrap();
    builder.open_array().unwrap();
    builder.close().unwrap();
    builder.close().unwrap();
    let doc = builder.finish().unwrap();

    assert_eq!(doc.length().unwrap(), 2);
    let inner = doc.at(0).unwrap();
    assert_eq!(inner.length().unwrap(), 1);
    assert_eq!(inner.at(0).unwrap().get_small_int().unwrap(), 1);
    assert_eq!(doc.at(1).unwrap().length().unwrap(), 0);
}

#[test]
fn test_one_byte_length_boundary() {
    // 84 one-byte members are the last count that fits the 1-byte length
    let doc = build_small_ints(84);
    assert_eq!(doc.byte_size().unwrap(), 255);
    assert_eq!(doc.as_bytes()[0], 0x05);
    assert_eq!(doc.as_bytes()[1], 0xff);
    assert_eq!(doc.length().unwrap(), 84);

    // one more member forces the 8-byte length, the table stays small
    let doc = build_small_ints(85);
    let bytes = doc.as_bytes();
    assert_eq!(bytes[0], 0x05);
    assert_eq!(bytes[1], 0x00);
    assert_eq!(&bytes[2..10], &266u64.to_le_bytes());
    assert_eq!(doc.byte_size().unwrap(), 266);
    assert_eq!(doc.length().unwrap(), 85);
    for i in 0..85 {
        assert_eq!(doc.at(i).unwrap().get_small_int().unwrap(), (i % 8) as i64);
    }
}

#[test]
fn test_large_table_boundary() {
    // 255 members still fit the 2-byte table entries
    let doc = build_small_ints(255);
    assert_eq!(doc.as_bytes()[0], 0x05);
    assert_eq!(doc.length().unwrap(), 255);

    // 256 members force 8-byte entries and the even tag
    let doc = build_small_ints(256);
    let bytes = doc.as_bytes();
    assert_eq!(bytes[0], 0x06);
    assert_eq!(bytes[1], 0x00);
    let expected_size = 10 + 256 + 8 * 256 + 8;
    assert_eq!(doc.byte_size().unwrap(), expected_size);
    assert_eq!(doc.length().unwrap(), 256);
    for i in [0usize, 7, 8, 100, 255] {
        assert_eq!(doc.at(i).unwrap().get_small_int().unwrap(), (i % 8) as i64);
    }
}

#[test]
fn test_large_offset_forces_large_table() {
    // a single member whose last offset passes 65535 needs 8-byte entries
    let text = "y".repeat(70000);
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.add(Value::string("head")).unwrap();
    builder.add(Value::string(&text)).unwrap();
    builder.add(Value::string("tail")).unwrap();
    builder.close().unwrap();
    let doc = builder.finish().unwrap();

    assert_eq!(doc.as_bytes()[0], 0x06);
    assert_eq!(doc.length().unwrap(), 3);
    assert_eq!(doc.at(0).unwrap().get_str().unwrap(), "head");
    assert_eq!(doc.at(1).unwrap().get_str().unwrap(), text);
    assert_eq!(doc.at(2).unwrap().get_str().unwrap(), "tail");
}
