//! Builder lifecycle tests.

use vpack::{BuildError, Builder, Value};

fn sample_object(builder: &mut Builder) {
    builder.open_object().unwrap();
    builder.add_key_value("id", Value::uint(9)).unwrap();
    builder.add_key_value("tags", Value::array()).unwrap();
    builder.add(Value::string("x")).unwrap();
    builder.add(Value::string("y")).unwrap();
    builder.close().unwrap();
    builder.close().unwrap();
}

#[test]
fn test_byte_size_matches_buffer() {
    let mut builder = Builder::new();
    sample_object(&mut builder);
    let doc = builder.finish().unwrap();
    assert_eq!(doc.byte_size().unwrap(), doc.as_bytes().len());
}

#[test]
fn test_close_without_open() {
    let mut builder = Builder::new();
    assert!(matches!(builder.close(), Err(BuildError::EmptyStack)));

    let mut builder = Builder::new();
    builder.open_array().unwrap();
    builder.close().unwrap();
    assert!(matches!(builder.close(), Err(BuildError::EmptyStack)));
}

#[test]
fn test_size_and_slice_require_sealed_value() {
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    assert!(matches!(builder.size(), Err(BuildError::ContainerMismatch(_))));
    assert!(matches!(builder.slice(), Err(BuildError::ContainerMismatch(_))));
    builder.close().unwrap();
    assert_eq!(builder.size().unwrap(), 2);
    assert_eq!(builder.slice().unwrap().length().unwrap(), 0);
}

#[test]
fn test_finish_requires_content() {
    let builder = Builder::new();
    assert!(matches!(builder.finish(), Err(BuildError::ContainerMismatch(_))));

    let mut builder = Builder::new();
    builder.open_object().unwrap();
    assert!(matches!(builder.finish(), Err(BuildError::ContainerMismatch(_))));
}

#[test]
fn test_clear_is_idempotent() {
    let mut fresh = Builder::new();
    fresh.open_array().unwrap();
    fresh.add(Value::string("second")).unwrap();
    fresh.close().unwrap();
    let expected = fresh.finish().unwrap();

    let mut reused = Builder::new();
    sample_object(&mut reused);
    reused.clear();
    reused.open_array().unwrap();
    reused.add(Value::string("second")).unwrap();
    reused.close().unwrap();
    let rebuilt = reused.finish().unwrap();

    assert_eq!(rebuilt.as_bytes(), expected.as_bytes());
}

#[test]
fn test_clear_inside_open_container() {
    let mut builder = Builder::new();
    builder.open_object().unwrap();
    builder.add(Value::string("k")).unwrap();
    builder.clear();
    builder.add(Value::null()).unwrap();
    assert_eq!(builder.finish().unwrap().as_bytes(), [0x01]);
}

#[test]
fn test_clone_keeps_builders_independent() {
    let mut left = Builder::new();
    left.open_array().unwrap();
    left.add(Value::small_int(1)).unwrap();

    let mut right = left.clone();
    left.add(Value::small_int(2)).unwrap();
    left.close().unwrap();
    right.add(Value::small_int(5)).unwrap();
    right.close().unwrap();

    let left = left.finish().unwrap();
    let right = right.finish().unwrap();
    assert_eq!(left.at(1).unwrap().get_small_int().unwrap(), 2);
    assert_eq!(right.at(1).unwrap().get_small_int().unwrap(), 5);
    assert_eq!(left.length().unwrap(), right.length().unwrap());
}

#[test]
fn test_multiple_top_level_values() {
    let mut builder = Builder::new();
    builder.add(Value::null()).unwrap();
    builder.add(Value::bool(true)).unwrap();
    assert_eq!(builder.size().unwrap(), 2);
    // the borrowed view covers the first value
    assert!(builder.slice().unwrap().is_null());
}

#[test]
fn test_failed_add_rolls_back() {
    // a rejected member must not leave an index entry behind
    let mut builder = Builder::new();
    builder.open_array().unwrap();
    assert!(builder.add(Value::small_int(99)).is_err());
    builder.add(Value::small_int(1)).unwrap();
    builder.close().unwrap();
    let doc = builder.finish().unwrap();
    assert_eq!(doc.length().unwrap(), 1);
    assert_eq!(doc.at(0).unwrap().get_small_int().unwrap(), 1);
}

#[test]
fn test_failed_value_add_keeps_key_slot_free() {
    // a failing pair rolls back both the key and the index entry
    let mut builder = Builder::new();
    builder.open_object().unwrap();
    assert!(builder.add_key_value("k", Value::small_int(99)).is_err());
    builder.add_key_value("k", Value::bool(true)).unwrap();
    builder.close().unwrap();
    let doc = builder.finish().unwrap();
    assert_eq!(doc.length().unwrap(), 1);
    assert_eq!(doc.key_at(0).unwrap().get_str().unwrap(), "k");
    assert!(doc.value_at(0).unwrap().get_bool().unwrap());
}

#[test]
fn test_failed_key_value_after_attr_written() {
    // a pair call is rejected while a bare key is dangling
    let mut builder = Builder::new();
    builder.open_object().unwrap();
    builder.add(Value::string("bare")).unwrap();
    assert!(matches!(
        builder.add_key_value("k", Value::null()),
        Err(BuildError::ContainerMismatch(_))
    ));
    builder.add(Value::null()).unwrap();
    builder.close().unwrap();
    assert!(builder.size().unwrap() > 0);
}

#[test]
fn test_deep_nesting() {
    let mut builder = Builder::new();
    for _ in 0..50 {
        builder.open_array().unwrap();
    }
    builder.add(Value::small_int(7)).unwrap();
    for _ in 0..50 {
        builder.close().unwrap();
    }
    let doc = builder.finish().unwrap();

    let mut slice = &*doc;
    for _ in 0..50 {
        assert_eq!(slice.length().unwrap(), 1);
        slice = slice.at(0).unwrap();
    }
    assert_eq!(slice.get_small_int().unwrap(), 7);
}
