//! Encoding and decoding support for a compact, self-describing binary
//! document format covering a JSON-superset data model.
//!
//! ## Optional features
//!
//! ### `serde`
//!
//! When this optional dependency is enabled, [`SliceBuf`] implements the
//! `serde::Serialize` and `serde::Deserialize` traits.
//!
//! ## Binary format
//!
//! Every value starts with a one-byte type tag; all multi-byte integers are
//! little-endian:
//!
//! | Tag | Meaning |
//! |---|---|
//! | `0x00` | reserved |
//! | `0x01` | null |
//! | `0x02` / `0x03` | false / true |
//! | `0x04` | double, 8 bytes IEEE-754 |
//! | `0x05` / `0x06` | array with a small / large index table |
//! | `0x07` / `0x08` | object with a small / large index table |
//! | `0x09` | external: an in-process address, not portable |
//! | `0x0a` | id: unsigned index followed by a key string |
//! | `0x0b` | sentinel for a database-assigned id |
//! | `0x0c` | long string: 8-byte length, then UTF-8 bytes |
//! | `0x0d` | timestamp in signed milliseconds, complement+1 encoded |
//! | `0x17 + w` | positive integer of `w` bytes, `w` in 1..=8 |
//! | `0x1f + w` | negative integer, the magnitude is stored |
//! | `0x27 + w` | unsigned integer |
//! | `0x30..=0x3f` | small integers 0..=7 and -8..=-1 |
//! | `0x40..=0xbf` | short string, the length rides in the tag |
//! | `0xbf + w` | binary blob with a `w`-byte length field |
//!
//! Arrays and objects end with an index table holding the offset of every
//! member relative to the container's first byte, followed by the member
//! count. A container tag with an odd low bit uses 2-byte table entries and
//! a 1-byte count, an even one 8-byte entries and an 8-byte count. The
//! byte after the tag holds the total length when non-zero; a zero there
//! marks an 8-byte length field behind it. Object tables may be sorted by
//! key; readers locate members through the table, never through payload
//! order.
//!
//! ## Building
//!
//! ```rust
//! use vpack::{Builder, DumpPolicy, Value, ValueType};
//!
//! let mut builder = Builder::new();
//! builder.open_object().unwrap();
//! builder.add_key_value("name", Value::string("hazel")).unwrap();
//! builder.add_key_value("size", Value::uint(4)).unwrap();
//! builder.close().unwrap();
//!
//! let doc = builder.finish().unwrap();
//! assert_eq!(doc.value_type(), ValueType::Object);
//! assert_eq!(
//!     doc.to_json_string(DumpPolicy::Fail).unwrap(),
//!     r#"{"name":"hazel","size":4}"#
//! );
//! ```
//!
//! ## Reading
//!
//! ```rust
//! use vpack::{Builder, Value};
//!
//! let mut builder = Builder::new();
//! builder.open_array().unwrap();
//! builder.add(Value::small_int(3)).unwrap();
//! builder.add(Value::string("x")).unwrap();
//! builder.close().unwrap();
//!
//! let doc = builder.finish().unwrap();
//! assert_eq!(doc.length().unwrap(), 2);
//! assert_eq!(doc.at(0).unwrap().get_small_int().unwrap(), 3);
//! assert_eq!(doc.at(1).unwrap().get_str().unwrap(), "x");
//! ```
//!
//! ## JSON
//!
//! ```rust
//! use vpack::{DumpPolicy, SliceBuf};
//!
//! let doc = SliceBuf::parse(r#"{"b":1,"a":[true,null]}"#).unwrap();
//! assert_eq!(
//!     doc.to_json_string(DumpPolicy::Fail).unwrap(),
//!     r#"{"a":[true,null],"b":1}"#
//! );
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod binary;
mod buffer;
mod builder;
mod dump;
mod json;
mod slice;
mod util;
mod value;
mod value_type;

#[cfg(feature = "serde")]
mod serde;

pub use self::{
    buffer::Buffer,
    builder::{BuildError, BuildResult, Builder, BuilderOptions},
    dump::{DumpError, DumpPolicy, DumpResult, Dumper},
    slice::{ArrayIter, ObjectIter, Slice, SliceBuf, SliceError, SliceResult},
    value::{Value, ValueData},
    value_type::ValueType,
};
