//! Wire format constants.

pub const TAG_NULL: u8 = 0x01;
pub const TAG_FALSE: u8 = 0x02;
pub const TAG_TRUE: u8 = 0x03;
pub const TAG_DOUBLE: u8 = 0x04;
pub const TAG_ARRAY: u8 = 0x05;
pub const TAG_ARRAY_LARGE: u8 = 0x06;
pub const TAG_OBJECT: u8 = 0x07;
pub const TAG_OBJECT_LARGE: u8 = 0x08;
pub const TAG_EXTERNAL: u8 = 0x09;
pub const TAG_ID: u8 = 0x0a;
pub const TAG_ID_SENTINEL: u8 = 0x0b;
pub const TAG_STRING_LONG: u8 = 0x0c;
pub const TAG_UTC_DATE: u8 = 0x0d;

/// Base tags for length-prefixed integers; the payload width 1..=8 is added
/// to the base.
pub const TAG_INT_POS_BASE: u8 = 0x17;
pub const TAG_INT_NEG_BASE: u8 = 0x1f;
pub const TAG_UINT_BASE: u8 = 0x27;
/// `0x30..=0x37` encode 0..=7, `0x38..=0x3f` encode -8..=-1.
pub const TAG_SMALL_INT_BASE: u8 = 0x30;
/// `0x40..=0xbf`, the string length is carried in the tag.
pub const TAG_STRING_SHORT_BASE: u8 = 0x40;
/// Base tag for binary blobs; the length-field width 1..=8 is added.
pub const TAG_BINARY_BASE: u8 = 0xbf;

/// Longest string whose length fits into the tag byte itself.
pub const MAX_SHORT_STRING_LEN: usize = 127;

/// Bytes written when a container opens: the tag, a 1-byte length slot and
/// an 8-byte length slot. `close` picks one of the two slots.
pub const RESERVED_HEADER_SIZE: usize = 10;

/// Hard cap on the encoded size of a single buffer.
pub const MAX_TOTAL_SIZE: u64 = 1 << 48;
