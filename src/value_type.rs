//! Logical value types.

use std::fmt::{Display, Formatter};

/// The logical type of an encoded value, recoverable from its first byte.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ValueType {
    None,
    Null,
    Bool,
    Double,
    Array,
    Object,
    External,
    Id,
    IdSentinel,
    String,
    UtcDate,
    Int,
    UInt,
    SmallInt,
    Binary,
    Bcd,
}

impl ValueType {
    /// Logical type encoded by a tag byte. Unassigned and reserved tags map
    /// to [`ValueType::None`].
    #[inline]
    pub fn from_tag(tag: u8) -> ValueType {
        match tag {
            0x01 => ValueType::Null,
            0x02 | 0x03 => ValueType::Bool,
            0x04 => ValueType::Double,
            0x05 | 0x06 => ValueType::Array,
            0x07 | 0x08 => ValueType::Object,
            0x09 => ValueType::External,
            0x0a => ValueType::Id,
            0x0b => ValueType::IdSentinel,
            0x0c => ValueType::String,
            0x0d => ValueType::UtcDate,
            0x18..=0x27 => ValueType::Int,
            0x28..=0x2f => ValueType::UInt,
            0x30..=0x3f => ValueType::SmallInt,
            0x40..=0xbf => ValueType::String,
            0xc0..=0xc7 => ValueType::Binary,
            _ => ValueType::None,
        }
    }
}

impl Display for ValueType {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::None => "None",
            ValueType::Null => "Null",
            ValueType::Bool => "Bool",
            ValueType::Double => "Double",
            ValueType::Array => "Array",
            ValueType::Object => "Object",
            ValueType::External => "External",
            ValueType::Id => "Id",
            ValueType::IdSentinel => "IdSentinel",
            ValueType::String => "String",
            ValueType::UtcDate => "UTCDate",
            ValueType::Int => "Int",
            ValueType::UInt => "UInt",
            ValueType::SmallInt => "SmallInt",
            ValueType::Binary => "Binary",
            ValueType::Bcd => "BCD",
        };
        f.write_str(name)
    }
}
