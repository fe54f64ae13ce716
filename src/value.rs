//! Polymorphic builder input.

use crate::value_type::ValueType;

/// The runtime representation handed to the builder alongside a declared
/// logical type.
#[derive(Copy, Clone, Debug)]
pub enum ValueData<'a> {
    None,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Str(&'a str),
    Bytes(&'a [u8]),
    Pointer(*const u8),
}

/// A value to encode: a declared logical type plus the representation
/// carrying it. The builder dispatches over both and rejects combinations
/// that do not fit.
#[derive(Copy, Clone, Debug)]
pub struct Value<'a> {
    ty: ValueType,
    data: ValueData<'a>,
}

impl<'a> Value<'a> {
    /// Creates a value with an explicitly declared logical type.
    #[inline]
    pub const fn new(ty: ValueType, data: ValueData<'a>) -> Self {
        Value { ty, data }
    }

    #[inline]
    pub const fn null() -> Self {
        Value::new(ValueType::Null, ValueData::None)
    }

    #[inline]
    pub const fn bool(value: bool) -> Self {
        Value::new(ValueType::Bool, ValueData::Bool(value))
    }

    #[inline]
    pub const fn double(value: f64) -> Self {
        Value::new(ValueType::Double, ValueData::Double(value))
    }

    /// An integer in the one-byte range -8..=7.
    #[inline]
    pub const fn small_int(value: i64) -> Self {
        Value::new(ValueType::SmallInt, ValueData::Int(value))
    }

    #[inline]
    pub const fn int(value: i64) -> Self {
        Value::new(ValueType::Int, ValueData::Int(value))
    }

    #[inline]
    pub const fn uint(value: u64) -> Self {
        Value::new(ValueType::UInt, ValueData::UInt(value))
    }

    /// A timestamp in signed milliseconds since the Unix epoch.
    #[inline]
    pub const fn utc_date(millis: i64) -> Self {
        Value::new(ValueType::UtcDate, ValueData::Int(millis))
    }

    #[inline]
    pub const fn string(value: &'a str) -> Self {
        Value::new(ValueType::String, ValueData::Str(value))
    }

    #[inline]
    pub const fn binary(value: &'a [u8]) -> Self {
        Value::new(ValueType::Binary, ValueData::Bytes(value))
    }

    /// An in-process address. The encoding is not portable.
    #[inline]
    pub const fn external(value: *const u8) -> Self {
        Value::new(ValueType::External, ValueData::Pointer(value))
    }

    /// Opens an array when handed to the builder.
    #[inline]
    pub const fn array() -> Self {
        Value::new(ValueType::Array, ValueData::None)
    }

    /// Opens an object when handed to the builder.
    #[inline]
    pub const fn object() -> Self {
        Value::new(ValueType::Object, ValueData::None)
    }

    /// Sentinel for a database-assigned document id.
    #[inline]
    pub const fn id_sentinel() -> Self {
        Value::new(ValueType::IdSentinel, ValueData::None)
    }

    #[inline]
    pub const fn value_type(&self) -> ValueType {
        self.ty
    }

    #[inline]
    pub fn data(&self) -> ValueData<'a> {
        self.data
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self.ty, ValueType::String)
    }
}
