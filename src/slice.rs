//! Zero-copy access to encoded values.

use std::borrow::Borrow;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::mem::size_of;
use std::ops::Deref;

use crate::binary::{
    TAG_ARRAY, TAG_ARRAY_LARGE, TAG_BINARY_BASE, TAG_DOUBLE, TAG_EXTERNAL, TAG_FALSE, TAG_ID,
    TAG_ID_SENTINEL, TAG_INT_NEG_BASE, TAG_INT_POS_BASE, TAG_NULL, TAG_OBJECT, TAG_OBJECT_LARGE,
    TAG_SMALL_INT_BASE, TAG_STRING_LONG, TAG_STRING_SHORT_BASE, TAG_TRUE, TAG_UINT_BASE,
    TAG_UTC_DATE,
};
use crate::buffer::Buffer;
use crate::value_type::ValueType;

/// Possible errors that can arise during reading.
#[derive(Debug)]
pub enum SliceError {
    IndexOutOfBounds { len: usize, index: usize },
    UnexpectedType { expected: ValueType, actual: ValueType },
    InvalidType(u8),
    InvalidUtf8,
}

impl Display for SliceError {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SliceError::IndexOutOfBounds { len, index } => {
                write!(f, "index out of bounds: the len is {} but the index is {}", len, index)
            }
            SliceError::UnexpectedType { expected, actual } => {
                write!(f, "value type mismatch, expect {}, but actual {}", expected, actual)
            }
            SliceError::InvalidType(tag) => write!(f, "invalid type tag '0x{:02x}'", tag),
            SliceError::InvalidUtf8 => write!(f, "string payload is not valid UTF-8"),
        }
    }
}

impl Error for SliceError {}

pub type SliceResult<T> = std::result::Result<T, SliceError>;

/// A borrowed view over one encoded value. The view may extend past the
/// value's last byte; [`Slice::byte_size`] bounds the value itself.
#[repr(transparent)]
pub struct Slice {
    bytes: [u8],
}

/// An owned encoded value, backed by the buffer the builder filled.
#[derive(Clone, Debug)]
pub struct SliceBuf {
    bytes: Buffer,
}

impl SliceBuf {
    /// Creates a new `SliceBuf` from a filled buffer.
    ///
    /// # Safety
    ///
    /// Callers must guarantee the buffer holds a well-formed encoded value.
    #[inline]
    pub unsafe fn new_unchecked(bytes: Buffer) -> Self {
        debug_assert!(!bytes.is_empty());
        SliceBuf { bytes }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }
}

impl Deref for SliceBuf {
    type Target = Slice;

    #[inline]
    fn deref(&self) -> &Slice {
        unsafe { Slice::new_unchecked(self.bytes.as_bytes()) }
    }
}

impl Borrow<Slice> for SliceBuf {
    #[inline]
    fn borrow(&self) -> &Slice {
        self.deref()
    }
}

impl AsRef<Slice> for SliceBuf {
    #[inline]
    fn as_ref(&self) -> &Slice {
        self
    }
}

impl PartialEq for SliceBuf {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SliceBuf {}

impl ToOwned for Slice {
    type Owned = SliceBuf;

    #[inline]
    fn to_owned(&self) -> SliceBuf {
        self.to_slice_buf()
    }
}

impl PartialEq for Slice {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        &self.bytes == &other.bytes
    }
}

impl Eq for Slice {}

impl fmt::Debug for Slice {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("type", &self.value_type())
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Slice {
    /// Creates a new `Slice` from a reference to encoded bytes.
    ///
    /// # Safety
    ///
    /// Callers must guarantee `bytes` starts with a well-formed encoded
    /// value.
    #[inline]
    pub unsafe fn new_unchecked<B: AsRef<[u8]> + ?Sized>(bytes: &B) -> &Slice {
        debug_assert!(!bytes.as_ref().is_empty());
        &*(bytes.as_ref() as *const [u8] as *const Slice)
    }

    /// Borrows `bytes` as a value view. Only the presence of a head byte is
    /// checked here; individual accessors validate what they read.
    #[inline]
    pub fn new(bytes: &[u8]) -> SliceResult<&Slice> {
        if bytes.is_empty() {
            return Err(SliceError::IndexOutOfBounds { len: 0, index: 0 });
        }
        Ok(unsafe { Slice::new_unchecked(bytes) })
    }

    #[inline]
    pub fn to_slice_buf(&self) -> SliceBuf {
        let mut bytes = Buffer::new();
        bytes.reserve(self.bytes.len());
        bytes.push_bytes(&self.bytes);
        // SAFETY: self already is a well-formed value.
        unsafe { SliceBuf::new_unchecked(bytes) }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The type tag, the first byte of every encoded value.
    #[inline]
    pub fn tag(&self) -> u8 {
        self.bytes[0]
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        ValueType::from_tag(self.tag())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.tag() == TAG_NULL
    }

    /// Total number of encoded bytes of this value, header and index table
    /// included.
    pub fn byte_size(&self) -> SliceResult<usize> {
        let tag = self.tag();
        let size = match tag {
            TAG_NULL | TAG_FALSE | TAG_TRUE | TAG_ID_SENTINEL => 1,
            TAG_DOUBLE | TAG_UTC_DATE => 1 + 8,
            TAG_ARRAY | TAG_ARRAY_LARGE | TAG_OBJECT | TAG_OBJECT_LARGE => {
                self.container_byte_size()?
            }
            TAG_EXTERNAL => 1 + size_of::<usize>(),
            TAG_ID => {
                let index = self.slice_at(1)?;
                let index_size = index.byte_size()?;
                let name = self.slice_at(1 + index_size)?;
                1 + index_size + name.byte_size()?
            }
            TAG_STRING_LONG => 1 + 8 + self.read_u64(1)? as usize,
            0x18..=0x1f => 1 + (tag - TAG_INT_POS_BASE) as usize,
            0x20..=0x27 => 1 + (tag - TAG_INT_NEG_BASE) as usize,
            0x28..=0x2f => 1 + (tag - TAG_UINT_BASE) as usize,
            0x30..=0x3f => 1,
            0x40..=0xbf => 1 + (tag - TAG_STRING_SHORT_BASE) as usize,
            0xc0..=0xc7 => {
                let width = (tag - TAG_BINARY_BASE) as usize;
                1 + width + self.read_uint(1, width)? as usize
            }
            _ => return Err(SliceError::InvalidType(tag)),
        };
        Ok(size)
    }

    /// Number of members in an array or object.
    pub fn length(&self) -> SliceResult<usize> {
        let tag = self.tag();
        if !matches!(tag, TAG_ARRAY | TAG_ARRAY_LARGE | TAG_OBJECT | TAG_OBJECT_LARGE) {
            return Err(SliceError::UnexpectedType {
                expected: ValueType::Array,
                actual: self.value_type(),
            });
        }
        let byte_size = self.container_byte_size()?;
        if byte_size == 2 {
            // an empty container is just the tag and its total length
            return Ok(0);
        }
        if tag & 1 == 1 {
            let count_pos = byte_size.checked_sub(1).ok_or(SliceError::IndexOutOfBounds {
                len: self.bytes.len(),
                index: byte_size,
            })?;
            Ok(self.get(count_pos)? as usize)
        } else {
            let count_pos = byte_size.checked_sub(8).ok_or(SliceError::IndexOutOfBounds {
                len: self.bytes.len(),
                index: byte_size,
            })?;
            Ok(self.read_u64(count_pos)? as usize)
        }
    }

    /// Member of an array at `index`, in insertion order.
    pub fn at(&self, index: usize) -> SliceResult<&Slice> {
        self.expect_type(ValueType::Array)?;
        let n = self.length()?;
        if index >= n {
            return Err(SliceError::IndexOutOfBounds { len: n, index });
        }
        let offset = self.table_offset(index, n)?;
        self.slice_at(offset)
    }

    /// Key of an object member at `index`, in index-table order.
    pub fn key_at(&self, index: usize) -> SliceResult<&Slice> {
        self.expect_type(ValueType::Object)?;
        let n = self.length()?;
        if index >= n {
            return Err(SliceError::IndexOutOfBounds { len: n, index });
        }
        let offset = self.table_offset(index, n)?;
        self.slice_at(offset)
    }

    /// Value of an object member at `index`, in index-table order.
    pub fn value_at(&self, index: usize) -> SliceResult<&Slice> {
        self.expect_type(ValueType::Object)?;
        let n = self.length()?;
        if index >= n {
            return Err(SliceError::IndexOutOfBounds { len: n, index });
        }
        let offset = self.table_offset(index, n)?;
        let key = self.slice_at(offset)?;
        // the value is written immediately after its key
        self.slice_at(offset + key.byte_size()?)
    }

    #[inline]
    pub fn get_bool(&self) -> SliceResult<bool> {
        match self.tag() {
            TAG_FALSE => Ok(false),
            TAG_TRUE => Ok(true),
            _ => Err(SliceError::UnexpectedType {
                expected: ValueType::Bool,
                actual: self.value_type(),
            }),
        }
    }

    #[inline]
    pub fn get_double(&self) -> SliceResult<f64> {
        self.expect_type(ValueType::Double)?;
        let bytes = self.range(1, 1 + 8)?;
        // SAFETY: the range call above always yields 8 bytes.
        Ok(f64::from_le_bytes(bytes.try_into().unwrap()))
    }

    #[inline]
    pub fn get_small_int(&self) -> SliceResult<i64> {
        let tag = self.tag();
        match tag {
            0x30..=0x37 => Ok((tag - TAG_SMALL_INT_BASE) as i64),
            0x38..=0x3f => Ok(tag as i64 - 0x40),
            _ => Err(SliceError::UnexpectedType {
                expected: ValueType::SmallInt,
                actual: self.value_type(),
            }),
        }
    }

    /// Signed integer stored with an `Int` or `SmallInt` tag.
    #[inline]
    pub fn get_i64(&self) -> SliceResult<i64> {
        let tag = self.tag();
        match tag {
            0x18..=0x1f => Ok(self.read_uint(1, (tag - TAG_INT_POS_BASE) as usize)? as i64),
            0x20..=0x27 => {
                let magnitude = self.read_uint(1, (tag - TAG_INT_NEG_BASE) as usize)?;
                Ok(magnitude.wrapping_neg() as i64)
            }
            0x30..=0x3f => self.get_small_int(),
            _ => Err(SliceError::UnexpectedType {
                expected: ValueType::Int,
                actual: self.value_type(),
            }),
        }
    }

    #[inline]
    pub fn get_u64(&self) -> SliceResult<u64> {
        let tag = self.tag();
        match tag {
            0x28..=0x2f => self.read_uint(1, (tag - TAG_UINT_BASE) as usize),
            _ => Err(SliceError::UnexpectedType {
                expected: ValueType::UInt,
                actual: self.value_type(),
            }),
        }
    }

    /// Milliseconds since the Unix epoch, stored as the complement+1 of the
    /// two's-complement form.
    #[inline]
    pub fn get_utc_date(&self) -> SliceResult<i64> {
        self.expect_type(ValueType::UtcDate)?;
        let stored = self.read_u64(1)?;
        Ok((!(stored.wrapping_sub(1))) as i64)
    }

    /// Raw payload bytes of a string value.
    #[inline]
    pub fn string_bytes(&self) -> SliceResult<&[u8]> {
        let tag = self.tag();
        match tag {
            0x40..=0xbf => {
                let len = (tag - TAG_STRING_SHORT_BASE) as usize;
                self.range(1, 1 + len)
            }
            TAG_STRING_LONG => {
                let len = self.read_u64(1)? as usize;
                self.range(9, 9 + len)
            }
            _ => Err(SliceError::UnexpectedType {
                expected: ValueType::String,
                actual: self.value_type(),
            }),
        }
    }

    #[inline]
    pub fn get_str(&self) -> SliceResult<&str> {
        std::str::from_utf8(self.string_bytes()?).map_err(|_| SliceError::InvalidUtf8)
    }

    #[inline]
    pub fn binary_bytes(&self) -> SliceResult<&[u8]> {
        let tag = self.tag();
        match tag {
            0xc0..=0xc7 => {
                let width = (tag - TAG_BINARY_BASE) as usize;
                let len = self.read_uint(1, width)? as usize;
                self.range(1 + width, 1 + width + len)
            }
            _ => Err(SliceError::UnexpectedType {
                expected: ValueType::Binary,
                actual: self.value_type(),
            }),
        }
    }

    /// The raw address stored in an `External` value.
    #[inline]
    pub fn get_external(&self) -> SliceResult<*const u8> {
        self.expect_type(ValueType::External)?;
        let bytes = self.range(1, 1 + size_of::<usize>())?;
        // SAFETY: the range call above always yields a pointer-sized chunk.
        Ok(usize::from_ne_bytes(bytes.try_into().unwrap()) as *const u8)
    }

    /// Iterates over the members of an array.
    #[inline]
    pub fn array_iter(&self) -> SliceResult<ArrayIter<'_>> {
        self.expect_type(ValueType::Array)?;
        Ok(ArrayIter { array: self, len: self.length()?, index: 0 })
    }

    /// Iterates over the `(key, value)` members of an object, in index-table
    /// order.
    #[inline]
    pub fn object_iter(&self) -> SliceResult<ObjectIter<'_>> {
        self.expect_type(ValueType::Object)?;
        Ok(ObjectIter { object: self, len: self.length()?, index: 0 })
    }
}

impl Slice {
    #[inline]
    fn get(&self, index: usize) -> SliceResult<u8> {
        self.bytes.get(index).copied().ok_or(SliceError::IndexOutOfBounds {
            len: self.bytes.len(),
            index,
        })
    }

    #[inline]
    fn range(&self, from: usize, to: usize) -> SliceResult<&[u8]> {
        self.bytes.get(from..to).ok_or(SliceError::IndexOutOfBounds {
            len: self.bytes.len(),
            index: to,
        })
    }

    #[inline]
    fn read_u16(&self, index: usize) -> SliceResult<u16> {
        let bytes = self.range(index, index + size_of::<u16>())?;
        // SAFETY: the range call above always yields 2 bytes.
        Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
    }

    #[inline]
    fn read_u64(&self, index: usize) -> SliceResult<u64> {
        let bytes = self.range(index, index + size_of::<u64>())?;
        // SAFETY: the range call above always yields 8 bytes.
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Little-endian unsigned integer of 1..=8 payload bytes.
    #[inline]
    fn read_uint(&self, index: usize, width: usize) -> SliceResult<u64> {
        let bytes = self.range(index, index + width)?;
        let mut value = 0u64;
        for (i, &byte) in bytes.iter().enumerate() {
            value |= (byte as u64) << (8 * i);
        }
        Ok(value)
    }

    #[inline]
    fn expect_type(&self, expected: ValueType) -> SliceResult<()> {
        let actual = self.value_type();
        if actual != expected {
            return Err(SliceError::UnexpectedType { expected, actual });
        }
        Ok(())
    }

    /// Total length of a container: a non-zero second byte is the length
    /// itself, zero marks an 8-byte length behind it.
    #[inline]
    fn container_byte_size(&self) -> SliceResult<usize> {
        let short = self.get(1)?;
        if short != 0 {
            Ok(short as usize)
        } else {
            Ok(self.read_u64(2)? as usize)
        }
    }

    /// Relative offset of member `index` from the container's index table.
    /// The tag's low bit selects the entry width.
    fn table_offset(&self, index: usize, n: usize) -> SliceResult<usize> {
        let byte_size = self.container_byte_size()?;
        if self.tag() & 1 == 1 {
            let base = byte_size.checked_sub(1 + 2 * n).ok_or(SliceError::IndexOutOfBounds {
                len: byte_size,
                index: 1 + 2 * n,
            })?;
            Ok(self.read_u16(base + 2 * index)? as usize)
        } else {
            let base = byte_size.checked_sub(8 + 8 * n).ok_or(SliceError::IndexOutOfBounds {
                len: byte_size,
                index: 8 + 8 * n,
            })?;
            Ok(self.read_u64(base + 8 * index)? as usize)
        }
    }

    /// Sub-value starting at `offset`, cut to its exact byte size.
    fn slice_at(&self, offset: usize) -> SliceResult<&Slice> {
        let rest = self.range(offset, self.bytes.len())?;
        if rest.is_empty() {
            return Err(SliceError::IndexOutOfBounds {
                len: self.bytes.len(),
                index: offset,
            });
        }
        // SAFETY: rest is non-empty; byte_size bounds every further read.
        let value = unsafe { Slice::new_unchecked(rest) };
        let size = value.byte_size()?;
        let exact = self.range(offset, offset + size)?;
        Ok(unsafe { Slice::new_unchecked(exact) })
    }
}

/// Iterator over the members of an array.
pub struct ArrayIter<'a> {
    array: &'a Slice,
    len: usize,
    index: usize,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = SliceResult<&'a Slice>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let member = self.array.at(self.index);
        self.index += 1;
        Some(member)
    }
}

/// Iterator over the `(key, value)` members of an object.
pub struct ObjectIter<'a> {
    object: &'a Slice,
    len: usize,
    index: usize,
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = SliceResult<(&'a Slice, &'a Slice)>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let entry = self
            .object
            .key_at(self.index)
            .and_then(|key| self.object.value_at(self.index).map(|value| (key, value)));
        self.index += 1;
        Some(entry)
    }
}
