//! Incremental document builder.

use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::mem::size_of;

use smallvec::CollectionAllocErr;

use crate::binary::{
    MAX_SHORT_STRING_LEN, MAX_TOTAL_SIZE, RESERVED_HEADER_SIZE, TAG_ARRAY, TAG_BINARY_BASE,
    TAG_DOUBLE, TAG_EXTERNAL, TAG_FALSE, TAG_ID, TAG_ID_SENTINEL, TAG_INT_NEG_BASE,
    TAG_INT_POS_BASE, TAG_NULL, TAG_OBJECT, TAG_OBJECT_LARGE, TAG_SMALL_INT_BASE,
    TAG_STRING_LONG, TAG_STRING_SHORT_BASE, TAG_TRUE, TAG_UINT_BASE, TAG_UTC_DATE,
};
use crate::buffer::Buffer;
use crate::slice::{Slice, SliceBuf, SliceError};
use crate::util::uint_length;
use crate::value::{Value, ValueData};
use crate::value_type::ValueType;

/// Possible errors that can arise during building.
#[derive(Debug)]
pub enum BuildError {
    ContainerMismatch(&'static str),
    TypeMismatch(&'static str),
    OutOfRange(&'static str),
    DuplicateAttribute(String),
    SizeOverflow(u64),
    AllocationFailed(CollectionAllocErr),
    EmptyStack,
    JsonError(serde_json::Error),
}

impl Display for BuildError {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::ContainerMismatch(msg) => write!(f, "container mismatch: {}", msg),
            BuildError::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
            BuildError::OutOfRange(msg) => write!(f, "value out of range: {}", msg),
            BuildError::DuplicateAttribute(key) => {
                write!(f, "duplicate attribute name '{}'", key)
            }
            BuildError::SizeOverflow(size) => {
                write!(f, "requested size {} exceeds the maximum buffer size", size)
            }
            BuildError::AllocationFailed(e) => write!(f, "allocation failed: {:?}", e),
            BuildError::EmptyStack => write!(f, "no array or object is currently open"),
            BuildError::JsonError(e) => write!(f, "{}", e),
        }
    }
}

impl Error for BuildError {}

impl From<CollectionAllocErr> for BuildError {
    #[inline]
    fn from(e: CollectionAllocErr) -> Self {
        BuildError::AllocationFailed(e)
    }
}

impl From<SliceError> for BuildError {
    #[inline]
    fn from(_: SliceError) -> Self {
        BuildError::TypeMismatch("malformed container member")
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Configuration honored by [`Builder`].
#[derive(Clone, Copy, Debug)]
pub struct BuilderOptions {
    /// Sort object attribute keys when a container closes.
    pub sort_attribute_names: bool,
    /// Reject objects that contain the same key twice.
    pub check_attribute_uniqueness: bool,
    /// Accepted for forward compatibility; the indexed encodings are always
    /// produced.
    pub build_unindexed_arrays: bool,
    pub build_unindexed_objects: bool,
}

impl Default for BuilderOptions {
    #[inline]
    fn default() -> Self {
        BuilderOptions {
            sort_attribute_names: true,
            check_attribute_uniqueness: false,
            build_unindexed_arrays: false,
            build_unindexed_objects: false,
        }
    }
}

struct SortEntry {
    offset: usize,
    key_start: usize,
    key_len: usize,
}

thread_local! {
    // reused across closes to avoid allocator churn
    static SORT_SCRATCH: RefCell<Vec<SortEntry>> = RefCell::new(Vec::new());
}

/// Incrementally composes a well-formed value into a growing byte buffer.
///
/// A container is opened with [`open_array`](Builder::open_array) or
/// [`open_object`](Builder::open_object), filled with [`add`](Builder::add)
/// calls and sealed with [`close`](Builder::close), which writes the index
/// table behind the member payloads and patches the container header.
/// Inside an object, `add` alternates between attribute keys (which must be
/// strings) and their values. The builder is strictly single-threaded and
/// every operation either completes or leaves the previous state in place.
#[derive(Clone, Debug)]
pub struct Builder {
    buf: Buffer,
    /// Header offsets of the currently open containers.
    stack: Vec<usize>,
    /// Per-depth relative member offsets; entries above the stack depth are
    /// kept allocated for reuse.
    index: Vec<Vec<usize>>,
    /// Inside an object: a key has been written, the next add is its value.
    attr_written: bool,
    pub options: BuilderOptions,
}

impl Default for Builder {
    #[inline]
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    #[inline]
    pub fn new() -> Self {
        Builder::with_options(BuilderOptions::default())
    }

    #[inline]
    pub fn with_options(options: BuilderOptions) -> Self {
        Builder {
            buf: Buffer::new(),
            stack: Vec::new(),
            index: Vec::new(),
            attr_written: false,
            options,
        }
    }

    /// Resets the builder for reuse, keeping the buffer capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
        self.stack.clear();
        self.attr_written = false;
    }

    /// Number of bytes written so far. Only defined once every container is
    /// closed.
    #[inline]
    pub fn size(&self) -> BuildResult<usize> {
        if !self.stack.is_empty() {
            return Err(BuildError::ContainerMismatch("value is not sealed"));
        }
        Ok(self.buf.len())
    }

    /// Borrows the first finished value. Any further mutation invalidates
    /// the returned view.
    #[inline]
    pub fn slice(&self) -> BuildResult<&Slice> {
        if !self.stack.is_empty() {
            return Err(BuildError::ContainerMismatch("value is not sealed"));
        }
        if self.buf.is_empty() {
            return Err(BuildError::ContainerMismatch("no value has been added"));
        }
        // SAFETY: the stack is empty, so the buffer holds finished values.
        Ok(unsafe { Slice::new_unchecked(self.buf.as_bytes()) })
    }

    /// Consumes the builder and hands out the finished document.
    #[inline]
    pub fn finish(self) -> BuildResult<SliceBuf> {
        if !self.stack.is_empty() {
            return Err(BuildError::ContainerMismatch("value is not sealed"));
        }
        if self.buf.is_empty() {
            return Err(BuildError::ContainerMismatch("no value has been added"));
        }
        // SAFETY: the stack is empty, so the buffer holds finished values.
        Ok(unsafe { SliceBuf::new_unchecked(self.buf) })
    }

    /// Adds one value at the top level, as an array member, or inside an
    /// object, where keys (strings) and values alternate.
    #[inline]
    pub fn add(&mut self, value: Value<'_>) -> BuildResult<()> {
        self.add_with(value.is_string(), |builder| builder.set(&value))
    }

    /// Adds an attribute pair to the innermost open object.
    pub fn add_key_value(&mut self, key: &str, value: Value<'_>) -> BuildResult<()> {
        if self.attr_written {
            return Err(BuildError::ContainerMismatch("attribute key has already been written"));
        }
        let tos = match self.stack.last() {
            Some(&tos) if self.buf[tos] == TAG_OBJECT => tos,
            _ => return Err(BuildError::ContainerMismatch("attribute pairs require an open object")),
        };
        let pos = self.buf.len();
        let depth = self.stack.len() - 1;
        self.index[depth].push(pos - tos);
        let result = self.add_string(key).and_then(|_| self.set(&value));
        if result.is_err() {
            self.buf.truncate(pos);
            self.index[depth].pop();
        }
        result
    }

    /// Adds an id value: the unsigned index followed by the key string.
    #[inline]
    pub fn add_id(&mut self, index: u64, name: &str) -> BuildResult<()> {
        self.add_with(false, |builder| {
            builder.reserve(1)?;
            builder.buf.push_u8(TAG_ID);
            builder.append_uint(index, TAG_UINT_BASE)?;
            builder.add_string(name)
        })
    }

    #[inline]
    pub fn open_array(&mut self) -> BuildResult<()> {
        self.add(Value::array())
    }

    #[inline]
    pub fn open_object(&mut self) -> BuildResult<()> {
        self.add(Value::object())
    }

    /// Seals the innermost open container: selects the length and table
    /// regimes, optionally sorts object keys, writes the index table and
    /// patches the header.
    pub fn close(&mut self) -> BuildResult<()> {
        let tos = match self.stack.last() {
            Some(&tos) => tos,
            None => return Err(BuildError::EmptyStack),
        };
        if self.attr_written {
            return Err(BuildError::ContainerMismatch("attribute key written without a value"));
        }
        let depth = self.stack.len() - 1;
        let mut index = std::mem::take(&mut self.index[depth]);
        let result = self.close_inner(tos, &mut index);
        // keep the allocation for the next container at this depth
        self.index[depth] = index;
        result?;
        self.stack.pop();
        Ok(())
    }
}

impl Builder {
    /// Frame bookkeeping shared by every add path: validates the container
    /// protocol, records the member offset and rolls everything back if the
    /// write fails.
    fn add_with<F>(&mut self, is_string: bool, write: F) -> BuildResult<()>
    where
        F: FnOnce(&mut Self) -> BuildResult<()>,
    {
        let pos = self.buf.len();
        let attr_written = self.attr_written;
        let mut recorded_depth = None;
        if let Some(&tos) = self.stack.last() {
            let tag = self.buf[tos];
            debug_assert!(tag == TAG_ARRAY || tag == TAG_OBJECT);
            if tag == TAG_OBJECT {
                if !self.attr_written && !is_string {
                    return Err(BuildError::ContainerMismatch("object attribute keys must be strings"));
                }
                if !self.attr_written {
                    self.report_add(tos);
                    recorded_depth = Some(self.stack.len() - 1);
                }
                self.attr_written = !self.attr_written;
            } else {
                self.report_add(tos);
                recorded_depth = Some(self.stack.len() - 1);
            }
        }
        match write(self) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.buf.truncate(pos);
                self.attr_written = attr_written;
                if let Some(depth) = recorded_depth {
                    self.index[depth].pop();
                }
                Err(e)
            }
        }
    }

    /// Records the next member's offset, relative to the container header.
    #[inline]
    fn report_add(&mut self, base: usize) {
        let depth = self.stack.len() - 1;
        let pos = self.buf.len();
        self.index[depth].push(pos - base);
    }

    /// Checked reservation: enforces the total size cap, then grows the
    /// buffer.
    #[inline]
    fn reserve(&mut self, additional: usize) -> BuildResult<()> {
        let required = self.buf.len() as u64 + additional as u64;
        if required > MAX_TOTAL_SIZE {
            return Err(BuildError::SizeOverflow(required));
        }
        self.buf.try_reserve(additional)?;
        Ok(())
    }

    /// Writes one value at the cursor, dispatching over the declared type
    /// and the runtime representation.
    fn set(&mut self, item: &Value<'_>) -> BuildResult<()> {
        match item.value_type() {
            ValueType::None => Err(BuildError::TypeMismatch("cannot encode a None value")),
            ValueType::Null => {
                self.reserve(1)?;
                self.buf.push_u8(TAG_NULL);
                Ok(())
            }
            ValueType::Bool => match item.data() {
                ValueData::Bool(v) => {
                    self.reserve(1)?;
                    self.buf.push_u8(if v { TAG_TRUE } else { TAG_FALSE });
                    Ok(())
                }
                _ => Err(BuildError::TypeMismatch("Bool requires a bool representation")),
            },
            ValueType::Double => {
                let v = match item.data() {
                    ValueData::Double(v) => v,
                    ValueData::Int(v) => v as f64,
                    ValueData::UInt(v) => v as f64,
                    _ => return Err(BuildError::TypeMismatch("Double requires a numeric representation")),
                };
                self.reserve(1 + 8)?;
                self.buf.push_u8(TAG_DOUBLE);
                self.buf.push_bytes(&v.to_le_bytes());
                Ok(())
            }
            ValueType::External => match item.data() {
                ValueData::Pointer(p) => {
                    self.reserve(1 + size_of::<usize>())?;
                    self.buf.push_u8(TAG_EXTERNAL);
                    // an in-process address, not portable
                    self.buf.push_bytes(&(p as usize).to_ne_bytes());
                    Ok(())
                }
                _ => Err(BuildError::TypeMismatch("External requires a pointer representation")),
            },
            ValueType::SmallInt => {
                let v = match item.data() {
                    ValueData::Int(v) => v,
                    ValueData::UInt(v) => v as i64,
                    ValueData::Double(v) => v as i64,
                    _ => return Err(BuildError::TypeMismatch("SmallInt requires a numeric representation")),
                };
                if !(-8..=7).contains(&v) {
                    return Err(BuildError::OutOfRange("small integers cover -8..=7 only"));
                }
                self.reserve(1)?;
                let tag = if v >= 0 {
                    TAG_SMALL_INT_BASE + v as u8
                } else {
                    (0x40 + v) as u8
                };
                self.buf.push_u8(tag);
                Ok(())
            }
            ValueType::Int => {
                let (positive, magnitude) = match item.data() {
                    ValueData::Int(v) => (v >= 0, v.unsigned_abs()),
                    ValueData::UInt(v) => (true, v),
                    ValueData::Double(v) => {
                        let v = v as i64;
                        (v >= 0, v.unsigned_abs())
                    }
                    _ => return Err(BuildError::TypeMismatch("Int requires a numeric representation")),
                };
                let base = if positive { TAG_INT_POS_BASE } else { TAG_INT_NEG_BASE };
                self.append_uint(magnitude, base)
            }
            ValueType::UInt => {
                let v = match item.data() {
                    ValueData::UInt(v) => v,
                    ValueData::Int(v) => {
                        if v < 0 {
                            return Err(BuildError::OutOfRange("UInt cannot hold a negative value"));
                        }
                        v as u64
                    }
                    ValueData::Double(v) => {
                        if v < 0.0 {
                            return Err(BuildError::OutOfRange("UInt cannot hold a negative value"));
                        }
                        v as u64
                    }
                    _ => return Err(BuildError::TypeMismatch("UInt requires a numeric representation")),
                };
                self.append_uint(v, TAG_UINT_BASE)
            }
            ValueType::UtcDate => match item.data() {
                ValueData::Int(millis) => self.add_utc_date(millis),
                _ => Err(BuildError::TypeMismatch("UTCDate requires a millisecond timestamp")),
            },
            ValueType::String => match item.data() {
                ValueData::Str(s) => self.add_string(s),
                _ => Err(BuildError::TypeMismatch("String requires a string representation")),
            },
            ValueType::Array => self.add_compound(TAG_ARRAY),
            ValueType::Object => self.add_compound(TAG_OBJECT),
            ValueType::Binary => {
                let bytes = match item.data() {
                    ValueData::Bytes(b) => b,
                    ValueData::Str(s) => s.as_bytes(),
                    _ => return Err(BuildError::TypeMismatch("Binary requires a byte representation")),
                };
                let len = bytes.len() as u64;
                let width = uint_length(len);
                self.reserve(1 + width + bytes.len())?;
                self.buf.push_u8(TAG_BINARY_BASE + width as u8);
                self.buf.push_bytes(&len.to_le_bytes()[..width]);
                self.buf.push_bytes(bytes);
                Ok(())
            }
            ValueType::Id => Err(BuildError::TypeMismatch("id values carry two parts, use add_id")),
            ValueType::IdSentinel => {
                self.reserve(1)?;
                self.buf.push_u8(TAG_ID_SENTINEL);
                Ok(())
            }
            ValueType::Bcd => Err(BuildError::TypeMismatch("binary-coded decimals are reserved")),
        }
    }

    /// Minimal-width unsigned integer behind a base tag.
    #[inline]
    fn append_uint(&mut self, value: u64, base: u8) -> BuildResult<()> {
        let width = uint_length(value);
        self.reserve(1 + width)?;
        self.buf.push_u8(base + width as u8);
        self.buf.push_bytes(&value.to_le_bytes()[..width]);
        Ok(())
    }

    fn add_string(&mut self, value: &str) -> BuildResult<()> {
        let bytes = value.as_bytes();
        let len = bytes.len();
        if len <= MAX_SHORT_STRING_LEN {
            self.reserve(1 + len)?;
            self.buf.push_u8(TAG_STRING_SHORT_BASE + len as u8);
        } else {
            self.reserve(1 + 8 + len)?;
            self.buf.push_u8(TAG_STRING_LONG);
            self.buf.push_bytes(&(len as u64).to_le_bytes());
        }
        self.buf.push_bytes(bytes);
        Ok(())
    }

    /// The timestamp is stored as the complement+1 of its two's-complement
    /// form.
    #[inline]
    fn add_utc_date(&mut self, millis: i64) -> BuildResult<()> {
        let encoded = (!(millis as u64)).wrapping_add(1);
        self.reserve(1 + 8)?;
        self.buf.push_u8(TAG_UTC_DATE);
        self.buf.push_bytes(&encoded.to_le_bytes());
        Ok(())
    }

    /// Opens a container: pushes a frame and writes the header with both
    /// length slots zero-filled, to be patched on close.
    fn add_compound(&mut self, tag: u8) -> BuildResult<()> {
        self.reserve(RESERVED_HEADER_SIZE)?;
        let pos = self.buf.len();
        self.stack.push(pos);
        if self.index.len() < self.stack.len() {
            self.index.resize_with(self.stack.len(), Vec::new);
        }
        self.index[self.stack.len() - 1].clear();
        self.buf.push_u8(tag);
        self.buf.push_bytes(&[0u8; 9]);
        Ok(())
    }

    fn close_inner(&mut self, tos: usize, index: &mut Vec<usize>) -> BuildResult<()> {
        let mut pos = self.buf.len();

        // One-byte total length is possible when the member count and the
        // final size (without the unused 8-byte slot) both stay below 256.
        // In that case the payload moves left over the gap and every
        // recorded offset shrinks by 8.
        let small_byte_length;
        let small_table;
        if index.len() < 0x100 && (pos - tos - 8) + 1 + 2 * index.len() < 0x100 {
            if pos > tos + RESERVED_HEADER_SIZE {
                self.buf.copy_within(tos + RESERVED_HEADER_SIZE..pos, tos + 2);
            }
            pos -= 8;
            self.buf.truncate(pos);
            for offset in index.iter_mut() {
                *offset -= 8;
            }
            small_byte_length = true;
            small_table = true;
        } else {
            small_byte_length = false;
            small_table = index.len() < 0x100 && index.last().map_or(true, |&last| last < 0x10000);
        }

        if small_table {
            // force the odd tag for 2-byte table entries
            if self.buf[tos] & 1 == 0 {
                self.buf[tos] -= 1;
            }
            if self.buf[tos] == TAG_OBJECT && index.len() >= 2 && self.options.sort_attribute_names {
                Self::sort_object_index_short(&self.buf, tos, index);
            }
            // an empty container keeps just the tag and its total length
            if !index.is_empty() {
                self.reserve(2 * index.len() + 1)?;
                for &offset in index.iter() {
                    self.buf.push_bytes(&(offset as u16).to_le_bytes());
                }
                self.buf.push_u8(index.len() as u8);
            }
        } else {
            // force the even tag for 8-byte table entries
            if self.buf[tos] & 1 == 1 {
                self.buf[tos] += 1;
            }
            if self.buf[tos] == TAG_OBJECT_LARGE
                && index.len() >= 2
                && self.options.sort_attribute_names
            {
                Self::sort_object_index_long(&self.buf, tos, index);
            }
            self.reserve(8 * index.len() + 8)?;
            for &offset in index.iter() {
                self.buf.push_bytes(&(offset as u64).to_le_bytes());
            }
            self.buf.push_bytes(&(index.len() as u64).to_le_bytes());
        }

        let pos = self.buf.len();
        if small_byte_length {
            self.buf[tos + 1] = (pos - tos) as u8;
        } else {
            self.buf[tos + 1] = 0x00;
            self.buf[tos + 2..tos + 10].copy_from_slice(&((pos - tos) as u64).to_le_bytes());
        }

        if self.options.check_attribute_uniqueness && index.len() > 1 && self.buf[tos] >= TAG_OBJECT
        {
            // SAFETY: the container at tos was finalized just above.
            let object = unsafe { Slice::new_unchecked(&self.buf[tos..]) };
            check_attribute_uniqueness(object)?;
        }
        Ok(())
    }

    /// Sorts a small object's offsets in place, comparing the key bytes
    /// they point at.
    fn sort_object_index_short(buf: &[u8], obj_base: usize, offsets: &mut [usize]) {
        offsets.sort_unstable_by(|&a, &b| {
            let ka = attribute_key(buf, obj_base + a);
            let kb = attribute_key(buf, obj_base + b);
            ka.cmp(kb)
        });
    }

    /// Large objects sort through a scratch vector of key spans so every
    /// key is parsed once instead of per comparison.
    fn sort_object_index_long(buf: &[u8], obj_base: usize, offsets: &mut [usize]) {
        SORT_SCRATCH.with(|scratch| {
            let mut entries = scratch.borrow_mut();
            entries.clear();
            entries.reserve(offsets.len());
            for &offset in offsets.iter() {
                let (key_start, key_len) = attribute_key_span(buf, obj_base + offset);
                entries.push(SortEntry { offset, key_start, key_len });
            }
            entries.sort_unstable_by(|a, b| {
                let ka = &buf[a.key_start..a.key_start + a.key_len];
                let kb = &buf[b.key_start..b.key_start + b.key_len];
                ka.cmp(kb)
            });
            for (slot, entry) in offsets.iter_mut().zip(entries.iter()) {
                *slot = entry.offset;
            }
        });
    }
}

/// Start and length of the key bytes at `pos`. Keys written by the builder
/// are always short or long strings.
fn attribute_key_span(buf: &[u8], pos: usize) -> (usize, usize) {
    let tag = buf[pos];
    if (TAG_STRING_SHORT_BASE..=0xbf).contains(&tag) {
        (pos + 1, (tag - TAG_STRING_SHORT_BASE) as usize)
    } else {
        debug_assert_eq!(tag, TAG_STRING_LONG);
        // SAFETY: the range below always yields 8 bytes.
        let len = u64::from_le_bytes(buf[pos + 1..pos + 9].try_into().unwrap()) as usize;
        (pos + 9, len)
    }
}

fn attribute_key(buf: &[u8], pos: usize) -> &[u8] {
    let (start, len) = attribute_key_span(buf, pos);
    &buf[start..start + len]
}

/// Walks the sorted keys of a just-closed object; adjacent equal keys fail.
/// Object values are checked recursively.
fn check_attribute_uniqueness(object: &Slice) -> BuildResult<()> {
    let n = object.length()?;
    if n > 1 {
        let mut previous = object.key_at(0)?.string_bytes()?;
        for i in 1..n {
            let current = object.key_at(i)?;
            if current.value_type() != ValueType::String {
                return Ok(());
            }
            let key = current.string_bytes()?;
            if key == previous {
                return Err(BuildError::DuplicateAttribute(
                    String::from_utf8_lossy(key).into_owned(),
                ));
            }
            previous = key;
        }
    }
    for i in 0..n {
        let value = object.value_at(i)?;
        if value.value_type() == ValueType::Object {
            check_attribute_uniqueness(value)?;
        }
    }
    Ok(())
}
