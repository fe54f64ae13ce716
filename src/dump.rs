//! JSON rendering of encoded values.

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter, Write};

use crate::slice::{Slice, SliceError};
use crate::value_type::ValueType;

/// How the dumper treats values JSON cannot represent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DumpPolicy {
    /// Emit nothing for the offending value.
    Suppress,
    /// Fail with [`DumpError::UnsupportedType`].
    Fail,
}

/// Possible errors that can arise during dumping.
#[derive(Debug)]
pub enum DumpError {
    FmtError(fmt::Error),
    InvalidUtf8,
    UnsupportedType(ValueType),
    SliceError(SliceError),
}

impl Display for DumpError {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DumpError::FmtError(e) => write!(f, "{}", e),
            DumpError::InvalidUtf8 => write!(f, "string payload is not valid UTF-8"),
            DumpError::UnsupportedType(ty) => {
                write!(f, "unsupported type {}, cannot convert to JSON", ty)
            }
            DumpError::SliceError(e) => write!(f, "{}", e),
        }
    }
}

impl Error for DumpError {}

impl From<fmt::Error> for DumpError {
    #[inline]
    fn from(e: fmt::Error) -> Self {
        DumpError::FmtError(e)
    }
}

impl From<SliceError> for DumpError {
    #[inline]
    fn from(e: SliceError) -> Self {
        DumpError::SliceError(e)
    }
}

pub type DumpResult<T> = std::result::Result<T, DumpError>;

const UU: u8 = b'u';

// Lookup table of escape actions. `UU` marks a byte that needs a generic
// \u00XX escape, any other non-zero entry is its short escape letter, zero
// passes through.
static ESCAPE: [u8; 256] = [
    //  0     1     2     3     4     5     6     7     8     9     A     B     C     D     E     F
    UU, UU, UU, UU, UU, UU, UU, UU, b'b', b't', b'n', UU, b'f', b'r', UU, UU, // 0
    UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, // 1
    0, 0, b'"', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, b'/', // 2
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 3
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 4
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, b'\\', 0, 0, 0, // 5
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 6
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 7
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 8
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 9
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // A
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // B
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // C
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // D
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // E
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // F
];

/// Renders a slice as JSON text into a [`fmt::Write`] target.
pub struct Dumper<'a, W: Write> {
    writer: &'a mut W,
    policy: DumpPolicy,
}

impl<'a, W: Write> Dumper<'a, W> {
    #[inline]
    pub fn new(writer: &'a mut W, policy: DumpPolicy) -> Self {
        Dumper { writer, policy }
    }

    /// Dumps one value, recursing into containers.
    pub fn dump(&mut self, slice: &Slice) -> DumpResult<()> {
        match slice.value_type() {
            ValueType::Null => Ok(self.writer.write_str("null")?),
            ValueType::Bool => {
                let text = if slice.get_bool()? { "true" } else { "false" };
                Ok(self.writer.write_str(text)?)
            }
            ValueType::Double => {
                let v = slice.get_double()?;
                if v.is_finite() {
                    Ok(write!(self.writer, "{}", v)?)
                } else {
                    self.unsupported(ValueType::Double)
                }
            }
            ValueType::SmallInt => Ok(write!(self.writer, "{}", slice.get_small_int()?)?),
            ValueType::Int => Ok(write!(self.writer, "{}", slice.get_i64()?)?),
            ValueType::UInt => Ok(write!(self.writer, "{}", slice.get_u64()?)?),
            ValueType::String => self.dump_string(slice.string_bytes()?),
            ValueType::Array => {
                self.writer.write_char('[')?;
                for (i, member) in slice.array_iter()?.enumerate() {
                    if i > 0 {
                        self.writer.write_char(',')?;
                    }
                    self.dump(member?)?;
                }
                Ok(self.writer.write_char(']')?)
            }
            ValueType::Object => {
                self.writer.write_char('{')?;
                for (i, entry) in slice.object_iter()?.enumerate() {
                    let (key, value) = entry?;
                    if i > 0 {
                        self.writer.write_char(',')?;
                    }
                    self.dump_string(key.string_bytes()?)?;
                    self.writer.write_char(':')?;
                    self.dump(value)?;
                }
                Ok(self.writer.write_char('}')?)
            }
            ty => self.unsupported(ty),
        }
    }

    #[inline]
    fn unsupported(&mut self, ty: ValueType) -> DumpResult<()> {
        match self.policy {
            DumpPolicy::Suppress => Ok(()),
            DumpPolicy::Fail => Err(DumpError::UnsupportedType(ty)),
        }
    }

    /// Quoted, escaped string output. ASCII runs are emitted in chunks
    /// split at escape positions; multi-byte sequences pass through after
    /// their continuation bytes have been verified.
    fn dump_string(&mut self, bytes: &[u8]) -> DumpResult<()> {
        self.writer.write_char('"')?;
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            let byte = bytes[i];
            if byte & 0x80 == 0 {
                let escape = ESCAPE[byte as usize];
                if escape != 0 {
                    if start < i {
                        self.write_verbatim(&bytes[start..i])?;
                    }
                    self.writer.write_char('\\')?;
                    if escape == UU {
                        write!(self.writer, "u00{:02X}", byte)?;
                    } else {
                        self.writer.write_char(escape as char)?;
                    }
                    start = i + 1;
                }
                i += 1;
            } else {
                let width = match byte {
                    0xc0..=0xdf => 2,
                    0xe0..=0xef => 3,
                    0xf0..=0xf7 => 4,
                    _ => return Err(DumpError::InvalidUtf8),
                };
                if i + width > bytes.len() {
                    return Err(DumpError::InvalidUtf8);
                }
                if bytes[i + 1..i + width].iter().any(|&b| b & 0xc0 != 0x80) {
                    return Err(DumpError::InvalidUtf8);
                }
                i += width;
            }
        }
        if start < bytes.len() {
            self.write_verbatim(&bytes[start..])?;
        }
        self.writer.write_char('"')?;
        Ok(())
    }

    #[inline]
    fn write_verbatim(&mut self, bytes: &[u8]) -> DumpResult<()> {
        // SAFETY: chunks are split at ASCII boundaries and multi-byte
        // sequences are verified before they reach this point.
        let text = unsafe { std::str::from_utf8_unchecked(bytes) };
        Ok(self.writer.write_str(text)?)
    }
}

impl Slice {
    /// Renders this value as a JSON string.
    #[inline]
    pub fn to_json_string(&self, policy: DumpPolicy) -> DumpResult<String> {
        let mut out = String::new();
        Dumper::new(&mut out, policy).dump(self)?;
        Ok(out)
    }
}
