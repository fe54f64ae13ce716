//! JSON to the binary format.

use serde_json::Value as JsonValue;

use crate::builder::{BuildError, BuildResult, Builder};
use crate::slice::SliceBuf;
use crate::value::Value;

impl TryFrom<&JsonValue> for SliceBuf {
    type Error = BuildError;

    #[inline]
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        let mut builder = Builder::new();
        write_value(&mut builder, value)?;
        builder.finish()
    }
}

impl SliceBuf {
    /// Parses a JSON string into its binary encoding.
    #[inline]
    pub fn parse<T: AsRef<str>>(text: T) -> BuildResult<Self> {
        let json: JsonValue = serde_json::from_str(text.as_ref()).map_err(BuildError::JsonError)?;
        SliceBuf::try_from(&json)
    }
}

fn write_value(builder: &mut Builder, value: &JsonValue) -> BuildResult<()> {
    match value {
        JsonValue::Null => builder.add(Value::null()),
        JsonValue::Bool(v) => builder.add(Value::bool(*v)),
        JsonValue::Number(v) => write_number(builder, v),
        JsonValue::String(v) => builder.add(Value::string(v)),
        JsonValue::Array(members) => {
            builder.open_array()?;
            for member in members {
                write_value(builder, member)?;
            }
            builder.close()
        }
        JsonValue::Object(members) => {
            builder.open_object()?;
            for (key, member) in members {
                builder.add(Value::string(key))?;
                write_value(builder, member)?;
            }
            builder.close()
        }
    }
}

#[inline]
fn write_number(builder: &mut Builder, value: &serde_json::Number) -> BuildResult<()> {
    if let Some(v) = value.as_u64() {
        if v < 8 {
            builder.add(Value::small_int(v as i64))
        } else if v > i64::MAX as u64 {
            // beyond i64::MAX the signed path cannot hold the value, store
            // it as a (lossy) double
            builder.add(Value::double(v as f64))
        } else {
            builder.add(Value::int(v as i64))
        }
    } else if let Some(v) = value.as_i64() {
        if v >= -8 {
            builder.add(Value::small_int(v))
        } else {
            builder.add(Value::int(v))
        }
    } else {
        match value.as_f64() {
            Some(v) => builder.add(Value::double(v)),
            None => Err(BuildError::TypeMismatch("unrepresentable JSON number")),
        }
    }
}
