//! Impl the `serde::Serialize` and `serde::Deserialize` traits.

use crate::buffer::Buffer;
use crate::dump::DumpPolicy;
use crate::slice::SliceBuf;
use std::fmt::Formatter;

#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl serde::Serialize for SliceBuf {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        if serializer.is_human_readable() {
            let text = self
                .to_json_string(DumpPolicy::Fail)
                .map_err(serde::ser::Error::custom)?;
            text.serialize(serializer)
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> serde::Deserialize<'de> for SliceBuf {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct SliceBufVisitor;

        impl<'de> serde::de::Visitor<'de> for SliceBufVisitor {
            type Value = SliceBuf;

            #[inline]
            fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
                write!(formatter, "an encoded document")
            }

            #[inline]
            fn visit_str<E>(self, v: &str) -> Result<SliceBuf, E>
            where
                E: serde::de::Error,
            {
                SliceBuf::parse(v).map_err(serde::de::Error::custom)
            }

            #[inline]
            fn visit_bytes<E>(self, v: &[u8]) -> Result<SliceBuf, E>
            where
                E: serde::de::Error,
            {
                let mut buf = Buffer::new();
                buf.try_reserve(v.len())
                    .map_err(|e| serde::de::Error::custom(format!("{:?}", e)))?;
                buf.push_bytes(v);
                // SAFETY: the bytes were produced by a matching serializer.
                Ok(unsafe { SliceBuf::new_unchecked(buf) })
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(SliceBufVisitor)
        } else {
            deserializer.deserialize_bytes(SliceBufVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde() {
        let doc = SliceBuf::parse(r#"[123, true, null, "abc"]"#).unwrap();

        let bin = bincode::serialize(&doc).unwrap();
        let decoded: SliceBuf = bincode::deserialize(&bin).unwrap();

        assert_eq!(decoded, doc);
    }
}
