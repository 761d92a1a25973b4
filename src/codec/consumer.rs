//! Request body decoders.

use bytes::Bytes;

use crate::codec::{CodecError, MIME_JSON, MIME_OCTET_STREAM, MIME_TEXT};
use crate::typing::{Payload, Repr, TypeDesc};

/// Decodes request bodies of one content type.
pub trait Consumer: Send + Sync {
    fn content_type(&self) -> &str;

    /// Decodes `data` into the representation of `target`. `None` means nil.
    fn consume(&self, data: &[u8], target: &TypeDesc) -> Result<Option<Payload>, CodecError>;
}

#[derive(Debug, Default)]
pub struct JsonConsumer;

impl Consumer for JsonConsumer {
    fn content_type(&self) -> &str {
        MIME_JSON
    }

    fn consume(&self, data: &[u8], target: &TypeDesc) -> Result<Option<Payload>, CodecError> {
        let value: serde_json::Value = serde_json::from_slice(data)?;
        if value.is_null() {
            return Ok(None);
        }
        let unsupported = |repr| CodecError::Unsupported {
            content_type: MIME_JSON,
            repr,
        };
        let payload = match target.repr() {
            None | Some(Repr::Json) => Payload::Json(value),
            Some(Repr::Text) => match value {
                serde_json::Value::String(s) => Payload::Text(s),
                _ => return Err(unsupported(Repr::Text)),
            },
            Some(Repr::Int) => value
                .as_i64()
                .map(Payload::Int)
                .ok_or_else(|| unsupported(Repr::Int))?,
            Some(Repr::Float) => value
                .as_f64()
                .map(Payload::Float)
                .ok_or_else(|| unsupported(Repr::Float))?,
            Some(Repr::Bool) => value
                .as_bool()
                .map(Payload::Bool)
                .ok_or_else(|| unsupported(Repr::Bool))?,
            Some(Repr::Bytes) => Payload::Bytes(Bytes::copy_from_slice(data)),
            Some(repr) => return Err(unsupported(repr)),
        };
        Ok(Some(payload))
    }
}

#[derive(Debug, Default)]
pub struct TextConsumer;

impl Consumer for TextConsumer {
    fn content_type(&self) -> &str {
        MIME_TEXT
    }

    fn consume(&self, data: &[u8], target: &TypeDesc) -> Result<Option<Payload>, CodecError> {
        let text = std::str::from_utf8(data)?;
        let repr = target.repr().unwrap_or(Repr::Text);
        Ok(Some(Payload::from_text(repr, text)?))
    }
}

#[derive(Debug, Default)]
pub struct OctetStreamConsumer;

impl Consumer for OctetStreamConsumer {
    fn content_type(&self) -> &str {
        MIME_OCTET_STREAM
    }

    fn consume(&self, data: &[u8], target: &TypeDesc) -> Result<Option<Payload>, CodecError> {
        match target.repr() {
            None | Some(Repr::Bytes) => Ok(Some(Payload::Bytes(Bytes::copy_from_slice(data)))),
            Some(Repr::Text) => Ok(Some(Payload::Text(std::str::from_utf8(data)?.to_string()))),
            Some(repr) => Err(CodecError::Unsupported {
                content_type: MIME_OCTET_STREAM,
                repr,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_consumer() {
        let c = JsonConsumer;
        let user = c
            .consume(br#"{"name":"ada"}"#, &TypeDesc::json("User"))
            .unwrap()
            .unwrap();
        assert_eq!(user.as_json().unwrap()["name"], "ada");

        let n = c.consume(b"12", &TypeDesc::int()).unwrap().unwrap();
        assert_eq!(n.as_int(), Some(12));

        assert!(c.consume(b"null", &TypeDesc::json("User")).unwrap().is_none());
        assert!(c.consume(b"\"x\"", &TypeDesc::int()).is_err());
        assert!(c.consume(b"{", &TypeDesc::any()).is_err());
    }

    #[test]
    fn test_text_consumer() {
        let c = TextConsumer;
        let n = c.consume(b"7", &TypeDesc::int()).unwrap().unwrap();
        assert_eq!(n.as_int(), Some(7));
        let s = c.consume(b"hello", &TypeDesc::any()).unwrap().unwrap();
        assert_eq!(s.as_str(), Some("hello"));
        assert!(c.consume(&[0xff, 0xfe], &TypeDesc::string()).is_err());
    }

    #[test]
    fn test_octet_consumer() {
        let c = OctetStreamConsumer;
        let b = c.consume(&[1, 2, 3], &TypeDesc::bytes()).unwrap().unwrap();
        assert!(matches!(b, Payload::Bytes(ref b) if b.as_ref() == [1, 2, 3]));
        assert!(c.consume(b"1", &TypeDesc::int()).is_err());
    }
}
