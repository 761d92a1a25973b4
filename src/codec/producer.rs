//! Response body encoders.

use bytes::Bytes;

use crate::codec::{CodecError, MIME_JSON, MIME_OCTET_STREAM, MIME_TEXT};
use crate::typing::Payload;

/// Encodes response bodies of one content type.
pub trait Producer: Send + Sync {
    fn content_type(&self) -> &str;

    fn produce(&self, payload: &Payload) -> Result<Bytes, CodecError>;
}

#[derive(Debug, Default)]
pub struct JsonProducer;

impl Producer for JsonProducer {
    fn content_type(&self) -> &str {
        MIME_JSON
    }

    fn produce(&self, payload: &Payload) -> Result<Bytes, CodecError> {
        let value = payload.to_json().ok_or(CodecError::Unsupported {
            content_type: MIME_JSON,
            repr: payload.repr(),
        })?;
        Ok(Bytes::from(serde_json::to_vec(&value)?))
    }
}

#[derive(Debug, Default)]
pub struct TextProducer;

impl Producer for TextProducer {
    fn content_type(&self) -> &str {
        MIME_TEXT
    }

    fn produce(&self, payload: &Payload) -> Result<Bytes, CodecError> {
        payload
            .to_text()
            .map(Bytes::from)
            .ok_or(CodecError::Unsupported {
                content_type: MIME_TEXT,
                repr: payload.repr(),
            })
    }
}

#[derive(Debug, Default)]
pub struct OctetStreamProducer;

impl Producer for OctetStreamProducer {
    fn content_type(&self) -> &str {
        MIME_OCTET_STREAM
    }

    fn produce(&self, payload: &Payload) -> Result<Bytes, CodecError> {
        match payload {
            Payload::Bytes(b) => Ok(b.clone()),
            other => other
                .to_text()
                .map(Bytes::from)
                .ok_or(CodecError::Unsupported {
                    content_type: MIME_OCTET_STREAM,
                    repr: other.repr(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_producer() {
        let p = JsonProducer;
        let out = p.produce(&Payload::Json(json!({"id": 1}))).unwrap();
        assert_eq!(out.as_ref(), br#"{"id":1}"#);
        assert_eq!(p.produce(&Payload::Text("hi".into())).unwrap().as_ref(), b"\"hi\"");
        assert!(p.produce(&Payload::opaque(1u8)).is_err());
    }

    #[test]
    fn test_text_producer() {
        let p = TextProducer;
        assert_eq!(p.produce(&Payload::Int(5)).unwrap().as_ref(), b"5");
        assert!(p.produce(&Payload::opaque(())).is_err());
    }

    #[test]
    fn test_octet_producer() {
        let p = OctetStreamProducer;
        let raw = Bytes::from_static(&[0, 1]);
        assert_eq!(p.produce(&Payload::Bytes(raw.clone())).unwrap(), raw);
    }
}
