//! Result destination handlers keyed by destination.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::StatusCode;
use thiserror::Error;

use crate::codec::Producer;
use crate::definition::Destination;
use crate::service::context::HttpContext;
use crate::service::response::{write_error, write_payload};
use crate::typing::{BoxError, Payload, Repr, TypeDesc, Value};

/// Writes one result value to its destination.
#[async_trait]
pub trait DestinationHandler: Send + Sync {
    fn destination(&self) -> &Destination;

    /// Lower priorities run first.
    fn priority(&self) -> i32;

    /// Checks at registration that values of `output` can be written.
    fn validate(&self, output: &TypeDesc) -> Result<(), BoxError>;

    /// Writes `value`; returns whether later results should still be handled.
    async fn handle(
        &self,
        ctx: &mut HttpContext,
        producers: &[Arc<dyn Producer>],
        code: StatusCode,
        value: Option<Value>,
    ) -> Result<bool, BoxError>;
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{destination} destination can't write values of type {output}")]
    InvalidOutput {
        destination: Destination,
        output: TypeDesc,
    },

    #[error("meta value must be a json object, got {0:?}")]
    InvalidMeta(Payload),

    #[error("invalid header {0:?}")]
    InvalidHeader(String),
}

static META: Destination = Destination::META;
static ERROR: Destination = Destination::ERROR;
static DATA: Destination = Destination::DATA;

/// Copies a JSON object of header names to values onto the response.
#[derive(Debug, Default)]
pub struct MetaHandler;

#[async_trait]
impl DestinationHandler for MetaHandler {
    fn destination(&self) -> &Destination {
        &META
    }

    fn priority(&self) -> i32 {
        10
    }

    fn validate(&self, output: &TypeDesc) -> Result<(), BoxError> {
        if output.is_interface() || output.repr() == Some(Repr::Json) {
            return Ok(());
        }
        Err(HandlerError::InvalidOutput {
            destination: META.clone(),
            output: output.clone(),
        }
        .into())
    }

    async fn handle(
        &self,
        ctx: &mut HttpContext,
        _producers: &[Arc<dyn Producer>],
        _code: StatusCode,
        value: Option<Value>,
    ) -> Result<bool, BoxError> {
        let Some(value) = value else {
            return Ok(true);
        };
        let fields = match value.payload() {
            Payload::Json(serde_json::Value::Object(fields)) => fields,
            other => return Err(HandlerError::InvalidMeta(other.clone()).into()),
        };
        let headers = ctx.response_mut().headers_mut();
        for (key, val) in fields {
            let text = match val {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| HandlerError::InvalidHeader(key.clone()))?;
            let value = HeaderValue::from_str(&text)
                .map_err(|_| HandlerError::InvalidHeader(format!("{key}: {text}")))?;
            headers.insert(name, value);
        }
        Ok(true)
    }
}

/// Writes a non-nil error and stops the result chain.
#[derive(Debug, Default)]
pub struct ErrorHandler;

#[async_trait]
impl DestinationHandler for ErrorHandler {
    fn destination(&self) -> &Destination {
        &ERROR
    }

    fn priority(&self) -> i32 {
        20
    }

    fn validate(&self, output: &TypeDesc) -> Result<(), BoxError> {
        if output.assignable_to(&TypeDesc::error()) {
            return Ok(());
        }
        Err(HandlerError::InvalidOutput {
            destination: ERROR.clone(),
            output: output.clone(),
        }
        .into())
    }

    async fn handle(
        &self,
        ctx: &mut HttpContext,
        producers: &[Arc<dyn Producer>],
        _code: StatusCode,
        value: Option<Value>,
    ) -> Result<bool, BoxError> {
        let Some(value) = value else {
            return Ok(true);
        };
        match value.into_payload() {
            Payload::Error(err) => write_error(ctx, producers, err.as_ref())?,
            other => {
                let message = other.to_text().unwrap_or_else(|| "unknown error".to_string());
                let err: BoxError = message.into();
                write_error(ctx, producers, err.as_ref())?;
            }
        }
        Ok(false)
    }
}

/// Encodes the value with the negotiated producer and writes it as the body.
#[derive(Debug, Default)]
pub struct DataHandler;

#[async_trait]
impl DestinationHandler for DataHandler {
    fn destination(&self) -> &Destination {
        &DATA
    }

    fn priority(&self) -> i32 {
        30
    }

    fn validate(&self, _output: &TypeDesc) -> Result<(), BoxError> {
        Ok(())
    }

    async fn handle(
        &self,
        ctx: &mut HttpContext,
        producers: &[Arc<dyn Producer>],
        code: StatusCode,
        value: Option<Value>,
    ) -> Result<bool, BoxError> {
        match value {
            Some(value) => write_payload(ctx, producers, code, value.payload())?,
            None => {
                ctx.response_mut().write_header(code);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JsonProducer, TextProducer};
    use crate::service::errors::HttpError;
    use axum::http::Request;
    use bytes::Bytes;
    use serde_json::json;

    fn ctx() -> HttpContext {
        let request = Request::builder()
            .header("accept", "application/json")
            .body(Bytes::new())
            .unwrap();
        HttpContext::from_request(request)
    }

    fn producers() -> Vec<Arc<dyn Producer>> {
        vec![Arc::new(JsonProducer), Arc::new(TextProducer)]
    }

    #[test]
    fn test_validate() {
        assert!(MetaHandler.validate(&TypeDesc::json("Headers")).is_ok());
        assert!(MetaHandler.validate(&TypeDesc::int()).is_err());
        assert!(ErrorHandler.validate(&TypeDesc::error()).is_ok());
        assert!(ErrorHandler.validate(&TypeDesc::error_type("NotFound")).is_ok());
        assert!(ErrorHandler.validate(&TypeDesc::string()).is_err());
        assert!(DataHandler.validate(&TypeDesc::opaque("Stream")).is_ok());
    }

    #[tokio::test]
    async fn test_meta_sets_headers() {
        let mut ctx = ctx();
        let value = Value::new(json!({"x-total": 3, "etag": "abc"}));
        let goon = MetaHandler
            .handle(&mut ctx, &producers(), StatusCode::OK, Some(value))
            .await
            .unwrap();
        assert!(goon);
        assert_eq!(ctx.response().headers()["x-total"], "3");
        assert_eq!(ctx.response().headers()["etag"], "abc");
        assert!(ctx.response().header_writable());
    }

    #[tokio::test]
    async fn test_error_halts() {
        let mut ctx = ctx();
        let nil = ErrorHandler
            .handle(&mut ctx, &producers(), StatusCode::OK, None)
            .await
            .unwrap();
        assert!(nil);

        let err = Value::new(Payload::error(HttpError::not_found("gone")));
        let goon = ErrorHandler
            .handle(&mut ctx, &producers(), StatusCode::OK, Some(err))
            .await
            .unwrap();
        assert!(!goon);
        assert_eq!(ctx.response().status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_data_writes_body() {
        let mut ctx = ctx();
        let value = Value::new(json!({"id": 1}));
        DataHandler
            .handle(&mut ctx, &producers(), StatusCode::CREATED, Some(value))
            .await
            .unwrap();
        assert_eq!(ctx.response().status(), Some(StatusCode::CREATED));
        assert_eq!(ctx.response().body(), br#"{"id":1}"#);
    }
}
