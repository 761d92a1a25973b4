//! Content-type codecs and header negotiation helpers.
//!
//! # Data Flow
//! ```text
//! Content-Type header → media::content_type → selects Consumer → Payload
//! Accept header       → media::accept_types → selects Producer → bytes
//! ```
//!
//! # Design Decisions
//! - Codecs are keyed by their exact content type string
//! - Only a minimal built-in set ships here; more can be registered
//! - Codecs are synchronous: bodies are buffered before dispatch

pub mod consumer;
pub mod media;
pub mod producer;

pub use consumer::{Consumer, JsonConsumer, OctetStreamConsumer, TextConsumer};
pub use media::{accept_types, content_type, MediaError};
pub use producer::{JsonProducer, OctetStreamProducer, Producer, TextProducer};

use thiserror::Error;

use crate::typing::{ConvertError, Repr};

pub const MIME_JSON: &str = "application/json";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// Errors raised while decoding a body or encoding a response.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{content_type} cannot carry {repr} values")]
    Unsupported {
        content_type: &'static str,
        repr: Repr,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}
