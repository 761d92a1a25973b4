//! Parameter value generators keyed by source.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::codec::{content_type, CodecError, Consumer, MediaError};
use crate::definition::Source;
use crate::service::context::{HttpContext, ValueContainer};
use crate::typing::types::FROM_TEXT;
use crate::typing::{BoxError, ConvertError, Payload, Repr, TypeDesc, Value};

/// Resolves a parameter's raw value from one request source.
#[async_trait]
pub trait ParameterGenerator: Send + Sync {
    fn source(&self) -> &Source;

    /// Checks at registration that `default` and `target` are usable together.
    fn validate(
        &self,
        name: &str,
        default: Option<&Payload>,
        target: &TypeDesc,
    ) -> Result<(), BoxError>;

    /// Produces the value for `name`, or `None` when the source has nothing.
    async fn generate(
        &self,
        ctx: &HttpContext,
        values: &ValueContainer,
        consumers: &[Arc<dyn Consumer>],
        name: &str,
        target: &TypeDesc,
    ) -> Result<Option<Value>, BoxError>;
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("parameter {name} has type {target} which can't be read from text")]
    NotTextual { name: String, target: TypeDesc },

    #[error("default value {default:?} of parameter {name} is not a {target}")]
    InvalidDefault {
        name: String,
        default: Payload,
        target: TypeDesc,
    },

    #[error("body parameters can't have a default value")]
    BodyDefault,

    #[error("no consumer for content type {0}")]
    NoConsumer(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

type Reader = for<'a> fn(&'a ValueContainer, &str) -> Option<&'a str>;

/// Reads single text values from path, query or header and converts them.
pub struct TextGenerator {
    source: Source,
    read: Reader,
}

impl TextGenerator {
    pub fn path() -> Self {
        Self {
            source: Source::PATH,
            read: |values, name| values.path(name),
        }
    }

    pub fn query() -> Self {
        Self {
            source: Source::QUERY,
            read: |values, name| values.query(name),
        }
    }

    pub fn header() -> Self {
        Self {
            source: Source::HEADER,
            read: |values, name| values.header(name),
        }
    }
}

#[async_trait]
impl ParameterGenerator for TextGenerator {
    fn source(&self) -> &Source {
        &self.source
    }

    fn validate(
        &self,
        name: &str,
        default: Option<&Payload>,
        target: &TypeDesc,
    ) -> Result<(), BoxError> {
        if !target.is_interface() && !target.has(FROM_TEXT) {
            return Err(GeneratorError::NotTextual {
                name: name.to_string(),
                target: target.clone(),
            }
            .into());
        }
        if let Some(default) = default {
            if !target.admits(default) {
                return Err(GeneratorError::InvalidDefault {
                    name: name.to_string(),
                    default: default.clone(),
                    target: target.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn generate(
        &self,
        _ctx: &HttpContext,
        values: &ValueContainer,
        _consumers: &[Arc<dyn Consumer>],
        name: &str,
        target: &TypeDesc,
    ) -> Result<Option<Value>, BoxError> {
        let Some(raw) = (self.read)(values, name) else {
            return Ok(None);
        };
        let repr = target.repr().unwrap_or(Repr::Text);
        let payload = Payload::from_text(repr, raw).map_err(GeneratorError::from)?;
        Ok(Some(Value::new(payload)))
    }
}

static BODY: Source = Source::BODY;

/// Decodes the request body with the consumer matching its content type.
#[derive(Debug, Default)]
pub struct BodyGenerator;

#[async_trait]
impl ParameterGenerator for BodyGenerator {
    fn source(&self) -> &Source {
        &BODY
    }

    fn validate(
        &self,
        _name: &str,
        default: Option<&Payload>,
        _target: &TypeDesc,
    ) -> Result<(), BoxError> {
        if default.is_some() {
            return Err(GeneratorError::BodyDefault.into());
        }
        Ok(())
    }

    async fn generate(
        &self,
        _ctx: &HttpContext,
        values: &ValueContainer,
        consumers: &[Arc<dyn Consumer>],
        _name: &str,
        target: &TypeDesc,
    ) -> Result<Option<Value>, BoxError> {
        if values.body().is_empty() {
            return Ok(None);
        }
        let ct = content_type(values.headers()).map_err(GeneratorError::from)?;
        let consumer = consumers
            .iter()
            .find(|c| c.content_type() == ct)
            .ok_or_else(|| GeneratorError::NoConsumer(ct.clone()))?;
        let payload = consumer
            .consume(values.body(), target)
            .map_err(GeneratorError::from)?;
        Ok(payload.map(Value::new))
    }
}
