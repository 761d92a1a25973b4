//! Runtime values flowing through the dispatch pipeline.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::typing::types::Repr;

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failed conversion of a raw value into a target representation.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot convert {value:?} to {repr}")]
    Unconvertible { value: String, repr: Repr },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// The data carried by a [`Value`].
#[derive(Clone)]
pub enum Payload {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Bytes),
    Json(serde_json::Value),
    Error(Arc<dyn std::error::Error + Send + Sync>),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Payload {
    pub fn error(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Payload::Error(Arc::new(err))
    }

    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Opaque(Arc::new(value))
    }

    pub fn repr(&self) -> Repr {
        match self {
            Payload::Text(_) => Repr::Text,
            Payload::Int(_) => Repr::Int,
            Payload::Float(_) => Repr::Float,
            Payload::Bool(_) => Repr::Bool,
            Payload::Bytes(_) => Repr::Bytes,
            Payload::Json(_) => Repr::Json,
            Payload::Error(_) => Repr::Error,
            Payload::Opaque(_) => Repr::Opaque,
        }
    }

    /// Parses a raw text value into the representation `repr`.
    pub fn from_text(repr: Repr, raw: &str) -> Result<Self, ConvertError> {
        let unconvertible = || ConvertError::Unconvertible {
            value: raw.to_string(),
            repr,
        };
        match repr {
            Repr::Text => Ok(Payload::Text(raw.to_string())),
            Repr::Int => raw.trim().parse().map(Payload::Int).map_err(|_| unconvertible()),
            Repr::Float => raw.trim().parse().map(Payload::Float).map_err(|_| unconvertible()),
            Repr::Bool => raw.trim().parse().map(Payload::Bool).map_err(|_| unconvertible()),
            Repr::Bytes => Ok(Payload::Bytes(Bytes::copy_from_slice(raw.as_bytes()))),
            Repr::Json => Ok(Payload::Json(serde_json::from_str(raw)?)),
            Repr::Error | Repr::Opaque => Err(unconvertible()),
        }
    }

    /// Text rendering for representations that have one.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Payload::Text(s) => Some(s.clone()),
            Payload::Int(i) => Some(i.to_string()),
            Payload::Float(v) => Some(v.to_string()),
            Payload::Bool(b) => Some(b.to_string()),
            Payload::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Payload::Json(v) => Some(v.to_string()),
            Payload::Error(e) => Some(e.to_string()),
            Payload::Opaque(_) => None,
        }
    }

    /// JSON rendering for representations that have one.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Payload::Text(s) => Some(serde_json::Value::String(s.clone())),
            Payload::Int(i) => Some((*i).into()),
            Payload::Float(v) => serde_json::Number::from_f64(*v).map(serde_json::Value::Number),
            Payload::Bool(b) => Some((*b).into()),
            Payload::Json(v) => Some(v.clone()),
            Payload::Error(e) => Some(serde_json::json!({ "message": e.to_string() })),
            Payload::Bytes(_) | Payload::Opaque(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Payload::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Opaque(v) => v.downcast_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Payload::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Payload::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Payload::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Payload::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Payload::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Payload::Error(e) => f.debug_tuple("Error").field(&e.to_string()).finish(),
            Payload::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<i64> for Payload {
    fn from(i: i64) -> Self {
        Payload::Int(i)
    }
}

impl From<f64> for Payload {
    fn from(v: f64) -> Self {
        Payload::Float(v)
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Bool(b)
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Json(v)
    }
}

/// Release capability attached to a value that holds a resource.
///
/// Consumed on use, so a hook can run at most once.
pub struct Release(Box<dyn FnOnce() -> Result<(), BoxError> + Send>);

impl Release {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        Self(Box::new(f))
    }

    pub fn run(self) -> Result<(), BoxError> {
        (self.0)()
    }
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Release(..)")
    }
}

/// A payload plus an optional release hook.
#[derive(Debug)]
pub struct Value {
    payload: Payload,
    release: Option<Release>,
}

impl Value {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            payload: payload.into(),
            release: None,
        }
    }

    /// A value whose resource must be released once the request is done with it.
    pub fn with_release<F>(payload: impl Into<Payload>, release: F) -> Self
    where
        F: FnOnce() -> Result<(), BoxError> + Send + 'static,
    {
        Self {
            payload: payload.into(),
            release: Some(Release::new(release)),
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub fn has_release(&self) -> bool {
        self.release.is_some()
    }

    /// Detaches the release hook so the caller owns running it.
    pub fn take_release(&mut self) -> Option<Release> {
        self.release.take()
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        Value::new(payload)
    }
}
