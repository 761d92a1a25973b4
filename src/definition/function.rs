//! Callables bound to definitions.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::service::context::HttpContext;
use crate::typing::{TypeDesc, Value};

/// Declared argument and return types of a callable.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub inputs: Vec<TypeDesc>,
    pub outputs: Vec<TypeDesc>,
}

impl Signature {
    pub fn new(inputs: Vec<TypeDesc>, outputs: Vec<TypeDesc>) -> Self {
        Self { inputs, outputs }
    }
}

/// A callable with a uniform invocation surface.
///
/// `call` receives exactly one value per declared input, in order, and must
/// return exactly one slot per declared output; `None` is a nil output.
#[async_trait]
pub trait Function: Send + Sync {
    fn name(&self) -> &str;

    /// Source location the callable was declared at, for diagnostics.
    fn location(&self) -> Option<&'static Location<'static>> {
        None
    }

    fn signature(&self) -> &Signature;

    async fn call(&self, ctx: &HttpContext, args: Vec<Value>) -> Vec<Option<Value>>;
}

/// Diagnostic identity of a callable, e.g. `create_user(users.rs#30)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn of(function: &dyn Function) -> Self {
        match function.location() {
            Some(loc) => {
                let file = Path::new(loc.file())
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_else(|| loc.file().to_string());
                Self(format!("{}({}#{})", function.name(), file, loc.line()))
            }
            None => Self(function.name().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Adapts an async closure into a [`Function`].
pub struct FnHandler<F> {
    name: Cow<'static, str>,
    location: &'static Location<'static>,
    signature: Signature,
    f: F,
}

#[async_trait]
impl<F, Fut> Function for FnHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Vec<Option<Value>>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&'static Location<'static>> {
        Some(self.location)
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn call(&self, _ctx: &HttpContext, args: Vec<Value>) -> Vec<Option<Value>> {
        (self.f)(args).await
    }
}

/// Builds a callable from a closure, recording the caller's location.
#[track_caller]
pub fn handler<F, Fut>(
    name: impl Into<Cow<'static, str>>,
    signature: Signature,
    f: F,
) -> Arc<dyn Function>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<Option<Value>>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        location: Location::caller(),
        signature,
        f,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_identity_and_call() {
        let f = handler(
            "double",
            Signature::new(vec![TypeDesc::int()], vec![TypeDesc::int()]),
            |args: Vec<Value>| async move {
                let n = args[0].payload().as_int().unwrap_or_default();
                vec![Some(Value::new(n * 2))]
            },
        );

        let identity = Identity::of(f.as_ref());
        assert!(identity.as_str().starts_with("double(function.rs#"));

        let ctx = HttpContext::default();
        let out = f.call(&ctx, vec![Value::new(21i64)]).await;
        assert_eq!(out[0].as_ref().unwrap().payload().as_int(), Some(42));
    }
}
