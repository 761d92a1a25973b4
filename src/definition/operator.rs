//! Typed transformation steps applied to parameters and results.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;

use crate::service::context::HttpContext;
use crate::typing::{BoxError, TypeDesc, Value};

/// A single transformation step with declared input and output types.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Short label used in logs, e.g. `validator` or `converter`.
    fn kind(&self) -> &str;

    fn input(&self) -> &TypeDesc;

    fn output(&self) -> &TypeDesc;

    /// Transforms `value`; `field` names the parameter or destination being processed.
    async fn operate(
        &self,
        ctx: &HttpContext,
        field: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>, BoxError>;
}

/// Adapts a synchronous closure into an [`Operator`].
pub struct FnOperator<F> {
    kind: Cow<'static, str>,
    input: TypeDesc,
    output: TypeDesc,
    f: F,
}

#[async_trait]
impl<F> Operator for FnOperator<F>
where
    F: Fn(&str, Option<Value>) -> Result<Option<Value>, BoxError> + Send + Sync,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    fn input(&self) -> &TypeDesc {
        &self.input
    }

    fn output(&self) -> &TypeDesc {
        &self.output
    }

    async fn operate(
        &self,
        _ctx: &HttpContext,
        field: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>, BoxError> {
        (self.f)(field, value)
    }
}

pub fn operator<F>(
    kind: impl Into<Cow<'static, str>>,
    input: TypeDesc,
    output: TypeDesc,
    f: F,
) -> Arc<dyn Operator>
where
    F: Fn(&str, Option<Value>) -> Result<Option<Value>, BoxError> + Send + Sync + 'static,
{
    Arc::new(FnOperator {
        kind: kind.into(),
        input,
        output,
        f,
    })
}
