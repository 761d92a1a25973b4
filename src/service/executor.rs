//! The per-request execution pipeline of one compiled definition.

use std::fmt;
use std::sync::Arc;

use axum::http::{self, StatusCode};

use crate::codec::{Consumer, Producer};
use crate::definition::{Destination, Function, Identity, Operator, Source};
use crate::service::context::HttpContext;
use crate::service::errors::ExecuteError;
use crate::service::generator::ParameterGenerator;
use crate::service::handler::DestinationHandler;
use crate::service::response::write_error;
use crate::typing::{BoxError, Payload, Release, TypeDesc, Value};

/// A parameter bound to its generator and operator chain.
pub(crate) struct BoundParameter {
    pub(crate) name: String,
    pub(crate) source: Source,
    /// Type the generator produces; the first operator's input when operators exist.
    pub(crate) target: TypeDesc,
    pub(crate) default: Option<Payload>,
    pub(crate) generator: Arc<dyn ParameterGenerator>,
    pub(crate) operators: Vec<Arc<dyn Operator>>,
}

/// A callable output bound to its destination handler.
pub(crate) struct BoundResult {
    /// Position in the callable's outputs.
    pub(crate) index: usize,
    pub(crate) destination: Destination,
    pub(crate) handler: Arc<dyn DestinationHandler>,
    pub(crate) operators: Vec<Arc<dyn Operator>>,
}

/// A validated, immutable handler for one definition.
///
/// Holds no request state, so one executor serves concurrent requests.
pub struct Executor {
    pub(crate) method: http::Method,
    pub(crate) code: StatusCode,
    pub(crate) identity: Identity,
    pub(crate) consumers: Vec<Arc<dyn Consumer>>,
    pub(crate) producers: Vec<Arc<dyn Producer>>,
    pub(crate) parameters: Vec<BoundParameter>,
    pub(crate) results: Vec<BoundResult>,
    pub(crate) function: Arc<dyn Function>,
}

impl Executor {
    pub fn method(&self) -> &http::Method {
        &self.method
    }

    /// Status written when no handler commits one.
    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn consumer_types(&self) -> impl Iterator<Item = &str> {
        self.consumers.iter().map(|c| c.content_type())
    }

    pub fn producer_types(&self) -> impl Iterator<Item = &str> {
        self.producers.iter().map(|p| p.content_type())
    }

    pub fn acceptable(&self, content_type: &str) -> bool {
        self.consumer_types().any(|ct| ct == content_type)
    }

    /// True if any producer's content type is in `accept`.
    pub fn producible(&self, accept: &[String]) -> bool {
        self.producer_types()
            .any(|ct| accept.iter().any(|a| a == ct))
    }

    /// Every (consumer, producer) content type pair this executor serves.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.consumer_types()
            .flat_map(move |c| self.producer_types().map(move |p| (c, p)))
    }

    /// Runs the pipeline against `ctx`.
    ///
    /// Release hooks collected along the way run in reverse order before
    /// this returns, whatever the outcome.
    pub async fn execute(&self, ctx: &mut HttpContext) -> Result<(), ExecuteError> {
        if ctx.request().is_none() {
            return Err(ExecuteError::NoContext);
        }
        let mut scope = ReleaseScope::default();
        let outcome = self.run(ctx, &mut scope).await;
        if let Err(err) = &outcome {
            tracing::warn!(function = %self.identity, error = %err, "Pipeline failed");
            if ctx.response().header_writable() {
                if let Err(write_err) = write_error(ctx, &self.producers, err.client_error()) {
                    tracing::warn!(error = %write_err, "Failed to write pipeline error");
                }
            }
        }
        scope.finish(outcome)
    }

    async fn run(
        &self,
        ctx: &mut HttpContext,
        scope: &mut ReleaseScope,
    ) -> Result<(), ExecuteError> {
        let mut args = Vec::with_capacity(self.parameters.len());
        for param in &self.parameters {
            match self.generate(ctx, param, scope).await {
                Ok(value) => args.push(value),
                Err(err) => {
                    tracing::debug!(
                        function = %self.identity,
                        parameter = %param.name,
                        error = %err,
                        "Rejecting request"
                    );
                    return write_error(ctx, &self.producers, err.client_error());
                }
            }
        }

        let mut outputs = self.function.call(ctx, args).await;
        // Outputs skipped by a halt or an error still get released.
        for value in outputs.iter_mut() {
            scope.defer(value);
        }
        if outputs.len() != self.results.len() {
            return Err(ExecuteError::UnmatchedOutputs {
                function: self.identity.clone(),
                expected: self.results.len(),
                actual: outputs.len(),
            });
        }

        for result in &self.results {
            let mut value = outputs[result.index].take();
            for op in &result.operators {
                value = op
                    .operate(ctx, result.destination.as_str(), value)
                    .await
                    .map_err(|error| ExecuteError::ResultOperator {
                        destination: result.destination.clone(),
                        kind: op.kind().to_string(),
                        error,
                    })?;
                scope.defer(&mut value);
            }
            let goon = result
                .handler
                .handle(ctx, &self.producers, self.code, value)
                .await
                .map_err(|error| ExecuteError::Handler {
                    destination: result.destination.clone(),
                    error,
                })?;
            if !goon {
                break;
            }
        }

        let response = ctx.response_mut();
        if response.header_writable() {
            response.write_header(self.code);
        }
        Ok(())
    }

    /// Produces one argument: generate, fall back to default or zero, then operate.
    async fn generate(
        &self,
        ctx: &HttpContext,
        param: &BoundParameter,
        scope: &mut ReleaseScope,
    ) -> Result<Value, ExecuteError> {
        let mut value = param
            .generator
            .generate(ctx, ctx.values(), &self.consumers, &param.name, &param.target)
            .await
            .map_err(|error| ExecuteError::Generate {
                name: param.name.clone(),
                error,
            })?;
        scope.defer(&mut value);
        if value.is_none() {
            value = param
                .default
                .clone()
                .or_else(|| param.target.zero())
                .map(Value::new);
        }
        for op in &param.operators {
            value = op
                .operate(ctx, &param.name, value)
                .await
                .map_err(|error| ExecuteError::ParameterOperator {
                    name: param.name.clone(),
                    kind: op.kind().to_string(),
                    error,
                })?;
            scope.defer(&mut value);
        }
        value.ok_or_else(|| ExecuteError::RequiredField {
            name: param.name.clone(),
            param_source: param.source.clone(),
        })
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("method", &self.method)
            .field("code", &self.code)
            .field("function", &self.identity)
            .field("consumes", &self.consumer_types().collect::<Vec<_>>())
            .field("produces", &self.producer_types().collect::<Vec<_>>())
            .field("parameters", &self.parameters.len())
            .field("results", &self.results.len())
            .finish()
    }
}

/// Release hooks collected during one execution.
///
/// Hooks run last-in first-out, each at most once. If the pipeline future is
/// dropped before finishing, pending hooks run on drop.
#[derive(Default)]
struct ReleaseScope {
    hooks: Vec<Release>,
}

impl ReleaseScope {
    /// Takes ownership of the value's release hook, if any.
    fn defer(&mut self, value: &mut Option<Value>) {
        if let Some(hook) = value.as_mut().and_then(Value::take_release) {
            self.hooks.push(hook);
        }
    }

    /// Runs every hook; the first release failure replaces a successful outcome.
    fn finish(mut self, outcome: Result<(), ExecuteError>) -> Result<(), ExecuteError> {
        let mut outcome = outcome;
        while let Some(hook) = self.hooks.pop() {
            if let Err(err) = hook.run() {
                tracing::warn!(error = %err, "Failed to release resource");
                if outcome.is_ok() {
                    outcome = Err(ExecuteError::Release(err));
                }
            }
        }
        outcome
    }

    fn release_all(&mut self) -> Vec<BoxError> {
        let mut errors = Vec::new();
        while let Some(hook) = self.hooks.pop() {
            if let Err(err) = hook.run() {
                errors.push(err);
            }
        }
        errors
    }
}

impl Drop for ReleaseScope {
    fn drop(&mut self) {
        for err in self.release_all() {
            tracing::warn!(error = %err, "Failed to release resource of cancelled request");
        }
    }
}
