//! Executors for one URL path, grouped by HTTP method.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::http;

use crate::codec::{accept_types, content_type};
use crate::definition::{Definition, MIME_ALL};
use crate::observability::metrics;
use crate::service::compiler::compile;
use crate::service::context::HttpContext;
use crate::service::errors::{DefinitionError, InspectError};
use crate::service::executor::Executor;
use crate::service::registry::Registry;

/// Owns the compiled executors of one path and picks one per request.
///
/// Built with `&mut self` during startup, then shared read-only.
pub struct Inspector {
    path: String,
    registry: Arc<Registry>,
    executors: HashMap<http::Method, Vec<Executor>>,
}

impl Inspector {
    pub fn new(path: impl Into<String>, registry: Arc<Registry>) -> Self {
        Self {
            path: path.into(),
            registry,
            executors: HashMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP methods with at least one executor.
    pub fn methods(&self) -> impl Iterator<Item = &http::Method> {
        self.executors.keys()
    }

    /// Executors registered for `method`, in registration order.
    pub fn executors(&self, method: &http::Method) -> &[Executor] {
        self.executors.get(method).map_or(&[], Vec::as_slice)
    }

    /// Compiles `definition` and registers it unless it conflicts.
    pub fn add_definition(&mut self, definition: &Definition) -> Result<(), DefinitionError> {
        let executor = compile(&self.registry, &self.path, definition).inspect_err(|err| {
            tracing::error!(path = %self.path, error = %err, "Failed to compile definition");
        })?;

        let registered = self.executors.entry(executor.method().clone()).or_default();
        conflict_check(&self.path, registered, &executor).inspect_err(|err| {
            tracing::error!(path = %self.path, error = %err, "Conflicting definition");
        })?;

        tracing::info!(
            path = %self.path,
            method = %executor.method(),
            function = %executor.identity(),
            "Registered executor"
        );
        metrics::record_executor_registered(executor.method().as_str());
        registered.push(executor);
        Ok(())
    }

    /// Selects the executor serving the request in `ctx`.
    pub fn inspect(&self, ctx: &HttpContext) -> Result<&Executor, InspectError> {
        let request = ctx.request().ok_or(InspectError::NoContext)?;
        let candidates = self
            .executors
            .get(&request.method)
            .filter(|list| !list.is_empty())
            .ok_or_else(|| InspectError::NoExecutorForMethod {
                method: request.method.clone(),
            })?;

        let ct = content_type(&request.headers)?;
        let consumable: Vec<&Executor> = candidates
            .iter()
            .filter(|e| e.acceptable(&ct))
            .collect();
        if consumable.is_empty() {
            return Err(InspectError::NoExecutorForContentType { content_type: ct });
        }

        let accept = accept_types(&request.headers)?;
        if let Some(executor) = consumable.iter().copied().find(|e| e.producible(&accept)) {
            return Ok(executor);
        }
        if accept.iter().any(|a| a == MIME_ALL) {
            return Ok(consumable[0]);
        }
        Err(InspectError::NoExecutorToProduce { accept })
    }
}

/// Rejects `executor` when it serves a (consumer, producer) pair that none of
/// the already registered executors serve.
fn conflict_check(
    path: &str,
    registered: &[Executor],
    executor: &Executor,
) -> Result<(), DefinitionError> {
    if registered.is_empty() {
        return Ok(());
    }
    let known: HashSet<(&str, &str)> = registered.iter().flat_map(Executor::pairs).collect();
    match executor.pairs().find(|pair| !known.contains(pair)) {
        Some((consumer, producer)) => Err(DefinitionError::Conflict {
            consumer: consumer.to_string(),
            producer: producer.to_string(),
            method: executor.method().clone(),
            path: path.to_string(),
        }),
        None => Ok(()),
    }
}
