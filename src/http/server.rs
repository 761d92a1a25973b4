//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compile every route's definitions into one `Inspector` per path
//! - Create Axum Router with one dispatch route per path
//! - Wire up middleware (request ID, tracing, timeout)
//! - Buffer request bodies and run the selected executor
//! - Map negotiation and pipeline failures to HTTP status codes
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{RawPathParams, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use indexmap::IndexMap;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DispatchConfig;
use crate::definition::Definition;
use crate::http::request::{make_span, propagate_request_id, set_request_id};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::service::{DefinitionError, HttpContext, Inspector, Registry};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{}", definition_message(.path, .source))]
    Definition {
        path: String,
        source: DefinitionError,
    },

    #[error("route path {0:?} must start with '/'")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn definition_message(path: &str, source: &DefinitionError) -> String {
    if source.names_path() {
        source.to_string()
    } else {
        format!("invalid definition for path {path}: {source}")
    }
}

/// Per-route state injected into the dispatch handler.
#[derive(Clone)]
struct RouteState {
    inspector: Arc<Inspector>,
    max_body_bytes: usize,
}

/// HTTP server dispatching requests to compiled definitions.
pub struct HttpServer {
    router: Router,
    config: DispatchConfig,
}

impl HttpServer {
    /// Compiles `routes` against `registry`.
    ///
    /// Definitions sharing a path are merged. Any invalid definition fails
    /// the whole server.
    pub fn new<I>(
        config: DispatchConfig,
        registry: Arc<Registry>,
        routes: I,
    ) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = (String, Vec<Definition>)>,
    {
        let mut grouped: IndexMap<String, Vec<Definition>> = IndexMap::new();
        for (path, definitions) in routes {
            grouped.entry(path).or_default().extend(definitions);
        }

        let mut router = Router::new();
        for (path, definitions) in grouped {
            if !path.starts_with('/') {
                return Err(ServerError::InvalidPath(path));
            }
            let mut inspector = Inspector::new(path.clone(), registry.clone());
            for definition in &definitions {
                inspector
                    .add_definition(definition)
                    .map_err(|source| ServerError::Definition {
                        path: path.clone(),
                        source,
                    })?;
            }
            let state = RouteState {
                inspector: Arc::new(inspector),
                max_body_bytes: config.limits.max_body_bytes,
            };
            router = router.route(&path, any(dispatch).with_state(state));
        }

        let router = Self::build_router(&config, router);
        Ok(Self { router, config })
    }

    /// Wrap the routes with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DispatchConfig, routes: Router) -> Router {
        routes.layer(
            ServiceBuilder::new()
                .layer(set_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.limits.request_timeout_secs,
                )))
                .layer(propagate_request_id()),
        )
    }

    /// The fully layered router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Serve on `listener` until Ctrl+C or a message on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Selects an executor for the request and runs it.
async fn dispatch(
    State(state): State<RouteState>,
    params: RawPathParams,
    request: Request,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path_params: Vec<(String, String)> = params
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(error = %err, limit = state.max_body_bytes, "Failed to read request body");
            let status = StatusCode::PAYLOAD_TOO_LARGE;
            metrics::record_request(method.as_str(), status.as_u16(), start);
            return (status, "request body too large or unreadable").into_response();
        }
    };
    let mut ctx = HttpContext::new(parts, body, path_params);

    let executor = match state.inspector.inspect(&ctx) {
        Ok(executor) => executor,
        Err(err) => {
            tracing::debug!(path = %state.inspector.path(), error = %err, "No executor for request");
            metrics::record_negotiation_failure(err.reason());
            let status = err.status_code();
            metrics::record_request(method.as_str(), status.as_u16(), start);
            return (status, err.to_string()).into_response();
        }
    };

    let response = match executor.execute(&mut ctx).await {
        Ok(()) => ctx.into_response(),
        // The executor writes its own errors; this covers a failed write.
        Err(err) if ctx.response().header_writable() => {
            (err.status_code(), err.to_string()).into_response()
        }
        // The client already has a status line; keep what was written.
        Err(_) => ctx.into_response(),
    };
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Source;

    #[test]
    fn test_definition_error_names_path_once() {
        let err = ServerError::Definition {
            path: "/users".into(),
            source: DefinitionError::NoConsumes {
                method: "Get".into(),
                path: "/users".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "no consumes in definition Get of path /users"
        );

        let err = ServerError::Definition {
            path: "/users".into(),
            source: DefinitionError::NoParameterGenerator {
                param_source: Source::new("Cookie"),
            },
        };
        assert_eq!(
            err.to_string(),
            "invalid definition for path /users: no parameter generator for source Cookie"
        );
    }
}
