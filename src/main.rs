//! Declarative dispatch server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ service::Inspector ──▶ service::Executor
//!                     (request id,     (method, content      (generators,
//!                      trace, limits)   type, accept)          function, handlers)
//!                                                                   │
//!     Client Response                                               │
//!     ◀────────────────────────── ResponseWriter ◀──────────────────┘
//!
//!     Cross-cutting: config (TOML + CLI), observability (tracing, metrics),
//!                    lifecycle (graceful shutdown)
//! ```
//!
//! Serves a small set of built-in demo endpoints; embedders build their own
//! `HttpServer` from the library with their own definitions.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use route_dispatch::config::{load_config, DispatchConfig};
use route_dispatch::definition::{handler, operator, Definition, Output, Parameter, Signature};
use route_dispatch::observability::{logging, metrics};
use route_dispatch::service::{HttpError, Registry};
use route_dispatch::typing::{Payload, TypeDesc, Value};
use route_dispatch::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "route-dispatch")]
#[command(about = "Serve declarative endpoint definitions over HTTP", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "route-dispatch starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.limits.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(Registry::with_defaults());
    let server = HttpServer::new(config.clone(), registry, demo_routes())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_routes() -> Vec<(String, Vec<Definition>)> {
    let greet = handler(
        "greet",
        Signature::new(
            vec![TypeDesc::string(), TypeDesc::string()],
            vec![TypeDesc::string()],
        ),
        |args: Vec<Value>| async move {
            let name = args[0].payload().as_str().unwrap_or_default();
            let salutation = args[1].payload().as_str().unwrap_or_default();
            vec![Some(Value::new(format!("{salutation}, {name}!")))]
        },
    );

    let sum = handler(
        "sum",
        Signature::new(
            vec![TypeDesc::int(), TypeDesc::int()],
            vec![TypeDesc::json("Headers"), TypeDesc::json("Sum")],
        ),
        |args: Vec<Value>| async move {
            let a = args[0].payload().as_int().unwrap_or_default();
            let b = args[1].payload().as_int().unwrap_or_default();
            vec![
                Some(Value::new(json!({"x-operands": 2}))),
                Some(Value::new(json!({"sum": a.saturating_add(b)}))),
            ]
        },
    );

    let object_only = operator(
        "object",
        TypeDesc::json("Document"),
        TypeDesc::json("Document"),
        |_, value| match value {
            Some(v) if matches!(v.payload(), Payload::Json(serde_json::Value::Object(_))) => {
                Ok(Some(v))
            }
            Some(_) => Err(HttpError::new(
                axum::http::StatusCode::UNPROCESSABLE_ENTITY,
                "body must be a json object",
            )
            .into()),
            None => Ok(None),
        },
    );
    let echo = handler(
        "echo",
        Signature::new(
            vec![TypeDesc::json("Document")],
            vec![TypeDesc::json("Document"), TypeDesc::error()],
        ),
        |mut args: Vec<Value>| async move { vec![args.pop(), None] },
    );

    vec![
        (
            "/greetings/{name}".to_string(),
            vec![Definition::new("Get")
                .consumes(["*/*"])
                .produces(["text/plain", "application/json"])
                .function(greet)
                .parameter(Parameter::path("name"))
                .parameter(Parameter::header("x-salutation").default("Hello"))
                .result(Output::data())],
        ),
        (
            "/sum".to_string(),
            vec![Definition::new("List")
                .consumes(["*/*"])
                .produces(["application/json"])
                .function(sum)
                .parameter(Parameter::query("a"))
                .parameter(Parameter::query("b"))
                .result(Output::meta())
                .result(Output::data())],
        ),
        (
            "/echo".to_string(),
            vec![Definition::new("Create")
                .consumes(["application/json"])
                .produces(["application/json"])
                .function(echo)
                .parameter(Parameter::body().operator(object_only))
                .result(Output::data())
                .result(Output::error())],
        ),
    ]
}
