//! Declarative HTTP request dispatch.
//!
//! Endpoint definitions are compiled into validated executors at startup;
//! each request is negotiated to one executor, which generates arguments,
//! calls the bound function and writes its results.

// Dispatch core
pub mod codec;
pub mod definition;
pub mod service;
pub mod typing;

// Serving
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::DispatchConfig;
pub use definition::{Definition, Output, Parameter};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use service::{Executor, HttpContext, Inspector, Registry};
