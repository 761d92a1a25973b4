//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one route per definition path)
//!     → request.rs (request ID, tracing span)
//!     → body buffered up to limits.max_body_bytes
//!     → service::Inspector (select executor)
//!     → service::Executor (run pipeline, buffer response)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
