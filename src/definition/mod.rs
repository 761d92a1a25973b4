//! Declarative endpoint definitions.
//!
//! # Data Flow
//! ```text
//! Definition (method, consumes, produces, function, parameters, outputs)
//!     → service::inspector compiles it into an Executor
//!     → executors grouped per HTTP method under one path
//! ```
//!
//! # Design Decisions
//! - Definitions are plain data; nothing is validated until compilation
//! - Sources and destinations are open string keys resolved in a registry
//! - Callables and operators are trait objects with declared types

pub mod function;
pub mod operator;
pub mod types;

pub use function::{handler, FnHandler, Function, Identity, Signature};
pub use operator::{operator, FnOperator, Operator};
pub use types::{Definition, Destination, Method, Output, Parameter, Source, MIME_ALL};
