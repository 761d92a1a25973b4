//! Definition compilation and request dispatch.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Definition
//!     → compiler.rs (resolve codecs, bind generators/handlers)
//!     → checker.rs (operator chain types)
//!     → inspector.rs (conflict check, group by HTTP method)
//!
//! Per request:
//!     HttpContext
//!     → Inspector::inspect (method → content type → accept)
//!     → Executor::execute
//!         → generator.rs (one value per parameter)
//!         → Function::call
//!         → handler.rs (results in priority order)
//!     → ResponseWriter
//! ```
//!
//! # Design Decisions
//! - Every check that can run at registration does; executors are immutable
//! - Collaborators come from an injected `Registry`, no global state
//! - Pipeline failures are written to the client through the executor's producers
//! - Release hooks run on every exit path, including cancellation

pub mod checker;
pub mod compiler;
pub mod context;
pub mod errors;
pub mod executor;
pub mod generator;
pub mod handler;
pub mod inspector;
pub mod registry;
pub mod response;

pub use checker::{check_chain, ChainError, Ordinal};
pub use compiler::compile;
pub use context::{HttpContext, ResponseWriter, ValueContainer};
pub use errors::{DefinitionError, ExecuteError, HttpError, InspectError};
pub use executor::Executor;
pub use generator::{BodyGenerator, ParameterGenerator, TextGenerator};
pub use handler::{DataHandler, DestinationHandler, ErrorHandler, MetaHandler};
pub use inspector::Inspector;
pub use registry::Registry;
