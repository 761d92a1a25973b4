//! Runtime type model shared by definitions, codecs and the pipeline.
//!
//! # Data Flow
//! ```text
//! Definition (declares TypeDesc per argument/return/operator)
//!     → service::checker (structural assignability at registration)
//!     → generators/consumers (produce Payload for a target TypeDesc)
//!     → Value (Payload + optional release hook) flows through the pipeline
//! ```
//!
//! # Design Decisions
//! - Types are checked once at registration; values are trusted at runtime
//! - Concrete types compare by name and representation
//! - Interfaces are capability sets; a concrete type satisfies an interface
//!   when it provides every required capability
//! - Nullable types have no zero value, so a missing input stays nil

pub mod types;
pub mod value;

pub use types::{Repr, TypeDesc};
pub use value::{BoxError, ConvertError, Payload, Release, Value};
