//! Error types for registration and request handling.

use axum::http::{self, StatusCode};
use thiserror::Error;

use crate::codec::{CodecError, MediaError};
use crate::definition::{Destination, Identity, Source};
use crate::service::checker::{ChainError, Ordinal};
use crate::typing::BoxError;

/// Registration-time failures. Fatal for the route being built.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("no http method for {method:?} in definition of path {path}")]
    NoMethod { method: String, path: String },

    #[error("no consumes in definition {method} of path {path}")]
    NoConsumes { method: String, path: String },

    #[error("no produces in definition {method} of path {path}")]
    NoProduces { method: String, path: String },

    #[error("no function in definition {method} of path {path}")]
    NoFunction { method: String, path: String },

    #[error("no consumer for content type {content_type} in definition {method} of path {path}")]
    NoConsumer {
        content_type: String,
        method: String,
        path: String,
    },

    #[error("no producer for content type {content_type} in definition {method} of path {path}")]
    NoProducer {
        content_type: String,
        method: String,
        path: String,
    },

    #[error("function {function} has {expected} parameters but {actual} are defined on path {path}")]
    UnmatchedParameters {
        function: Identity,
        expected: usize,
        actual: usize,
        path: String,
    },

    #[error("function {function} has {expected} results but {actual} are defined on path {path}")]
    UnmatchedResults {
        function: Identity,
        expected: usize,
        actual: usize,
        path: String,
    },

    #[error("no parameter generator for source {param_source}")]
    NoParameterGenerator { param_source: Source },

    #[error("no destination handler for destination {destination}")]
    NoDestinationHandler { destination: Destination },

    #[error("invalid {position} parameter of function {function}: {reason}")]
    InvalidParameter {
        position: Ordinal,
        function: Identity,
        #[source]
        reason: BoxError,
    },

    #[error("invalid operators for {position} parameter of function {function}: {error}")]
    ParameterOperators {
        position: Ordinal,
        function: Identity,
        #[source]
        error: ChainError,
    },

    #[error("invalid {position} result of function {function}: {reason}")]
    InvalidResult {
        position: Ordinal,
        function: Identity,
        #[source]
        reason: BoxError,
    },

    #[error("invalid operators for {position} result of function {function}: {error}")]
    ResultOperators {
        position: Ordinal,
        function: Identity,
        #[source]
        error: ChainError,
    },

    #[error("consumer {consumer} and producer {producer} conflict for method {method} of path {path}")]
    Conflict {
        consumer: String,
        producer: String,
        method: http::Method,
        path: String,
    },
}

impl DefinitionError {
    /// True when the message already names the route path.
    pub fn names_path(&self) -> bool {
        matches!(
            self,
            DefinitionError::NoMethod { .. }
                | DefinitionError::NoConsumes { .. }
                | DefinitionError::NoProduces { .. }
                | DefinitionError::NoFunction { .. }
                | DefinitionError::NoConsumer { .. }
                | DefinitionError::NoProducer { .. }
                | DefinitionError::UnmatchedParameters { .. }
                | DefinitionError::UnmatchedResults { .. }
                | DefinitionError::Conflict { .. }
        )
    }
}

/// Negotiation failures from [`Inspector::inspect`](crate::service::Inspector::inspect).
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("no request in context")]
    NoContext,

    #[error("no executor for method {method}")]
    NoExecutorForMethod { method: http::Method },

    #[error("no executor can consume content type {content_type}")]
    NoExecutorForContentType { content_type: String },

    #[error("no executor can produce any of {accept:?}")]
    NoExecutorToProduce { accept: Vec<String> },

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl InspectError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InspectError::NoContext => StatusCode::INTERNAL_SERVER_ERROR,
            InspectError::NoExecutorForMethod { .. } => StatusCode::METHOD_NOT_ALLOWED,
            InspectError::NoExecutorForContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            InspectError::NoExecutorToProduce { .. } => StatusCode::NOT_ACCEPTABLE,
            InspectError::Media(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            InspectError::NoContext => "no_context",
            InspectError::NoExecutorForMethod { .. } => "method",
            InspectError::NoExecutorForContentType { .. } => "content_type",
            InspectError::NoExecutorToProduce { .. } => "accept",
            InspectError::Media(_) => "malformed_header",
        }
    }
}

/// Pipeline failures from [`Executor::execute`](crate::service::Executor::execute).
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("no request in context")]
    NoContext,

    #[error("required field {name} in {param_source} but got empty")]
    RequiredField { name: String, param_source: Source },

    #[error("can't generate parameter {name}: {error}")]
    Generate {
        name: String,
        #[source]
        error: BoxError,
    },

    #[error("{kind} operator failed on parameter {name}: {error}")]
    ParameterOperator {
        name: String,
        kind: String,
        #[source]
        error: BoxError,
    },

    #[error("function {function} returned {actual} results, expected {expected}")]
    UnmatchedOutputs {
        function: Identity,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} operator failed on destination {destination}: {error}")]
    ResultOperator {
        destination: Destination,
        kind: String,
        #[source]
        error: BoxError,
    },

    #[error("{destination} handler failed: {error}")]
    Handler {
        destination: Destination,
        #[source]
        error: BoxError,
    },

    #[error("failed to write error response: {0}")]
    Write(#[from] CodecError),

    #[error("failed to release resource: {0}")]
    Release(#[source] BoxError),
}

impl ExecuteError {
    /// 400 for bad input, 500 for server faults. A carried [`HttpError`] wins.
    pub fn status_code(&self) -> StatusCode {
        if let Some(e) = self.carried() {
            return e.status;
        }
        match self {
            ExecuteError::RequiredField { .. }
            | ExecuteError::Generate { .. }
            | ExecuteError::ParameterOperator { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The error shown to the client: a carried [`HttpError`] as is, else `self`.
    pub fn client_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self.carried() {
            Some(e) => e,
            None => self,
        }
    }

    fn carried(&self) -> Option<&HttpError> {
        match self {
            ExecuteError::Generate { error, .. }
            | ExecuteError::ParameterOperator { error, .. }
            | ExecuteError::ResultOperator { error, .. }
            | ExecuteError::Handler { error, .. } => error.downcast_ref::<HttpError>(),
            _ => None,
        }
    }
}

/// An error value carrying its own status code.
///
/// Functions return it through an `Error` destination to choose the response status.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

/// Status code for an arbitrary error written to the client.
pub fn status_of(err: &(dyn std::error::Error + Send + Sync + 'static)) -> StatusCode {
    if let Some(e) = err.downcast_ref::<HttpError>() {
        e.status
    } else if let Some(e) = err.downcast_ref::<ExecuteError>() {
        e.status_code()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_of() {
        let e = HttpError::not_found("no such user");
        assert_eq!(status_of(&e), StatusCode::NOT_FOUND);

        let e = ExecuteError::RequiredField {
            name: "id".into(),
            param_source: Source::PATH,
        };
        assert_eq!(status_of(&e), StatusCode::BAD_REQUEST);
        assert_eq!(e.to_string(), "required field id in Path but got empty");

        let e = std::io::Error::other("disk");
        assert_eq!(status_of(&e), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_carried_http_error() {
        let e = ExecuteError::ResultOperator {
            destination: Destination::DATA,
            kind: "reject".into(),
            error: HttpError::bad_request("nope").into(),
        };
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.client_error().to_string(), "nope");

        let e = ExecuteError::Handler {
            destination: Destination::META,
            error: "broken header".into(),
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.client_error().to_string(), e.to_string());
    }

    #[test]
    fn test_inspect_status() {
        let e = InspectError::NoExecutorToProduce {
            accept: vec!["text/html".into()],
        };
        assert_eq!(e.status_code(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(e.reason(), "accept");
    }
}
