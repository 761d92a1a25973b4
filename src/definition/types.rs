//! Definition data types.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use axum::http::{self, StatusCode};

use crate::definition::function::Function;
use crate::definition::operator::Operator;
use crate::typing::Payload;

/// Content type matching every registered consumer or producer.
pub const MIME_ALL: &str = "*/*";

/// Declarative verbs and their HTTP mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    List,
    Get,
    Create,
    Update,
    Patch,
    Delete,
}

impl Method {
    /// Case-insensitive lookup of a declarative verb.
    pub fn parse(name: &str) -> Option<Self> {
        let method = match name.to_ascii_lowercase().as_str() {
            "list" => Method::List,
            "get" => Method::Get,
            "create" => Method::Create,
            "update" => Method::Update,
            "patch" => Method::Patch,
            "delete" => Method::Delete,
            _ => return None,
        };
        Some(method)
    }

    pub fn http_method(self) -> http::Method {
        match self {
            Method::List | Method::Get => http::Method::GET,
            Method::Create => http::Method::POST,
            Method::Update => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
        }
    }

    /// Status written when no result handler sets one.
    pub fn default_status(self) -> StatusCode {
        match self {
            Method::Create => StatusCode::CREATED,
            Method::Delete => StatusCode::NO_CONTENT,
            _ => StatusCode::OK,
        }
    }
}

/// Where a parameter value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source(Cow<'static, str>);

impl Source {
    pub const PATH: Source = Source(Cow::Borrowed("Path"));
    pub const QUERY: Source = Source(Cow::Borrowed("Query"));
    pub const HEADER: Source = Source(Cow::Borrowed("Header"));
    pub const BODY: Source = Source(Cow::Borrowed("Body"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a result value goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination(Cow<'static, str>);

impl Destination {
    pub const META: Destination = Destination(Cow::Borrowed("Meta"));
    pub const DATA: Destination = Destination(Cow::Borrowed("Data"));
    pub const ERROR: Destination = Destination(Cow::Borrowed("Error"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Describes one argument of the callable.
#[derive(Clone)]
pub struct Parameter {
    pub source: Source,
    pub name: String,
    pub default: Option<Payload>,
    pub operators: Vec<Arc<dyn Operator>>,
}

impl Parameter {
    pub fn new(source: Source, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            default: None,
            operators: Vec::new(),
        }
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(Source::PATH, name)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(Source::QUERY, name)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(Source::HEADER, name)
    }

    pub fn body() -> Self {
        Self::new(Source::BODY, "")
    }

    pub fn default(mut self, value: impl Into<Payload>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn operator(mut self, op: Arc<dyn Operator>) -> Self {
        self.operators.push(op);
        self
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("source", &self.source)
            .field("name", &self.name)
            .field("default", &self.default)
            .field("operators", &self.operators.len())
            .finish()
    }
}

/// Describes one return value of the callable.
#[derive(Clone)]
pub struct Output {
    pub destination: Destination,
    pub operators: Vec<Arc<dyn Operator>>,
}

impl Output {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            operators: Vec::new(),
        }
    }

    pub fn meta() -> Self {
        Self::new(Destination::META)
    }

    pub fn data() -> Self {
        Self::new(Destination::DATA)
    }

    pub fn error() -> Self {
        Self::new(Destination::ERROR)
    }

    pub fn operator(mut self, op: Arc<dyn Operator>) -> Self {
        self.operators.push(op);
        self
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("destination", &self.destination)
            .field("operators", &self.operators.len())
            .finish()
    }
}

/// One endpoint: a callable bound to a method and content types.
#[derive(Clone, Default)]
pub struct Definition {
    /// Declarative verb, e.g. `Get` or `Create`.
    pub method: String,
    /// Accepted request content types, `*/*` for all.
    pub consumes: Vec<String>,
    /// Producible response content types, `*/*` for all.
    pub produces: Vec<String>,
    pub function: Option<Arc<dyn Function>>,
    pub parameters: Vec<Parameter>,
    pub results: Vec<Output>,
}

impl Definition {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Default::default()
        }
    }

    pub fn consumes<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumes.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn produces<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn function(mut self, function: Arc<dyn Function>) -> Self {
        self.function = Some(function);
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn result(mut self, output: Output) -> Self {
        self.results.push(output);
        self
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("method", &self.method)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("function", &self.function.as_ref().map(|func| func.name().to_string()))
            .field("parameters", &self.parameters)
            .field("results", &self.results)
            .finish()
    }
}
