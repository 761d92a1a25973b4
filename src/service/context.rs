//! Per-request context handed to inspectors, executors and collaborators.
//!
//! # Responsibilities
//! - Expose the inbound request head (method, content type, accept)
//! - Hold raw input values for generators (path, query, headers, body)
//! - Buffer the response until the pipeline finishes
//!
//! # Design Decisions
//! - One context per request, never shared across requests
//! - The status line commits once; later writes are ignored
//! - Body is buffered before dispatch so generators never block on I/O

use std::collections::HashMap;

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use bytes::{Bytes, BytesMut};

/// Raw request values read by parameter generators.
#[derive(Debug, Default, Clone)]
pub struct ValueContainer {
    path: HashMap<String, String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl ValueContainer {
    pub fn new(
        path: impl IntoIterator<Item = (String, String)>,
        query: Option<&str>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        let query = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self {
            path: path.into_iter().collect(),
            query,
            headers,
            body,
        }
    }

    pub fn path(&self, name: &str) -> Option<&str> {
        self.path.get(name).map(String::as_str)
    }

    /// First query value for `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First header value for `name`, if it is valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Buffered response written by destination handlers.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    /// True until a status code has been written.
    pub fn header_writable(&self) -> bool {
        self.status.is_none()
    }

    /// Commits the status line. Returns false if it was already committed.
    pub fn write_header(&mut self, status: StatusCode) -> bool {
        if self.status.is_some() {
            tracing::debug!(status = %status, "Superfluous status write ignored");
            return false;
        }
        self.status = Some(status);
        true
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Appends to the body, committing a 200 status if none was written.
    pub fn write(&mut self, data: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

/// Request-scoped context.
#[derive(Debug, Default)]
pub struct HttpContext {
    request: Option<Parts>,
    values: ValueContainer,
    response: ResponseWriter,
}

impl HttpContext {
    pub fn new(parts: Parts, body: Bytes, path_params: Vec<(String, String)>) -> Self {
        let values = ValueContainer::new(
            path_params,
            parts.uri.query(),
            parts.headers.clone(),
            body,
        );
        Self {
            request: Some(parts),
            values,
            response: ResponseWriter::default(),
        }
    }

    /// Context for an already-buffered request without path parameters.
    pub fn from_request(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body, Vec::new())
    }

    /// Adds a path parameter, as extracted by the URL router.
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.path.insert(name.into(), value.into());
        self
    }

    /// The inbound request, absent for a detached context.
    pub fn request(&self) -> Option<&Parts> {
        self.request.as_ref()
    }

    pub fn values(&self) -> &ValueContainer {
        &self.values
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    pub fn into_response(self) -> Response {
        self.response.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_container() {
        let request = Request::builder()
            .uri("http://example.com/users/7?verbose=true&tag=a&tag=b")
            .header("x-trace", "abc")
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        let ctx = HttpContext::from_request(request).with_path_param("id", "7");

        let values = ctx.values();
        assert_eq!(values.path("id"), Some("7"));
        assert_eq!(values.query("verbose"), Some("true"));
        assert_eq!(values.query("tag"), Some("a"));
        assert_eq!(values.query("missing"), None);
        assert_eq!(values.header("x-trace"), Some("abc"));
        assert_eq!(values.body().as_ref(), b"payload");
    }

    #[test]
    fn test_status_commits_once() {
        let mut writer = ResponseWriter::default();
        assert!(writer.header_writable());
        assert!(writer.write_header(StatusCode::CREATED));
        assert!(!writer.write_header(StatusCode::OK));
        assert_eq!(writer.status(), Some(StatusCode::CREATED));
        assert!(!writer.header_writable());
    }

    #[test]
    fn test_write_commits_ok() {
        let mut writer = ResponseWriter::default();
        writer.write(b"hello");
        assert_eq!(writer.status(), Some(StatusCode::OK));
        assert_eq!(writer.body(), b"hello");
    }

    #[test]
    fn test_detached_context() {
        let ctx = HttpContext::default();
        assert!(ctx.request().is_none());
    }
}
