//! Writing values and errors through an executor's producers.

use std::sync::Arc;

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;

use crate::codec::{accept_types, CodecError, Producer};
use crate::definition::MIME_ALL;
use crate::service::context::HttpContext;
use crate::service::errors::{status_of, ExecuteError, HttpError};
use crate::typing::Payload;

fn matches_range(range: &str, content_type: &str) -> bool {
    if range == MIME_ALL || range == content_type {
        return true;
    }
    match range.strip_suffix("/*") {
        Some(main) => content_type
            .split_once('/')
            .is_some_and(|(m, _)| m == main),
        None => false,
    }
}

/// Picks the producer for the client's most preferred acceptable type.
///
/// Falls back to the first producer when nothing matches or the Accept header is malformed.
pub fn select_producer<'a>(
    ctx: &HttpContext,
    producers: &'a [Arc<dyn Producer>],
) -> Option<&'a Arc<dyn Producer>> {
    let accepted = ctx
        .request()
        .and_then(|req| accept_types(&req.headers).ok())
        .unwrap_or_default();
    accepted
        .iter()
        .find_map(|range| {
            producers
                .iter()
                .find(|p| matches_range(range, p.content_type()))
        })
        .or_else(|| producers.first())
}

/// Encodes `payload` with a negotiated producer and writes it with `status`.
pub fn write_payload(
    ctx: &mut HttpContext,
    producers: &[Arc<dyn Producer>],
    status: StatusCode,
    payload: &Payload,
) -> Result<(), CodecError> {
    let Some(producer) = select_producer(ctx, producers) else {
        ctx.response_mut().write_header(status);
        return Ok(());
    };
    let body = producer.produce(payload)?;
    let content_type = HeaderValue::from_str(producer.content_type())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let response = ctx.response_mut();
    if !response.headers().contains_key(CONTENT_TYPE) {
        response.set_header(CONTENT_TYPE, content_type);
    }
    response.write_header(status);
    response.write(&body);
    Ok(())
}

/// Writes `err` to the client in a negotiated format.
///
/// The status comes from the error when it carries one, else 500.
pub fn write_error(
    ctx: &mut HttpContext,
    producers: &[Arc<dyn Producer>],
    err: &(dyn std::error::Error + Send + Sync + 'static),
) -> Result<(), ExecuteError> {
    let status = status_of(err);
    let body = Payload::error(HttpError::new(status, err.to_string()));
    write_payload(ctx, producers, status, &body)?;
    Ok(())
}
