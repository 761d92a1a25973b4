//! Content-Type and Accept header parsing.

use axum::http::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use thiserror::Error;

use crate::codec::MIME_OCTET_STREAM;
use crate::definition::MIME_ALL;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("malformed {header} header: {value:?}")]
    Malformed { header: &'static str, value: String },

    #[error("multiple {header} headers")]
    Multiple { header: &'static str },
}

/// Parses `type/subtype` (parameters stripped), lowercased.
fn media_type(raw: &str) -> Option<String> {
    let essence = raw.split(';').next().unwrap_or_default().trim();
    let (main, sub) = essence.split_once('/')?;
    let valid = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+*".contains(c))
    };
    if !valid(main) || !valid(sub) {
        return None;
    }
    Some(essence.to_ascii_lowercase())
}

/// The request's content type. Missing headers default to `application/octet-stream`.
pub fn content_type(headers: &HeaderMap) -> Result<String, MediaError> {
    let mut values = headers.get_all(CONTENT_TYPE).iter();
    let Some(value) = values.next() else {
        return Ok(MIME_OCTET_STREAM.to_string());
    };
    if values.next().is_some() {
        return Err(MediaError::Multiple {
            header: "Content-Type",
        });
    }
    let malformed = || MediaError::Malformed {
        header: "Content-Type",
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };
    let raw = value.to_str().map_err(|_| malformed())?;
    if raw.trim().is_empty() {
        return Ok(MIME_OCTET_STREAM.to_string());
    }
    if raw.contains(',') {
        return Err(malformed());
    }
    media_type(raw).ok_or_else(malformed)
}

/// Accepted types ordered by preference (q-value descending, stable).
///
/// An absent or empty Accept header accepts everything. Types with `q=0` are dropped.
pub fn accept_types(headers: &HeaderMap) -> Result<Vec<String>, MediaError> {
    let mut accepted: Vec<(String, f32)> = Vec::new();
    for value in headers.get_all(ACCEPT) {
        let malformed = || MediaError::Malformed {
            header: "Accept",
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        let raw = value.to_str().map_err(|_| malformed())?;
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let ty = media_type(item).ok_or_else(malformed)?;
            let mut q = 1.0f32;
            for param in item.split(';').skip(1) {
                if let Some((key, val)) = param.split_once('=') {
                    if key.trim().eq_ignore_ascii_case("q") {
                        q = val
                            .trim()
                            .parse()
                            .ok()
                            .filter(|q| (0.0..=1.0).contains(q))
                            .ok_or_else(malformed)?;
                    }
                }
            }
            if q > 0.0 {
                accepted.push((ty, q));
            }
        }
    }
    if accepted.is_empty() {
        return Ok(vec![MIME_ALL.to_string()]);
    }
    // sort_by is stable, so equal q-values keep header order.
    accepted.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(accepted.into_iter().map(|(ty, _)| ty).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: axum::http::header::HeaderName, values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(name.clone(), HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn test_content_type() {
        let h = headers(CONTENT_TYPE, &["Application/JSON; charset=utf-8"]);
        assert_eq!(content_type(&h).unwrap(), "application/json");

        assert_eq!(content_type(&HeaderMap::new()).unwrap(), MIME_OCTET_STREAM);

        let h = headers(CONTENT_TYPE, &["json"]);
        assert!(matches!(content_type(&h), Err(MediaError::Malformed { .. })));

        let h = headers(CONTENT_TYPE, &["text/plain", "application/json"]);
        assert_eq!(
            content_type(&h),
            Err(MediaError::Multiple {
                header: "Content-Type"
            })
        );

        let h = headers(CONTENT_TYPE, &["text/plain, application/json"]);
        assert!(content_type(&h).is_err());
    }

    #[test]
    fn test_accept_ordering() {
        let h = headers(
            ACCEPT,
            &["text/plain;q=0.5, application/json, text/html;q=0.9, */*;q=0.1"],
        );
        assert_eq!(
            accept_types(&h).unwrap(),
            vec!["application/json", "text/html", "text/plain", "*/*"]
        );
    }

    #[test]
    fn test_accept_defaults_and_errors() {
        assert_eq!(accept_types(&HeaderMap::new()).unwrap(), vec!["*/*"]);

        let h = headers(ACCEPT, &["text/plain;q=0"]);
        assert_eq!(accept_types(&h).unwrap(), vec!["*/*"]);

        let h = headers(ACCEPT, &["text/plain;q=2"]);
        assert!(accept_types(&h).is_err());

        let h = headers(ACCEPT, &["nonsense"]);
        assert!(accept_types(&h).is_err());
    }

    #[test]
    fn test_accept_multiple_headers() {
        let h = headers(ACCEPT, &["text/plain", "application/json"]);
        assert_eq!(
            accept_types(&h).unwrap(),
            vec!["text/plain", "application/json"]
        );
    }
}
