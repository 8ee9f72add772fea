//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4)
//! - Buffer the body within the configured limit
//! - Parse JSON bodies for the dispatcher, keeping the raw text
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Only JSON content types are parsed; every other body is passed raw

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use mime_guess::mime::{self, Mime};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::HttpError;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// A buffered request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBody {
    /// Parsed value for JSON requests with a non-empty body.
    pub json: Option<Value>,
    pub raw: String,
}

/// Buffer at most `limit` bytes and parse them if the content type is JSON.
pub async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<ParsedBody, HttpError> {
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!(error = %e, limit, "Request body rejected");
        HttpError::new(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE")
    })?;

    let raw = String::from_utf8_lossy(&bytes).into_owned();
    let json = if is_json(headers) && !raw.trim().is_empty() {
        Some(serde_json::from_str(&raw).map_err(|e| {
            tracing::debug!(error = %e, "Malformed JSON body");
            HttpError::bad_request("INVALID_JSON")
        })?)
    } else {
        None
    };

    Ok(ParsedBody { json, raw })
}

/// `application/json`, any `+json` type, and `application/csp-report`.
fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Mime>().ok())
    else {
        return false;
    };

    content_type.type_() == mime::APPLICATION
        && (content_type.subtype() == mime::JSON
            || content_type.suffix().is_some_and(|suffix| suffix == mime::JSON)
            || content_type.subtype().as_str() == "csp-report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(&headers("application/json")));
        assert!(is_json(&headers("application/json; charset=utf-8")));
        assert!(is_json(&headers("application/vnd.api+json")));
        assert!(is_json(&headers("application/csp-report")));
        assert!(!is_json(&headers("text/plain")));
        assert!(!is_json(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn test_read_json_body() {
        let parsed = read_body(&headers("application/json"), Body::from(r#"{"a":1}"#), 1024)
            .await
            .unwrap();
        assert_eq!(parsed.json, Some(json!({"a": 1})));
        assert_eq!(parsed.raw, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_non_json_body_is_raw_only() {
        let parsed = read_body(&headers("text/plain"), Body::from("hello"), 1024)
            .await
            .unwrap();
        assert_eq!(parsed.json, None);
        assert_eq!(parsed.raw, "hello");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let err = read_body(&headers("application/json"), Body::from("{oops"), 1024)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_JSON");
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let err = read_body(&headers("application/json"), Body::from("[1,2,3,4,5]"), 4)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
