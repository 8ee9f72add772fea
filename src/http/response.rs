//! Response handling.
//!
//! # Responsibilities
//! - Turn a dispatch [`Reply`] into an HTTP response
//! - Apply the status override and headers set through the response handle
//! - Stream files without buffering them
//! - Map errors to `{"code": ...}` bodies and report unexpected ones
//!
//! # Design Decisions
//! - Only `HttpError` codes reach the client; everything else is a 500
//! - A reply without a body is 204 unless a handler chose a status

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use futures_util::stream;
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

use crate::config::ServerConfig;
use crate::dispatch::{FileStream, Redirect, Reply, ResponseHandle};
use crate::error::RouteError;

const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// Build the response for a successful dispatch.
pub fn reply_response(reply: Reply, handle: &ResponseHandle) -> Result<Response, RouteError> {
    let mut response = match reply {
        Reply::Json(Value::Null) | Reply::Empty => {
            handle.status().unwrap_or(StatusCode::NO_CONTENT).into_response()
        }
        Reply::Json(value) => {
            let mut response = Json(value).into_response();
            if let Some(status) = handle.status() {
                *response.status_mut() = status;
            }
            response
        }
        Reply::Redirect(redirect) => redirect_response(redirect)?,
        Reply::File(file) => {
            let mut response = file_response(file);
            if let Some(status) = handle.status() {
                *response.status_mut() = status;
            }
            response
        }
    };

    response.headers_mut().extend(handle.headers());
    Ok(response)
}

fn redirect_response(redirect: Redirect) -> Result<Response, RouteError> {
    let location = HeaderValue::from_str(&redirect.location)
        .map_err(|_| RouteError::internal(format!("invalid redirect location: {}", redirect.location)))?;
    Ok((redirect.status, [(header::LOCATION, location)]).into_response())
}

fn file_response(file: FileStream) -> Response {
    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let chunks = stream::unfold(Some(file.file), |state| async move {
        let mut file = state?;
        let mut buf = vec![0u8; FILE_CHUNK_SIZE];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok::<_, std::io::Error>(Bytes::from(buf)), Some(file)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "File stream aborted");
                Some((Err(e), None))
            }
        }
    });

    ([(header::CONTENT_TYPE, content_type)], Body::from_stream(chunks)).into_response()
}

/// Build the response for a failed dispatch.
///
/// The configured error handler sees every unexpected error and every
/// HTTP error with a 5xx status.
pub fn error_response(error: &RouteError, server: &ServerConfig) -> Response {
    let reportable = match error.as_http() {
        Some(http) => http.status.is_server_error(),
        None => {
            if server.debug {
                tracing::error!(error = %error, detail = ?error, "Unexpected error while handling request");
            } else {
                tracing::debug!(error = %error, "Unexpected error while handling request");
            }
            true
        }
    };

    if reportable {
        if let Some(handler) = &server.error_handler {
            handler.report(error);
        }
    }

    (error.status(), Json(json!({ "code": error.code() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ErrorHandler};
    use crate::error::HttpError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_reply() {
        let response = reply_response(Reply::Json(json!({"ok": true})), &ResponseHandle::new()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }

    #[test]
    fn test_empty_reply_respects_handle() {
        let handle = ResponseHandle::new();
        let response = reply_response(Reply::Empty, &handle).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        handle.set_status(StatusCode::ACCEPTED);
        handle.insert_header(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        );
        let response = reply_response(Reply::Json(Value::Null), &handle).unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[test]
    fn test_redirect_reply() {
        let response =
            reply_response(Reply::Redirect(Redirect::see_other("/done")), &ResponseHandle::new()).unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/done");
    }

    #[tokio::test]
    async fn test_error_response_and_reporting() {
        let reported = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reported);
        let config = Config::new("/srv/app")
            .with_error_handler(ErrorHandler::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .resolve();

        let response = error_response(&HttpError::not_found("NOT_FOUND").into(), &config.server);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"code": "NOT_FOUND"}));
        assert_eq!(reported.load(Ordering::SeqCst), 0);

        let response = error_response(&HttpError::new(StatusCode::BAD_GATEWAY, "UPSTREAM").into(), &config.server);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(reported.load(Ordering::SeqCst), 1);

        let response = error_response(&RouteError::internal("boom"), &config.server);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"code": "INTERNAL_SERVER_ERROR"}));
        assert_eq!(reported.load(Ordering::SeqCst), 2);
    }
}
