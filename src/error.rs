//! Error types.
//!
//! # Taxonomy
//! - [`LoadError`]: fatal, raised while building the route table. Bootstrap aborts.
//! - [`HttpError`]: expected request-time failure carrying a status and a code.
//! - [`RouteError`]: anything a handler or the dispatcher can fail with.
//!
//! # Design Decisions
//! - Load errors are never retried; the operator fixes the routes and restarts
//! - Only [`HttpError`] reaches the client verbatim; everything else is a 500

use std::path::PathBuf;

use axum::http::StatusCode;

/// Code sent for every failure that is not an [`HttpError`].
pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

/// A typed HTTP failure: status plus a machine-readable code.
///
/// The hosting layer turns it into `{"code": <code>}` with `status`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {code}")]
pub struct HttpError {
    pub status: StatusCode,
    pub code: String,
}

impl HttpError {
    pub fn new(status: StatusCode, code: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
        }
    }

    pub fn bad_request(code: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code)
    }

    pub fn unauthorized(code: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code)
    }

    pub fn forbidden(code: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code)
    }

    pub fn not_found(code: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code)
    }

    pub fn conflict(code: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code)
    }

    pub fn unprocessable(code: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code)
    }

    pub fn internal(code: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code)
    }
}

/// Failure raised while dispatching a request.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl RouteError {
    /// Wrap any message as an unexpected failure.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        RouteError::Internal(message.to_string())
    }

    /// The typed HTTP error, if this is one.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            RouteError::Http(e) => Some(e),
            _ => None,
        }
    }

    /// Status the client will observe.
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::Http(e) => e.status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Code the client will observe.
    pub fn code(&self) -> &str {
        match self {
            RouteError::Http(e) => &e.code,
            _ => INTERNAL_SERVER_ERROR,
        }
    }
}

/// Fatal error raised while building the route table.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("The routes directory does not exist: \"{}\"", .0.display())]
    RoutesDirectoryMissing(PathBuf),

    #[error("Failed to read routes directory \"{}\": {source}", path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid route exclusion pattern \"{pattern}\": {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Route file \"{file}\" has no registered module")]
    ModuleNotRegistered { file: String },

    #[error("Endpoint \"{key}\" in route \"{file}\" must be formatted as \"<METHOD> <path>\"")]
    MalformedEndpointKey { file: String, key: String },

    #[error(
        "Endpoint \"{key}\" in route \"{file}\" does not start with a valid request type (GET, POST, PUT, PATCH, DELETE or ANY)"
    )]
    InvalidMethod { file: String, key: String },

    #[error("Invalid route pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_surface() {
        let err = RouteError::from(HttpError::not_found("NOT_FOUND"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.as_http().is_some());

        let err = RouteError::internal("boom");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), INTERNAL_SERVER_ERROR);
        assert!(err.as_http().is_none());
    }

    #[test]
    fn test_load_error_names_file_and_key() {
        let err = LoadError::InvalidMethod {
            file: "users.rs".into(),
            key: "FOO /bar".into(),
        };
        let message = err.to_string();
        assert!(message.contains("users.rs"));
        assert!(message.contains("FOO /bar"));
    }
}
