//! Dispatch results.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::RouteError;
use crate::routing::HandlerResult;

/// What a handler chain produced. The hosting layer matches on the variant.
#[derive(Debug)]
pub enum Reply {
    /// Serialized as the response body; `Null` means no body.
    Json(Value),
    Redirect(Redirect),
    /// An open file, streamed and closed by the hosting layer.
    File(FileStream),
    Empty,
}

impl Reply {
    /// Serialize any value into a [`Reply::Json`].
    pub fn json<T: Serialize>(value: T) -> HandlerResult {
        Ok(Reply::Json(serde_json::to_value(value)?))
    }

    /// JSON view a client would observe for this reply.
    pub fn to_json_value(&self) -> Value {
        match self {
            Reply::Json(value) => value.clone(),
            Reply::Redirect(redirect) => json!({
                "status": redirect.status.as_u16(),
                "location": redirect.location,
            }),
            Reply::File(file) => json!({
                "path": file.path.to_string_lossy(),
                "contentType": file.content_type,
            }),
            Reply::Empty => Value::Null,
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

impl From<Redirect> for Reply {
    fn from(redirect: Redirect) -> Self {
        Reply::Redirect(redirect)
    }
}

impl From<FileStream> for Reply {
    fn from(file: FileStream) -> Self {
        Reply::File(file)
    }
}

/// Redirect directive: status plus target location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub status: StatusCode,
    pub location: String,
}

impl Redirect {
    pub fn new(status: StatusCode, location: impl Into<String>) -> Self {
        Self {
            status,
            location: location.into(),
        }
    }

    /// 302 Found.
    pub fn found(location: impl Into<String>) -> Self {
        Self::new(StatusCode::FOUND, location)
    }

    /// 301 Moved Permanently.
    pub fn permanent(location: impl Into<String>) -> Self {
        Self::new(StatusCode::MOVED_PERMANENTLY, location)
    }

    /// 303 See Other.
    pub fn see_other(location: impl Into<String>) -> Self {
        Self::new(StatusCode::SEE_OTHER, location)
    }

    /// 307 Temporary Redirect.
    pub fn temporary(location: impl Into<String>) -> Self {
        Self::new(StatusCode::TEMPORARY_REDIRECT, location)
    }
}

/// An opened file and the content type derived from its extension.
#[derive(Debug)]
pub struct FileStream {
    pub file: tokio::fs::File,
    pub path: PathBuf,
    pub content_type: String,
}

impl FileStream {
    /// Open `path` for streaming.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RouteError> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::File::open(&path).await?;
        Ok(Self {
            content_type: content_type_for(&path),
            file,
            path,
        })
    }
}

/// MIME type by extension; text types carry `charset=utf-8`.
pub fn content_type_for(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let is_text = mime.type_() == mime_guess::mime::TEXT
        || mime.subtype() == mime_guess::mime::JAVASCRIPT
        || mime.subtype() == mime_guess::mime::JSON;
    if is_text && mime.get_param(mime_guess::mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(
            content_type_for(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("site.css")),
            "text/css; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("data.json")),
            "application/json; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("logo.png")), "image/png");
        assert_eq!(
            content_type_for(Path::new("blob")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_json_view() {
        assert_eq!(Reply::Empty.to_json_value(), Value::Null);
        assert_eq!(
            Reply::from(Redirect::found("/login")).to_json_value(),
            json!({"status": 302, "location": "/login"})
        );
        assert_eq!(
            Reply::json(vec![1, 2]).unwrap().to_json_value(),
            json!([1, 2])
        );
    }

    #[tokio::test]
    async fn test_open_missing_file_is_io_error() {
        let err = FileStream::open("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, RouteError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }
}
