//! Static asset fallback, consulted only when no route matched.

use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::dispatch::reply::{content_type_for, FileStream};
use crate::error::RouteError;

const DIRECTORY_INDEX: &str = "index.html";

/// Serves files below a single root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path to an open file.
    ///
    /// `Ok(None)` means no static match: the path escapes the root, or the
    /// file (or a directory's `index.html`) does not exist. Other I/O
    /// failures are returned.
    pub async fn resolve(&self, request_path: &str) -> Result<Option<FileStream>, RouteError> {
        let Some(relative) = confine(request_path) else {
            tracing::debug!(path = %request_path, "Static path rejected");
            return Ok(None);
        };

        let candidate = self.root.join(relative);
        let metadata = match not_found_as_none(tokio::fs::metadata(&candidate).await)? {
            Some(metadata) => metadata,
            None => return Ok(None),
        };

        let target = if metadata.is_dir() {
            let index = candidate.join(DIRECTORY_INDEX);
            match not_found_as_none(tokio::fs::metadata(&index).await)? {
                Some(metadata) if metadata.is_file() => index,
                _ => return Ok(None),
            }
        } else {
            candidate
        };

        match not_found_as_none(tokio::fs::File::open(&target).await)? {
            Some(file) => Ok(Some(FileStream {
                content_type: content_type_for(&target),
                file,
                path: target,
            })),
            None => Ok(None),
        }
    }
}

fn not_found_as_none<T>(result: io::Result<T>) -> Result<Option<T>, RouteError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Percent-decode a request path and turn it into a path relative to the
/// static root. `None` if it would leave the root.
fn confine(request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(decoded.as_ref()).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(segment) => relative.push(segment),
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}
