//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use routedir::{Config, Context, HandlerResult, Reply};
use tempfile::TempDir;

/// A throwaway application root with a `routes/` directory.
pub struct AppDir {
    dir: TempDir,
}

impl AppDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir(dir.path().join("routes")).expect("create routes dir");
        Self { dir }
    }

    /// An application root without a routes directory.
    pub fn without_routes() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create route file markers; their behavior comes from the registry.
    pub fn route_files(self, names: &[&str]) -> Self {
        for name in names {
            fs::write(self.path().join("routes").join(name), "// route file\n").expect("write route file");
        }
        self
    }

    pub fn static_file(self, relative: &str, contents: &str) -> Self {
        let path = self.path().join("static").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create static dir");
        }
        fs::write(path, contents).expect("write static file");
        self
    }

    pub fn config(&self) -> Config {
        Config::new(self.path())
    }
}

/// Handler returning the parsed request body unchanged.
pub async fn echo_body(ctx: Context) -> HandlerResult {
    Ok(Reply::Json(ctx.body().clone()))
}

pub async fn empty(_ctx: Context) -> HandlerResult {
    Ok(Reply::Empty)
}
