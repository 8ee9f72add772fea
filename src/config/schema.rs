//! Configuration schema definitions.
//!
//! [`Config`] is what users write: only `root_directory` is mandatory and
//! every block may be partially filled. [`Config::resolve`] fills in the
//! defaults and anchors relative directories at the root, producing the
//! immutable [`ValidatedConfig`] the rest of the crate consumes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// Default routes directory, relative to the root directory.
pub const DEFAULT_ROUTES_DIRECTORY: &str = "./routes";
/// Default static directory when a `static` block is present without one.
pub const DEFAULT_STATIC_DIRECTORY: &str = "static";
/// Default listening port.
pub const DEFAULT_PORT: u16 = 4444;
/// Default name of the route file that binds to `/`.
pub const DEFAULT_INDEX: &str = "index";
/// Default request body limit in bytes.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Partial configuration as supplied by the caller or a TOML file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Directory every relative path is resolved against.
    pub root_directory: PathBuf,

    #[serde(default)]
    pub routes: Option<RoutesSection>,

    /// Static asset fallback; absent means no static serving.
    #[serde(default, rename = "static")]
    pub static_files: Option<StaticSection>,

    #[serde(default)]
    pub server: Option<ServerSection>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoutesSection {
    pub directory: Option<PathBuf>,
    /// Files whose name matches this regex are skipped.
    pub exclude_regex: Option<String>,
    /// Prefix prepended to every route pattern.
    pub global_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StaticSection {
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub index: Option<String>,
    pub debug: Option<bool>,
    pub cors: Option<CorsConfig>,
    pub body_limit: Option<usize>,

    /// Callback for unexpected errors. Only settable from code.
    #[serde(skip)]
    pub error_handler: Option<ErrorHandler>,
}

/// CORS policy applied by the hosting layer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; empty or `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Allowed methods; empty allows any method.
    pub allowed_methods: Vec<String>,
    /// Allowed request headers; empty allows any header.
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Callback invoked with unexpected request-time errors.
#[derive(Clone)]
pub struct ErrorHandler(Arc<dyn Fn(&RouteError) + Send + Sync>);

impl ErrorHandler {
    pub fn new(f: impl Fn(&RouteError) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn report(&self, error: &RouteError) {
        (self.0)(error)
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorHandler(..)")
    }
}

/// Fully populated configuration. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub root_directory: PathBuf,
    pub routes: RoutesConfig,
    pub static_files: Option<StaticConfig>,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone)]
pub struct RoutesConfig {
    pub directory: PathBuf,
    pub exclude_regex: Option<String>,
    pub global_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub index: String,
    pub debug: bool,
    pub cors: Option<CorsConfig>,
    pub body_limit: usize,
    pub error_handler: Option<ErrorHandler>,
}

impl Config {
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            ..Self::default()
        }
    }

    pub fn with_routes_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.routes.get_or_insert_with(Default::default).directory = Some(directory.into());
        self
    }

    pub fn with_exclude_regex(mut self, pattern: impl Into<String>) -> Self {
        self.routes.get_or_insert_with(Default::default).exclude_regex = Some(pattern.into());
        self
    }

    pub fn with_global_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.routes.get_or_insert_with(Default::default).global_prefix = Some(prefix.into());
        self
    }

    /// Enable the static fallback; `None` picks the default directory.
    pub fn with_static_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.static_files = Some(StaticSection { directory });
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.get_or_insert_with(Default::default).port = Some(port);
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.server.get_or_insert_with(Default::default).index = Some(index.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.server.get_or_insert_with(Default::default).debug = Some(debug);
        self
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.server.get_or_insert_with(Default::default).cors = Some(cors);
        self
    }

    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.server.get_or_insert_with(Default::default).error_handler = Some(handler);
        self
    }

    /// Fill in defaults and resolve relative directories against the root.
    ///
    /// Pure transform: the filesystem is never consulted.
    pub fn resolve(self) -> ValidatedConfig {
        let root = self.root_directory;
        let routes = self.routes.unwrap_or_default();
        let server = self.server.unwrap_or_default();

        let routes_directory = routes
            .directory
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROUTES_DIRECTORY));

        let static_files = self.static_files.map(|section| {
            let directory = section
                .directory
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIRECTORY));
            StaticConfig {
                directory: anchor(&root, &directory),
            }
        });

        ValidatedConfig {
            routes: RoutesConfig {
                directory: anchor(&root, &routes_directory),
                exclude_regex: routes.exclude_regex.filter(|r| !r.is_empty()),
                global_prefix: routes.global_prefix.filter(|p| !p.is_empty()),
            },
            static_files,
            server: ServerConfig {
                port: server.port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT),
                index: server
                    .index
                    .filter(|i| !i.is_empty())
                    .unwrap_or_else(|| DEFAULT_INDEX.to_string()),
                debug: server.debug.unwrap_or(false),
                cors: server.cors,
                body_limit: server.body_limit.unwrap_or(DEFAULT_BODY_LIMIT),
                error_handler: server.error_handler,
            },
            observability: self.observability,
            root_directory: root,
        }
    }
}

/// Join a relative path onto `root`, dropping `.` components.
fn anchor(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path).components().collect()
    }
}
