//! The routing engine: one immutable route table plus configuration,
//! shared by every request.
//!
//! # Per-request flow
//! ```text
//! DispatchRequest
//!     → split URL into path + query
//!     → RouteTable::find (first match in table order)
//!         → Context → middleware… → handlers… → last result
//!     → miss: StaticFiles::resolve (if configured)
//!     → miss: HttpError 404 NOT_FOUND
//! ```

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use futures_util::FutureExt;
use serde_json::Value;

use crate::config::{Config, ValidatedConfig};
use crate::dispatch::context::{Context, Query, ResponseHandle};
use crate::dispatch::reply::Reply;
use crate::dispatch::static_files::StaticFiles;
use crate::error::{HttpError, LoadError, RouteError};
use crate::observability::metrics;
use crate::routing::{load_routes, HandlerResult, ModuleRegistry, RouteDescriptor, RouteTable};

/// Normalized request data fed to the engine by the hosting layer or the
/// test harness.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    /// Request method, any case.
    pub method: String,
    /// Origin-form (`/path?query`) or absolute URL.
    pub url: String,
    /// Parsed JSON body, if any.
    pub body: Option<Value>,
    pub raw_body: String,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
    pub response: ResponseHandle,
}

impl DispatchRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the parsed body and its JSON text as the raw body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.raw_body = body.to_string();
        self.body = Some(body);
        self
    }

    pub fn with_body(mut self, body: Option<Value>, raw_body: impl Into<String>) -> Self {
        self.body = body;
        self.raw_body = raw_body.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_response(mut self, response: ResponseHandle) -> Self {
        self.response = response;
        self
    }
}

/// Route table, configuration and static fallback. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoutingEngine {
    config: Arc<ValidatedConfig>,
    routes: Arc<RouteTable>,
    static_files: Option<StaticFiles>,
}

impl RoutingEngine {
    /// Resolve `config` and load every route file. Fails fast; no engine
    /// exists until the whole table is built.
    pub fn bootstrap(config: Config, registry: &ModuleRegistry) -> Result<Self, LoadError> {
        let config = config.resolve();
        let routes = load_routes(&config, registry)?;
        Ok(Self::from_parts(config, routes))
    }

    pub fn from_parts(config: ValidatedConfig, routes: RouteTable) -> Self {
        let static_files = config
            .static_files
            .as_ref()
            .map(|s| StaticFiles::new(s.directory.clone()));
        Self {
            config: Arc::new(config),
            routes: Arc::new(routes),
            static_files,
        }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Dispatch one request.
    pub async fn handle_request(&self, request: DispatchRequest) -> Result<Reply, RouteError> {
        let start = Instant::now();
        let method = request.method.to_ascii_uppercase();

        let (method_label, route, result) = match Method::from_bytes(method.as_bytes()) {
            Ok(parsed) => {
                let label = metrics::method_label(&parsed);
                let (route, result) = self.dispatch(parsed, request).await;
                (label, route, result)
            }
            Err(_) => (
                metrics::OTHER_METHOD,
                "none".to_string(),
                Err(HttpError::bad_request("INVALID_METHOD").into()),
            ),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(RouteError::Http(_)) => "http_error",
            Err(_) => "error",
        };
        metrics::record_dispatch(method_label, &route, outcome, start);

        result
    }

    async fn dispatch(&self, method: Method, request: DispatchRequest) -> (String, Result<Reply, RouteError>) {
        let (path, raw_query) = split_url(&request.url);

        if let Some(found) = self.routes.find(method.as_str(), &path) {
            let route = found.route;
            tracing::debug!(
                method = %method,
                path = %path,
                pattern = %route.pattern(),
                source = %route.source,
                "Route matched"
            );

            let ctx = Context::new(
                method,
                path,
                Query::parse(&raw_query),
                found.params,
                request.body,
                request.raw_body,
                request.headers,
                request.remote_addr,
                request.response,
            );
            return (route.pattern().to_string(), run_chain(route, ctx).await);
        }

        if let Some(static_files) = &self.static_files {
            match static_files.resolve(&path).await {
                Ok(Some(file)) => {
                    tracing::debug!(path = %path, file = %file.path.display(), "Static file matched");
                    return ("static".to_string(), Ok(Reply::File(file)));
                }
                Ok(None) => {}
                Err(e) => return ("static".to_string(), Err(e)),
            }
        }

        tracing::debug!(method = %method, path = %path, "No route matched");
        ("none".to_string(), Err(HttpError::not_found("NOT_FOUND").into()))
    }
}

/// Run file middleware then route handlers, one after another. The last
/// stage's reply is the result; any error stops the chain. A panicking
/// stage stops it too, as an internal error.
async fn run_chain(route: &RouteDescriptor, ctx: Context) -> HandlerResult {
    let mut last = Reply::Empty;
    for stage in route.middleware.iter().chain(route.handlers.iter()) {
        last = AssertUnwindSafe(stage.call(ctx.clone()))
            .catch_unwind()
            .await
            .map_err(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::error!(pattern = %route.pattern(), source = %route.source, panic = %message, "Handler panicked");
                RouteError::internal(format!("handler panicked: {message}"))
            })??;
    }
    Ok(last)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Split a request URL into its path and raw query. The fragment is dropped.
pub(crate) fn split_url(url: &str) -> (String, String) {
    if !url.is_empty() && !url.starts_with('/') {
        if let Ok(parsed) = url::Url::parse(url) {
            return (
                parsed.path().to_string(),
                parsed.query().unwrap_or_default().to_string(),
            );
        }
    }

    let without_fragment = url.split_once('#').map_or(url, |(before, _)| before);
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));
    let path = if path.is_empty() { "/" } else { path };
    (path.to_string(), query.to_string())
}
