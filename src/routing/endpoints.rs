//! The surface a route file exposes.
//!
//! A route file is a Rust module with a `pub fn endpoints() -> Endpoints`.
//! Besides its `"METHOD path"` keyed handler chains it may carry
//! file-level `middleware`, a `prefix`/`suffix` wrapped around the file
//! name, and a `priority` for every route it defines.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::dispatch::{Context, Reply};
use crate::error::RouteError;

/// What every middleware and handler resolves to.
pub type HandlerResult = Result<Reply, RouteError>;

/// An async function run against a request [`Context`].
///
/// Implemented for every `Fn(Context) -> impl Future<Output = HandlerResult>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(ctx))
    }
}

pub type BoxedHandler = Arc<dyn Handler>;

/// Box an async function as a handler.
pub fn handler<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(f)
}

/// One or more handlers run in order for a single endpoint.
#[derive(Clone, Default)]
pub struct HandlerChain(Vec<BoxedHandler>);

impl HandlerChain {
    pub fn handlers(&self) -> &[BoxedHandler] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BoxedHandler> for HandlerChain {
    fn from(handler: BoxedHandler) -> Self {
        Self(vec![handler])
    }
}

impl From<Vec<BoxedHandler>> for HandlerChain {
    fn from(handlers: Vec<BoxedHandler>) -> Self {
        Self(handlers)
    }
}

/// The method token of an endpoint key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// Matches every request method.
    Any,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Patch => "PATCH",
            RouteMethod::Delete => "DELETE",
            RouteMethod::Any => "ANY",
        }
    }

    /// Whether a request method (any case) is accepted.
    pub fn accepts(&self, method: &str) -> bool {
        *self == RouteMethod::Any || self.as_str().eq_ignore_ascii_case(method)
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint keys are case-sensitive: only the upper-case tokens parse.
impl FromStr for RouteMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(RouteMethod::Get),
            "POST" => Ok(RouteMethod::Post),
            "PUT" => Ok(RouteMethod::Put),
            "PATCH" => Ok(RouteMethod::Patch),
            "DELETE" => Ok(RouteMethod::Delete),
            "ANY" => Ok(RouteMethod::Any),
            _ => Err(()),
        }
    }
}

/// Everything a route file defines.
#[derive(Clone, Default)]
pub struct Endpoints {
    middleware: Vec<BoxedHandler>,
    prefix: Option<String>,
    suffix: Option<String>,
    priority: Option<i64>,
    routes: Vec<(String, HandlerChain)>,
}

impl Endpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware run before every handler chain of this file.
    pub fn middleware(mut self, handler: BoxedHandler) -> Self {
        self.middleware.push(handler);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Lower values are tried first; files without one sort last.
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Define an endpoint under a raw `"METHOD path"` key.
    ///
    /// The key is validated when routes are loaded. Redefining a key
    /// replaces its chain but keeps its original position.
    pub fn route(mut self, key: impl Into<String>, chain: impl Into<HandlerChain>) -> Self {
        let key = key.into();
        let chain = chain.into();
        match self.routes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = chain,
            None => self.routes.push((key, chain)),
        }
        self
    }

    pub fn get(self, path: &str, chain: impl Into<HandlerChain>) -> Self {
        self.route(format!("GET {path}"), chain)
    }

    pub fn post(self, path: &str, chain: impl Into<HandlerChain>) -> Self {
        self.route(format!("POST {path}"), chain)
    }

    pub fn put(self, path: &str, chain: impl Into<HandlerChain>) -> Self {
        self.route(format!("PUT {path}"), chain)
    }

    pub fn patch(self, path: &str, chain: impl Into<HandlerChain>) -> Self {
        self.route(format!("PATCH {path}"), chain)
    }

    pub fn delete(self, path: &str, chain: impl Into<HandlerChain>) -> Self {
        self.route(format!("DELETE {path}"), chain)
    }

    pub fn any(self, path: &str, chain: impl Into<HandlerChain>) -> Self {
        self.route(format!("ANY {path}"), chain)
    }

    pub fn middleware_chain(&self) -> &[BoxedHandler] {
        &self.middleware
    }

    pub fn file_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn file_suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn file_priority(&self) -> Option<i64> {
        self.priority
    }

    /// Endpoint keys and their chains, in definition order.
    pub fn routes(&self) -> &[(String, HandlerChain)] {
        &self.routes
    }
}

impl fmt::Debug for Endpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoints")
            .field("middleware", &self.middleware.len())
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("priority", &self.priority)
            .field("routes", &self.routes.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

/// A module's exports. When a default export is present it wins over the
/// named ones.
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    pub default: Option<Endpoints>,
    pub named: Endpoints,
}

impl ModuleExports {
    pub fn with_default(endpoints: Endpoints) -> Self {
        Self {
            default: Some(endpoints),
            named: Endpoints::default(),
        }
    }

    pub fn into_endpoints(self) -> Endpoints {
        self.default.unwrap_or(self.named)
    }
}

impl From<Endpoints> for ModuleExports {
    fn from(named: Endpoints) -> Self {
        Self {
            default: None,
            named,
        }
    }
}
