//! Route table and lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Keep them ordered by priority
//! - Look up the first route accepting a method and path, or report no match
//!
//! # Design Decisions
//! - Immutable after construction (shared across requests without locks)
//! - O(n) scan in table order: first match wins, never the most specific
//! - Stable sort: equal or missing priorities keep insertion order

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::routing::endpoints::{BoxedHandler, RouteMethod};
use crate::routing::matcher::{PathMatcher, PatternError};

/// One compiled, dispatchable endpoint.
#[derive(Clone)]
pub struct RouteDescriptor {
    pub method: RouteMethod,
    pub matcher: PathMatcher,
    pub handlers: Vec<BoxedHandler>,
    /// Middleware of the file this route came from, shared by its siblings.
    pub middleware: Arc<[BoxedHandler]>,
    pub priority: Option<i64>,
    /// File the route was loaded from, for diagnostics.
    pub source: String,
}

impl RouteDescriptor {
    /// Build a route outside the loader, e.g. in tests.
    pub fn new(
        method: RouteMethod,
        pattern: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            method,
            matcher: PathMatcher::compile(pattern)?,
            handlers,
            middleware: Arc::from(Vec::new()),
            priority: None,
            source: String::new(),
        })
    }

    pub fn with_middleware(mut self, middleware: Vec<BoxedHandler>) -> Self {
        self.middleware = Arc::from(middleware);
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn parameter_names(&self) -> &[String] {
        self.matcher.keys()
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("method", &self.method)
            .field("pattern", &self.pattern())
            .field("parameter_names", &self.parameter_names())
            .field("handlers", &self.handlers.len())
            .field("middleware", &self.middleware.len())
            .field("priority", &self.priority)
            .field("source", &self.source)
            .finish()
    }
}

/// A route that accepted a request, with its bound parameters.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDescriptor,
    pub params: BTreeMap<String, String>,
}

/// Ordered route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Build a table from routes in insertion order, then sort by priority.
    pub fn from_routes(routes: Vec<RouteDescriptor>) -> Self {
        let mut table = Self { routes };
        table.sort_by_priority();
        table
    }

    pub(crate) fn extend(&mut self, routes: impl IntoIterator<Item = RouteDescriptor>) {
        self.routes.extend(routes);
    }

    pub(crate) fn sort_by_priority(&mut self) {
        self.routes
            .sort_by(|a, b| compare_priority(a.priority, b.priority));
    }

    /// First route, in table order, accepting `method` and `path`.
    pub fn find(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method.accepts(method))
            .find_map(|route| {
                route
                    .matcher
                    .match_path(path)
                    .map(|params| RouteMatch { route, params })
            })
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Present priorities ascend; absent ones sort after all present ones.
fn compare_priority(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Context, Reply};
    use crate::routing::endpoints::{handler, HandlerResult};

    async fn noop(_ctx: Context) -> HandlerResult {
        Ok(Reply::Empty)
    }

    fn route(method: RouteMethod, pattern: &str) -> RouteDescriptor {
        RouteDescriptor::new(method, pattern, vec![handler(noop)]).unwrap()
    }

    #[test]
    fn test_priority_order_is_stable() {
        let table = RouteTable::from_routes(vec![
            route(RouteMethod::Get, "/none-a"),
            route(RouteMethod::Get, "/two").with_priority(2),
            route(RouteMethod::Get, "/none-b"),
            route(RouteMethod::Get, "/one").with_priority(1),
            route(RouteMethod::Get, "/minus").with_priority(-5),
            route(RouteMethod::Get, "/one-again").with_priority(1),
        ]);

        let order: Vec<_> = table.routes().iter().map(|r| r.pattern()).collect();
        assert_eq!(
            order,
            ["/minus", "/one", "/one-again", "/two", "/none-a", "/none-b"]
        );
    }

    #[test]
    fn test_first_match_wins_over_specificity() {
        let table = RouteTable::from_routes(vec![
            route(RouteMethod::Get, "/items/:id"),
            route(RouteMethod::Get, "/items/special"),
        ]);

        let found = table.find("GET", "/items/special").unwrap();
        assert_eq!(found.route.pattern(), "/items/:id");
        assert_eq!(found.params["id"], "special");
    }

    #[test]
    fn test_method_filter() {
        let table = RouteTable::from_routes(vec![
            route(RouteMethod::Post, "/items"),
            route(RouteMethod::Any, "/items"),
        ]);

        assert_eq!(table.find("post", "/items").unwrap().route.method, RouteMethod::Post);
        assert_eq!(table.find("GET", "/items").unwrap().route.method, RouteMethod::Any);
        assert!(table.find("GET", "/other").is_none());
    }
}
