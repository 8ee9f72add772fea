//! Route discovery.
//!
//! # Data Flow
//! ```text
//! routes directory listing (sorted by file name)
//!     → drop names matching routes.exclude_regex
//!     → keep names with a route-file suffix (.js .mjs .ts .mts .rs)
//!     → ModuleRegistry::resolve(file name) → Endpoints
//!     → one RouteDescriptor per "METHOD path" key
//!     → stable sort by priority after each file
//! ```
//!
//! Any failure aborts the load; a partially built table is never returned.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;

use crate::config::ValidatedConfig;
use crate::error::LoadError;
use crate::observability::metrics;
use crate::routing::endpoints::{BoxedHandler, Endpoints, RouteMethod};
use crate::routing::matcher::{assemble_pattern, join_file_prefix, PathMatcher};
use crate::routing::registry::ModuleRegistry;
use crate::routing::router::{RouteDescriptor, RouteTable};

const ROUTE_FILE_EXTENSIONS: [&str; 5] = ["js", "mjs", "ts", "mts", "rs"];

/// Scan the configured routes directory and build the route table.
pub fn load_routes(config: &ValidatedConfig, registry: &ModuleRegistry) -> Result<RouteTable, LoadError> {
    let directory = &config.routes.directory;
    let mut file_names = list_directory(directory)?;

    if let Some(pattern) = &config.routes.exclude_regex {
        let exclude = Regex::new(pattern).map_err(|source| LoadError::InvalidExcludePattern {
            pattern: pattern.clone(),
            source,
        })?;
        file_names.retain(|name| {
            let excluded = exclude.is_match(name);
            if excluded {
                tracing::debug!(file = %name, "Route file excluded");
            }
            !excluded
        });
    }

    let index = join_file_prefix("", &config.server.index, "");
    let global_prefix = config.routes.global_prefix.as_deref();
    let mut table = RouteTable::default();

    for file_name in &file_names {
        let Some(route) = route_name(file_name) else {
            continue;
        };

        let endpoints = registry
            .resolve(file_name)
            .ok_or_else(|| LoadError::ModuleNotRegistered {
                file: file_name.clone(),
            })?
            .into_endpoints();

        let routes = build_routes(file_name, route, &endpoints, &index, global_prefix)?;
        table.extend(routes);
        table.sort_by_priority();
    }

    tracing::info!(
        directory = %directory.display(),
        files = file_names.len(),
        routes = table.len(),
        "Routes loaded"
    );
    metrics::record_routes_loaded(table.len());

    Ok(table)
}

fn list_directory(directory: &Path) -> Result<Vec<String>, LoadError> {
    let entries = std::fs::read_dir(directory).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::RoutesDirectoryMissing(directory.to_path_buf()),
        _ => LoadError::ReadDirectory {
            path: directory.to_path_buf(),
            source,
        },
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::ReadDirectory {
            path: directory.to_path_buf(),
            source,
        })?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => tracing::warn!(file = ?name, "Skipping route file with non UTF-8 name"),
        }
    }

    names.sort();
    Ok(names)
}

/// The route name of a route file: its name minus the recognized extension.
pub fn route_name(file_name: &str) -> Option<&str> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || !ROUTE_FILE_EXTENSIONS.contains(&extension) {
        return None;
    }
    Some(stem)
}

fn build_routes(
    file_name: &str,
    route: &str,
    endpoints: &Endpoints,
    index: &str,
    global_prefix: Option<&str>,
) -> Result<Vec<RouteDescriptor>, LoadError> {
    let middleware: Arc<[BoxedHandler]> = Arc::from(endpoints.middleware_chain().to_vec());

    let mut file_prefix = join_file_prefix(
        endpoints.file_prefix().unwrap_or_default(),
        route,
        endpoints.file_suffix().unwrap_or_default(),
    );
    if file_prefix == index {
        file_prefix.clear();
    }

    let mut routes = Vec::with_capacity(endpoints.routes().len());
    for (key, chain) in endpoints.routes() {
        let (method, sub_pattern) = key.split_once(' ').ok_or_else(|| LoadError::MalformedEndpointKey {
            file: file_name.to_string(),
            key: key.clone(),
        })?;
        let method: RouteMethod = method.parse().map_err(|_| LoadError::InvalidMethod {
            file: file_name.to_string(),
            key: key.clone(),
        })?;

        let pattern = assemble_pattern(global_prefix, &file_prefix, sub_pattern);
        let matcher = PathMatcher::compile(&pattern).map_err(|e| LoadError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.reason,
        })?;

        tracing::debug!(
            file = %file_name,
            method = %method,
            pattern = %pattern,
            priority = ?endpoints.file_priority(),
            "Route registered"
        );

        routes.push(RouteDescriptor {
            method,
            matcher,
            handlers: chain.handlers().to_vec(),
            middleware: Arc::clone(&middleware),
            priority: endpoints.file_priority(),
            source: file_name.to_string(),
        });
    }

    Ok(routes)
}
