//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     routes directory + ModuleRegistry
//!     → loader.rs (discover files, read Endpoints)
//!     → matcher.rs (assemble and compile patterns)
//!     → router.rs (sort by priority, freeze as RouteTable)
//!
//! Incoming Request (method, path)
//!     → router.rs (scan in table order)
//!     → matcher.rs (extract parameters)
//!     → Return: matched route + params, or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same files always give the same table
//! - First match wins (ordered by priority, then load order)

pub mod endpoints;
pub mod loader;
pub mod matcher;
pub mod registry;
pub mod router;

pub use endpoints::{
    handler, BoxedHandler, Endpoints, Handler, HandlerChain, HandlerResult, ModuleExports,
    RouteMethod,
};
pub use loader::load_routes;
pub use matcher::{PathMatcher, PatternError};
pub use registry::ModuleRegistry;
pub use router::{RouteDescriptor, RouteMatch, RouteTable};
