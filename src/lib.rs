//! Convention-based HTTP routing on top of Axum.
//!
//! Route files in a directory become URL patterns: `users.rs` exposing
//! `"GET /:id"` answers `GET /users/42`. The engine loads them once,
//! dispatches each request to the first matching route (middleware, then
//! handlers) and falls back to static files.
//!
//! ```text
//! Config ──resolve──▶ ValidatedConfig
//!                          │
//! routes/ + ModuleRegistry ─▶ routing::load_routes ──▶ RouteTable
//!                                                         │
//! HttpServer / TestClient ──▶ RoutingEngine::handle_request ──▶ Reply
//!                                     └─ miss ─▶ StaticFiles ─▶ 404
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod testing;

pub use config::{Config, ValidatedConfig};
pub use dispatch::{Context, DispatchRequest, FileStream, Redirect, Reply, RoutingEngine};
pub use error::{HttpError, LoadError, RouteError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{handler, Endpoints, HandlerResult, ModuleExports, ModuleRegistry};
pub use testing::TestClient;
