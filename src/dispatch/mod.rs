//! Request dispatch subsystem (the Dispatcher and Static Fallback).
//!
//! # Data Flow
//! ```text
//! hosting layer / TestClient
//!     → DispatchRequest (method, url, body, raw body, headers)
//!     → engine.rs (first-match lookup, sequential chain)
//!     → static_files.rs (only on a miss)
//!     → Reply (Json | Redirect | File | Empty) or RouteError
//! ```
//!
//! # Design Decisions
//! - The engine is a value, built once at bootstrap and cloned into servers
//! - No state survives between requests besides the route table and config
//! - A hung handler blocks only its own request; timeouts belong to the host

pub mod context;
pub mod engine;
pub mod reply;
pub mod static_files;

pub use context::{Context, Query, ResponseHandle};
pub use engine::{DispatchRequest, RoutingEngine};
pub use reply::{FileStream, Redirect, Reply};
pub use static_files::StaticFiles;
