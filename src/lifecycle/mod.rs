//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (HttpServer::bootstrap):
//!     Resolve config → Load routes (fail fast) → Build router → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or Shutdown::trigger → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Traffic is accepted only after the route table is complete
//! - Ordered shutdown: stop accept, drain, close

pub mod shutdown;

pub use shutdown::Shutdown;
