//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, tracing, request ID)
//!     → request.rs (buffer body, parse JSON)
//!     → RoutingEngine::handle_request
//!     → response.rs (Reply or error → response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{read_body, MakeRequestUuidV4, ParsedBody, X_REQUEST_ID};
pub use response::{error_response, reply_response};
pub use server::HttpServer;
