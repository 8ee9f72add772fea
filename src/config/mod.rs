//! Configuration management subsystem (the Config Resolver).
//!
//! # Data Flow
//! ```text
//! TOML file or Config built in code (only root_directory mandatory)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config::resolve (defaults, paths anchored at root_directory)
//!     → ValidatedConfig (immutable, owned by the RoutingEngine)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; changes require a restart
//! - All blocks are optional to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    Config, CorsConfig, ErrorHandler, ObservabilityConfig, RoutesConfig, ServerConfig,
    StaticConfig, ValidatedConfig,
};
pub use validation::{validate_config, ValidationError};
