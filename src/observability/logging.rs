//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Let `RUST_LOG` override the configured level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Safe to call more than once (tests, embedding applications)

use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Install a fmt subscriber filtered at `level` unless `RUST_LOG` is set.
///
/// Returns `false` when a global subscriber already existed.
pub fn init(level: &str) -> bool {
    if LOGGING_INIT.get().is_some() {
        return false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    let _ = LOGGING_INIT.set(());
    installed
}

fn default_directives(level: &str) -> String {
    format!("routedir={level},tower_http={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("debug"), "routedir=debug,tower_http=debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init("info");
        assert!(!init("debug"));
    }
}
