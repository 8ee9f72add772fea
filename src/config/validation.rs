//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the exclusion pattern compiles
//! - Reject values that can never produce a usable route table
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - The filesystem is not consulted; missing directories surface at load time

use regex::Regex;

use crate::config::schema::Config;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("root_directory must not be empty")]
    EmptyRootDirectory,

    #[error("routes.exclude_regex \"{pattern}\" is not a valid regex: {reason}")]
    InvalidExcludeRegex { pattern: String, reason: String },

    #[error("server.index must not be blank")]
    EmptyIndex,

    #[error("routes.global_prefix \"{0}\" must not contain whitespace")]
    WhitespaceInGlobalPrefix(String),
}

/// Validate a partial configuration, collecting every problem.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.root_directory.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyRootDirectory);
    }

    if let Some(routes) = &config.routes {
        if let Some(pattern) = &routes.exclude_regex {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError::InvalidExcludeRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                });
            }
        }
        if let Some(prefix) = &routes.global_prefix {
            if prefix.chars().any(char::is_whitespace) {
                errors.push(ValidationError::WhitespaceInGlobalPrefix(prefix.clone()));
            }
        }
    }

    if let Some(server) = &config.server {
        if matches!(server.index.as_deref(), Some(i) if i.trim().is_empty() && !i.is_empty()) {
            errors.push(ValidationError::EmptyIndex);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::new("/srv").with_exclude_regex("^_").with_global_prefix("/api");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = Config::new("")
            .with_exclude_regex("(")
            .with_global_prefix("/a b")
            .with_index("  ");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], ValidationError::EmptyRootDirectory);
        assert_eq!(errors[3], ValidationError::EmptyIndex);
    }
}
