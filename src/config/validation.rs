//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the bind address parses
//! - Check the content root is an existing directory
//! - Check limits and log filters
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StubConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::config::schema::StubConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("bind address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("content root {} is not a directory", .0.display())]
    ContentRoot(PathBuf),

    #[error("max_body_bytes must be greater than zero")]
    BodyLimit,

    #[error("log level {value:?} is invalid: {reason}")]
    LogLevel { value: String, reason: String },
}

pub fn validate_config(config: &StubConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if !config.content.root.is_dir() {
        errors.push(ValidationError::ContentRoot(config.content.root.clone()));
    }

    if config.content.max_body_bytes == 0 {
        errors.push(ValidationError::BodyLimit);
    }

    if let Err(e) = EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError::LogLevel {
            value: config.observability.log_level.clone(),
            reason: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
