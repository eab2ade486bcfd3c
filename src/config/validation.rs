//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Refuse signing settings that would make every link forgeable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, including on reload/merge

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AppConfig, DownloadConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("download.secret must not be empty")]
    EmptySecret,

    #[error("download.timeout must be greater than zero")]
    ZeroTimeout,

    #[error("download.root_path must not be empty")]
    EmptyRootPath,

    #[error("download.uri_prefix must not contain '..' or '\\': {0:?}")]
    InvalidPrefix(String),

    #[error("download.server must be a valid header value: {0:?}")]
    InvalidServer(String),

    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("admin.api_key must be changed when the admin API is enabled")]
    DefaultAdminKey,
}

/// Validate a complete configuration file.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = match validate_download(&config.download) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "admin.bind_address",
                value: config.admin.bind_address.clone(),
            });
        }
        if config.admin.api_key.is_empty() || config.admin.api_key == "CHANGE_ME_IN_PRODUCTION" {
            errors.push(ValidationError::DefaultAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the hot-swappable download settings on their own.
pub fn validate_download(config: &DownloadConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }
    if config.timeout == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.root_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyRootPath);
    }

    let prefix = config.prefix();
    if prefix.contains('\\') || prefix.split('/').any(|seg| seg == "..") {
        errors.push(ValidationError::InvalidPrefix(config.uri_prefix.clone()));
    }

    if axum::http::HeaderValue::from_str(&config.server).is_err() {
        errors.push(ValidationError::InvalidServer(config.server.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
