//! Layered error definitions
//!
//! Categorized by source: config / dispatch

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Dispatch Errors =====
    /// Dispatcher task is no longer receiving payloads
    #[error("dispatcher is closed, payload for source '{source_id}' not accepted")]
    DispatcherClosed { source_id: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create dispatcher closed error
    pub fn dispatcher_closed(source_id: impl Into<String>) -> Self {
        Self::DispatcherClosed {
            source_id: source_id.into(),
        }
    }
}
