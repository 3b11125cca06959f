//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// HTTP gateway failure
    #[error("Gateway failed: {0}")]
    Gateway(#[from] gateway::GatewayError),

    /// Dispatcher task ended abnormally
    #[error("Dispatcher task failed: {message}")]
    Dispatcher { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn dispatcher(message: impl Into<String>) -> Self {
        Self::Dispatcher {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
