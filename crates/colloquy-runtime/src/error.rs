//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A plugin lifecycle hook failed.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] colloquy_core::LifecycleError),

    /// Request handling failed.
    #[error("Handle error: {0}")]
    Handle(#[from] colloquy_core::HandleError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
