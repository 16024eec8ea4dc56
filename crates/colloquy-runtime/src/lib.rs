//! Colloquy Runtime - Orchestration layer for the Colloquy framework.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `ColloquyConfig`)
//! - Runtime orchestration (`ColloquyRuntime`)
//! - Logging configuration (`LoggingBuilder`, `init_from_config`)
//!
//! # Configuration Sources
//!
//! Configuration is loaded from (lowest to highest priority): built-in
//! defaults, profile-specific config files, the main config file,
//! `COLLOQUY_*` environment variables, and programmatic overrides.
//!
//! Which file formats are searched depends on cargo features:
//!
//! - `toml-config`: `colloquy.toml`, `config.toml`
//! - `yaml-config`: `colloquy.yaml`, `colloquy.yml`, etc.
//!
//! ```ignore
//! use std::sync::Arc;
//! use colloquy_runtime::ColloquyRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Auto-loads config and initializes logging
//!     let mut runtime = ColloquyRuntime::new();
//!
//!     runtime.use_plugin(Arc::new(MyPlatform::default()));
//!     runtime.initialize().await?;
//!
//!     let response = runtime.handle(request).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ColloquyConfig, ConfigError, ConfigLoader, ConfigResult, LogFormat, LogLevel, LogOutput,
    LoggingConfig, load_config, load_config_from_file, validate_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{ColloquyRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
