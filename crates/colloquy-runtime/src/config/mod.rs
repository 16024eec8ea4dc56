//! Configuration module for the Colloquy runtime.
//!
//! This module provides layered configuration loading (files, environment,
//! programmatic overrides) and validation for logging settings and
//! per-plugin configuration sections.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ColloquyConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
