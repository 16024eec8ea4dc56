//! # Colloquy
//!
//! An extensible, plugin-driven request-processing framework for Rust.
//!
//! ## Overview
//!
//! Colloquy is built around a small orchestration core: independently-authored
//! plugins register listeners into a fixed pipeline of named stages, per-plugin
//! configuration is deep-merged from defaults, user config, and use-time
//! overrides, and each inbound request is driven through the stages in an
//! isolated context while the application itself stays immutable.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────────────────────────┐
//! │   Runtime   │────▶│ App (plugins +  │────▶│ RequestContext (per request)    │
//! │ (config +   │     │ stage pipeline) │────▶│ RequestContext (per request)    │
//! │  logging)   │     │                 │────▶│ RequestContext ...              │
//! └─────────────┘     └─────────────────┘     └─────────────────────────────────┘
//! ```
//!
//! - **Runtime**: Loads layered configuration and initializes logging
//! - **App**: Long-lived plugin tree, stage pipeline, and component registry
//! - **Plugins**: Named units with install/initialize/mount lifecycle hooks
//! - **Platforms**: Plugins that claim requests and produce the request facade
//! - **RequestContext**: Isolated per-request state, discarded after handling
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use colloquy::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = ColloquyRuntime::new();
//!     runtime.use_plugin(Arc::new(MyPlatform::default()));
//!     runtime.initialize().await?;
//!
//!     let response = runtime.handle(json!({"channel": "web"})).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: newline-delimited JSON log output

pub use colloquy_core as core;
pub use colloquy_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use colloquy::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use colloquy_runtime::ColloquyRuntime;

    // Application and plugin system
    pub use colloquy_core::{App, Extensible, HookContext, Plugin, PluginRole};

    // Pipeline - stage names and listener registration
    pub use colloquy_core::{MiddlewareCollection, STAGES, listener};

    // Platforms and request handling
    pub use colloquy_core::{Facade, Platform, RequestContext};

    // Components
    pub use colloquy_core::ComponentDeclaration;

    // Errors
    pub use colloquy_core::{BoxError, HandleError, HandleResult};
    pub use colloquy_runtime::{RuntimeError, RuntimeResult};
}
