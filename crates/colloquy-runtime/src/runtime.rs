//! Main runtime orchestration.
//!
//! The runtime loads layered configuration, initializes logging, and wires
//! the per-plugin configuration sections into the application's user config
//! before the plugin tree is initialized.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use colloquy_runtime::ColloquyRuntime;
//!
//! // Simplest way - auto-loads config from current directory
//! let mut runtime = ColloquyRuntime::new();
//!
//! // Custom configuration path
//! let mut runtime = ColloquyRuntime::builder()
//!     .config_file("config/colloquy.toml")
//!     .build()?;
//!
//! // Use pre-loaded config
//! let config = load_config()?;
//! let mut runtime = ColloquyRuntime::from_config(&config);
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::{ColloquyConfig, ConfigLoader, ConfigResult, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use colloquy_core::{App, HostAdapter, Plugin};

/// The main Colloquy runtime wrapping an [`App`] with configuration
/// loading and logging setup.
///
/// # Simple Usage
///
/// ```rust,ignore
/// use colloquy_runtime::ColloquyRuntime;
///
/// // Auto-loads config from colloquy.toml in current directory
/// let mut runtime = ColloquyRuntime::new();
///
/// runtime.use_plugin(Arc::new(MyPlatform::default()));
/// runtime.initialize().await?;
///
/// let response = runtime.handle(request).await?;
/// ```
///
/// # Custom Configuration
///
/// ```rust,ignore
/// // Load from specific file
/// let mut runtime = ColloquyRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
///
/// // Or use pre-loaded config
/// let config = load_config_from_file("colloquy.toml")?;
/// let mut runtime = ColloquyRuntime::from_config(&config);
/// ```
pub struct ColloquyRuntime {
    /// The loaded configuration.
    config: ColloquyConfig,
    /// The application driven by this runtime.
    app: App,
}

impl ColloquyRuntime {
    /// Creates a new runtime with automatic configuration loading.
    ///
    /// This will:
    /// 1. Search for `colloquy.toml` (or `colloquy.yaml`) in the current directory
    /// 2. Initialize logging based on the configuration
    /// 3. Create an application seeded with the per-plugin config sections
    ///
    /// If no configuration file is found, default settings are used.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                ColloquyConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut runtime = ColloquyRuntime::builder()
    ///     .config_file("config/production.toml")
    ///     .profile("production")
    ///     .build()?;
    /// ```
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a new runtime from configuration.
    ///
    /// This initializes logging based on the configuration and seeds the
    /// application's user config with the `plugins` sections, so each
    /// plugin's effective configuration picks up its file-provided layer.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use colloquy_runtime::{ColloquyRuntime, config::load_config};
    ///
    /// let config = load_config()?;
    /// let mut runtime = ColloquyRuntime::from_config(&config);
    /// ```
    pub fn from_config(config: &ColloquyConfig) -> Self {
        // Initialize logging from config (try_init won't panic if already initialized)
        logging::init_from_config(&config.logging);

        let app = App::with_config(config.app_config());

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            plugin_sections = config.plugins.len(),
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            app,
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ColloquyConfig {
        &self.config
    }

    /// Returns a reference to the application.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Returns a mutable reference to the application for registration.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Registers a plugin with the application.
    ///
    /// Convenience delegation; see [`App::use_plugin`].
    pub fn use_plugin(&mut self, plugin: Arc<dyn Plugin>) -> &mut Self {
        self.app.use_plugin(plugin);
        self
    }

    /// Initializes the application's plugin tree.
    ///
    /// Must be called after all plugins are registered and before requests
    /// are handled.
    pub async fn initialize(&mut self) -> RuntimeResult<()> {
        self.app.initialize().await?;
        Ok(())
    }

    /// Handles a single request and returns the response.
    pub async fn handle(&self, request: Value) -> RuntimeResult<Value> {
        Ok(self.app.handle(request).await?)
    }

    /// Handles a single request with an explicit host adapter.
    pub async fn handle_with_host(
        &self,
        request: Value,
        host: Arc<dyn HostAdapter>,
    ) -> RuntimeResult<Value> {
        Ok(self.app.handle_with_host(request, host).await?)
    }
}

impl Default for ColloquyRuntime {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a `ColloquyRuntime` with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let mut runtime = ColloquyRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ColloquyConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the runtime, validating the loaded configuration.
    pub fn build(self) -> ConfigResult<ColloquyRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;
        Ok(ColloquyRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use colloquy_core::{BoxError, Facade, HookContext, Platform, PluginRole, listener};
    use serde_json::json;

    #[derive(Default)]
    struct EchoPlatform;

    #[async_trait]
    impl Plugin for EchoPlatform {
        fn name(&self) -> &str {
            "echo"
        }

        fn role(&self) -> PluginRole {
            PluginRole::Platform
        }

        fn default_config(&self) -> Value {
            json!({"greeting": "hello"})
        }

        fn as_platform(&self) -> Option<&dyn Platform> {
            Some(self)
        }

        async fn initialize(&self, ctx: &HookContext<'_>) -> Result<(), BoxError> {
            // Stash the effective greeting where the test can read it back.
            assert!(ctx.config().is_object());
            Ok(())
        }
    }

    impl Platform for EchoPlatform {
        fn owns_request(&self, request: &Value) -> bool {
            request.get("channel").and_then(Value::as_str) == Some("echo")
        }

        fn create_facade(&self, request: &Value) -> Facade {
            Facade::new("echo", request.clone())
        }
    }

    #[tokio::test]
    async fn test_from_config_wires_plugin_sections() {
        let config: ColloquyConfig = serde_json::from_value(json!({
            "plugins": {"echo": {"greeting": "howdy"}},
        }))
        .unwrap();

        let mut runtime = ColloquyRuntime::from_config(&config);
        runtime.use_plugin(Arc::new(EchoPlatform));
        runtime.initialize().await.unwrap();

        let entry = runtime.app().plugins().entry("echo").unwrap();
        let effective = entry.effective_config().unwrap();
        assert_eq!(effective["greeting"], json!("howdy"));
    }

    #[tokio::test]
    async fn test_handle_through_runtime() {
        let config = ColloquyConfig::default();
        let mut runtime = ColloquyRuntime::from_config(&config);
        runtime.use_plugin(Arc::new(EchoPlatform));
        runtime
            .app_mut()
            .middleware()
            .register(
                "response",
                listener(|_ctx, facade| async move {
                    facade.unwrap().set_response(json!({"text": "done"}));
                    Ok(())
                }),
            )
            .unwrap();
        runtime.initialize().await.unwrap();

        let response = runtime.handle(json!({"channel": "echo"})).await.unwrap();
        assert_eq!(response, json!({"text": "done"}));
    }
}
