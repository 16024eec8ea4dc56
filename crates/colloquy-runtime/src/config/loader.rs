//! Configuration loader using figment.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`colloquy.{profile}.toml`)
//! 3. Main config file (`colloquy.toml` / `colloquy.yaml`)
//! 4. Environment variables (`COLLOQUY_*`)
//! 5. Programmatic overrides
//!
//! Discovery walks the search paths (current directory, then the user
//! config directory under `colloquy/`) and stops at the first directory
//! holding a recognized config file. Which file names are recognized
//! depends on cargo features:
//!
//! - `toml-config`: `colloquy.toml`, `config.toml`
//! - `yaml-config`: `colloquy.yaml`, `colloquy.yml`, `config.yaml`, `config.yml`
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `COLLOQUY_` prefix with `__` as the
//! nesting separator:
//!
//! - `COLLOQUY_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `COLLOQUY_PLUGINS__ROUTER__STRICT=true` → `plugins.router.strict = true`
//!
//! # Example
//!
//! ```rust,ignore
//! use colloquy_runtime::config::{ColloquyConfig, ConfigLoader};
//!
//! // Simple loading from default locations
//! let config = ConfigLoader::new().load()?;
//!
//! // Load with specific profile
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .load()?;
//!
//! // Load from specific file with env overrides
//! let config = ConfigLoader::new()
//!     .file("./config/colloquy.toml")
//!     .with_env()
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::ColloquyConfig;

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Creates a profile from `COLLOQUY_PROFILE` or defaults to Development.
    pub fn from_env() -> Self {
        std::env::var("COLLOQUY_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            _ => Self::Custom(name.to_string()),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigLoader::new()
///     .file("colloquy.yaml")
///     .with_env()
///     .load()?;
/// ```
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    figment: Figment,
    /// Configuration profile.
    profile: Profile,
    /// Search paths for configuration files; defaults when empty.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (skips discovery).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new()
    ///     .merge(ColloquyConfig {
    ///         logging: LoggingConfig { level: LogLevel::Debug, ..Default::default() },
    ///         ..Default::default()
    ///     })
    ///     .load()?;
    /// ```
    pub fn merge(mut self, config: ColloquyConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<ColloquyConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: ColloquyConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Stacks all sources into one figment.
    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ColloquyConfig::default()));

        let overrides = std::mem::take(&mut self.figment);
        figment = figment.merge(overrides);

        figment = match &self.config_file {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration file");
                Self::merge_config_file(figment, path)?
            }
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => self.discover(figment),
        };

        if self.load_env {
            trace!("Loading environment variables with COLLOQUY_ prefix");
            figment = figment.merge(
                Env::prefixed("COLLOQUY_")
                    .split("__")
                    .map(|key| key.as_str().replace("__", ".").into()),
            );
        }

        Ok(figment)
    }

    /// Merges an explicitly named config file, dispatching on extension.
    ///
    /// Only extensions enabled via feature flags are accepted.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    /// Merges a file discovered by [`discover`](Self::discover).
    ///
    /// Candidate names are built under the same feature gates, so an
    /// unrecognized extension cannot occur here; the fallthrough is a no-op.
    fn merge_discovered(figment: Figment, path: &Path) -> Figment {
        match path.extension().and_then(|e| e.to_str()) {
            #[cfg(feature = "toml-config")]
            Some("toml") => figment.merge(Toml::file(path)),
            #[cfg(feature = "yaml-config")]
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            _ => figment,
        }
    }

    /// Base file names recognized by discovery, in precedence order.
    fn base_names() -> Vec<&'static str> {
        let mut names = Vec::new();
        #[cfg(feature = "toml-config")]
        names.extend(["colloquy.toml", "config.toml"]);
        #[cfg(feature = "yaml-config")]
        names.extend(["colloquy.yaml", "colloquy.yml", "config.yaml", "config.yml"]);
        names
    }

    /// The effective search paths: explicit ones, or cwd plus the user
    /// config directory.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("colloquy"));
        }
        paths
    }

    /// Config file candidates within one directory, profile-specific
    /// variants first so the base file can override them.
    fn candidates(&self, dir: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for name in Self::base_names() {
            if let Some((stem, ext)) = name.rsplit_once('.') {
                out.push(dir.join(format!("{stem}.{}.{ext}", self.profile.as_str())));
                out.push(dir.join(name));
            }
        }
        out
    }

    /// Searches the paths and merges every existing candidate of the first
    /// directory that holds one.
    fn discover(&self, mut figment: Figment) -> Figment {
        for dir in self.resolve_search_paths() {
            let mut found = false;
            for candidate in self.candidates(&dir) {
                if candidate.exists() {
                    info!(path = %candidate.display(), "Loading configuration file");
                    figment = Self::merge_discovered(figment, &candidate);
                    found = true;
                }
            }
            if found {
                return figment;
            }
        }
        warn!("No configuration file found, using defaults");
        figment
    }
}

/// Loads configuration from default locations with environment overrides.
pub fn load_config() -> ConfigResult<ColloquyConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ColloquyConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigLoader::new().without_env().load().unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_profile_from_env() {
        // SAFETY: This test is single-threaded and we clean up immediately after
        unsafe {
            std::env::set_var("COLLOQUY_PROFILE", "production");
        }
        let profile = Profile::from_env();
        assert!(matches!(profile, Profile::Production));
        unsafe {
            std::env::remove_var("COLLOQUY_PROFILE");
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigLoader::new()
            .file("/nonexistent/colloquy.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_candidates_put_profile_variant_before_base() {
        let loader = ConfigLoader::new().profile("production");
        let candidates = loader.candidates(Path::new("/etc/colloquy"));

        let profiled = candidates
            .iter()
            .position(|p| p.ends_with("colloquy.production.toml"))
            .unwrap();
        let base = candidates
            .iter()
            .position(|p| p.ends_with("colloquy.toml"))
            .unwrap();
        assert!(profiled < base);
    }

    #[test]
    fn test_programmatic_merge_wins_over_defaults() {
        use super::super::schema::{LogLevel, LoggingConfig};

        let config = ConfigLoader::new()
            .without_env()
            .merge(ColloquyConfig {
                logging: LoggingConfig {
                    level: LogLevel::Debug,
                    ..Default::default()
                },
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
