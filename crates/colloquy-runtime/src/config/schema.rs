//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColloquyConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-plugin configuration sections, keyed by plugin name.
    ///
    /// These become the application's `plugin.<name>` user layers, merged
    /// over each plugin's defaults during initialization.
    #[serde(default)]
    pub plugins: HashMap<String, Value>,
}

impl ColloquyConfig {
    /// Builds the user configuration tree handed to the application.
    pub fn app_config(&self) -> Value {
        let mut sections = serde_json::Map::new();
        for (name, section) in &self.plugins {
            sections.insert(name.clone(), section.clone());
        }
        Value::Object(
            [("plugin".to_string(), Value::Object(sections))]
                .into_iter()
                .collect(),
        )
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log severity level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug information.
    Debug,
    /// Standard operational messages.
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Returns the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Default human-readable format.
    Full,
    /// Condensed single-line format.
    #[default]
    Compact,
    /// Multi-line, indented format.
    Pretty,
    /// Newline-delimited JSON (requires the `json-log` feature).
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// A log file (requires `file_path`).
    File,
}

/// Span lifecycle events to include in log output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct SpanEventConfig {
    /// Log span creation.
    #[serde(default)]
    pub new: bool,
    /// Log span entry.
    #[serde(default)]
    pub enter: bool,
    /// Log span exit.
    #[serde(default)]
    pub exit: bool,
    /// Log span close.
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread IDs in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line number in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-target level overrides, e.g. `colloquy_core = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ColloquyConfig::default();

        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.output, LogOutput::Stdout);
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_plugin_sections_deserialize() {
        let config: ColloquyConfig = serde_json::from_value(json!({
            "logging": {"level": "debug"},
            "plugins": {
                "router": {"strict": true},
            },
        }))
        .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.plugins["router"], json!({"strict": true}));
    }

    #[test]
    fn test_app_config_shape() {
        let config: ColloquyConfig = serde_json::from_value(json!({
            "plugins": {"router": {"strict": true}},
        }))
        .unwrap();

        assert_eq!(
            config.app_config(),
            json!({"plugin": {"router": {"strict": true}}})
        );
    }
}
