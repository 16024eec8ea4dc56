//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ColloquyConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ColloquyConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_plugin_sections(config)?;
    Ok(())
}

/// Validates logging configuration settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        match &logging.file_path {
            None => {
                return Err(ConfigError::validation(
                    "logging.file_path is required when logging.output is \"file\"",
                ));
            }
            Some(path) if path.as_os_str().is_empty() => {
                return Err(ConfigError::validation("logging.file_path cannot be empty"));
            }
            Some(_) => {}
        }
    }

    for target in logging.filters.keys() {
        if target.is_empty() {
            return Err(ConfigError::validation(
                "logging.filters cannot contain an empty target name",
            ));
        }
    }

    Ok(())
}

/// Validates per-plugin configuration sections.
fn validate_plugin_sections(config: &ColloquyConfig) -> ConfigResult<()> {
    for (name, section) in &config.plugins {
        if name.is_empty() {
            return Err(ConfigError::validation(
                "Plugin configuration sections must have a non-empty name",
            ));
        }

        if !section.is_object() {
            return Err(ConfigError::validation(format!(
                "Plugin section '{name}' must be a table of settings"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_empty_config() {
        let config = ColloquyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = ColloquyConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("/var/log/colloquy.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_plugin_section_must_be_object() {
        let mut config = ColloquyConfig::default();
        config
            .plugins
            .insert("router".to_string(), json!("not-a-table"));

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
