//! Logging setup for the Colloquy runtime.
//!
//! Built on `tracing` and `tracing-subscriber`. Each pipeline stage runs
//! inside a `stage` span, so span events are the main debugging aid for
//! listener ordering problems: enabling them shows exactly when a stage
//! begins and ends relative to each listener's log lines.
//!
//! # Configuration-Based Initialization
//!
//! ```rust,ignore
//! use colloquy_runtime::config::load_config;
//! use colloquy_runtime::logging;
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual Initialization
//!
//! ```rust,ignore
//! use colloquy_runtime::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .directive("colloquy_core=debug")
//!     .span_events(SpanEvents::STAGE_BOUNDARIES)
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

/// Which span lifecycle events appear in log output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanEvents {
    /// Log when a span is created.
    pub new: bool,
    /// Log when a span is entered.
    pub enter: bool,
    /// Log when a span is exited.
    pub exit: bool,
    /// Log when a span is closed (dropped).
    pub close: bool,
}

impl SpanEvents {
    /// No span events will be logged.
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Log stage entry and completion only.
    ///
    /// One line when a stage span is created and one when it closes, which
    /// brackets the listener output of that stage without enter/exit noise.
    pub const STAGE_BOUNDARIES: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    /// Log every span event.
    pub const VERBOSE: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn to_fmt_span(self) -> fmt::format::FmtSpan {
        let mut span = fmt::format::FmtSpan::NONE;
        if self.new {
            span |= fmt::format::FmtSpan::NEW;
        }
        if self.enter {
            span |= fmt::format::FmtSpan::ENTER;
        }
        if self.exit {
            span |= fmt::format::FmtSpan::EXIT;
        }
        if self.close {
            span |= fmt::format::FmtSpan::CLOSE;
        }
        span
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self {
            new: config.new,
            enter: config.enter,
            exit: config.exit,
            close: config.close,
        }
    }
}

/// Initialize logging from a `LoggingConfig`.
///
/// The primary entry point for Colloquy applications; reads every setting
/// from the configuration. Safe to call more than once — a subscriber that
/// is already installed is left in place.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

// =============================================================================
// LoggingBuilder
// =============================================================================

/// A builder for configuring logging by hand.
///
/// # Example
///
/// ```rust,ignore
/// use colloquy_runtime::logging::{LoggingBuilder, SpanEvents};
/// use tracing::Level;
///
/// LoggingBuilder::new()
///     .with_level(Level::DEBUG)
///     .span_events(SpanEvents::STAGE_BOUNDARIES)
///     .with_thread_ids(true)
///     .init();
/// ```
#[derive(Default)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Option<tracing::Level>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    with_target: bool,
    with_thread_ids: bool,
    /// Source file and line number, toggled together.
    with_location: bool,
    file_path: Option<PathBuf>,
}

impl LoggingBuilder {
    /// Create a new logging builder.
    pub fn new() -> Self {
        Self {
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            with_target: true,
            ..Default::default()
        }
    }

    /// Create a builder from a `LoggingConfig`.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();

        builder.level = Some(config.level.to_tracing_level());
        builder.format = config.format;
        builder.output = config.output;
        builder.span_events = SpanEvents::from(&config.span_events);
        builder.with_thread_ids = config.thread_ids;
        builder.with_location = config.file_location;
        builder.file_path.clone_from(&config.file_path);

        for (target, level) in &config.filters {
            builder
                .directives
                .push(format!("{}={}", target, level.as_str()));
        }

        builder
    }

    /// Set the global log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Add a per-target filter directive, e.g. `"colloquy_core=debug"`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Configure which span lifecycle events are logged.
    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    /// Set the output format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Include the target (module path) in log output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Include thread IDs in log output.
    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Include source file and line number in log output.
    pub fn with_location(mut self, enabled: bool) -> Self {
        self.with_location = enabled;
        self
    }

    /// Set the log file path used when the output is `File`.
    pub fn file_path(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    /// Build the filter from the level and directives.
    ///
    /// `RUST_LOG`, when set, takes precedence over the configured level;
    /// explicit directives are added on top either way.
    fn build_filter(&self) -> EnvFilter {
        let base_level = self.level.unwrap_or(tracing::Level::INFO);
        let base_filter = base_level.to_string().to_lowercase();

        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base_filter));

        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        filter
    }

    /// Resolve the output destination into a type-erased writer.
    fn make_writer(&self) -> BoxMakeWriter {
        match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File => match &self.file_path {
                Some(path) => {
                    let appender = tracing_appender::rolling::never(
                        path.parent().unwrap_or_else(|| Path::new(".")),
                        path.file_name()
                            .unwrap_or_else(|| OsStr::new("colloquy.log")),
                    );
                    BoxMakeWriter::new(appender)
                }
                None => {
                    warn!(
                        "File output requested but no file path configured, falling back to stdout"
                    );
                    BoxMakeWriter::new(std::io::stdout)
                }
            },
        }
    }

    /// Initialize the logging system, ignoring an already-installed subscriber.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Try to initialize the logging system, returning an error on failure.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();
        let events = self.span_events.to_fmt_span();
        let writer = self.make_writer();

        let layer = fmt::layer()
            .with_span_events(events)
            .with_target(self.with_target)
            .with_thread_ids(self.with_thread_ids)
            .with_file(self.with_location)
            .with_line_number(self.with_location)
            .with_writer(writer);

        let registry = tracing_subscriber::registry().with(filter);
        match self.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => registry.with(layer.json()).try_init(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => {
                warn!("JSON log format requested without the json-log feature, using compact");
                registry.with(layer.compact()).try_init()
            }
            LogFormat::Compact => registry.with(layer.compact()).try_init(),
            LogFormat::Full => registry.with(layer).try_init(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, SpanEventConfig};

    #[test]
    fn test_span_events_from_config() {
        let config = SpanEventConfig {
            new: true,
            enter: false,
            exit: false,
            close: true,
        };

        let events = SpanEvents::from(&config);
        assert!(events.new && events.close);
        assert!(!events.enter && !events.exit);
    }

    #[test]
    fn test_builder_from_config_carries_filters() {
        let mut config = LoggingConfig::default();
        config.level = LogLevel::Debug;
        config.file_location = true;
        config
            .filters
            .insert("colloquy_core".to_string(), LogLevel::Trace);

        let builder = LoggingBuilder::from_config(&config);

        assert_eq!(builder.level, Some(tracing::Level::DEBUG));
        assert!(builder.with_location);
        assert_eq!(builder.directives, vec!["colloquy_core=trace".to_string()]);
    }
}
