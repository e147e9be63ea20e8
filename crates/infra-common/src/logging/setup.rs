use crate::errors::types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The log level to use
    pub level: Level,
    /// Whether to enable JSON formatting
    pub json: bool,
    /// Whether to include file and line information
    pub file_info: bool,
    /// Whether to log span open/close events
    pub log_spans: bool,
    /// Application name included in the welcome line
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            log_spans: false,
            app_name: "pjtune".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from the `[logging]` settings section
    pub fn from_settings(settings: &LoggingSettings, app_name: impl Into<String>) -> Result<Self> {
        let mut config = Self::new(parse_log_level(&settings.level)?, app_name);
        if settings.json {
            config = config.with_json();
        }
        if settings.file_info {
            config = config.with_file_info();
        }
        if settings.spans {
            config = config.with_spans();
        }
        Ok(config)
    }

    /// Enable JSON formatting
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Enable file and line information in logs
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Enable span logging
    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }
}

/// The `[logging]` section of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
    /// Include source file and line in each event
    pub file_info: bool,
    /// Log span open/close events (one span per reconciliation cycle)
    pub spans: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
            spans: false,
        }
    }
}

/// Filter from `RUST_LOG` when it is set and valid, otherwise from the configured level
fn env_filter(level: Level, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()))
}

/// Set up the logging system with the provided configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so that command output on stdout stays machine-readable.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(config.level, rust_log.as_deref());

    let span_events = if config.log_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let mut subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events);

    if config.file_info {
        subscriber = subscriber.with_file(true).with_line_number(true);
    }

    let subscriber = subscriber.with_writer(std::io::stderr);

    let installed = if config.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    installed.map_err(|e| Error::Logging(e.to_string()))
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| Error::Config(format!("Invalid log level: {}", level)))
}

/// Log a welcome message with version info
pub fn log_welcome(config: &LoggingConfig, version: &str) {
    tracing::info!("Starting {} v{}", config.app_name, version);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
    }

    #[test]
    fn rejects_unknown_level() {
        let err = parse_log_level("chatty").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn settings_carry_json_flag() {
        let settings = LoggingSettings {
            level: "trace".to_string(),
            json: true,
            ..Default::default()
        };
        let config = LoggingConfig::from_settings(&settings, "test").unwrap();
        assert_eq!(config.level, Level::TRACE);
        assert!(config.json);
        assert!(!config.file_info);
        assert!(!config.log_spans);
        assert_eq!(config.app_name, "test");
    }

    #[test]
    fn settings_enable_file_info_and_spans() {
        let settings = LoggingSettings {
            file_info: true,
            spans: true,
            ..Default::default()
        };
        let config = LoggingConfig::from_settings(&settings, "pjtune-optimizer").unwrap();
        assert!(config.file_info);
        assert!(config.log_spans);
        assert!(!config.json);
    }

    #[test]
    fn rust_log_overrides_configured_level() {
        let filter = env_filter(Level::WARN, Some("debug"));
        assert_eq!(filter.to_string(), "debug");

        let filter = env_filter(Level::WARN, Some("probe_core=trace"));
        assert_eq!(filter.to_string(), "probe_core=trace");
    }

    #[test]
    fn configured_level_applies_without_rust_log() {
        assert_eq!(env_filter(Level::WARN, None).to_string(), "warn");
        assert_eq!(env_filter(Level::INFO, Some("  ")).to_string(), "info");
        assert_eq!(env_filter(Level::INFO, Some("probe_core=verbose")).to_string(), "info");
    }
}
