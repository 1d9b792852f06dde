//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! # Log Levels
//!
//! - `error`: run aborted by the settings repository
//! - `warn`: skipped elements, missing types, failed devices
//! - `info`: run progress and per-device outcomes
//! - `debug`: per-row misses and matching detail
//!
//! # Usage
//!
//! ```ignore
//! use relay_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_section(&relay_config.logging);
//! init_logging(&config)?;
//! ```

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use relay_config::LoggingSection;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter (error, warn, info, debug, trace).
    pub level: Level,
    pub with_timestamps: bool,
    /// Whether to include the module path in log output.
    pub with_target: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Logs go to this file instead of stderr when set.
    pub log_file: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    /// One object per event; device spans are reported when they close.
    Json,
}

impl LogFormat {
    /// Parse a format name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_timestamps: false,
            with_target: false,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl LogConfig {
    /// Build from the `[logging]` section of the configuration file.
    ///
    /// Unknown level or format names fall back to the defaults. File output
    /// is written without ANSI colours.
    #[must_use]
    pub fn from_section(section: &LoggingSection) -> Self {
        let defaults = Self::default();
        Self {
            level: Level::from_str(section.level.trim()).unwrap_or(defaults.level),
            format: LogFormat::parse(&section.format).unwrap_or(defaults.format),
            with_timestamps: section.with_timestamps,
            with_target: section.with_target,
            with_ansi: section.log_file.is_none(),
            log_file: section.log_file.clone(),
            ..defaults
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.with_timestamps = enable;
        self
    }

    #[must_use]
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log file path (writes to stderr when None).
    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            init_logging_with_writer(config, Mutex::new(file))
        }
        None => init_logging_with_writer(config, io::stderr),
    }
}

/// Install the global tracing subscriber with a custom writer.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> io::Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = build_env_filter(config.level);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(config.with_target)
                .with_span_events(fmt::format::FmtSpan::CLOSE);
            registry.with(layer).try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target);
            if config.with_timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target);
            if config.with_timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
    };
    installed.map_err(io::Error::other)
}

/// `RUST_LOG` wins over the configured level.
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},relay_config={level},relay_core={level},relay_map={level},relay_model={level}",
            level = level.as_str().to_lowercase()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_maps_onto_config() {
        let section = LoggingSection {
            level: "debug".to_string(),
            format: "JSON".to_string(),
            with_timestamps: true,
            with_target: false,
            log_file: None,
        };
        let config = LogConfig::from_section(&section);
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.with_timestamps);
        assert!(config.with_ansi);
    }

    #[test]
    fn file_output_drops_colours() {
        let section = LoggingSection {
            log_file: Some(PathBuf::from("relay-run.log")),
            ..LoggingSection::default()
        };
        let config = LogConfig::from_section(&section);
        assert!(!config.with_ansi);
        assert_eq!(config.log_file, Some(PathBuf::from("relay-run.log")));
    }

    #[test]
    fn unknown_names_fall_back() {
        let section = LoggingSection {
            level: "chatty".to_string(),
            format: "xml".to_string(),
            with_timestamps: false,
            with_target: true,
            log_file: None,
        };
        let config = LogConfig::from_section(&section);
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.with_target);
    }
}
