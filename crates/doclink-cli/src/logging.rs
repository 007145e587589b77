//! Logging setup for the `doclink` binary
//!
//! Everything goes to stderr so stdout stays machine-readable. `RUST_LOG`
//! takes precedence over the filter derived from the command line.

use clap::ValueEnum;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Whether to log span open/close events
    pub enable_spans: bool,

    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            include_location: false,
            enable_spans: false,
            default_filter: "warn,doclink=info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Configuration for `-v`: lifecycle events and connect spans
    pub fn verbose() -> Self {
        Self {
            include_location: cfg!(debug_assertions),
            enable_spans: true,
            default_filter: "info,doclink=debug,doclink_connection=debug,doclink_driver_mongodb=debug"
                .to_string(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn span_events(&self) -> FmtSpan {
        // NEW fires once per span; ENTER would repeat on every poll of an awaited future.
        if self.enable_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Install the global subscriber
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_filter)?,
    };

    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(config.span_events())
            .with_ansi(true)
            .compact()
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(config.span_events())
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::debug!(format = ?config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.enable_spans);
        assert!(config.default_filter.starts_with("warn"));
    }

    #[test]
    fn test_verbose_config() {
        let config = LoggingConfig::verbose().with_format(LogFormat::Json);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.enable_spans);
        assert!(config.default_filter.contains("doclink_connection=debug"));
        assert_eq!(config.span_events(), FmtSpan::NEW | FmtSpan::CLOSE);
    }

    #[test]
    fn test_default_filters_parse() {
        for config in [LoggingConfig::default(), LoggingConfig::verbose()] {
            assert!(EnvFilter::try_new(&config.default_filter).is_ok());
        }
    }
}
