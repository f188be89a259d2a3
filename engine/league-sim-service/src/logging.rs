//! Logging and tracing setup

use anyhow::{Context, Result};
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::{
    fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt, prelude::*, util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Initialize logging with custom configuration.
///
/// Logs go to stderr so report output on stdout stays machine-readable.
pub fn initialize_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter =
        select_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), &config.level)?;

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {:?}", path))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed(),
        "pretty" => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_target(false)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(ansi)
            .boxed(),
        _ => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_target(false)
            .with_thread_names(true)
            .with_ansi(ansi)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// `RUST_LOG` directives when present and valid, otherwise the configured level
fn select_filter(env_directives: Option<&str>, level: &str) -> Result<EnvFilter> {
    if let Some(directives) = env_directives.filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return Ok(filter);
        }
    }
    EnvFilter::try_new(level).with_context(|| format!("Invalid log filter: {}", level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_directives_take_precedence() {
        let filter = select_filter(Some("league_sim=trace"), "warn").unwrap();
        assert!(filter.to_string().contains("league_sim=trace"));
    }

    #[test]
    fn test_configured_level_without_env() {
        let filter = select_filter(None, "debug").unwrap();
        assert!(filter.to_string().contains("debug"));

        let filter = select_filter(Some("  "), "error").unwrap();
        assert!(filter.to_string().contains("error"));
    }

    #[test]
    fn test_invalid_configured_level_is_an_error() {
        assert!(select_filter(None, "league_sim=loud").is_err());
    }
}
