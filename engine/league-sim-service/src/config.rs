//! Service configuration management

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use league_sim::{LeagueConfig, DEFAULT_RUNS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "league-sim.toml";

/// Prefix for environment overrides, e.g. `LEAGUE_SIM_SIMULATION__RUNS`
pub const ENV_PREFIX: &str = "LEAGUE_SIM";

/// Main service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// League rules, auction behaviour and scoring model
    pub league: LeagueConfig,

    /// Batch settings
    pub simulation: SimulationSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Batch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Runs per batch
    pub runs: u64,

    /// Worker threads
    pub workers: usize,

    /// Batch seed
    pub seed: u64,

    /// Wall-clock limit for a batch in seconds
    pub deadline_secs: Option<u64>,

    /// League snapshot (JSON); synthetic data is used when unset
    pub snapshot: Option<PathBuf>,

    /// Separate league TOML file, replacing the `[league]` table
    pub league_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,

    /// Log file path (if None, logs go to stderr)
    pub file: Option<PathBuf>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            workers: num_cpus::get(),
            seed: 0,
            deadline_secs: None,
            snapshot: None,
            league_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string(), file: None }
    }
}

/// Load configuration from a file and environment variables.
///
/// An explicit `path` must exist; otherwise `league-sim.toml` in the working
/// directory is used when present.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let file = match path {
        Some(path) => {
            tracing::debug!("Loading configuration from file: {:?}", path);
            File::from(path).required(true)
        }
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let mut config: ServiceConfig = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration sources")?
        .try_deserialize()
        .context("Failed to parse configuration")?;

    if let Some(league_file) = &config.simulation.league_file {
        config.league = LeagueConfig::from_file(league_file)
            .with_context(|| format!("Failed to load league file: {:?}", league_file))?;
    }

    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    config.league.validate().context("Invalid league configuration")?;

    if config.simulation.runs == 0 {
        return Err(anyhow::anyhow!("Invalid run count: {}", config.simulation.runs));
    }
    if config.simulation.workers == 0 {
        return Err(anyhow::anyhow!("Invalid worker count: {}", config.simulation.workers));
    }

    // Validate log level
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    // Validate log format
    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    Ok(())
}

/// Save configuration to a TOML file
pub fn save_config(config: &ServiceConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write configuration file: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.simulation.runs, DEFAULT_RUNS);
        assert!(config.simulation.workers >= 1);
    }

    #[test]
    fn test_invalid_log_settings_rejected() {
        let mut config = ServiceConfig::default();
        config.logging.level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(
            &path,
            r#"
[simulation]
runs = 250
workers = 2
seed = 17

[logging]
level = "debug"

[league.roster]
teams = 12
budget = 300
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.simulation.runs, 250);
        assert_eq!(config.simulation.workers, 2);
        assert_eq!(config.simulation.seed, 17);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.league.roster.teams, 12);
        assert_eq!(config.league.roster.budget, 300);
        assert_eq!(config.league.roster.starters.wr, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = ServiceConfig::default();
        config.simulation.workers = 3;
        config.simulation.deadline_secs = Some(30);
        save_config(&config, &path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.simulation.workers, 3);
        assert_eq!(loaded.simulation.deadline_secs, Some(30));
        assert_eq!(loaded.league, config.league);
    }

    #[test]
    fn test_league_file_overrides_table() {
        let dir = TempDir::new().unwrap();
        let league_path = dir.path().join("league.toml");
        let mut league = LeagueConfig::default();
        league.roster.teams = 8;
        league.season.playoff_teams = 4;
        league.season.playoff_byes = 0;
        league.season.wildcards = 0;
        league.to_file(&league_path).unwrap();

        let path = dir.path().join("service.toml");
        std::fs::write(&path, format!("[simulation]\nleague_file = {:?}\n", league_path)).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.league.roster.teams, 8);
    }
}
