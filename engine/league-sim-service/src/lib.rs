//! League Sim Service Library
//!
//! Command-line driver for the league simulation engine: layered
//! configuration, logging setup, snapshot loading, batch execution and
//! report rendering.

use anyhow::{Context, Result};
use std::path::Path;

pub mod cli;
pub mod config;
pub mod input;
pub mod logging;
pub mod output;
pub mod signals;

pub use cli::{Cli, CliHandler, Commands};
pub use config::ServiceConfig;
pub use logging::initialize_logging_with_config;
pub use signals::setup_cancel_flag;

/// Load configuration from files and environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    config::load_config(path).context("Failed to load service configuration")
}
