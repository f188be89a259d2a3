//! League Sim command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use league_sim_service::{
    initialize_logging_with_config, load_configuration, setup_cancel_flag, Cli, CliHandler,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration before logging so its settings apply
    let mut config =
        load_configuration(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    initialize_logging_with_config(&config.logging)?;

    info!("Starting League Sim v{}", env!("CARGO_PKG_VERSION"));
    info!("Engine v{}", league_sim::VERSION);

    let cancel = setup_cancel_flag()?;
    let handler = CliHandler::new(config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    handler.handle_command(cli.command, &cancel, &mut out)?;

    Ok(())
}
