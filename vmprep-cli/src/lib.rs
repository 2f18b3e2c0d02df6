//! vmprep command-line interface.
//!
//! - [`cli`]: clap argument definitions
//! - [`commands`]: one handler per subcommand
//! - [`output`]: text / JSON rendering
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: `CliError` and exit code mapping

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

use std::sync::Arc;

use vmprep_core::command::SystemCommandRunner;
use vmprep_core::config::GeneralConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Run a parsed command line to completion.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config(args) => {
            logging::init_tracing(&GeneralConfig::default(), cli.log_level.as_deref())?;
            commands::config::execute(args, config_path, &writer).await
        }
        Commands::Provision(args) => {
            let (config, source) = commands::load_config(config_path).await?;
            logging::init_tracing(&config.general, cli.log_level.as_deref())?;
            tracing::debug!(source = %source, "configuration loaded");
            let runner = Arc::new(SystemCommandRunner::new());
            commands::provision::execute(args, config.provision, runner, &writer).await
        }
        Commands::Dispatch(args) => {
            let (config, source) = commands::load_config(config_path).await?;
            logging::init_tracing(&config.general, cli.log_level.as_deref())?;
            tracing::debug!(source = %source, "configuration loaded");
            let runner = Arc::new(SystemCommandRunner::new());
            commands::dispatch::execute(args, config.dispatch, runner, &writer).await
        }
    }
}
