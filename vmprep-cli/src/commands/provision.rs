//! `vmprep provision` command handler

use std::sync::Arc;

use tracing::info;

use vmprep_core::command::CommandRunner;
use vmprep_core::config::ProvisionConfig;
use vmprep_provision::Provisioner;

use crate::cli::ProvisionArgs;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `provision` command.
///
/// # Errors
///
/// Returns `CliError::Provision` carrying the failing tool's exit status.
pub async fn execute<R: CommandRunner>(
    args: ProvisionArgs,
    config: ProvisionConfig,
    runner: Arc<R>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(srpm = %args.srpm.display(), "starting provisioning");

    let provisioner = Provisioner::new(runner, config);
    let report = provisioner.provision(&args.srpm).await?;

    writer.render(&report)?;
    Ok(())
}
