//! Service enablement.

use vmprep_core::command::{CommandRunner, Invocation};
use vmprep_core::step::{FailurePolicy, StepExecutor};

use crate::error::ProvisionError;

/// Enables each service for the next boot without starting it now.
pub async fn enable_services<R: CommandRunner>(
    exec: &mut StepExecutor<R>,
    services: &[String],
) -> Result<(), ProvisionError> {
    for service in services {
        exec.run(
            "enable-service",
            Invocation::new("systemctl").args(["enable", service.as_str()]),
            FailurePolicy::Fatal,
        )
        .await?;
    }
    Ok(())
}
