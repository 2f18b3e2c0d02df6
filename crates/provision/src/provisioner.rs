//! Provisioning orchestrator.
//!
//! [`Provisioner`] runs the five provisioning stages in a fixed order. Every
//! stage must succeed before the next one starts; the only failure that does
//! not abort the run is erasing a previously installed package.
//!
//! ```text
//! prerequisite -> grow root volume -> rebuild SRPM -> reinstall packages -> enable services
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use vmprep_core::command::CommandRunner;
use vmprep_core::config::ProvisionConfig;
use vmprep_core::step::{RunReport, StepExecutor};

use crate::build;
use crate::disk;
use crate::error::ProvisionError;
use crate::packages::{self, PackageSet};
use crate::prereq;
use crate::services;

/// Build VM provisioner.
pub struct Provisioner<R: CommandRunner> {
    runner: Arc<R>,
    config: ProvisionConfig,
}

impl<R: CommandRunner> Provisioner<R> {
    pub fn new(runner: Arc<R>, config: ProvisionConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Provisions the host from `srpm`.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error. Command failures carry the
    /// external tool's exit status (see [`ProvisionError::exit_code`]).
    pub async fn provision(&self, srpm: impl AsRef<Path>) -> Result<RunReport, ProvisionError> {
        let srpm = srpm.as_ref();
        build::check_source_package(srpm).await?;

        let mut exec = StepExecutor::new(Arc::clone(&self.runner), "provision");

        info!(stage = "prerequisite", package = %self.config.prerequisite_package, "stage start");
        let action = prereq::ensure_prerequisite(&mut exec, &self.config).await?;
        info!(stage = "prerequisite", ?action, "stage done");

        info!(stage = "disk", device = %self.config.disk.device, "stage start");
        disk::grow_root_volume(&mut exec, &self.config.disk).await?;

        info!(stage = "rebuild", srpm = %srpm.display(), "stage start");
        build::rebuild(&mut exec, &self.config.build, srpm).await?;

        let result_dir = Path::new(&self.config.build.result_dir);
        let set = PackageSet::scan(result_dir).await?;
        if set.is_empty() {
            return Err(ProvisionError::NoBinaryPackages {
                dir: result_dir.display().to_string(),
            });
        }

        info!(stage = "install", count = set.len(), "stage start");
        packages::reinstall(&mut exec, &set).await?;

        info!(stage = "services", services = ?self.config.services, "stage start");
        services::enable_services(&mut exec, &self.config.services).await?;

        let report = exec.finish();
        info!(
            steps = report.steps.len(),
            tolerated = report.tolerated_count(),
            "provisioning complete"
        );
        Ok(report)
    }
}
