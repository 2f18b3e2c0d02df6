//! Prerequisite library installation.
//!
//! On the enterprise distribution the library lives in a separate repository
//! whose definition file is fetched, used for exactly one install with
//! certificate verification off, and removed again. Every other distribution
//! installs straight from its configured repositories.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use vmprep_core::command::{CommandRunner, Invocation};
use vmprep_core::config::ProvisionConfig;
use vmprep_core::step::{FailurePolicy, StepExecutor};

use crate::error::ProvisionError;
use crate::host::OsRelease;

/// What the prerequisite step ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrerequisiteAction {
    /// `rpm -q` found the package; nothing was installed
    AlreadyInstalled,
    /// Installed from the temporary enterprise repository
    InstalledFromRepo {
        /// `--releasever` passed to the package manager
        release: String,
    },
    /// Installed with the default package manager configuration
    Installed,
}

/// Makes sure `config.prerequisite_package` is installed.
pub async fn ensure_prerequisite<R: CommandRunner>(
    exec: &mut StepExecutor<R>,
    config: &ProvisionConfig,
) -> Result<PrerequisiteAction, ProvisionError> {
    let package = config.prerequisite_package.as_str();

    let query = exec
        .probe(
            "prerequisite-query",
            Invocation::new("rpm").args(["-q", package]),
        )
        .await?;
    if query.is_success() {
        info!(package, "prerequisite already installed");
        return Ok(PrerequisiteAction::AlreadyInstalled);
    }

    let os = OsRelease::load(&config.os_release_path).await?;
    info!(os_id = %os.id, version_id = ?os.version_id, "detected host os");

    if os.id != config.enterprise_os_id {
        exec.run(
            "install-prerequisite",
            Invocation::new("yum").args(["install", "-y", package]),
            FailurePolicy::Fatal,
        )
        .await?;
        return Ok(PrerequisiteAction::Installed);
    }

    let release = os
        .major_version()
        .ok_or_else(|| ProvisionError::OsRelease {
            path: config.os_release_path.clone(),
            reason: "VERSION_ID is required to pick the repository release".to_owned(),
        })?
        .to_owned();

    install_from_temporary_repo(exec, config, &release).await?;
    Ok(PrerequisiteAction::InstalledFromRepo { release })
}

/// Path the repository definition is downloaded to.
pub fn repo_file_path(config: &ProvisionConfig) -> PathBuf {
    Path::new(&config.repo_dir).join(&config.repo_file)
}

async fn install_from_temporary_repo<R: CommandRunner>(
    exec: &mut StepExecutor<R>,
    config: &ProvisionConfig,
    release: &str,
) -> Result<(), ProvisionError> {
    let repo_path = repo_file_path(config);
    let repo_arg = repo_path.display().to_string();

    let fetched = exec
        .run(
            "fetch-repo",
            Invocation::new("curl").args([
                "-fsSL",
                "-o",
                repo_arg.as_str(),
                config.repo_url.as_str(),
            ]),
            FailurePolicy::Fatal,
        )
        .await;

    let installed = match fetched {
        Ok(_) => exec
            .run(
                "install-prerequisite",
                Invocation::new("yum").args([
                    "install".to_owned(),
                    "-y".to_owned(),
                    format!("--releasever={release}"),
                    "--setopt=sslverify=0".to_owned(),
                    config.prerequisite_package.clone(),
                ]),
                FailurePolicy::Fatal,
            )
            .await
            .map(|_| ()),
        Err(e) => Err(e),
    };

    // The repository must not outlive this step, whatever happened above
    let removed = remove_repo_file(&repo_path).await;
    if removed.is_ok() {
        exec.record_action("remove-repo", format!("remove {repo_arg}"));
    }

    match (installed, removed) {
        (Err(install_err), Err(remove_err)) => {
            warn!(path = %repo_arg, error = %remove_err, "failed to remove repository file");
            Err(install_err.into())
        }
        (Err(install_err), Ok(())) => Err(install_err.into()),
        (Ok(()), Err(remove_err)) => Err(remove_err),
        (Ok(()), Ok(())) => Ok(()),
    }
}

async fn remove_repo_file(path: &Path) -> Result<(), ProvisionError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProvisionError::io(path, e)),
    }
}
