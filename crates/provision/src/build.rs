//! Sandboxed rebuild of the source package.

use std::path::Path;

use vmprep_core::command::{CommandRunner, Invocation};
use vmprep_core::config::BuildConfig;
use vmprep_core::step::{FailurePolicy, StepExecutor};

use crate::error::ProvisionError;
use crate::packages::SOURCE_SUFFIX;

/// Checks that `srpm` names an existing `.src.rpm` file.
pub async fn check_source_package(srpm: &Path) -> Result<(), ProvisionError> {
    let invalid = |reason: String| ProvisionError::InvalidSourcePackage {
        path: srpm.display().to_string(),
        reason,
    };

    let is_srpm = srpm
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > SOURCE_SUFFIX.len() && n.ends_with(SOURCE_SUFFIX));
    if !is_srpm {
        return Err(invalid(format!("file name must end in {SOURCE_SUFFIX}")));
    }

    let metadata = tokio::fs::metadata(srpm)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    if !metadata.is_file() {
        return Err(invalid("not a regular file".to_owned()));
    }
    Ok(())
}

/// Deletes the build-output directory so the later scan only sees fresh artifacts.
pub async fn clear_result_dir(dir: &Path) -> Result<(), ProvisionError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProvisionError::io(dir, e)),
    }
}

/// `runuser -u <user> -- <mock> --resultdir <dir> --rebuild <srpm>`
pub fn rebuild_invocation(build: &BuildConfig, srpm: &Path) -> Invocation {
    Invocation::new("runuser")
        .args(["-u", build.build_user.as_str(), "--", build.mock_path.as_str()])
        .args(["--resultdir", build.result_dir.as_str(), "--rebuild"])
        .arg(srpm.display().to_string())
}

/// Clears the result directory and rebuilds `srpm` into it.
pub async fn rebuild<R: CommandRunner>(
    exec: &mut StepExecutor<R>,
    build: &BuildConfig,
    srpm: &Path,
) -> Result<(), ProvisionError> {
    let result_dir = Path::new(&build.result_dir);
    clear_result_dir(result_dir).await?;
    exec.record_action("clear-results", format!("remove {}", result_dir.display()));

    exec.run(
        "rebuild",
        rebuild_invocation(build, srpm),
        FailurePolicy::Fatal,
    )
    .await?;
    Ok(())
}
