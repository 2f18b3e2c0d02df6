//! Root volume growth.
//!
//! Extends the configured partition over the remaining free space, resizes
//! the LVM physical volumes on that device and grows the logical volume that
//! backs `/` together with its filesystem.

use tracing::info;

use vmprep_core::command::{CommandRunner, Invocation};
use vmprep_core::config::DiskConfig;
use vmprep_core::step::{FailurePolicy, StepExecutor};

use crate::error::ProvisionError;

/// sfdisk script line: keep the start, grow the size to the maximum.
const SFDISK_GROW: &str = ", +\n";

/// Grows the root logical volume to use all free space on `disk.device`.
pub async fn grow_root_volume<R: CommandRunner>(
    exec: &mut StepExecutor<R>,
    disk: &DiskConfig,
) -> Result<(), ProvisionError> {
    let device = disk.device.as_str();

    exec.run(
        "grow-partition",
        Invocation::new("sfdisk")
            .args(["-N".to_owned(), disk.partition.to_string()])
            .args(["-f", device])
            .stdin(SFDISK_GROW),
        FailurePolicy::Fatal,
    )
    .await?;

    exec.run(
        "reread-partitions",
        Invocation::new("partprobe").arg(device),
        FailurePolicy::Fatal,
    )
    .await?;

    let pvs = exec
        .run(
            "list-physical-volumes",
            Invocation::new("pvs")
                .args(["--noheadings", "-o", "pv_name"])
                .capture_output(),
            FailurePolicy::Fatal,
        )
        .await?;
    let volumes = physical_volumes_on(device, &pvs.stdout);
    if volumes.is_empty() {
        return Err(ProvisionError::VolumeDiscovery(format!(
            "no LVM physical volume found on {device}"
        )));
    }
    for pv in &volumes {
        exec.run(
            "resize-physical-volume",
            Invocation::new("pvresize").arg(pv.as_str()),
            FailurePolicy::Fatal,
        )
        .await?;
    }

    let root = exec
        .run(
            "find-root-volume",
            Invocation::new("findmnt")
                .args(["-n", "-o", "SOURCE", "/"])
                .capture_output(),
            FailurePolicy::Fatal,
        )
        .await?;
    let root_volume = root_source(&root.stdout).ok_or_else(|| {
        ProvisionError::VolumeDiscovery("findmnt returned no source for /".to_owned())
    })?;
    info!(device, root_volume, pvs = ?volumes, "growing root volume");

    exec.run(
        "resize-root-volume",
        Invocation::new("lvresize").args(["-r", "-l", "+100%FREE", root_volume]),
        FailurePolicy::Fatal,
    )
    .await?;

    Ok(())
}

/// Physical volumes from `pvs --noheadings -o pv_name` output that live on `device`.
///
/// Accepts the whole device and its partitions (`/dev/vda2`, `/dev/nvme0n1p2`),
/// but not other devices sharing the prefix (`/dev/vdaa`).
pub fn physical_volumes_on(device: &str, pvs_output: &str) -> Vec<String> {
    pvs_output
        .lines()
        .map(str::trim)
        .filter(|pv| {
            pv.strip_prefix(device).is_some_and(|suffix| {
                let digits = suffix.strip_prefix('p').unwrap_or(suffix);
                suffix.is_empty()
                    || (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            })
        })
        .map(str::to_owned)
        .collect()
}

/// First non-empty line of `findmnt -n -o SOURCE /`.
///
/// Btrfs subvolume sources (`/dev/vda3[/root]`) are cut at the bracket.
fn root_source(findmnt_output: &str) -> Option<&str> {
    findmnt_output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.split('[').next().unwrap_or(line))
        .filter(|source| !source.is_empty())
}
