//! Provisioner error types
//!
//! [`ProvisionError`] covers every way a provisioning run can stop.
//! External tool failures keep the tool's exit status so the CLI can
//! forward it unchanged.

use vmprep_core::error::CommandError;

/// Provisioning domain error
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// A fatal external command failed or could not be started
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The os-release file could not be read or lacks a required field
    #[error("os-release error: {path}: {reason}")]
    OsRelease {
        /// os-release file path
        path: String,
        /// failure reason
        reason: String,
    },

    /// The source package argument is unusable
    #[error("invalid source package '{path}': {reason}")]
    InvalidSourcePackage {
        /// path given on the command line
        path: String,
        /// failure reason
        reason: String,
    },

    /// Physical or logical volume discovery returned nothing usable
    #[error("volume discovery failed: {0}")]
    VolumeDiscovery(String),

    /// The rebuild finished but produced no installable package
    #[error("no binary packages found in '{dir}'")]
    NoBinaryPackages {
        /// build-output directory
        dir: String,
    },

    /// A built package file name is not `name-version-release.arch.rpm`
    #[error("cannot derive package name from '{file}'")]
    MalformedPackageName {
        /// offending file name
        file: String,
    },

    /// Filesystem operation failed
    #[error("io error: {path}: {source}")]
    Io {
        /// path being accessed
        path: String,
        /// underlying error
        source: std::io::Error,
    },
}

impl ProvisionError {
    /// Process exit code for this error.
    ///
    /// Command failures forward the tool's own status; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Command(e) => e.exit_code(),
            _ => 1,
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
