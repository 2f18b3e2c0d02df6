//! CLI-specific error types and exit code mapping

use vmprep_core::error::{ConfigError, VmprepError};
use vmprep_dispatch::DispatchError;
use vmprep_provision::ProvisionError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes, forwarding
/// the status of a failing external tool unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Provisioning stopped.
    #[error("provision failed: {0}")]
    Provision(#[from] ProvisionError),

    /// Dispatch stopped.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging setup failed.
    #[error(transparent)]
    Setup(#[from] anyhow::Error),
}

impl From<VmprepError> for CliError {
    fn from(e: VmprepError) -> Self {
        match e {
            VmprepError::Config(e) => Self::Config(e.to_string()),
            VmprepError::Io(e) => Self::Io(e),
            VmprepError::Command(e) => Self::Command(e.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code  | Meaning                                  |
    /// |-------|------------------------------------------|
    /// | 0     | Success                                  |
    /// | 1     | General / command error                  |
    /// | 2     | Configuration error                      |
    /// | other | Exit status of the failing external tool |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Provision(e) => e.exit_code(),
            Self::Dispatch(e) => e.exit_code(),
            Self::Command(_) | Self::JsonSerialize(_) | Self::Io(_) | Self::Setup(_) => 1,
        }
    }
}
