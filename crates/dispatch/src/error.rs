//! Dispatcher error types

use vmprep_core::error::CommandError;

/// Dispatch domain error
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The image build or a test entry point failed or could not be started
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The scenario name cannot be turned into a test identifier
    #[error("invalid scenario '{name}': {reason}")]
    InvalidScenario {
        /// scenario value as given
        name: String,
        /// failure reason
        reason: String,
    },

    /// Strict mode rejected a cloud scenario outside the known list
    #[error("unknown cloud scenario '{name}' (known: {known})")]
    UnknownScenario {
        /// scenario value as given
        name: String,
        /// comma separated list of known scenarios
        known: String,
    },

    /// The configured image build command is empty
    #[error("build command is empty")]
    EmptyBuildCommand,
}

impl DispatchError {
    /// Process exit code for this error.
    ///
    /// The failing command's status is forwarded; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Command(e) => e.exit_code(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_forwards_exit_code() {
        let err: DispatchError = CommandError::Failed {
            step: "test".to_owned(),
            command: "test/check-cli TestImages".to_owned(),
            exit_code: 3,
        }
        .into();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            CommandError::Failed {
                step: "test".to_owned(),
                command: "test/check-cli TestImages".to_owned(),
                exit_code: 3,
            }
            .to_string()
        );
    }

    #[test]
    fn scenario_errors_exit_with_one() {
        let err = DispatchError::InvalidScenario {
            name: "Bad Name".to_owned(),
            reason: "contains a space".to_owned(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("Bad Name"));

        let err = DispatchError::UnknownScenario {
            name: "gcp".to_owned(),
            known: "aws, azure".to_owned(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("aws, azure"));
    }
}
