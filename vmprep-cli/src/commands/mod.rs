//! Command handlers -- one module per subcommand

pub mod config;
pub mod dispatch;
pub mod provision;

use std::path::Path;

use vmprep_core::config::{DEFAULT_CONFIG_PATH, VmprepConfig};

use crate::error::CliError;

/// Loads the effective configuration.
///
/// An explicit path must exist. Without one, `vmprep.toml` is read when
/// present and built-in defaults are used otherwise. Environment overrides
/// apply in both cases.
///
/// Returns the configuration and a label for where it came from.
pub async fn load_config(path: Option<&Path>) -> Result<(VmprepConfig, String), CliError> {
    match path {
        Some(path) => {
            let config = VmprepConfig::load(path).await?;
            Ok((config, path.display().to_string()))
        }
        None => match VmprepConfig::load_optional(DEFAULT_CONFIG_PATH).await? {
            Some(config) => Ok((config, DEFAULT_CONFIG_PATH.to_owned())),
            None => Ok((VmprepConfig::from_env()?, "(defaults)".to_owned())),
        },
    }
}
