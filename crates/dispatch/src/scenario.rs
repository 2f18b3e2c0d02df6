//! Test scenario selection.
//!
//! A scenario picks which test entry point the dispatcher runs after the
//! image build. Two names map to fixed image tests; every other name is a
//! cloud upload target and becomes part of a cloud test identifier.

use std::fmt;

use serde::Serialize;

use crate::error::DispatchError;

/// Scenario name for the live ISO image test.
pub const LIVE_ISO: &str = "live-iso";
/// Scenario name for the qcow2 image test.
pub const QCOW2: &str = "qcow2";

/// Test name prefix for cloud scenarios.
pub const CLOUD_TEST_PREFIX: &str = "TestCloud.test_";

/// Selected test scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    LiveIso,
    Qcow2,
    /// Cloud upload target (`aws`, `azure`, ...)
    Cloud(String),
}

impl Scenario {
    /// Parses an optional selector. `None` and `""` both mean the default run.
    ///
    /// Any other value is a cloud scenario, taken as given.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let name = value.filter(|v| !v.is_empty())?;
        Some(match name {
            LIVE_ISO => Self::LiveIso,
            QCOW2 => Self::Qcow2,
            cloud => Self::Cloud(cloud.to_owned()),
        })
    }

    /// Name as given on the command line.
    pub fn name(&self) -> &str {
        match self {
            Self::LiveIso => LIVE_ISO,
            Self::Qcow2 => QCOW2,
            Self::Cloud(name) => name,
        }
    }

    /// Test identifier passed to the entry point.
    pub fn test_name(&self) -> String {
        match self {
            Self::LiveIso => "TestLiveIso".to_owned(),
            Self::Qcow2 => "TestQcow2".to_owned(),
            Self::Cloud(name) => format!("{CLOUD_TEST_PREFIX}{name}"),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checks that a cloud name forms a valid test identifier suffix:
/// `[a-z0-9][a-z0-9_]*`.
pub fn validate_cloud_name(name: &str) -> Result<(), DispatchError> {
    let invalid = |reason: &str| DispatchError::InvalidScenario {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !first_ok {
        return Err(invalid("must start with a lowercase letter or digit"));
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(invalid("only lowercase letters, digits and '_' are allowed"));
    }
    Ok(())
}
