#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error type (`ProvisionError`)
//! - [`host`]: os-release parsing (`OsRelease`)
//! - [`prereq`]: Prerequisite library installation
//! - [`disk`]: Root volume growth
//! - [`build`]: Sandboxed source package rebuild
//! - [`packages`]: Built package discovery and reinstall (`PackageSet`)
//! - [`services`]: Service enablement
//! - [`provisioner`]: Orchestrator (`Provisioner`)
//!
//! All external tools are reached through
//! [`vmprep_core::command::CommandRunner`], so the whole sequence runs
//! against a mock in tests.

pub mod build;
pub mod disk;
pub mod error;
pub mod host;
pub mod packages;
pub mod prereq;
pub mod provisioner;
pub mod services;

// --- Public API Re-exports ---

pub use error::ProvisionError;
pub use host::OsRelease;
pub use packages::{BuiltPackage, PackageSet, package_base_name};
pub use prereq::PrerequisiteAction;
pub use provisioner::Provisioner;
