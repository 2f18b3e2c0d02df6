//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// vmprep -- build VM provisioning and CI test dispatch.
///
/// Use `vmprep <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "vmprep", version, about, long_about = None)]
pub struct Cli {
    /// Path to the vmprep.toml configuration file.
    ///
    /// When omitted, `vmprep.toml` is used if it exists and built-in
    /// defaults otherwise.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision this host as a build VM from a source package.
    Provision(ProvisionArgs),

    /// Build the VM image and run the selected test suite.
    Dispatch(DispatchArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- provision ----

/// Install prerequisites, grow the root volume, rebuild and install packages.
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Source package (`*.src.rpm`) to rebuild and install.
    pub srpm: PathBuf,
}

// ---- dispatch ----

/// Build the image, then run the test entry point for the scenario.
#[derive(Args, Debug)]
pub struct DispatchArgs {
    /// Test scenario (live-iso, qcow2, or a cloud target). Unset or empty
    /// runs the default image and API tests.
    #[arg(long, env = "TEST_SCENARIO")]
    pub scenario: Option<String>,

    /// Print the commands that would run without running them.
    #[arg(long)]
    pub dry_run: bool,
}

// ---- config ----

/// Manage vmprep configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, provision, dispatch).
        #[arg(long)]
        section: Option<String>,
    },
}
