#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`scenario`]: Scenario parsing and test names (`Scenario`)
//! - [`dispatcher`]: Planning and execution (`Dispatcher`, `DispatchPlan`)
//! - [`error`]: Domain error type (`DispatchError`)

pub mod dispatcher;
pub mod error;
pub mod scenario;

pub use dispatcher::{DispatchPlan, Dispatcher, PlannedStep, TEST_OS_ENV};
pub use error::DispatchError;
pub use scenario::Scenario;
