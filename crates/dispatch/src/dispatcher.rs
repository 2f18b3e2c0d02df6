//! CI dispatcher.
//!
//! Builds the VM image, then runs the test entry point chosen by the
//! scenario:
//!
//! ```text
//! live-iso  -> <cli_entry> TestLiveIso
//! qcow2     -> <cli_entry> TestQcow2
//! <name>    -> <cloud_entry> TestCloud.test_<name>
//! (unset)   -> <cli_entry> TestImages, then <api_entry>
//! ```
//!
//! Every step is fatal; the first failing command's exit status ends the run.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use vmprep_core::command::{CommandRunner, Invocation};
use vmprep_core::config::DispatchConfig;
use vmprep_core::step::{FailurePolicy, RunReport, StepExecutor};

use crate::error::DispatchError;
use crate::scenario::{Scenario, validate_cloud_name};

/// Environment variable naming the target OS; read by the image build.
pub const TEST_OS_ENV: &str = "TEST_OS";

/// One step of a dispatch plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub step: String,
    pub invocation: Invocation,
}

/// Ordered commands a dispatch would run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    /// `None` for the default run
    pub scenario: Option<Scenario>,
    pub steps: Vec<PlannedStep>,
}

impl DispatchPlan {
    pub fn invocations(&self) -> impl Iterator<Item = &Invocation> {
        self.steps.iter().map(|s| &s.invocation)
    }
}

/// CI test dispatcher.
pub struct Dispatcher<R: CommandRunner> {
    runner: Arc<R>,
    config: DispatchConfig,
}

impl<R: CommandRunner> Dispatcher<R> {
    pub fn new(runner: Arc<R>, config: DispatchConfig) -> Self {
        Self { runner, config }
    }

    /// Parses the selector and applies the known-scenario check.
    ///
    /// Unknown cloud scenarios only log a warning unless
    /// `strict_scenarios` is set, which also enforces the name charset.
    pub fn resolve_scenario(
        &self,
        value: Option<&str>,
    ) -> Result<Option<Scenario>, DispatchError> {
        let scenario = Scenario::parse(value);
        if let Some(Scenario::Cloud(name)) = &scenario {
            if self.config.strict_scenarios {
                validate_cloud_name(name)?;
            }
            let known = self.config.known_cloud_scenarios.iter().any(|k| k == name);
            if !known {
                if self.config.strict_scenarios {
                    return Err(DispatchError::UnknownScenario {
                        name: name.clone(),
                        known: self.config.known_cloud_scenarios.join(", "),
                    });
                }
                warn!(
                    scenario = %name,
                    known = ?self.config.known_cloud_scenarios,
                    "cloud scenario is not in the known list"
                );
            }
        }
        Ok(scenario)
    }

    /// Builds the ordered command list without running anything.
    pub fn plan(&self, scenario: Option<&str>) -> Result<DispatchPlan, DispatchError> {
        let scenario = self.resolve_scenario(scenario)?;

        let build = Invocation::from_argv(&self.config.build_command)
            .ok_or(DispatchError::EmptyBuildCommand)?;
        let mut steps = vec![PlannedStep {
            step: "build-image".to_owned(),
            invocation: build,
        }];

        match &scenario {
            Some(cloud @ Scenario::Cloud(_)) => steps.push(PlannedStep {
                step: "test".to_owned(),
                invocation: Invocation::new(&self.config.cloud_entry).arg(cloud.test_name()),
            }),
            Some(fixed) => steps.push(PlannedStep {
                step: "test".to_owned(),
                invocation: Invocation::new(&self.config.cli_entry).arg(fixed.test_name()),
            }),
            None => {
                steps.push(PlannedStep {
                    step: "test".to_owned(),
                    invocation: Invocation::new(&self.config.cli_entry).arg("TestImages"),
                });
                steps.push(PlannedStep {
                    step: "test-api".to_owned(),
                    invocation: Invocation::new(&self.config.api_entry),
                });
            }
        }

        Ok(DispatchPlan { scenario, steps })
    }

    /// Runs the plan for `scenario`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Scenario errors are returned before anything runs. Command failures
    /// carry the failing command's exit status.
    pub async fn dispatch(&self, scenario: Option<&str>) -> Result<RunReport, DispatchError> {
        let plan = self.plan(scenario)?;
        let test_os = std::env::var(TEST_OS_ENV).ok();
        info!(
            scenario = plan.scenario.as_ref().map(Scenario::name).unwrap_or("default"),
            test_os = test_os.as_deref().unwrap_or("unset"),
            steps = plan.steps.len(),
            "dispatching"
        );

        let mut exec = StepExecutor::new(Arc::clone(&self.runner), "dispatch");
        for PlannedStep { step, invocation } in plan.steps {
            exec.run(&step, invocation, FailurePolicy::Fatal).await?;
        }

        let report = exec.finish();
        info!(steps = report.steps.len(), "dispatch complete");
        Ok(report)
    }
}
