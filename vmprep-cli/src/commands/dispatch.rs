//! `vmprep dispatch` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use vmprep_core::command::CommandRunner;
use vmprep_core::config::DispatchConfig;
use vmprep_dispatch::{DispatchPlan, Dispatcher};

use crate::cli::DispatchArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `dispatch` command.
///
/// With `--dry-run` only the plan is rendered.
pub async fn execute<R: CommandRunner>(
    args: DispatchArgs,
    config: DispatchConfig,
    runner: Arc<R>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let dispatcher = Dispatcher::new(runner, config);
    let scenario = args.scenario.as_deref();

    if args.dry_run {
        let plan = dispatcher.plan(scenario)?;
        writer.render(&PlanReport::from(&plan))?;
        return Ok(());
    }

    let report = dispatcher.dispatch(scenario).await?;
    writer.render(&report)?;
    Ok(())
}

/// Dry-run output.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    /// Scenario name, `None` for the default run
    pub scenario: Option<String>,
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Serialize)]
pub struct PlanStep {
    pub step: String,
    pub command: String,
}

impl From<&DispatchPlan> for PlanReport {
    fn from(plan: &DispatchPlan) -> Self {
        Self {
            scenario: plan.scenario.as_ref().map(|s| s.name().to_owned()),
            steps: plan
                .steps
                .iter()
                .map(|s| PlanStep {
                    step: s.step.clone(),
                    command: s.invocation.command_line(),
                })
                .collect(),
        }
    }
}

impl Render for PlanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let scenario = self.scenario.as_deref().unwrap_or("(default)");
        writeln!(w, "Dispatch plan for scenario {}", scenario.bold())?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(w, "  {}. {:<12} {}", i + 1, step.step, step.command)?;
        }
        Ok(())
    }
}
