//! 스텝 실행기: fail-fast 순차 실행과 실행 기록
//!
//! [`StepExecutor`]는 이름 붙은 스텝을 하나씩 실행하고, 각 스텝의
//! [`FailurePolicy`]에 따라 0이 아닌 종료 코드를 에러로 볼지 무시할지 결정합니다.
//! 실행된 모든 스텝은 [`RunReport`]에 순서대로 기록됩니다.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::command::{CommandOutput, CommandRunner, Invocation};
use crate::error::CommandError;

/// 스텝 실패 처리 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 0이 아닌 종료 코드가 전체 실행을 중단시킴
    Fatal,
    /// 0이 아닌 종료 코드를 기록하고 계속 진행
    Ignorable,
}

/// 완료된 스텝의 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// 종료 코드 0
    Succeeded,
    /// `Ignorable` 스텝이 실패했지만 무시됨
    Tolerated { exit_code: i32 },
    /// 분기 판단용 조회. 종료 코드 자체가 결과임
    Probed { exit_code: i32 },
}

/// 실행된 스텝 한 건의 기록
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 스텝 이름 (예: `rebuild`, `erase`)
    pub step: String,
    /// 실행한 커맨드 라인 또는 내부 동작 설명
    pub command: String,
    /// 결과
    pub outcome: StepOutcome,
    /// 소요 시간 (밀리초)
    pub duration_ms: u64,
}

/// 파이프라인 한 번의 실행 기록
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// 파이프라인 이름 (`provision`, `dispatch`)
    pub pipeline: String,
    /// 실행 순서대로의 스텝 기록
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            steps: Vec::new(),
        }
    }

    /// 이름이 `step`인 기록들
    pub fn steps_named<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a StepRecord> {
        self.steps.iter().filter(move |r| r.step == step)
    }

    /// 무시된 실패 수
    pub fn tolerated_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Tolerated { .. }))
            .count()
    }
}

/// fail-fast 순차 스텝 실행기
pub struct StepExecutor<R: CommandRunner> {
    runner: Arc<R>,
    report: RunReport,
}

impl<R: CommandRunner> StepExecutor<R> {
    pub fn new(runner: Arc<R>, pipeline: impl Into<String>) -> Self {
        Self {
            runner,
            report: RunReport::new(pipeline),
        }
    }

    /// 스텝을 실행하고 정책을 적용합니다.
    ///
    /// # Errors
    ///
    /// - `CommandError::Failed`: `Fatal` 스텝이 0이 아닌 코드로 종료됨
    /// - `CommandError::Spawn` / `CommandError::Io`: 정책과 무관하게 전파됨
    pub async fn run(
        &mut self,
        step: &str,
        invocation: Invocation,
        policy: FailurePolicy,
    ) -> Result<CommandOutput, CommandError> {
        let command = invocation.command_line();
        info!(step, command = %command, "running");

        let started = Instant::now();
        let output = self.runner.run(&invocation).await?;
        let duration_ms = elapsed_ms(started);

        if output.is_success() {
            self.push(step, command, StepOutcome::Succeeded, duration_ms);
            return Ok(output);
        }

        match policy {
            FailurePolicy::Fatal => Err(CommandError::Failed {
                step: step.to_owned(),
                command,
                exit_code: output.exit_code,
            }),
            FailurePolicy::Ignorable => {
                warn!(
                    step,
                    command = %command,
                    exit_code = output.exit_code,
                    "step failed, continuing"
                );
                self.push(
                    step,
                    command,
                    StepOutcome::Tolerated {
                        exit_code: output.exit_code,
                    },
                    duration_ms,
                );
                Ok(output)
            }
        }
    }

    /// 종료 코드로 분기를 판단하는 조회 커맨드를 실행합니다.
    ///
    /// 0이 아닌 종료 코드도 에러가 아닙니다.
    pub async fn probe(
        &mut self,
        step: &str,
        invocation: Invocation,
    ) -> Result<CommandOutput, CommandError> {
        let command = invocation.command_line();
        debug!(step, command = %command, "probing");

        let started = Instant::now();
        let output = self.runner.run(&invocation).await?;
        let outcome = StepOutcome::Probed {
            exit_code: output.exit_code,
        };
        self.push(step, command, outcome, elapsed_ms(started));
        Ok(output)
    }

    /// 외부 커맨드가 아닌 내부 동작(파일 삭제 등)을 기록합니다.
    pub fn record_action(&mut self, step: &str, description: impl Into<String>) {
        let description = description.into();
        info!(step, action = %description, "done");
        self.push(step, description, StepOutcome::Succeeded, 0);
    }

    /// 지금까지의 기록
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// 실행을 마치고 기록을 반환합니다.
    pub fn finish(self) -> RunReport {
        self.report
    }

    fn push(&mut self, step: &str, command: String, outcome: StepOutcome, duration_ms: u64) {
        self.report.steps.push(StepRecord {
            step: step.to_owned(),
            command,
            outcome,
            duration_ms,
        });
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
