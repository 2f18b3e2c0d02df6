#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`command`]: 외부 커맨드 실행 추상화 (`CommandRunner`, `Invocation`)
//! - [`step`]: fail-fast 순차 실행기와 실행 기록 (`StepExecutor`, `RunReport`)
//! - [`config`]: `vmprep.toml` 설정
//! - [`error`]: 에러 타입

pub mod command;
pub mod config;
pub mod error;
pub mod step;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{CommandError, ConfigError, VmprepError};

// 설정
pub use config::VmprepConfig;

// 커맨드 실행
#[cfg(any(test, feature = "test-util"))]
pub use command::MockCommandRunner;
pub use command::{CommandOutput, CommandRunner, Invocation, SystemCommandRunner};

// 스텝
pub use step::{FailurePolicy, RunReport, StepExecutor, StepOutcome, StepRecord};
