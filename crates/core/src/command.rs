//! 외부 커맨드 실행 추상화
//!
//! 패키지 매니저, 디스크 유틸리티, 샌드박스 빌더, 서비스 매니저, 테스트 하네스 등
//! vmprep이 순서대로 호출하는 모든 외부 도구는 [`CommandRunner`] trait을 거칩니다.
//! 운영 코드는 [`SystemCommandRunner`]를, 테스트는 `MockCommandRunner`를 사용합니다.
//!
//! ```text
//!   Provisioner / Dispatcher
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │CommandRunner │ (trait)
//!     └──────────────┘
//!        │        │
//!        ▼        ▼
//!    ┌──────┐ ┌──────┐
//!    │System│ │ Mock │
//!    └──┬───┘ └──────┘
//!       │
//!       ▼
//!   child process
//! ```
//!
//! 이 계층에서는 0이 아닌 종료 코드가 에러가 아닙니다.
//! 실패를 치명적으로 볼지 무시할지는 [`crate::step`]의 `FailurePolicy`가 결정합니다.

use std::fmt;
use std::future::Future;
use std::process::{ExitStatus, Stdio};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::CommandError;

/// 실행할 외부 커맨드 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    env: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<String>,
    #[serde(skip)]
    capture: bool,
}

impl Invocation {
    /// 인자 없는 커맨드를 생성합니다.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
            capture: false,
        }
    }

    /// argv 형태(`["make", "vm"]`)에서 커맨드를 생성합니다. 빈 목록이면 `None`.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Option<Self> {
        let (program, rest) = argv.split_first()?;
        Some(Self::new(program.as_ref()).args(rest.iter().map(|a| a.as_ref())))
    }

    /// 인자를 하나 추가합니다.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 인자 여러 개를 순서대로 추가합니다.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 자식 프로세스에 환경변수를 추가합니다 (부모 환경은 그대로 상속).
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// 표준 입력으로 전달할 텍스트를 설정합니다.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// stdout/stderr를 터미널로 흘려보내지 않고 수집합니다.
    pub fn capture_output(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn stdin_text(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    pub fn captures_output(&self) -> bool {
        self.capture
    }

    /// 주어진 접두사(프로그램 + 앞쪽 인자)로 시작하는지 확인합니다.
    pub fn starts_with<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
        let Some((program, args)) = prefix.split_first() else {
            return true;
        };
        program.as_ref() == self.program
            && args.len() <= self.args.len()
            && args
                .iter()
                .zip(&self.args)
                .all(|(expected, actual)| expected.as_ref() == actual)
    }

    /// 로그와 리포트용 셸 형태 커맨드 라인
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn shell_quote(word: &str) -> String {
    let is_plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=+%,@".contains(c));
    if is_plain {
        word.to_owned()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// 종료된 커맨드의 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// 종료 코드. 시그널로 종료된 경우 셸 관례대로 `128 + signal`.
    pub exit_code: i32,
    /// 수집된 stdout (`capture_output`을 지정하지 않았다면 비어 있음)
    pub stdout: String,
    /// 수집된 stderr (`capture_output`을 지정하지 않았다면 비어 있음)
    pub stderr: String,
}

impl CommandOutput {
    /// 종료 코드 0의 결과
    pub fn success() -> Self {
        Self::default()
    }

    /// 주어진 종료 코드의 결과
    pub fn exit(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    /// stdout을 가진 성공 결과
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// 외부 커맨드 실행 trait
///
/// 모든 외부 도구 호출은 이 trait을 통해 이루어집니다.
/// `Send + Sync + 'static`이므로 `Arc`로 감싸 공유할 수 있습니다.
///
/// # Errors
///
/// 프로세스를 생성하지 못했거나 입출력 처리에 실패한 경우에만 에러를 반환합니다.
/// 0이 아닌 종료 코드는 `Ok(CommandOutput)`으로 전달됩니다.
pub trait CommandRunner: Send + Sync + 'static {
    /// 커맨드를 실행하고 종료될 때까지 기다립니다.
    fn run(
        &self,
        invocation: &Invocation,
    ) -> impl Future<Output = Result<CommandOutput, CommandError>> + Send;
}

/// `tokio::process` 기반 운영용 러너
///
/// 부모 프로세스의 환경변수와 작업 디렉토리를 그대로 상속합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let program = invocation.program();
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(invocation.arguments());
        for (key, value) in invocation.env_vars() {
            cmd.env(key, value);
        }

        if invocation.stdin_text().is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::inherit());
        }
        if invocation.captures_output() {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let mut child = cmd.spawn().map_err(|e| CommandError::Spawn {
            program: program.to_owned(),
            reason: e.to_string(),
        })?;

        if let (Some(input), Some(mut stdin)) = (invocation.stdin_text(), child.stdin.take()) {
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|e| CommandError::Io {
                    program: program.to_owned(),
                    reason: format!("failed to write stdin: {e}"),
                })?;
            // stdin을 닫아야 자식 프로세스가 EOF를 받습니다
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CommandError::Io {
                program: program.to_owned(),
                reason: format!("failed to wait for process: {e}"),
            })?;

        Ok(CommandOutput {
            exit_code: exit_code_of(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockCommandRunner;

#[cfg(any(test, feature = "test-util"))]
mod mock {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::{CommandOutput, CommandRunner, Invocation};
    use crate::error::CommandError;

    struct ScriptedResponse {
        prefix: Vec<String>,
        outcome: Result<CommandOutput, String>,
        creates: Vec<(PathBuf, String)>,
    }

    /// 테스트용 Mock 커맨드 러너
    ///
    /// 모든 호출을 기록하고, 프로그램 + 인자 접두사로 등록된 응답을 돌려줍니다.
    /// 여러 접두사가 일치하면 가장 긴 것이 우선합니다.
    /// 등록되지 않은 호출은 종료 코드 0으로 성공합니다.
    #[derive(Default)]
    pub struct MockCommandRunner {
        responses: Vec<ScriptedResponse>,
        calls: Mutex<Vec<Invocation>>,
    }

    impl MockCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// 접두사에 일치하는 호출이 `output`을 반환하도록 설정합니다.
        pub fn respond(mut self, prefix: &[&str], output: CommandOutput) -> Self {
            self.responses.push(ScriptedResponse {
                prefix: prefix.iter().map(|s| (*s).to_owned()).collect(),
                outcome: Ok(output),
                creates: Vec::new(),
            });
            self
        }

        /// 접두사에 일치하는 호출이 주어진 종료 코드로 끝나도록 설정합니다.
        pub fn fail(self, prefix: &[&str], exit_code: i32) -> Self {
            self.respond(prefix, CommandOutput::exit(exit_code))
        }

        /// 접두사에 일치하는 호출이 stdout을 출력하고 성공하도록 설정합니다.
        pub fn stdout(self, prefix: &[&str], stdout: &str) -> Self {
            self.respond(prefix, CommandOutput::with_stdout(stdout))
        }

        /// 접두사에 일치하는 호출이 프로세스 생성 단계에서 실패하도록 설정합니다.
        pub fn spawn_error(mut self, prefix: &[&str]) -> Self {
            self.responses.push(ScriptedResponse {
                prefix: prefix.iter().map(|s| (*s).to_owned()).collect(),
                outcome: Err("mock spawn failure".to_owned()),
                creates: Vec::new(),
            });
            self
        }

        /// 접두사에 일치하는 호출이 성공하면서 파일을 만들도록 설정합니다.
        ///
        /// 다운로드나 빌드처럼 파일시스템에 결과물을 남기는 도구를 흉내 냅니다.
        pub fn creates_file(
            mut self,
            prefix: &[&str],
            path: impl Into<PathBuf>,
            content: &str,
        ) -> Self {
            let prefix: Vec<String> = prefix.iter().map(|s| (*s).to_owned()).collect();
            let file = (path.into(), content.to_owned());
            match self.responses.iter_mut().find(|r| r.prefix == prefix) {
                Some(existing) => existing.creates.push(file),
                None => self.responses.push(ScriptedResponse {
                    prefix,
                    outcome: Ok(CommandOutput::success()),
                    creates: vec![file],
                }),
            }
            self
        }

        /// 지금까지 기록된 호출 목록
        pub fn calls(&self) -> Vec<Invocation> {
            self.calls
                .lock()
                .map(|calls| calls.clone())
                .unwrap_or_default()
        }

        /// 기록된 호출을 셸 형태 문자열로 반환합니다.
        pub fn command_lines(&self) -> Vec<String> {
            self.calls().iter().map(Invocation::command_line).collect()
        }

        /// 접두사에 일치하는 기록된 호출 목록
        pub fn calls_matching(&self, prefix: &[&str]) -> Vec<Invocation> {
            self.calls()
                .into_iter()
                .filter(|call| call.starts_with(prefix))
                .collect()
        }
    }

    impl CommandRunner for MockCommandRunner {
        async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(invocation.clone());
            }

            let Some(response) = self
                .responses
                .iter()
                .filter(|r| invocation.starts_with(&r.prefix))
                .max_by_key(|r| r.prefix.len())
            else {
                return Ok(CommandOutput::success());
            };

            for (path, content) in &response.creates {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| CommandError::Io {
                        program: invocation.program().to_owned(),
                        reason: e.to_string(),
                    })?;
                }
                std::fs::write(path, content).map_err(|e| CommandError::Io {
                    program: invocation.program().to_owned(),
                    reason: e.to_string(),
                })?;
            }

            response
                .outcome
                .clone()
                .map_err(|reason| CommandError::Spawn {
                    program: invocation.program().to_owned(),
                    reason,
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_quotes_only_when_needed() {
        let inv = Invocation::new("sh")
            .arg("-c")
            .arg("echo it's done")
            .arg("")
            .arg("+100%FREE");
        assert_eq!(inv.command_line(), r"sh -c 'echo it'\''s done' '' +100%FREE");
    }

    #[test]
    fn from_argv_splits_program_and_args() {
        let inv = Invocation::from_argv(&["make", "vm"]).unwrap();
        assert_eq!(inv.program(), "make");
        assert_eq!(inv.arguments(), ["vm"]);
        assert!(Invocation::from_argv::<&str>(&[]).is_none());
    }

    #[test]
    fn starts_with_matches_program_and_leading_args() {
        let inv = Invocation::new("rpm").args(["-q", "beakerlib"]);
        assert!(inv.starts_with(&["rpm"]));
        assert!(inv.starts_with(&["rpm", "-q"]));
        assert!(inv.starts_with(&["rpm", "-q", "beakerlib"]));
        assert!(!inv.starts_with(&["rpm", "-e"]));
        assert!(!inv.starts_with(&["yum"]));
        assert!(!inv.starts_with(&["rpm", "-q", "beakerlib", "extra"]));
    }

    #[test]
    fn display_matches_command_line() {
        let inv = Invocation::new("systemctl").args(["enable", "docker.service"]);
        assert_eq!(inv.to_string(), "systemctl enable docker.service");
    }

    #[tokio::test]
    async fn mock_unmatched_call_succeeds_and_is_recorded() {
        let runner = MockCommandRunner::new();
        let out = runner
            .run(&Invocation::new("partprobe").arg("/dev/vda"))
            .await
            .unwrap();
        assert!(out.is_success());
        assert_eq!(runner.command_lines(), vec!["partprobe /dev/vda"]);
    }

    #[tokio::test]
    async fn mock_longest_prefix_wins() {
        let runner = MockCommandRunner::new()
            .fail(&["rpm"], 1)
            .respond(&["rpm", "-q"], CommandOutput::success());
        let query = runner
            .run(&Invocation::new("rpm").args(["-q", "foo"]))
            .await
            .unwrap();
        let erase = runner
            .run(&Invocation::new("rpm").args(["-e", "foo"]))
            .await
            .unwrap();
        assert!(query.is_success());
        assert_eq!(erase.exit_code, 1);
    }

    #[tokio::test]
    async fn mock_spawn_error_is_an_error() {
        let runner = MockCommandRunner::new().spawn_error(&["mock"]);
        let err = runner.run(&Invocation::new("mock")).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn mock_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.txt");
        let runner = MockCommandRunner::new().creates_file(&["curl"], &target, "data");
        runner.run(&Invocation::new("curl")).await.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "data");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_reports_exit_code() {
        let runner = SystemCommandRunner::new();
        let out = runner
            .run(&Invocation::new("sh").args(["-c", "exit 3"]).capture_output())
            .await
            .unwrap();
        assert_eq!(out.exit_code, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_pipes_stdin_and_captures_stdout() {
        let runner = SystemCommandRunner::new();
        let out = runner
            .run(&Invocation::new("cat").stdin(", +\n").capture_output())
            .await
            .unwrap();
        assert!(out.is_success());
        assert_eq!(out.stdout, ", +\n");
    }

    #[tokio::test]
    async fn system_runner_missing_program_is_spawn_error() {
        let runner = SystemCommandRunner::new();
        let err = runner
            .run(&Invocation::new("/nonexistent/vmprep-test-binary"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
