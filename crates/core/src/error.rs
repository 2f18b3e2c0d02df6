//! 에러 타입: 도메인별 에러 정의

/// vmprep 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum VmprepError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 외부 커맨드 실행 에러
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 외부 커맨드 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// 프로세스 생성 실패 (실행 파일 없음, 권한 없음 등)
    #[error("failed to spawn '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// 치명적 스텝이 0이 아닌 종료 코드로 끝남
    #[error("step '{step}' failed: '{command}' exited with status {exit_code}")]
    Failed {
        step: String,
        command: String,
        exit_code: i32,
    },

    /// 프로세스 I/O 처리 실패 (stdin 쓰기, 출력 수집)
    #[error("i/o error while running '{program}': {reason}")]
    Io { program: String, reason: String },
}

impl CommandError {
    /// 이 에러로 프로세스가 종료될 때 사용할 종료 코드를 반환합니다.
    ///
    /// 외부 도구의 실패는 그 도구의 종료 코드를 그대로 전달합니다.
    /// 커맨드 자체를 실행하지 못한 경우는 셸과 같이 127을 사용합니다.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed { exit_code, .. } => *exit_code,
            Self::Spawn { .. } => 127,
            Self::Io { .. } => 1,
        }
    }
}
