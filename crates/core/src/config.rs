//! 설정 관리: vmprep.toml 파싱 및 런타임 설정
//!
//! [`VmprepConfig`]는 프로비저너와 디스패처의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`VMPREP_PROVISION_PREREQUISITE_PACKAGE=beakerlib` 형식)
//! 3. 설정 파일 (`vmprep.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), vmprep_core::error::VmprepError> {
//! use vmprep_core::config::VmprepConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = VmprepConfig::load("vmprep.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = VmprepConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, VmprepError};

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "vmprep.toml";

/// vmprep 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmprepConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 프로비저너 설정
    #[serde(default)]
    pub provision: ProvisionConfig,
    /// 디스패처 설정
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl VmprepConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, VmprepError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값에서 시작합니다.
    ///
    /// 파일 외의 에러(파싱 실패, 권한 등)는 그대로 반환합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, VmprepError> {
        match Self::load_optional(path).await? {
            Some(config) => Ok(config),
            None => Self::from_env(),
        }
    }

    /// 파일이 있으면 `load`와 같고, 없으면 `None`을 반환합니다.
    pub async fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>, VmprepError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Ok(config) => Ok(Some(config)),
            Err(VmprepError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// 기본값에 환경변수 오버라이드를 적용합니다.
    pub fn from_env() -> Result<Self, VmprepError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, VmprepError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VmprepError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                VmprepError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, VmprepError> {
        toml::from_str(toml_str).map_err(|e| {
            VmprepError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `VMPREP_{SECTION}_{FIELD}`
    /// 중첩 섹션은 경로를 이어 붙입니다. 예: `VMPREP_PROVISION_DISK_DEVICE=/dev/sda`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "VMPREP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "VMPREP_GENERAL_LOG_FORMAT");

        // Provision
        override_string(
            &mut self.provision.prerequisite_package,
            "VMPREP_PROVISION_PREREQUISITE_PACKAGE",
        );
        override_string(
            &mut self.provision.enterprise_os_id,
            "VMPREP_PROVISION_ENTERPRISE_OS_ID",
        );
        override_string(
            &mut self.provision.os_release_path,
            "VMPREP_PROVISION_OS_RELEASE_PATH",
        );
        override_string(&mut self.provision.repo_url, "VMPREP_PROVISION_REPO_URL");
        override_string(&mut self.provision.repo_dir, "VMPREP_PROVISION_REPO_DIR");
        override_string(&mut self.provision.repo_file, "VMPREP_PROVISION_REPO_FILE");
        override_csv(&mut self.provision.services, "VMPREP_PROVISION_SERVICES");

        // Disk
        override_string(
            &mut self.provision.disk.device,
            "VMPREP_PROVISION_DISK_DEVICE",
        );
        override_u32(
            &mut self.provision.disk.partition,
            "VMPREP_PROVISION_DISK_PARTITION",
        );

        // Build
        override_string(
            &mut self.provision.build.result_dir,
            "VMPREP_PROVISION_BUILD_RESULT_DIR",
        );
        override_string(
            &mut self.provision.build.build_user,
            "VMPREP_PROVISION_BUILD_BUILD_USER",
        );
        override_string(
            &mut self.provision.build.mock_path,
            "VMPREP_PROVISION_BUILD_MOCK_PATH",
        );

        // Dispatch
        override_words(
            &mut self.dispatch.build_command,
            "VMPREP_DISPATCH_BUILD_COMMAND",
        );
        override_string(&mut self.dispatch.cli_entry, "VMPREP_DISPATCH_CLI_ENTRY");
        override_string(&mut self.dispatch.cloud_entry, "VMPREP_DISPATCH_CLOUD_ENTRY");
        override_string(&mut self.dispatch.api_entry, "VMPREP_DISPATCH_API_ENTRY");
        override_csv(
            &mut self.dispatch.known_cloud_scenarios,
            "VMPREP_DISPATCH_KNOWN_CLOUD_SCENARIOS",
        );
        override_bool(
            &mut self.dispatch.strict_scenarios,
            "VMPREP_DISPATCH_STRICT_SCENARIOS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), VmprepError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        let required = [
            (
                "provision.prerequisite_package",
                &self.provision.prerequisite_package,
            ),
            ("provision.enterprise_os_id", &self.provision.enterprise_os_id),
            ("provision.os_release_path", &self.provision.os_release_path),
            ("provision.repo_url", &self.provision.repo_url),
            ("provision.repo_dir", &self.provision.repo_dir),
            ("provision.disk.device", &self.provision.disk.device),
            ("provision.build.result_dir", &self.provision.build.result_dir),
            ("provision.build.build_user", &self.provision.build.build_user),
            ("provision.build.mock_path", &self.provision.build.mock_path),
            ("dispatch.cli_entry", &self.dispatch.cli_entry),
            ("dispatch.cloud_entry", &self.dispatch.cloud_entry),
            ("dispatch.api_entry", &self.dispatch.api_entry),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty".to_owned()));
            }
        }

        // 저장소 파일은 repo_dir 바로 아래의 단일 파일명이어야 삭제 대상이 명확함
        let repo_file = &self.provision.repo_file;
        if repo_file.is_empty() || repo_file.contains('/') || repo_file == "." || repo_file == ".."
        {
            return Err(invalid(
                "provision.repo_file",
                "must be a plain file name".to_owned(),
            ));
        }

        if self.provision.disk.partition == 0 {
            return Err(invalid(
                "provision.disk.partition",
                "partition numbers start at 1".to_owned(),
            ));
        }

        let result_dir = self.provision.build.result_dir.trim_end_matches('/');
        if result_dir.is_empty() || result_dir == "." || result_dir == ".." {
            return Err(invalid(
                "provision.build.result_dir",
                "refusing to use this path as a disposable build directory".to_owned(),
            ));
        }

        if self.provision.services.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid(
                "provision.services",
                "service names must not be empty".to_owned(),
            ));
        }

        if self.dispatch.build_command.is_empty() {
            return Err(invalid(
                "dispatch.build_command",
                "must contain at least the program name".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> VmprepError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 프로비저너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// 빌드 VM에 반드시 설치되어 있어야 하는 테스트 지원 라이브러리
    pub prerequisite_package: String,
    /// 별도 저장소 경로로 라이브러리를 설치해야 하는 OS의 `ID`
    pub enterprise_os_id: String,
    /// OS 식별 정보 파일
    pub os_release_path: String,
    /// 엔터프라이즈 OS용 저장소 정의 파일 URL
    pub repo_url: String,
    /// 시스템 저장소 디렉토리
    pub repo_dir: String,
    /// 내려받은 저장소 정의 파일 이름
    pub repo_file: String,
    /// 설치 후 활성화할 서비스
    pub services: Vec<String>,
    /// 디스크 확장 설정
    #[serde(default)]
    pub disk: DiskConfig,
    /// 샌드박스 빌드 설정
    #[serde(default)]
    pub build: BuildConfig,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            prerequisite_package: "beakerlib".to_owned(),
            enterprise_os_id: "rhel".to_owned(),
            os_release_path: "/etc/os-release".to_owned(),
            repo_url: "https://beaker-project.org/yum/beaker-client-RedHatEnterpriseLinux.repo"
                .to_owned(),
            repo_dir: "/etc/yum.repos.d".to_owned(),
            repo_file: "beaker-client-RedHatEnterpriseLinux.repo".to_owned(),
            services: vec!["composer.socket".to_owned(), "docker.service".to_owned()],
            disk: DiskConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

/// 디스크 확장 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// 루트 볼륨 그룹이 있는 블록 디바이스
    pub device: String,
    /// 남은 공간으로 확장할 파티션 번호
    pub partition: u32,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            device: "/dev/vda".to_owned(),
            partition: 2,
        }
    }
}

/// 샌드박스 빌드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// 빌드 결과 디렉토리 (매 실행마다 삭제 후 재생성)
    pub result_dir: String,
    /// 빌드를 실행할 제한된 시스템 사용자
    pub build_user: String,
    /// mock 실행 파일 경로
    pub mock_path: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            result_dir: "build-results".to_owned(),
            build_user: "builder".to_owned(),
            mock_path: "/usr/bin/mock".to_owned(),
        }
    }
}

/// 디스패처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// 테스트 전에 실행하는 이미지 빌드 커맨드 (argv)
    pub build_command: Vec<String>,
    /// CLI 테스트 진입점
    pub cli_entry: String,
    /// 클라우드 테스트 진입점
    pub cloud_entry: String,
    /// API 테스트 진입점
    pub api_entry: String,
    /// 알려진 클라우드 시나리오 이름
    pub known_cloud_scenarios: Vec<String>,
    /// true이면 알려지지 않은 클라우드 시나리오를 거부
    pub strict_scenarios: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            build_command: vec!["make".to_owned(), "vm".to_owned()],
            cli_entry: "test/check-cli".to_owned(),
            cloud_entry: "test/check-cloud".to_owned(),
            api_entry: "test/check-api".to_owned(),
            known_cloud_scenarios: ["aws", "azure", "openstack", "vsphere"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            strict_scenarios: false,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

fn override_words(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split_whitespace().map(str::to_owned).collect();
    }
}
