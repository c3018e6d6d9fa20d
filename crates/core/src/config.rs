//! 설정 관리 — kmodtest.toml 파싱 및 불변 워크플로 설정
//!
//! [`HarnessConfig`]는 워크플로 전체에서 읽기 전용으로 공유되는 설정입니다.
//! 기본값은 고정 상수(모듈 이름 `mydevice`, 테스트 바이너리 `./test_suite`)이며,
//! 설정 파일과 CLI 인자는 워크플로 시작 전에만 값을 덮어씁니다.
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), kmodtest_core::error::KmodtestError> {
//! use kmodtest_core::config::HarnessConfig;
//!
//! // 파일에서 로드
//! let config = HarnessConfig::load("kmodtest.toml")?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HarnessConfig::parse("[module]\nname = \"mydevice\"")?;
//! assert_eq!(config.device_path(), "/dev/mydevice");
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, KmodtestError};

/// kmodtest 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 대상 커널 모듈
    #[serde(default)]
    pub module: ModuleConfig,
    /// 빌드 명령
    #[serde(default)]
    pub build: BuildConfig,
    /// 외부 테스트 스위트
    #[serde(default)]
    pub test_suite: TestSuiteConfig,
}

impl HarnessConfig {
    /// TOML 파일에서 설정을 로드하고 검증합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KmodtestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KmodtestError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                KmodtestError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다 (검증 없음).
    pub fn parse(toml_str: &str) -> Result<Self, KmodtestError> {
        toml::from_str(toml_str).map_err(|e| {
            KmodtestError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), KmodtestError> {
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

        // 모듈 이름은 rmmod 인자와 /dev 경로에 그대로 들어간다
        let name = &self.module.name;
        if name.is_empty() {
            return Err(invalid("module.name", "must not be empty".to_owned()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid(
                "module.name",
                format!("'{name}' may only contain ASCII letters, digits, '_' and '-'"),
            ));
        }

        if matches!(&self.module.object_file, Some(f) if f.is_empty()) {
            return Err(invalid(
                "module.object_file",
                "must not be empty when set".to_owned(),
            ));
        }

        if self.build.clean.is_empty() {
            return Err(invalid("build.clean", "command must not be empty".to_owned()));
        }
        if self.build.build.is_empty() {
            return Err(invalid("build.build", "command must not be empty".to_owned()));
        }

        if self.test_suite.path.is_empty() {
            return Err(invalid("test_suite.path", "must not be empty".to_owned()));
        }
        if self.test_suite.pass_marker.is_empty() {
            return Err(invalid(
                "test_suite.pass_marker",
                "must not be empty".to_owned(),
            ));
        }

        Ok(())
    }

    /// `insmod`에 넘길 모듈 오브젝트 파일 (`<name>.ko` 기본)
    pub fn object_file(&self) -> String {
        self.module
            .object_file
            .clone()
            .unwrap_or_else(|| format!("{}.ko", self.module.name))
    }

    /// 모듈 장치 노드 경로 (`/dev/<name>`)
    pub fn device_path(&self) -> String {
        format!("/dev/{}", self.module.name)
    }
}

fn invalid(field: &str, reason: String) -> KmodtestError {
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
            log_level: "warn".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 대상 커널 모듈 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// 모듈 이름 (rmmod/lsmod 에서 사용)
    pub name: String,
    /// 오브젝트 파일 경로. 없으면 `<name>.ko`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_file: Option<String>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: "mydevice".to_owned(),
            object_file: None,
        }
    }
}

/// 빌드 명령 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// 정리 명령
    pub clean: Vec<String>,
    /// 빌드 명령 (모듈과 테스트 스위트를 모두 생성)
    pub build: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            clean: vec!["make".to_owned(), "clean".to_owned()],
            build: vec!["make".to_owned()],
        }
    }
}

/// 외부 테스트 스위트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSuiteConfig {
    /// 테스트 바이너리 경로
    pub path: String,
    /// 통과 판정에 필요한 stdout 문자열
    pub pass_marker: String,
}

impl Default for TestSuiteConfig {
    fn default() -> Self {
        Self {
            path: "./test_suite".to_owned(),
            pass_marker: "All tests passed!".to_owned(),
        }
    }
}
