//! 에러 타입 — 설정 에러와 명령 실행 에러 정의

use crate::command::Outcome;

/// kmodtest 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum KmodtestError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 명령 실행 에러 (치명적)
    #[error("runner error: {0}")]
    Runner(#[from] RunnerError),

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

/// 명령 실행기의 치명적 에러
///
/// 이 에러가 반환되면 워크플로는 더 이상 다음 단계로 진행하지 않습니다.
/// 허용된 실패(`tolerate_failure`)는 에러가 아니라 [`Outcome`]으로 반환됩니다.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// 현재 플랫폼에서 권한 상승을 지원하지 않음
    #[error("privilege escalation is not supported on this platform (command: {command})")]
    PrivilegeUnsupported { command: String },

    /// 실행 파일을 찾을 수 없음
    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    /// 빈 인자 벡터
    #[error("command has no program to execute")]
    EmptyCommand,

    /// 허용되지 않은 0이 아닌 종료 코드
    #[error("command '{command}' exited with status {}", .outcome.exit_code())]
    CommandFailed { command: String, outcome: Outcome },

    /// 프로세스 생성/대기 중 예기치 않은 I/O 에러
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// 실패 시 캡처된 출력 (있는 경우)
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            Self::CommandFailed { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_display_includes_exit_code() {
        let err = RunnerError::CommandFailed {
            command: "make".to_owned(),
            outcome: Outcome::new(2),
        };
        assert_eq!(err.to_string(), "command 'make' exited with status 2");
        assert_eq!(err.outcome().map(Outcome::exit_code), Some(2));
    }

    #[test]
    fn command_not_found_has_no_outcome() {
        let err = RunnerError::CommandNotFound {
            program: "insmod".to_owned(),
        };
        assert!(err.to_string().contains("insmod"));
        assert!(err.outcome().is_none());
    }

    #[test]
    fn config_error_converts_to_top_level() {
        let err: KmodtestError = ConfigError::InvalidValue {
            field: "module.name".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert!(matches!(err, KmodtestError::Config(_)));
        assert!(err.to_string().contains("module.name"));
    }
}
