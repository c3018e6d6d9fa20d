//! 명령 호출과 결과 — 실행기가 주고받는 값 타입
//!
//! [`Invocation`]은 생성 후 변경되지 않으며 한 번 실행될 때 소비됩니다.
//! [`Outcome`]은 실행기가 만들고 이후에는 읽기 전용입니다.

use std::fmt;

use serde::Serialize;

/// 외부 명령 호출 한 건
///
/// # 사용 예시
/// ```
/// use kmodtest_core::command::Invocation;
///
/// let unload = Invocation::new(["rmmod", "mydevice"])
///     .elevated()
///     .tolerating_failure();
/// assert_eq!(unload.to_string(), "rmmod mydevice");
/// assert!(unload.elevate());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    argv: Vec<String>,
    elevate: bool,
    capture: bool,
    tolerate_failure: bool,
}

impl Invocation {
    /// 인자 벡터로 호출을 만듭니다. 모든 플래그는 꺼진 상태로 시작합니다.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            elevate: false,
            capture: false,
            tolerate_failure: false,
        }
    }

    /// 권한 상승(`sudo`)이 필요한 호출로 표시합니다.
    pub fn elevated(mut self) -> Self {
        self.elevate = true;
        self
    }

    /// 표준 출력/에러를 캡처합니다.
    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// 0이 아닌 종료 코드를 데이터로 취급합니다.
    pub fn tolerating_failure(mut self) -> Self {
        self.tolerate_failure = true;
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn elevate(&self) -> bool {
        self.elevate
    }

    pub fn capture(&self) -> bool {
        self.capture
    }

    pub fn tolerate_failure(&self) -> bool {
        self.tolerate_failure
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// 외부 명령 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
}

impl Outcome {
    /// 캡처된 출력 없이 종료 코드만 가진 결과
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            stdout: None,
            stderr: None,
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout(&self) -> Option<&str> {
        self.stdout.as_deref()
    }

    pub fn stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }

    /// 캡처된 표준 출력. 캡처하지 않았다면 빈 문자열입니다.
    pub fn stdout_text(&self) -> &str {
        self.stdout.as_deref().unwrap_or_default()
    }
}
