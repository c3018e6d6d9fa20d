//! 사람이 읽는 실행 기록 — 단계 헤더, 상태 줄, 요약 배너
//!
//! 한 논리 단계당 한 줄을 쓰며, 색상은 [`Transcript::with_color`]로 끌 수 있습니다.
//! 상태 줄은 50칸 고정 폭 레이블 뒤에 `[PASSED]`/`[FAILED]`를 붙입니다.
//!
//! 쓰기 실패는 워크플로를 중단시키지 않습니다. 정리 단계가 반드시 실행되어야
//! 하므로 첫 번째 I/O 에러만 기록해 두었다가 [`Transcript::finish`]에서 반환합니다.

use std::io::{self, Write};

use colored::{Color, Colorize};

use crate::error::RunnerError;

/// 상태 줄 레이블 폭
const LABEL_WIDTH: usize = 50;

/// 요약 배너 구분선
const SUMMARY_RULE: &str = "==================================================";

/// 실행 기록 작성기
pub struct Transcript<W: Write> {
    out: W,
    color: bool,
    error: Option<io::Error>,
}

impl Transcript<Box<dyn Write>> {
    /// 표준 출력으로 쓰는 기록
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// 표준 에러로 쓰는 기록 (JSON 출력 모드에서 stdout을 비워 둘 때)
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl<W: Write> Transcript<W> {
    /// 색상은 `colored`의 전역 판단을 따릅니다.
    pub fn new(out: W) -> Self {
        Self {
            out,
            color: true,
            error: None,
        }
    }

    /// `false`면 ANSI 색상 코드 없이 씁니다.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// 시작 배너
    pub fn banner(&mut self, text: &str) {
        let text = self.paint(text, Color::Yellow);
        self.write_line(format_args!("{text}"));
    }

    /// 단계 헤더 (`--- title ---`)
    pub fn phase(&mut self, title: &str) {
        let header = self.paint(&format!("--- {title} ---"), Color::Blue);
        self.write_line(format_args!("\n{header}"));
    }

    /// 고정 폭 레이블 + 컬러 PASSED/FAILED 표시
    pub fn status(&mut self, message: &str, passed: bool) {
        let marker = if passed {
            self.paint("PASSED", Color::Green)
        } else {
            self.paint("FAILED", Color::Red)
        };
        self.write_line(format_args!("{message:<LABEL_WIDTH$} [{marker}]"));
    }

    /// 일반 텍스트 한 줄
    pub fn line(&mut self, text: &str) {
        self.write_line(format_args!("{text}"));
    }

    /// 붉은색 경고/에러 텍스트
    pub fn alert(&mut self, text: &str) {
        let text = self.paint(text, Color::Red);
        self.write_line(format_args!("{text}"));
    }

    /// 치명적 실행기 에러를 보고합니다.
    ///
    /// 명령 실패인 경우 캡처된 stdout/stderr 블록을 함께 출력합니다.
    pub fn fatal(&mut self, err: &RunnerError) {
        match err {
            RunnerError::CommandNotFound { program } => {
                self.status(&format!("Command not found: {program}"), false);
            }
            RunnerError::CommandFailed { command, outcome } => {
                self.status(&format!("Error running command: {command}"), false);
                if let Some(stdout) = outcome.stdout().filter(|s| !s.is_empty()) {
                    self.write_line(format_args!("--- STDOUT ---\n{stdout}"));
                }
                if let Some(stderr) = outcome.stderr().filter(|s| !s.is_empty()) {
                    self.write_line(format_args!("--- STDERR ---\n{stderr}"));
                }
            }
            RunnerError::PrivilegeUnsupported { .. } => {
                self.status("Privilege escalation unavailable", false);
                self.alert("Sudo is only supported on Linux.");
            }
            RunnerError::EmptyCommand | RunnerError::Spawn { .. } => {
                self.status(&format!("An unexpected error occurred: {err}"), false);
            }
        }
    }

    /// 테스트 결과 요약 배너
    pub fn summary(&mut self, passed: bool) {
        let title = self.paint(
            "================== TEST SUMMARY ==================",
            Color::Yellow,
        );
        self.write_line(format_args!("\n{title}"));
        let verdict = if passed {
            self.paint(
                "✅ All tests PASSED! The framework ran successfully.",
                Color::Green,
            )
        } else {
            self.paint(
                "❌ Some tests FAILED. Please review the output above.",
                Color::Red,
            )
        };
        self.write_line(format_args!("{verdict}"));
        let rule = self.paint(SUMMARY_RULE, Color::Yellow);
        self.write_line(format_args!("{rule}"));
    }

    /// 기록을 마치고 첫 번째 쓰기 에러를 반환합니다.
    pub fn finish(mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()
    }

    /// 기록을 마치고 내부 writer를 돌려줍니다.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_owned()
        }
    }

    fn write_line(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{args}") {
            tracing::warn!(error = %e, "failed to write transcript");
            self.error = Some(e);
        }
    }
}
