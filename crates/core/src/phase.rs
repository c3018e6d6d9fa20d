//! 단계 함수 — 사전 정리, 컴파일, 적재+검증, 테스트 실행, 최종 정리
//!
//! 각 단계는 [`CommandRunner`]를 0번 이상 호출하고 하나의 성공 신호로 결과를
//! 모읍니다. 치명적 실행기 에러는 `Err`로 그대로 전파되어 드라이버가 명시적으로
//! 처리합니다. 정리 단계는 최선 노력(best-effort)이며 실패해도 워크플로를
//! 중단하지 않습니다.
//!
//! # 실패 정책
//!
//! | 단계        | 명령                | 실패 처리                       |
//! |-------------|---------------------|---------------------------------|
//! | 사전 정리   | `rmmod`             | 허용 (모듈이 없으면 정상)       |
//! | 컴파일      | clean, build        | 치명적                          |
//! | 적재        | `insmod`            | 치명적                          |
//! | 검증        | `lsmod`             | 목록에 없으면 단계 실패         |
//! | 권한        | `chmod 666`         | 경고만 출력                     |
//! | 테스트      | 테스트 바이너리     | 판정 데이터                     |
//! | 최종 정리   | `rmmod`, clean      | 보고만 하고 무시                |

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use crate::command::{Invocation, Outcome};
use crate::config::HarnessConfig;
use crate::error::RunnerError;
use crate::runner::CommandRunner;
use crate::transcript::Transcript;

/// 단계 결과. `Ok(false)`는 단계 실패, `Err`는 치명적 중단입니다.
pub type PhaseResult = Result<bool, RunnerError>;

/// 최종 정리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// `rmmod` 명령이 실행되었는지 (모듈이 이미 없던 경우 포함)
    pub unload_attempted: bool,
    /// 빌드 산출물 정리 성공 여부
    pub build_cleaned: bool,
}

/// 설정, 실행기, 실행 기록을 묶어 각 단계를 실행합니다.
pub struct Phases<'a, R, W: Write> {
    config: &'a HarnessConfig,
    runner: &'a mut R,
    transcript: &'a mut Transcript<W>,
    module_inserted: bool,
}

impl<'a, R: CommandRunner, W: Write> Phases<'a, R, W> {
    pub fn new(
        config: &'a HarnessConfig,
        runner: &'a mut R,
        transcript: &'a mut Transcript<W>,
    ) -> Self {
        Self {
            config,
            runner,
            transcript,
            module_inserted: false,
        }
    }

    /// `insmod`가 성공해 커널에 모듈이 올라갔을 수 있는지
    pub fn module_inserted(&self) -> bool {
        self.module_inserted
    }

    pub fn transcript(&mut self) -> &mut Transcript<W> {
        self.transcript
    }

    /// 사전 정리: 이전 실행에서 남은 모듈을 해제합니다.
    ///
    /// 모듈이 없어서 `rmmod`가 실패하는 것이 정상 경로입니다.
    pub fn initial_cleanup(&mut self) -> Result<(), RunnerError> {
        self.transcript
            .phase("Pre-flight Check: Cleaning up old modules");
        let unload = self.unload_invocation();
        let outcome = self.exec(&unload)?;
        if !outcome.is_success() {
            info!(module = %self.config.module.name, "module was not loaded before the run");
        }
        self.transcript.line("Cleanup check complete.");
        Ok(())
    }

    /// 컴파일: clean 후 build. 어떤 실패도 치명적입니다.
    pub fn compile(&mut self) -> PhaseResult {
        self.transcript.phase("Phase 1: Compiling Code");
        self.exec(&Invocation::new(self.config.build.clean.iter().cloned()))?;
        self.exec(&Invocation::new(self.config.build.build.iter().cloned()))?;
        self.transcript
            .status("Compilation of module and test suite", true);
        Ok(true)
    }

    /// 적재 + 검증 + 장치 노드 권한 설정
    ///
    /// 반환값은 적재와 검증의 결과만 반영합니다. 권한 설정 실패는 경고로 끝납니다.
    pub fn load_and_verify(&mut self) -> PhaseResult {
        self.transcript.phase("Phase 2: Loading Kernel Module");

        let object_file = self.config.object_file();
        self.exec(&Invocation::new(["insmod", object_file.as_str()]).elevated())?;
        self.module_inserted = true;
        self.transcript
            .status(&format!("Loading module '{object_file}'"), true);

        let listing = self.exec(&Invocation::new(["lsmod"]).captured())?;
        if !module_listed(listing.stdout_text(), &self.config.module.name) {
            warn!(module = %self.config.module.name, "module missing from lsmod after insmod");
            self.transcript.status("Verification with 'lsmod'", false);
            return Ok(false);
        }
        self.transcript.status("Verification with 'lsmod'", true);

        let device = self.config.device_path();
        let chmod = Invocation::new(["chmod", "666", device.as_str()])
            .elevated()
            .tolerating_failure();
        let label = format!("Setting permissions on {device}");
        match self.exec(&chmod) {
            Ok(outcome) if outcome.is_success() => self.transcript.status(&label, true),
            _ => {
                warn!(device = %device, "failed to set device permissions");
                self.transcript.status(&label, false);
                self.transcript
                    .alert("Could not set permissions. The test suite will likely fail.");
            }
        }

        Ok(true)
    }

    /// 외부 테스트 스위트 실행
    ///
    /// 종료 코드 0 **그리고** stdout의 통과 문자열이 모두 있어야 성공입니다.
    pub fn run_test_suite(&mut self) -> PhaseResult {
        self.transcript.phase("Phase 3: Running Test Suite");

        let suite = Invocation::new([self.config.test_suite.path.as_str()])
            .captured()
            .tolerating_failure();
        let outcome = self.exec(&suite)?;

        self.transcript.line("--- Test Application Output ---");
        let stdout = outcome.stdout_text().trim();
        if !stdout.is_empty() {
            self.transcript.line(stdout);
        }
        self.transcript.line("-----------------------------");

        let passed = suite_passed(&outcome, &self.config.test_suite.pass_marker);
        self.transcript.status("Test suite execution", passed);
        if !passed {
            info!(exit_code = outcome.exit_code(), "test suite failed");
            if let Some(stderr) = outcome.stderr().map(str::trim).filter(|s| !s.is_empty()) {
                self.transcript
                    .alert(&format!("Test suite errors:\n{stderr}"));
            }
        }
        Ok(passed)
    }

    /// 최종 정리: 모듈 해제 후 빌드 산출물 정리
    ///
    /// 어떤 실패도 워크플로 종료 상태를 바꾸지 않습니다.
    pub fn final_cleanup(&mut self) -> CleanupReport {
        self.transcript.phase("Phase 4: Final Cleanup");
        let mut report = CleanupReport::default();

        let name = self.config.module.name.clone();
        let unload = self.unload_invocation();
        report.unload_attempted = self.exec(&unload).is_ok();
        self.transcript
            .status(&format!("Unloading module '{name}'"), report.unload_attempted);
        if report.unload_attempted {
            self.module_inserted = false;
        }

        let clean = Invocation::new(self.config.build.clean.iter().cloned()).tolerating_failure();
        report.build_cleaned = matches!(self.exec(&clean), Ok(outcome) if outcome.is_success());
        self.transcript
            .status("Cleaning build files", report.build_cleaned);

        report
    }

    fn unload_invocation(&self) -> Invocation {
        Invocation::new(["rmmod", self.config.module.name.as_str()])
            .elevated()
            .tolerating_failure()
    }

    /// 실행기 호출. 치명적 에러는 기록에 남긴 뒤 그대로 반환합니다.
    fn exec(&mut self, invocation: &Invocation) -> Result<Outcome, RunnerError> {
        match self.runner.run(invocation) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.transcript.fatal(&e);
                Err(e)
            }
        }
    }
}

/// `lsmod` 출력의 첫 열에 모듈 이름이 있는지 확인합니다.
///
/// 커널은 모듈 이름의 `-`를 `_`로 보고하므로 비교 전에 정규화합니다.
pub fn module_listed(listing: &str, name: &str) -> bool {
    let wanted = name.replace('-', "_");
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|first| first == wanted)
}

/// 테스트 스위트 판정: 종료 코드가 먼저, 그다음 통과 문자열
pub fn suite_passed(outcome: &Outcome, pass_marker: &str) -> bool {
    outcome.exit_code() == 0 && outcome.stdout_text().contains(pass_marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSMOD: &str = "\
Module                  Size  Used by
mydevice               16384  0
snd_hda_intel          57344  3
mydevice_extra         12288  0
";

    #[test]
    fn listed_module_is_found() {
        assert!(module_listed(LSMOD, "mydevice"));
        assert!(module_listed(LSMOD, "snd_hda_intel"));
    }

    #[test]
    fn prefix_of_another_module_does_not_match() {
        let listing = "Module Size Used by\nmydevice_extra 12288 0\n";
        assert!(!module_listed(listing, "mydevice"));
    }

    #[test]
    fn dashed_name_matches_kernel_underscore_form() {
        assert!(module_listed(LSMOD, "snd-hda-intel"));
    }

    #[test]
    fn empty_listing_finds_nothing() {
        assert!(!module_listed("", "mydevice"));
    }

    #[test]
    fn suite_passes_with_zero_exit_and_marker() {
        let outcome = Outcome::new(0).with_stdout("running...\nAll tests passed!\n");
        assert!(suite_passed(&outcome, "All tests passed!"));
    }

    #[test]
    fn zero_exit_without_exact_marker_fails() {
        let outcome = Outcome::new(0).with_stdout("3 tests passed");
        assert!(!suite_passed(&outcome, "All tests passed!"));
    }

    #[test]
    fn marker_with_nonzero_exit_fails() {
        let outcome = Outcome::new(1).with_stdout("All tests passed!");
        assert!(!suite_passed(&outcome, "All tests passed!"));
    }

    #[test]
    fn missing_stdout_fails() {
        assert!(!suite_passed(&Outcome::new(0), "All tests passed!"));
    }
}
