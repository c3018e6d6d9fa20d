//! kmodtest 핵심 라이브러리 — 커널 모듈 테스트 워크플로 엔진
//!
//! 빌드 → 적재/검증 → 외부 테스트 실행 → 정리로 이어지는 고정 파이프라인을
//! 구현합니다. 모든 외부 명령은 [`runner::CommandRunner`]를 통해 실행되며,
//! 정상 종료 경로에서는 커널 모듈이 적재된 채로 남지 않습니다.

pub mod command;
pub mod config;
pub mod error;
pub mod phase;
pub mod privilege;
pub mod runner;
pub mod transcript;
pub mod workflow;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, KmodtestError, RunnerError};

// 설정
pub use config::HarnessConfig;

// 명령 실행
pub use command::{Invocation, Outcome};
pub use privilege::Privilege;
pub use runner::{CommandRunner, StdoutRoute, SystemRunner};

// 워크플로
pub use phase::{CleanupReport, Phases};
pub use transcript::Transcript;
pub use workflow::{Verdict, Workflow, WorkflowReport, WorkflowState};
