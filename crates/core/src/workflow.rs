//! Workflow driver -- phase sequencing, stop/continue policy, final report.
//!
//! The [`Workflow`] runs the five phases strictly in order and decides after
//! each one whether to continue.
//!
//! # State machine
//!
//! ```text
//! Start ─► Cleaned ─┬─► Compiled ─┬─► Loaded ─► Tested ─► CleanedUp ─► Done
//!                   │             │
//!                   │             └─► FailedLoad ─(final cleanup)─► Done
//!                   └─► FailedCompile ─────────────────────────────► Done
//! ```
//!
//! # Cleanup guarantee
//!
//! Final cleanup runs on every path after a module may have been inserted.
//! It is skipped only when the workflow stops before `insmod` succeeded
//! (pre-flight failure, compile failure, or a fatal `insmod` error):
//! nothing was acquired, so there is nothing to unload.

use std::io::Write;

use serde::Serialize;
use tracing::{error, info};

use crate::config::HarnessConfig;
use crate::error::RunnerError;
use crate::phase::{CleanupReport, Phases};
use crate::runner::CommandRunner;
use crate::transcript::Transcript;

/// Driver states, recorded in visiting order in [`WorkflowReport::trail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Start,
    Cleaned,
    Compiled,
    FailedCompile,
    Loaded,
    FailedLoad,
    Tested,
    CleanedUp,
    Done,
}

/// Overall verdict of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Compile, load, and the test-suite verdict all succeeded.
    Passed,
    /// Module loaded and tests ran, but the test-suite verdict failed.
    TestsFailed,
    /// Stopped by a compile failure, load failure, or fatal runner error.
    Aborted,
}

/// Final report of a workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub module: String,
    pub compiled: bool,
    pub loaded: bool,
    pub tests_passed: bool,
    /// `None` when the run stopped before anything needed unloading.
    pub cleanup: Option<CleanupReport>,
    /// Message of the fatal runner error that stopped the run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
    pub trail: Vec<WorkflowState>,
}

impl WorkflowReport {
    fn new(module: &str) -> Self {
        Self {
            module: module.to_owned(),
            compiled: false,
            loaded: false,
            tests_passed: false,
            cleanup: None,
            fatal: None,
            trail: vec![WorkflowState::Start],
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.fatal.is_some() || !self.compiled || !self.loaded {
            Verdict::Aborted
        } else if self.tests_passed {
            Verdict::Passed
        } else {
            Verdict::TestsFailed
        }
    }

    pub fn succeeded(&self) -> bool {
        self.verdict() == Verdict::Passed
    }

    /// Last state reached.
    pub fn state(&self) -> WorkflowState {
        self.trail.last().copied().unwrap_or(WorkflowState::Start)
    }

    pub fn visited(&self, state: WorkflowState) -> bool {
        self.trail.contains(&state)
    }
}

/// Sequences the phases against one immutable configuration.
///
/// # Examples
///
/// ```no_run
/// use kmodtest_core::config::HarnessConfig;
/// use kmodtest_core::privilege::Privilege;
/// use kmodtest_core::runner::SystemRunner;
/// use kmodtest_core::transcript::Transcript;
/// use kmodtest_core::workflow::Workflow;
///
/// let config = HarnessConfig::default();
/// let mut runner = SystemRunner::new(Privilege::detect());
/// let mut transcript = Transcript::stdout();
/// let report = Workflow::new(&config, &mut runner, &mut transcript).run();
/// std::process::exit(if report.succeeded() { 0 } else { 1 });
/// ```
pub struct Workflow<'a, R, W: Write> {
    phases: Phases<'a, R, W>,
    report: WorkflowReport,
}

impl<'a, R: CommandRunner, W: Write> Workflow<'a, R, W> {
    pub fn new(
        config: &'a HarnessConfig,
        runner: &'a mut R,
        transcript: &'a mut Transcript<W>,
    ) -> Self {
        Self {
            phases: Phases::new(config, runner, transcript),
            report: WorkflowReport::new(&config.module.name),
        }
    }

    /// Runs the whole pipeline and returns the report.
    ///
    /// Never panics on command failures; every failure is folded into the
    /// report so the caller can choose the process exit status.
    pub fn run(mut self) -> WorkflowReport {
        info!(module = %self.report.module, "workflow starting");
        self.phases
            .transcript()
            .banner("===== Starting Automated Kernel Module Test Framework =====");

        if let Err(e) = self.phases.initial_cleanup() {
            self.phases
                .transcript()
                .alert("\nWorkflow stopped due to pre-flight cleanup failure.");
            return self.abort(e);
        }
        self.advance(WorkflowState::Cleaned);

        match self.phases.compile() {
            Ok(true) => {
                self.report.compiled = true;
                self.advance(WorkflowState::Compiled);
            }
            result => {
                self.advance(WorkflowState::FailedCompile);
                self.phases
                    .transcript()
                    .alert("\nWorkflow stopped due to compilation failure.");
                return match result {
                    Err(e) => self.abort(e),
                    Ok(_) => self.finish(),
                };
            }
        }

        match self.phases.load_and_verify() {
            Ok(true) => {
                self.report.loaded = true;
                self.advance(WorkflowState::Loaded);
            }
            result => {
                self.advance(WorkflowState::FailedLoad);
                self.phases
                    .transcript()
                    .alert("\nWorkflow stopped due to module loading failure.");
                if let Err(e) = result {
                    self.record_fatal(&e);
                }
                if self.phases.module_inserted() {
                    self.report.cleanup = Some(self.phases.final_cleanup());
                }
                return self.finish();
            }
        }

        match self.phases.run_test_suite() {
            Ok(passed) => self.report.tests_passed = passed,
            Err(e) => self.record_fatal(&e),
        }
        self.advance(WorkflowState::Tested);

        self.phases.transcript().summary(self.report.tests_passed);

        self.report.cleanup = Some(self.phases.final_cleanup());
        self.advance(WorkflowState::CleanedUp);

        self.phases.transcript().line("\nFramework finished.");
        self.finish()
    }

    fn advance(&mut self, state: WorkflowState) {
        info!(state = ?state, "workflow state");
        self.report.trail.push(state);
    }

    fn record_fatal(&mut self, err: &RunnerError) {
        error!(error = %err, "fatal command failure");
        self.report.fatal = Some(err.to_string());
    }

    fn abort(mut self, err: RunnerError) -> WorkflowReport {
        self.record_fatal(&err);
        self.finish()
    }

    fn finish(mut self) -> WorkflowReport {
        self.advance(WorkflowState::Done);
        info!(verdict = ?self.report.verdict(), "workflow finished");
        self.report
    }
}
