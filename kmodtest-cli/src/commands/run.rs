//! `kmodtest run` command handler

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use kmodtest_core::config::HarnessConfig;
use kmodtest_core::privilege::Privilege;
use kmodtest_core::runner::SystemRunner;
use kmodtest_core::workflow::{Verdict, Workflow, WorkflowReport};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Applies CLI overrides, freezes the configuration, and drives the workflow
/// against the real system. Returns the process exit code for the verdict.
pub fn execute(
    args: RunArgs,
    mut config: HarnessConfig,
    writer: &OutputWriter,
) -> Result<u8, CliError> {
    apply_overrides(&mut config, args);
    config.validate()?;
    let config = config;

    let privilege = Privilege::detect();
    if !privilege.is_supported() {
        warn!("privilege escalation is unavailable; module loading will fail");
    }
    info!(
        module = %config.module.name,
        test_suite = %config.test_suite.path,
        privilege = ?privilege,
        "starting kernel module test workflow"
    );

    let mut runner = SystemRunner::new(privilege).with_stdout_route(writer.stdout_route());
    let mut transcript = writer.transcript();
    let report = Workflow::new(&config, &mut runner, &mut transcript).run();
    transcript.finish()?;

    let summary = RunSummary::from_report(report);
    writer.render(&summary)?;

    Ok(summary.exit_code)
}

fn apply_overrides(config: &mut HarnessConfig, args: RunArgs) {
    if let Some(module) = args.module {
        config.module.name = module;
    }
    if let Some(test_suite) = args.test_suite {
        config.test_suite.path = test_suite;
    }
}

/// Process exit code for a workflow verdict.
///
/// | Code | Meaning                                        |
/// |------|------------------------------------------------|
/// | 0    | Compile, load, and tests all succeeded         |
/// | 1    | Compile/load failure or fatal command error    |
/// | 3    | Test suite verdict failed (cleanup performed)  |
pub fn verdict_exit_code(verdict: Verdict) -> u8 {
    match verdict {
        Verdict::Passed => 0,
        Verdict::Aborted => 1,
        Verdict::TestsFailed => 3,
    }
}

/// Final result of `kmodtest run`.
#[derive(Serialize)]
pub struct RunSummary {
    pub verdict: Verdict,
    pub exit_code: u8,
    #[serde(flatten)]
    pub report: WorkflowReport,
}

impl RunSummary {
    pub fn from_report(report: WorkflowReport) -> Self {
        let verdict = report.verdict();
        Self {
            verdict,
            exit_code: verdict_exit_code(verdict),
            report,
        }
    }
}

impl Render for RunSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let label = match self.verdict {
            Verdict::Passed => "PASSED".green().bold(),
            Verdict::TestsFailed => "FAILED".red().bold(),
            Verdict::Aborted => "ABORTED".red().bold(),
        };
        writeln!(
            w,
            "\nResult: {} (module '{}', exit {})",
            label, self.report.module, self.exit_code
        )
    }
}
