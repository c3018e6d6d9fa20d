//! Command execution abstraction for testability.
//!
//! The [`CommandRunner`] trait abstracts process execution, allowing the
//! workflow to use [`SystemRunner`] in production while tests drive it with a
//! scripted runner.
//!
//! # Failure contract
//!
//! - Elevation on an unsupported platform: [`RunnerError::PrivilegeUnsupported`]
//! - Executable missing: [`RunnerError::CommandNotFound`]
//! - Non-zero exit, not tolerated: [`RunnerError::CommandFailed`] (carries the outcome)
//! - Non-zero exit, tolerated: `Ok(outcome)`, the caller decides
//!
//! Every error variant is fatal to the workflow; tolerated failures never
//! surface as errors.

use std::io::{self, ErrorKind};
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, warn};

use crate::command::{Invocation, Outcome};
use crate::error::RunnerError;
use crate::privilege::Privilege;

/// Trait abstracting external command execution.
///
/// Implementations block until the process terminates. There is no timeout:
/// a hung command hangs the caller.
pub trait CommandRunner {
    /// Executes the invocation and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`RunnerError`] for every condition the workflow must treat
    /// as fatal. Implementations should finish with [`settle`] so the
    /// tolerance rule is applied the same way everywhere.
    fn run(&mut self, invocation: &Invocation) -> Result<Outcome, RunnerError>;
}

/// Applies the failure-tolerance rule to a finished process.
pub fn settle(invocation: &Invocation, outcome: Outcome) -> Result<Outcome, RunnerError> {
    if outcome.is_success() {
        return Ok(outcome);
    }
    if invocation.tolerate_failure() {
        warn!(
            command = %invocation,
            exit_code = outcome.exit_code(),
            "command failed (tolerated)"
        );
        return Ok(outcome);
    }
    Err(RunnerError::CommandFailed {
        command: invocation.to_string(),
        outcome,
    })
}

/// Where uncaptured children write their standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdoutRoute {
    /// Share the harness's stdout.
    #[default]
    Inherit,
    /// Send it to the harness's stderr, keeping stdout for a machine-readable report.
    Stderr,
}

/// Production runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    privilege: Privilege,
    stdout_route: StdoutRoute,
}

impl SystemRunner {
    pub fn new(privilege: Privilege) -> Self {
        Self {
            privilege,
            stdout_route: StdoutRoute::Inherit,
        }
    }

    /// Routes the stdout of uncaptured commands. Captured commands are unaffected.
    pub fn with_stdout_route(mut self, route: StdoutRoute) -> Self {
        self.stdout_route = route;
        self
    }

    fn resolve_argv(&self, invocation: &Invocation) -> Result<Vec<String>, RunnerError> {
        if !invocation.elevate() {
            return Ok(invocation.argv().to_vec());
        }
        self.privilege
            .elevate(invocation.argv())
            .ok_or_else(|| RunnerError::PrivilegeUnsupported {
                command: invocation.to_string(),
            })
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<Outcome, RunnerError> {
        let argv = self.resolve_argv(invocation)?;
        let (program, args) = argv.split_first().ok_or(RunnerError::EmptyCommand)?;

        debug!(
            command = %argv.join(" "),
            capture = invocation.capture(),
            tolerate_failure = invocation.tolerate_failure(),
            "spawning command"
        );

        let mut cmd = Command::new(program);
        cmd.args(args);

        let spawn_error = |e: io::Error| {
            if e.kind() == ErrorKind::NotFound {
                RunnerError::CommandNotFound {
                    program: program.clone(),
                }
            } else {
                RunnerError::Spawn {
                    command: argv.join(" "),
                    source: e,
                }
            }
        };

        let outcome = if invocation.capture() {
            let output = cmd.output().map_err(spawn_error)?;
            Outcome::new(exit_code(output.status))
                .with_stdout(String::from_utf8_lossy(&output.stdout))
                .with_stderr(String::from_utf8_lossy(&output.stderr))
        } else {
            if self.stdout_route == StdoutRoute::Stderr {
                cmd.stdout(Stdio::from(io::stderr()));
            }
            let status = cmd.status().map_err(spawn_error)?;
            Outcome::new(exit_code(status))
        };

        debug!(
            command = %invocation,
            exit_code = outcome.exit_code(),
            "command finished"
        );

        settle(invocation, outcome)
    }
}

/// Maps a process status to an integer exit code.
///
/// Signal terminations follow the shell convention (`128 + signal`).
#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_passes_success_through() {
        let inv = Invocation::new(["make"]);
        let outcome = settle(&inv, Outcome::new(0)).expect("success should settle");
        assert!(outcome.is_success());
    }

    #[test]
    fn settle_returns_tolerated_failure_as_data() {
        let inv = Invocation::new(["rmmod", "mydevice"]).tolerating_failure();
        let outcome = settle(&inv, Outcome::new(1)).expect("tolerated failure is not an error");
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn settle_rejects_untolerated_failure() {
        let inv = Invocation::new(["make"]).captured();
        let err = settle(&inv, Outcome::new(2).with_stderr("boom"))
            .expect_err("untolerated failure must be fatal");
        match err {
            RunnerError::CommandFailed { command, outcome } => {
                assert_eq!(command, "make");
                assert_eq!(outcome.stderr(), Some("boom"));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_platform_refuses_elevated_command() {
        let mut runner = SystemRunner::new(Privilege::Unsupported);
        let inv = Invocation::new(["rmmod", "mydevice"])
            .elevated()
            .tolerating_failure();
        let err = runner.run(&inv).expect_err("elevation must not be skipped");
        assert!(matches!(err, RunnerError::PrivilegeUnsupported { .. }));
    }

    #[test]
    fn empty_command_is_rejected() {
        let mut runner = SystemRunner::new(Privilege::Root);
        let err = runner
            .run(&Invocation::new(Vec::<String>::new()))
            .expect_err("empty argv");
        assert!(matches!(err, RunnerError::EmptyCommand));
    }

    #[test]
    fn missing_executable_is_reported_as_not_found() {
        let mut runner = SystemRunner::new(Privilege::Unsupported);
        let inv = Invocation::new(["kmodtest-definitely-missing-binary"]).tolerating_failure();
        let err = runner.run(&inv).expect_err("missing binary is fatal");
        match err {
            RunnerError::CommandNotFound { program } => {
                assert_eq!(program, "kmodtest-definitely-missing-binary");
            }
            other => panic!("expected CommandNotFound, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_exit_code() {
        let mut runner = SystemRunner::new(Privilege::Unsupported);
        let inv = Invocation::new(["sh", "-c", "echo hello; echo oops >&2; exit 3"])
            .captured()
            .tolerating_failure();
        let outcome = runner.run(&inv).expect("tolerated failure");
        assert_eq!(outcome.exit_code(), 3);
        assert_eq!(outcome.stdout_text().trim(), "hello");
        assert_eq!(outcome.stderr().map(str::trim), Some("oops"));
    }

    #[cfg(unix)]
    #[test]
    fn stderr_route_leaves_captured_output_alone() {
        let mut runner =
            SystemRunner::new(Privilege::Unsupported).with_stdout_route(StdoutRoute::Stderr);
        let outcome = runner
            .run(&Invocation::new(["sh", "-c", "echo listing"]).captured())
            .expect("captured command");
        assert_eq!(outcome.stdout_text().trim(), "listing");
    }

    #[cfg(unix)]
    #[test]
    fn stderr_route_runs_uncaptured_command() {
        let mut runner =
            SystemRunner::new(Privilege::Unsupported).with_stdout_route(StdoutRoute::Stderr);
        let outcome = runner
            .run(&Invocation::new(["sh", "-c", "echo 'make: Entering directory'"]))
            .expect("uncaptured command");
        assert!(outcome.is_success());
        assert!(outcome.stdout().is_none());
    }

    #[test]
    fn default_route_inherits_stdout() {
        assert_eq!(StdoutRoute::default(), StdoutRoute::Inherit);
    }

    #[cfg(unix)]
    #[test]
    fn uncaptured_command_has_no_streams() {
        let mut runner = SystemRunner::new(Privilege::Unsupported);
        let outcome = runner
            .run(&Invocation::new(["true"]))
            .expect("true should succeed");
        assert!(outcome.is_success());
        assert!(outcome.stdout().is_none());
    }
}
