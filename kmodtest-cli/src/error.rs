//! CLI-specific error types and exit code mapping

use kmodtest_core::error::KmodtestError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (transcript or stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from kmodtest-core.
    #[error("{0}")]
    Core(#[from] KmodtestError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 1    | Runner or JSON output error           |
    /// | 2    | Configuration error                   |
    /// | 10   | IO error                              |
    ///
    /// Workflow verdicts (0, 1, 3) are mapped in `commands::run`.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Core(KmodtestError::Config(_)) => 2,
            Self::Io(_) | Self::Core(KmodtestError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Core(KmodtestError::Runner(_)) => 1,
        }
    }
}
