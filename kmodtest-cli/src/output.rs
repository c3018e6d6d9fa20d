//! Stream routing for `kmodtest` output.
//!
//! In text mode everything a run produces shares stdout: the colored
//! transcript, the output of `make`/`insmod`/`rmmod`, and the one-line result.
//! In JSON mode stdout is reserved for the final report document, so the
//! transcript and uncaptured child output are moved to stderr.

use std::io::{self, IsTerminal, Write};

use serde::Serialize;

use kmodtest_core::runner::StdoutRoute;
use kmodtest_core::transcript::Transcript;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Chooses the stream for every kind of output a command produces.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Transcript sink for the workflow.
    ///
    /// On stderr the transcript is colored only when stderr itself is a
    /// terminal and `NO_COLOR` is unset.
    pub fn transcript(&self) -> Transcript<Box<dyn Write>> {
        match self.format {
            OutputFormat::Text => Transcript::stdout(),
            OutputFormat::Json => {
                let color = io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
                colored::control::set_override(color);
                Transcript::stderr().with_color(color)
            }
        }
    }

    /// Where uncaptured child processes write their stdout.
    pub fn stdout_route(&self) -> StdoutRoute {
        match self.format {
            OutputFormat::Text => StdoutRoute::Inherit,
            OutputFormat::Json => StdoutRoute::Stderr,
        }
    }

    /// Writes the final payload to stdout: `Render` text or one JSON document.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.render_to(&mut handle, payload)
    }

    fn render_to<T: Render + Serialize>(
        &self,
        w: &mut dyn Write,
        payload: &T,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable form of a report; the JSON form comes from `Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()>;
}
