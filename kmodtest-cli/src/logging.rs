//! Diagnostic logging for kmodtest.
//!
//! Logs always go to stderr so they never interleave with the transcript in
//! text mode or corrupt the JSON report in JSON mode. The `[general]` section
//! picks the level and format; `RUST_LOG` overrides the level.

use std::io::{self, IsTerminal};

use anyhow::{Result, bail};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use kmodtest_core::config::GeneralConfig;

/// Installs the global subscriber. Call once, before the workflow starts.
///
/// `log_format` is `"json"` (one object per line) or `"pretty"`; ANSI colors
/// are used for `pretty` only when stderr is a terminal.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.log_format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init(),
        "pretty" => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(io::stderr().is_terminal())
                    .with_writer(io::stderr),
            )
            .try_init(),
        other => bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install {} logger: {e}", config.log_format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_is_rejected() {
        let config = GeneralConfig {
            log_level: "info".to_owned(),
            log_format: "xml".to_owned(),
        };
        let err = init_tracing(&config).expect_err("unknown format must fail");
        assert!(err.to_string().contains("unknown log format 'xml'"));
    }
}
