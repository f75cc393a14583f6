//! Tracing subscriber setup.
//!
//! `generate` logs JSON to a daily file under the runtime `logs/` directory
//! and human-readable lines to stderr. `models` and `keywords` log to stderr
//! only, and stay quiet unless asked. `RUST_LOG` always wins over `-v`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "ghostwriter.log";

/// Filter level picked from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors.
    Quiet,
    /// Stage progress.
    Normal,
    /// Per-document detail from this crate.
    Debug,
    /// Everything this crate emits.
    Trace,
}

impl Verbosity {
    /// Raise `base` by one level per `-v`.
    pub fn raised(base: Self, count: u8) -> Self {
        (0..count).fold(base, |level, _| match level {
            Self::Quiet => Self::Normal,
            Self::Normal => Self::Debug,
            Self::Debug | Self::Trace => Self::Trace,
        })
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Debug => "info,ghostwriter=debug",
            Self::Trace => "info,ghostwriter=trace",
        }
    }
}

fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()))
}

/// Keeps the file writer flushing; drop it last.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Install file and stderr logging for a generation run.
///
/// JSON lines go to `{logs_dir}/ghostwriter.log.YYYY-MM-DD`.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created or a global
/// subscriber is already installed.
pub fn init_production(logs_dir: &Path, verbosity: Verbosity) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create logs directory {}: {e}",
            logs_dir.display()
        )
    })?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(env_filter(verbosity))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(file_writer),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(LoggingGuard { _guard: guard })
}

/// Install stderr-only logging for the quick subcommands.
pub fn init_cli(verbosity: Verbosity) {
    // A subscriber may already be installed (tests, embedding hosts).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .try_init();
}
