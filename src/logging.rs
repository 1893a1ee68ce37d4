//! Tracing setup for the binary.
//!
//! Reads `RUST_LOG`, defaulting to `warn` (or `interviewer=debug` with `--verbose`).
//! Output goes to stderr so it never mixes with the conversation on stdout. When a log
//! directory is configured, a daily-rolling JSON file is written as well.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// How the stderr layer formats events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions<'a> {
    pub verbose: bool,
    pub format: LogFormat,
    pub dir: Option<&'a Path>,
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "interviewer=debug" } else { "warn" }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the life of
/// the process.
pub fn init(options: LogOptions<'_>) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    layers.push(match options.format {
        LogFormat::Compact => fmt::layer()
            .with_writer(std::io::stderr)
            .compact()
            .with_filter(env_filter(options.verbose))
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_filter(env_filter(options.verbose))
            .boxed(),
    });

    let mut guard = None;
    if let Some(dir) = options.dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(dir, "interviewer.log");
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .json()
                .with_filter(env_filter(true))
                .boxed(),
        );
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
