//! Logging setup for the `plotaid` binary.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the application. The binary calls [`init`] once at startup, which
//! writes to the console and to daily-rotated files in the platform data
//! directory.
//!
//! ```no_run
//! plotaid::logging::init(0).expect("Failed to initialize logging");
//! tracing::info!("ready");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/plotaid/logs`
/// - macOS: `~/Library/Application Support/plotaid/logs`
/// - Linux: `~/.local/share/plotaid/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join("plotaid").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Maps the CLI `-v` count onto a default filter directive.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// The two rolling log files.
struct LogFiles {
    dir: PathBuf,
    all: RollingFileAppender,
    errors: RollingFileAppender,
}

impl LogFiles {
    fn open(dir: PathBuf) -> Result<Self> {
        let all = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .max_log_files(10)
            .filename_prefix("plotaid")
            .filename_suffix("log")
            .build(&dir)
            .context("Failed to create all-logs file appender")?;

        let errors = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .max_log_files(10)
            .filename_prefix("error")
            .filename_suffix("log")
            .build(&dir)
            .context("Failed to create error-logs file appender")?;

        Ok(Self { dir, all, errors })
    }
}

/// Initializes console and file logging.
///
/// `RUST_LOG` overrides the verbosity-derived default. Two files are kept:
/// `plotaid.<date>.log` with everything and `error.<date>.log` with warnings
/// and errors only (skipped metadata columns land there). When no log
/// directory is available (no data directory, read-only home) only the
/// console layer is installed and a warning says why.
///
/// # Errors
///
/// Returns error if the filter cannot be built or a subscriber is already
/// installed.
pub fn init(verbosity: u8) -> Result<()> {
    let (log_files, file_error) = match get_log_dir().and_then(LogFiles::open) {
        Ok(files) => (Some(files), None),
        Err(e) => (None, Some(e)),
    };
    let log_dir = log_files.as_ref().map(|files| files.dir.clone());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))
        .context("Failed to create env filter")?;

    // Console output goes to stderr so `meta show --format json` stays pipeable.
    let console_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    let (all_logs_layer, error_logs_layer) = log_files
        .map(|files| {
            let all_logs_layer = fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(files.all);

            let error_logs_layer = fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(files.errors)
                .with_filter(EnvFilter::new("warn"));

            (all_logs_layer, error_logs_layer)
        })
        .unzip();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    match (log_dir, file_error) {
        (Some(dir), _) => {
            tracing::debug!("Logging initialized, log directory: {}", dir.display());
        }
        (None, Some(e)) => tracing::warn!("File logging disabled: {e:#}"),
        (None, None) => {}
    }

    Ok(())
}
