//! Error types shared by the metadata store and the figure writer.
//!
//! Every fatal condition maps to one [`PlotaidError`] variant so callers can
//! tell exactly which precondition failed:
//!
//! ```
//! use plotaid::error::PlotaidError;
//!
//! fn describe(err: &PlotaidError) -> &'static str {
//!     match err {
//!         PlotaidError::Validation(_) => "bad input",
//!         PlotaidError::UnsupportedFormat { .. } => "wrong file type",
//!         PlotaidError::NoPlotAvailable => "nothing to save",
//!         PlotaidError::NoActiveSurface => "no open device",
//!         PlotaidError::Filesystem { .. } | PlotaidError::Io(_) => "disk trouble",
//!         _ => "other",
//!     }
//! }
//! ```
//!
//! Unknown target columns in a metadata batch are *not* errors. They are
//! logged with `tracing::warn!` and listed in the returned report.
//!
//! The [`ResultExt`] trait adds `.context()` to any result whose error
//! converts into [`PlotaidError`]:
//!
//! ```no_run
//! use plotaid::error::ResultExt as _;
//!
//! fn load() -> plotaid::error::Result<String> {
//!     let text = std::fs::read_to_string("meta.csv").context("Failed to read metadata table")?;
//!     Ok(text)
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Main error type for plotaid operations.
#[derive(Debug)]
pub enum PlotaidError {
    /// Malformed metadata input or an unsafe figure name component.
    Validation(String),

    /// The requested file type is not valid for the chosen export mode.
    UnsupportedFormat { format: String, mode: &'static str },

    /// No plot handle was given and the backend has no previous plot.
    NoPlotAvailable,

    /// Capture was requested but no display surface is active.
    NoActiveSurface,

    /// Directory creation, rename or copy failed for a specific path.
    Filesystem {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    /// Other I/O errors (reading inputs, writing reports)
    Io(std::io::Error),

    /// Configuration errors
    Config(String),

    /// Failure reported by the external rendering collaborator.
    Render(String),

    /// Generic error with context
    Other(String),
}

impl PlotaidError {
    /// Wraps an I/O error with the path and the action that failed.
    pub fn filesystem(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            action,
            source,
        }
    }
}

impl fmt::Display for PlotaidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::UnsupportedFormat { format, mode } => {
                write!(f, "Unsupported file type '{format}' for {mode}")
            }
            Self::NoPlotAvailable => write!(f, "No plot supplied and no previous plot available"),
            Self::NoActiveSurface => write!(f, "No active rendering surface to capture"),
            Self::Filesystem {
                path,
                action,
                source,
            } => write!(f, "Failed to {action} {}: {source}", path.display()),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PlotaidError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Filesystem { source, .. } | Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlotaidError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for PlotaidError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for PlotaidError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<csv::Error> for PlotaidError {
    fn from(err: csv::Error) -> Self {
        Self::Validation(format!("CSV error: {err}"))
    }
}

/// Result type alias for plotaid operations.
pub type Result<T> = std::result::Result<T, PlotaidError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<PlotaidError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: PlotaidError = e.into();
            PlotaidError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: PlotaidError = e.into();
            PlotaidError::Other(format!("{}: {}", f(), err))
        })
    }
}
