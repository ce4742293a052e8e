//! Versioned figure saving.
//!
//! Figures are written under a save directory with filenames built from an
//! optional prefix (usually the running script's name), the plot name and a
//! timestamp. In preserve-latest mode a dateless copy is kept under
//! `latest/` and the version it replaces is moved into `archive/`.
//!
//! Rendering is delegated to a [`PlotBackend`]; this module only decides
//! where the file goes and in which units the backend is asked to draw.
//!
//! ```no_run
//! use plotaid::config::SaveConfig;
//! use plotaid::figure::{FigureSource, FigureWriter, FileCopyBackend, RenderedFile, SaveRequest};
//!
//! # fn example() -> plotaid::error::Result<()> {
//! let writer = FigureWriter::new(SaveConfig::default().with_save_dir("out"));
//! let plot = RenderedFile::open("tmp/scatter.png")?;
//! let saved = writer.save(
//!     &FileCopyBackend::new(),
//!     FigureSource::Plot(&plot),
//!     &SaveRequest::new("scatter").preserve_latest(true),
//! )?;
//! println!("{}", saved.path.display());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod destination;
pub mod format;
pub mod naming;
pub mod units;
pub mod writer;

pub use backend::{FileCopyBackend, PlotBackend, RenderedFile, SurfaceCapture};
pub use destination::{
    FigureDestination, ResolvedSave, Rotation, SaveRequest, destination_path, ensure_directory,
    resolve_destination,
};
pub use format::{ExportMode, FileType};
pub use naming::{
    CurrentExecutable, EnvScript, FixedScript, PrefixPolicy, ScriptIdentity, resolve_prefix,
};
pub use units::{PixelSize, RenderOptions, Unit};
pub use writer::{FigureSource, FigureWriter, write};
