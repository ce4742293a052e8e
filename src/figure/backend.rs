//! Seams to the external plotting library.
//!
//! The writer never draws. It hands a destination, a format and normalized
//! sizes to a [`PlotBackend`] (for plot objects) or to the backend's active
//! [`SurfaceCapture`] (for whatever the current device shows).

use super::destination::is_same_file;
use super::format::FileType;
use super::units::{PixelSize, RenderOptions};
use crate::error::{PlotaidError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Copies the currently active display surface to a file.
pub trait SurfaceCapture {
    /// Encodes the surface into `path`. Sizes are always in pixels.
    ///
    /// # Errors
    ///
    /// Backend-specific failures, usually [`PlotaidError::Render`].
    fn capture(&self, path: &Path, file_type: FileType, size: PixelSize, dpi: f64) -> Result<()>;
}

/// Exports plot objects to files.
pub trait PlotBackend {
    type Plot;

    /// Writes `plot` to `path`. `options` carries physical units (pixel sizes
    /// have already been converted to inches) plus any pass-through options.
    ///
    /// # Errors
    ///
    /// Backend-specific failures, usually [`PlotaidError::Render`].
    fn export(
        &self,
        plot: &Self::Plot,
        path: &Path,
        file_type: FileType,
        options: &RenderOptions,
    ) -> Result<()>;

    /// The file `plot` is copied from, for backends that export existing
    /// files. Lets the writer notice when a save would overwrite its own
    /// source.
    fn source_file<'p>(&self, _plot: &'p Self::Plot) -> Option<&'p Path> {
        None
    }

    /// The most recently produced plot this backend knows about.
    fn last_plot(&self) -> Option<&Self::Plot> {
        None
    }

    /// The display surface currently receiving draw commands, if any.
    fn active_surface(&self) -> Option<&dyn SurfaceCapture> {
        None
    }
}

/// A figure some other tool already rendered to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub file_type: FileType,
}

impl RenderedFile {
    /// Opens a rendered file, taking its format from the extension.
    ///
    /// # Errors
    ///
    /// Fails when the file does not exist or its extension is not a known
    /// [`FileType`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(PlotaidError::Validation(format!(
                "Rendered figure not found: {}",
                path.display()
            )));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                PlotaidError::Validation(format!(
                    "Cannot tell the format of {} (no extension)",
                    path.display()
                ))
            })?;
        let file_type: FileType = ext.parse()?;
        Ok(Self { path, file_type })
    }
}

/// Backend for pre-rendered files: exporting copies the file byte-for-byte,
/// so only the file's own format can be produced.
#[derive(Debug, Clone, Default)]
pub struct FileCopyBackend {
    last: Option<RenderedFile>,
}

impl FileCopyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers `file` as the most recent plot.
    #[must_use]
    pub fn with_last(mut self, file: RenderedFile) -> Self {
        self.last = Some(file);
        self
    }
}

impl PlotBackend for FileCopyBackend {
    type Plot = RenderedFile;

    fn export(
        &self,
        plot: &RenderedFile,
        path: &Path,
        file_type: FileType,
        options: &RenderOptions,
    ) -> Result<()> {
        if plot.file_type != file_type {
            return Err(PlotaidError::Render(format!(
                "{} is a {} file and cannot be converted to {file_type}",
                plot.path.display(),
                plot.file_type
            )));
        }
        if !options.extra.is_empty() {
            tracing::debug!(
                "Ignoring {} render option(s) for pre-rendered file",
                options.extra.len()
            );
        }
        if is_same_file(&plot.path, path) {
            tracing::debug!("{} is already in place", path.display());
            return Ok(());
        }
        fs::copy(&plot.path, path).map_err(|e| PlotaidError::filesystem("write figure", path, e))?;
        Ok(())
    }

    fn source_file<'p>(&self, plot: &'p RenderedFile) -> Option<&'p Path> {
        Some(&plot.path)
    }

    fn last_plot(&self) -> Option<&RenderedFile> {
        self.last.as_ref()
    }
}
