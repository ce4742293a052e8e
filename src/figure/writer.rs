//! The save pipeline: check the source, resolve the destination, render.

use super::backend::{PlotBackend, SurfaceCapture};
use super::destination::{FigureDestination, SaveRequest, resolve_destination_from};
use super::format::{ExportMode, FileType};
use super::naming::{CurrentExecutable, ScriptIdentity, resolve_prefix};
use super::units::RenderOptions;
use crate::config::SaveConfig;
use crate::error::{PlotaidError, Result};
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

/// What to save.
#[derive(Debug)]
pub enum FigureSource<'a, P> {
    /// A plot object owned by the caller.
    Plot(&'a P),
    /// The backend's most recently produced plot.
    LastPlot,
    /// Whatever the active display surface currently shows.
    ActiveSurface,
}

impl<P> FigureSource<'_, P> {
    pub fn mode(&self) -> ExportMode {
        match self {
            Self::ActiveSurface => ExportMode::RasterCapture,
            Self::Plot(_) | Self::LastPlot => ExportMode::VectorExport,
        }
    }
}

/// A source after availability checks.
enum Target<'a, P> {
    Plot(&'a P),
    Surface(&'a dyn SurfaceCapture),
}

fn select_target<'a, B: PlotBackend>(
    backend: &'a B,
    source: FigureSource<'a, B::Plot>,
    file_type: FileType,
) -> Result<Target<'a, B::Plot>> {
    source.mode().check(file_type)?;
    match source {
        FigureSource::Plot(plot) => Ok(Target::Plot(plot)),
        FigureSource::LastPlot => backend
            .last_plot()
            .map(Target::Plot)
            .ok_or(PlotaidError::NoPlotAvailable),
        FigureSource::ActiveSurface => backend
            .active_surface()
            .map(Target::Surface)
            .ok_or(PlotaidError::NoActiveSurface),
    }
}

fn render_target<B: PlotBackend>(
    backend: &B,
    target: Target<'_, B::Plot>,
    destination: &Path,
    file_type: FileType,
    options: &RenderOptions,
) -> Result<()> {
    match target {
        Target::Plot(plot) => {
            let options = options.for_export()?;
            backend.export(plot, destination, file_type, &options)
        }
        Target::Surface(surface) => {
            let size = options.pixels()?;
            surface.capture(destination, file_type, size, options.dpi)
        }
    }
}

/// Renders `source` to an already resolved `destination`.
///
/// Plot sources go through the backend's exporter with physical units;
/// surface capture receives pixel dimensions.
///
/// # Errors
///
/// - [`PlotaidError::UnsupportedFormat`] when `file_type` is not allowed for
///   the source's export mode
/// - [`PlotaidError::NoPlotAvailable`] / [`PlotaidError::NoActiveSurface`]
/// - any error reported by the backend
pub fn write<B: PlotBackend>(
    backend: &B,
    destination: &Path,
    source: FigureSource<'_, B::Plot>,
    file_type: FileType,
    options: &RenderOptions,
) -> Result<PathBuf> {
    let target = select_target(backend, source, file_type)?;
    render_target(backend, target, destination, file_type, options)?;
    Ok(destination.to_path_buf())
}

/// Saves figures with script/plot/timestamp filenames and optional
/// latest/archive rotation.
#[derive(Debug, Clone)]
pub struct FigureWriter<S = CurrentExecutable> {
    config: SaveConfig,
    script: S,
}

impl FigureWriter {
    /// Writer whose automatic prefix comes from the running executable.
    pub fn new(config: SaveConfig) -> Self {
        Self {
            config,
            script: CurrentExecutable,
        }
    }
}

impl<S: ScriptIdentity> FigureWriter<S> {
    pub fn with_script(config: SaveConfig, script: S) -> Self {
        Self { config, script }
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    /// Saves `source` using the current local time for the timestamp.
    ///
    /// # Errors
    ///
    /// See [`FigureWriter::save_at`].
    pub fn save<B: PlotBackend>(
        &self,
        backend: &B,
        source: FigureSource<'_, B::Plot>,
        request: &SaveRequest,
    ) -> Result<FigureDestination> {
        self.save_at(backend, source, request, Local::now().naive_local())
    }

    /// Saves `source` as if the current time were `now`.
    ///
    /// The source and format are checked before anything on disk changes,
    /// so a missing plot never rotates the latest file away. Saving a file
    /// that already is the destination leaves it as it is (in preserve-latest
    /// mode it is still archived, by copy).
    ///
    /// # Errors
    ///
    /// Validation, format, availability, filesystem or backend errors. A
    /// failure after the rotation step leaves the archive as it is.
    pub fn save_at<B: PlotBackend>(
        &self,
        backend: &B,
        source: FigureSource<'_, B::Plot>,
        request: &SaveRequest,
        now: NaiveDateTime,
    ) -> Result<FigureDestination> {
        let save = request.resolve(&self.config);
        save.render.validate()?;
        let target = select_target(backend, source, save.file_type)?;

        let source = match &target {
            Target::Plot(plot) => backend.source_file(*plot),
            Target::Surface(_) => None,
        };

        let prefix = resolve_prefix(&save.prefix, &self.script)?;
        let (destination, in_place) =
            resolve_destination_from(&save, prefix.as_deref(), now, source)?;
        if in_place {
            tracing::info!("Figure {} is already in place", destination.path.display());
            return Ok(destination);
        }

        render_target(backend, target, &destination.path, save.file_type, &save.render)?;
        tracing::debug!(path = %destination.path.display(), "state: written");
        tracing::info!("Saved figure {}", destination.path.display());

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::destination::Rotation;
    use crate::figure::naming::{FixedScript, PrefixPolicy};
    use crate::figure::units::{PixelSize, Unit};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    /// Records what it was asked to render and writes the plot's label.
    #[derive(Default)]
    struct RecordingBackend {
        last: Option<String>,
        surface: Option<RecordingSurface>,
        exports: RefCell<Vec<(PathBuf, FileType, RenderOptions)>>,
    }

    #[derive(Default)]
    struct RecordingSurface {
        captures: RefCell<Vec<(FileType, PixelSize)>>,
    }

    impl SurfaceCapture for RecordingSurface {
        fn capture(&self, path: &Path, file_type: FileType, size: PixelSize, _dpi: f64) -> Result<()> {
            fs::write(path, b"surface")?;
            self.captures.borrow_mut().push((file_type, size));
            Ok(())
        }
    }

    impl PlotBackend for RecordingBackend {
        type Plot = String;

        fn export(&self, plot: &String, path: &Path, file_type: FileType, options: &RenderOptions) -> Result<()> {
            fs::write(path, plot.as_bytes())?;
            self.exports
                .borrow_mut()
                .push((path.to_path_buf(), file_type, options.clone()));
            Ok(())
        }

        fn last_plot(&self) -> Option<&String> {
            self.last.as_ref()
        }

        fn active_surface(&self) -> Option<&dyn SurfaceCapture> {
            self.surface.as_ref().map(|s| s as &dyn SurfaceCapture)
        }
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn writer(dir: &Path) -> FigureWriter<FixedScript> {
        FigureWriter::with_script(
            SaveConfig::default().with_save_dir(dir),
            FixedScript(Some(PathBuf::from("scripts/analysis.R"))),
        )
    }

    #[test]
    fn test_save_uses_script_prefix_and_timestamp() -> Result<()> {
        let dir = tempdir()?;
        let backend = RecordingBackend::default();
        let plot = "scatter plot".to_owned();

        let dest = writer(dir.path()).save_at(
            &backend,
            FigureSource::Plot(&plot),
            &SaveRequest::new("scatter"),
            day(5),
        )?;

        assert_eq!(dest.path, dir.path().join("analysis_scatter_240305.png"));
        assert_eq!(fs::read_to_string(&dest.path)?, "scatter plot");
        Ok(())
    }

    #[test]
    fn test_last_plot_fallback() -> Result<()> {
        let dir = tempdir()?;
        let backend = RecordingBackend {
            last: Some("previous".to_owned()),
            ..RecordingBackend::default()
        };
        let dest = writer(dir.path()).save_at(
            &backend,
            FigureSource::LastPlot,
            &SaveRequest::new("p").prefix(PrefixPolicy::Disabled),
            day(5),
        )?;
        assert_eq!(fs::read_to_string(dest.path)?, "previous");
        Ok(())
    }

    #[test]
    fn test_no_plot_available() {
        let dir = tempdir().unwrap();
        let err = writer(dir.path())
            .save_at(
                &RecordingBackend::default(),
                FigureSource::LastPlot,
                &SaveRequest::new("p"),
                day(5),
            )
            .unwrap_err();
        assert!(matches!(err, PlotaidError::NoPlotAvailable));
        // nothing created on disk
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_no_active_surface() {
        let dir = tempdir().unwrap();
        let err = writer(dir.path())
            .save_at(
                &RecordingBackend::default(),
                FigureSource::ActiveSurface,
                &SaveRequest::new("p"),
                day(5),
            )
            .unwrap_err();
        assert!(matches!(err, PlotaidError::NoActiveSurface));
    }

    #[test]
    fn test_capture_rejects_vector_only_format() {
        let dir = tempdir().unwrap();
        let backend = RecordingBackend {
            surface: Some(RecordingSurface::default()),
            ..RecordingBackend::default()
        };
        let err = writer(dir.path())
            .save_at(
                &backend,
                FigureSource::ActiveSurface,
                &SaveRequest::new("p").file_type(FileType::Eps),
                day(5),
            )
            .unwrap_err();
        assert!(matches!(err, PlotaidError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_capture_receives_pixels() -> Result<()> {
        let dir = tempdir()?;
        let backend = RecordingBackend {
            surface: Some(RecordingSurface::default()),
            ..RecordingBackend::default()
        };
        let options = RenderOptions::new(10.0, 5.0, Unit::Cm).with_dpi(254.0);
        writer(dir.path()).save_at(
            &backend,
            FigureSource::ActiveSurface,
            &SaveRequest::new("screen").render(options),
            day(5),
        )?;

        let surface = backend.surface.as_ref().unwrap();
        let captures = surface.captures.borrow();
        assert_eq!(
            captures.as_slice(),
            [(FileType::Png, PixelSize { width: 1000, height: 500 })]
        );
        Ok(())
    }

    #[test]
    fn test_export_receives_physical_units_and_extras() -> Result<()> {
        let dir = tempdir()?;
        let backend = RecordingBackend::default();
        let plot = "p".to_owned();
        let options = RenderOptions::new(900.0, 600.0, Unit::Px)
            .with_dpi(300.0)
            .with_extra("bg", "transparent");
        writer(dir.path()).save_at(
            &backend,
            FigureSource::Plot(&plot),
            &SaveRequest::new("p").file_type(FileType::Pdf).render(options),
            day(5),
        )?;

        let exports = backend.exports.borrow();
        let (path, file_type, sent) = exports.first().unwrap();
        assert_eq!(path.extension().unwrap(), "pdf");
        assert_eq!(*file_type, FileType::Pdf);
        assert_eq!(sent.unit, Unit::In);
        assert!((sent.width - 3.0).abs() < 1e-9);
        assert_eq!(sent.extra.get("bg").map(String::as_str), Some("transparent"));
        Ok(())
    }

    #[test]
    fn test_preserve_latest_rotation_end_to_end() -> Result<()> {
        let dir = tempdir()?;
        let backend = RecordingBackend::default();
        let w = writer(dir.path());
        let request = SaveRequest::new("scatter").preserve_latest(true);

        let first = "first".to_owned();
        let second = "second".to_owned();
        w.save_at(&backend, FigureSource::Plot(&first), &request, day(5))?;
        let dest = w.save_at(&backend, FigureSource::Plot(&second), &request, day(6))?;

        assert!(matches!(dest.rotation, Rotation::Archived(_)));
        let latest: Vec<_> = fs::read_dir(dir.path().join("latest"))?.collect();
        let archive: Vec<_> = fs::read_dir(dir.path().join("archive"))?.collect();
        assert_eq!(latest.len(), 1);
        assert_eq!(archive.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("latest/analysis_scatter.png"))?,
            "second"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("archive/analysis_scatter_240306.png"))?,
            "first"
        );
        Ok(())
    }

    #[test]
    fn test_three_saves_in_one_timestamp_bucket() -> Result<()> {
        let dir = tempdir()?;
        let backend = RecordingBackend::default();
        let w = writer(dir.path());
        let request = SaveRequest::new("scatter").preserve_latest(true);

        for label in ["one", "two", "three"] {
            let plot = label.to_owned();
            w.save_at(&backend, FigureSource::Plot(&plot), &request, day(5))?;
        }

        let archive: Vec<_> = fs::read_dir(dir.path().join("archive"))?.collect();
        assert_eq!(archive.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("archive/analysis_scatter_240305.png"))?,
            "one"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("latest/analysis_scatter.png"))?,
            "three"
        );
        Ok(())
    }

    #[test]
    fn test_write_to_explicit_destination() -> Result<()> {
        let dir = tempdir()?;
        let backend = RecordingBackend::default();
        let plot = "direct".to_owned();
        let target = dir.path().join("direct.svg");
        let written = write(
            &backend,
            &target,
            FigureSource::Plot(&plot),
            FileType::Svg,
            &RenderOptions::default(),
        )?;
        assert_eq!(written, target);
        assert_eq!(fs::read_to_string(target)?, "direct");
        Ok(())
    }
}
