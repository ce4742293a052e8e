//! Destination paths and latest/archive rotation.
//!
//! Layout produced under `save_dir`:
//!
//! ```text
//! <save_dir>/
//!   <prefix>_<plot>_<timestamp>.<ext>          preserve_latest = false
//!   latest/<prefix>_<plot>.<ext>               preserve_latest = true
//!   archive/<prefix>_<plot>_<timestamp>.<ext>  rotated-out versions
//! ```
//!
//! Rotation is not locked. Two processes saving the same plot identity in
//! preserve-latest mode at the same moment can both see no latest file and
//! one write replaces the other; callers that need more must serialize saves
//! per plot themselves.

use super::format::FileType;
use super::naming::{PrefixPolicy, base_name, validate_component};
use super::units::RenderOptions;
use crate::config::SaveConfig;
use crate::error::{PlotaidError, Result};
use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Per-call save arguments. `None` falls back to the injected config.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    pub plot_name: String,
    pub save_dir: Option<PathBuf>,
    pub file_type: Option<FileType>,
    pub prefix: Option<PrefixPolicy>,
    pub timestamp_format: Option<String>,
    pub preserve_latest: Option<bool>,
    pub latest_subdir: Option<String>,
    pub archive_subdir: Option<String>,
    pub render: Option<RenderOptions>,
}

impl SaveRequest {
    pub fn new(plot_name: impl Into<String>) -> Self {
        Self {
            plot_name: plot_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    #[must_use]
    pub fn prefix(mut self, policy: PrefixPolicy) -> Self {
        self.prefix = Some(policy);
        self
    }

    #[must_use]
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn preserve_latest(mut self, preserve: bool) -> Self {
        self.preserve_latest = Some(preserve);
        self
    }

    #[must_use]
    pub fn render(mut self, options: RenderOptions) -> Self {
        self.render = Some(options);
        self
    }

    /// Fills every unset argument from `config`.
    pub fn resolve(&self, config: &SaveConfig) -> ResolvedSave {
        ResolvedSave {
            plot_name: self.plot_name.clone(),
            save_dir: self.save_dir.clone().unwrap_or_else(|| config.save_dir.clone()),
            file_type: self.file_type.unwrap_or(config.file_type),
            prefix: self.prefix.clone().unwrap_or_else(|| config.prefix.clone()),
            timestamp_format: self
                .timestamp_format
                .clone()
                .unwrap_or_else(|| config.timestamp_format.clone()),
            preserve_latest: self.preserve_latest.unwrap_or(config.preserve_latest),
            latest_subdir: self
                .latest_subdir
                .clone()
                .unwrap_or_else(|| config.latest_subdir.clone()),
            archive_subdir: self
                .archive_subdir
                .clone()
                .unwrap_or_else(|| config.archive_subdir.clone()),
            render: self.render.clone().unwrap_or_else(|| config.render.clone()),
        }
    }
}

/// Save arguments after precedence has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSave {
    pub plot_name: String,
    pub save_dir: PathBuf,
    pub file_type: FileType,
    pub prefix: PrefixPolicy,
    pub timestamp_format: String,
    pub preserve_latest: bool,
    pub latest_subdir: String,
    pub archive_subdir: String,
    pub render: RenderOptions,
}

/// What happened to a previous latest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// Not in preserve-latest mode.
    NotApplicable,
    /// Preserve-latest mode, but there was no latest file yet.
    NoPreviousLatest,
    /// The previous latest file was moved here.
    Archived(PathBuf),
    /// An archive entry with this name already existed; left untouched and
    /// the latest file will be overwritten.
    ArchiveExists(PathBuf),
}

/// Output location for one save call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureDestination {
    /// Where the figure is written.
    pub path: PathBuf,
    /// Archive name for the previous latest file (preserve-latest only).
    pub archive_path: Option<PathBuf>,
    pub rotation: Rotation,
}

/// Formats `now`, rejecting patterns chrono cannot render and results that
/// would not be a single filename component.
fn format_timestamp(format: &str, now: NaiveDateTime) -> Result<String> {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(PlotaidError::Validation(format!(
            "Invalid timestamp format: {format:?}"
        )));
    }
    let stamp = now.format(format).to_string();
    validate_component("formatted timestamp", &stamp)?;
    Ok(stamp)
}

/// Computes the destination without touching the filesystem.
///
/// Given the same arguments and `now` this always returns the same path.
///
/// # Errors
///
/// Returns [`PlotaidError::Validation`] for unsafe name components or an
/// unusable timestamp format.
pub fn destination_path(
    save: &ResolvedSave,
    prefix: Option<&str>,
    now: NaiveDateTime,
) -> Result<FigureDestination> {
    validate_component("plot name", &save.plot_name)?;
    if let Some(prefix) = prefix {
        validate_component("prefix", prefix)?;
    }

    let base = base_name(prefix, &save.plot_name);
    let ext = save.file_type.extension();
    let stamp = format_timestamp(&save.timestamp_format, now)?;

    if !save.preserve_latest {
        return Ok(FigureDestination {
            path: save.save_dir.join(format!("{base}_{stamp}.{ext}")),
            archive_path: None,
            rotation: Rotation::NotApplicable,
        });
    }

    validate_component("latest directory", &save.latest_subdir)?;
    validate_component("archive directory", &save.archive_subdir)?;

    Ok(FigureDestination {
        path: save
            .save_dir
            .join(&save.latest_subdir)
            .join(format!("{base}.{ext}")),
        archive_path: Some(
            save.save_dir
                .join(&save.archive_subdir)
                .join(format!("{base}_{stamp}.{ext}")),
        ),
        rotation: Rotation::NoPreviousLatest,
    })
}

/// Creates `path` and any missing ancestors. Succeeds if it already exists.
///
/// # Errors
///
/// Returns [`PlotaidError::Filesystem`] when creation fails.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| PlotaidError::filesystem("create directory", path, e))
}

/// Moves a file, copying and removing when the rename crosses filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            fs::copy(from, to).map_err(|e| PlotaidError::filesystem("copy file to", to, e))?;
            fs::remove_file(from).map_err(|e| PlotaidError::filesystem("remove", from, e))
        }
        Err(e) => Err(PlotaidError::filesystem("move file to", to, e)),
    }
}

/// True when both paths exist and name the same file.
pub(crate) fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Moves the existing latest file into the archive unless an archive entry
/// with the same name is already there. With `keep_latest` the file is
/// copied and stays where it is.
fn rotate_latest(latest: &Path, archive: &Path, keep_latest: bool) -> Result<Rotation> {
    if !latest.exists() {
        return Ok(Rotation::NoPreviousLatest);
    }
    if archive.exists() {
        tracing::debug!(
            "Archive entry {} already exists, keeping it",
            archive.display()
        );
        return Ok(Rotation::ArchiveExists(archive.to_path_buf()));
    }
    if let Some(dir) = archive.parent() {
        ensure_directory(dir)?;
    }
    if keep_latest {
        fs::copy(latest, archive).map_err(|e| PlotaidError::filesystem("copy file to", archive, e))?;
    } else {
        move_file(latest, archive)?;
    }
    tracing::info!(
        "Archived previous figure {} -> {}",
        latest.display(),
        archive.display()
    );
    Ok(Rotation::Archived(archive.to_path_buf()))
}

/// Computes the destination, creates its directory and, in preserve-latest
/// mode, rotates the previous latest file into the archive.
///
/// The returned path is absolute. Nothing is rolled back if a later step
/// fails.
///
/// # Errors
///
/// Validation errors from [`destination_path`], or
/// [`PlotaidError::Filesystem`] when a directory cannot be created or the
/// rotation fails.
pub fn resolve_destination(
    save: &ResolvedSave,
    prefix: Option<&str>,
    now: NaiveDateTime,
) -> Result<FigureDestination> {
    resolve_destination_from(save, prefix, now, None).map(|(destination, _)| destination)
}

/// [`resolve_destination`] for a figure read from the file at `source`.
///
/// The flag is true when `source` already is the destination file. The
/// previous latest is then archived by copy and stays in place, and the
/// caller must not write over it.
pub(crate) fn resolve_destination_from(
    save: &ResolvedSave,
    prefix: Option<&str>,
    now: NaiveDateTime,
    source: Option<&Path>,
) -> Result<(FigureDestination, bool)> {
    let mut destination = destination_path(save, prefix, now)?;
    destination.path = std::path::absolute(&destination.path)
        .map_err(|e| PlotaidError::filesystem("resolve", &destination.path, e))?;

    if let Some(dir) = destination.path.parent() {
        ensure_directory(dir)?;
    }
    tracing::debug!(path = %destination.path.display(), "state: directory ensured");

    let in_place = source.is_some_and(|source| is_same_file(source, &destination.path));

    if let Some(archive) = destination.archive_path.take() {
        let archive = std::path::absolute(&archive)
            .map_err(|e| PlotaidError::filesystem("resolve", &archive, e))?;
        destination.rotation = rotate_latest(&destination.path, &archive, in_place)?;
        destination.archive_path = Some(archive);
    }
    tracing::debug!(rotation = ?destination.rotation, "state: rotation checked");

    Ok((destination, in_place))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn request(dir: &Path, preserve: bool) -> ResolvedSave {
        SaveRequest::new("scatter")
            .save_dir(dir)
            .prefix(PrefixPolicy::Explicit("analysis".to_owned()))
            .preserve_latest(preserve)
            .resolve(&SaveConfig::default())
    }

    #[test]
    fn test_dated_filename() {
        let save = request(Path::new("out"), false);
        let dest = destination_path(&save, Some("analysis"), at(2024, 3, 5, 9)).unwrap();
        assert_eq!(dest.path, PathBuf::from("out/analysis_scatter_240305.png"));
        assert_eq!(dest.rotation, Rotation::NotApplicable);
    }

    #[test]
    fn test_destination_is_deterministic() {
        let save = request(Path::new("out"), true);
        let now = at(2024, 3, 5, 9);
        assert_eq!(
            destination_path(&save, Some("analysis"), now).unwrap(),
            destination_path(&save, Some("analysis"), now).unwrap()
        );
    }

    #[test]
    fn test_latest_and_archive_paths() {
        let save = request(Path::new("out"), true);
        let dest = destination_path(&save, None, at(2024, 3, 5, 9)).unwrap();
        assert_eq!(dest.path, PathBuf::from("out/latest/scatter.png"));
        assert_eq!(
            dest.archive_path,
            Some(PathBuf::from("out/archive/scatter_240305.png"))
        );
    }

    #[test]
    fn test_request_overrides_config() {
        let config = SaveConfig::default()
            .with_save_dir("from-config")
            .with_file_type(FileType::Pdf);
        let save = SaveRequest::new("p").file_type(FileType::Svg).resolve(&config);
        assert_eq!(save.save_dir, PathBuf::from("from-config"));
        assert_eq!(save.file_type, FileType::Svg);
    }

    #[test]
    fn test_rejects_bad_timestamp_formats() {
        let now = at(2024, 3, 5, 9);
        let mut save = request(Path::new("out"), false);
        save.timestamp_format = "%Q".to_owned();
        assert!(matches!(
            destination_path(&save, None, now),
            Err(PlotaidError::Validation(_))
        ));
        // %D renders as 03/05/24
        save.timestamp_format = "%D".to_owned();
        assert!(destination_path(&save, None, now).is_err());
    }

    #[test]
    fn test_rejects_traversal_in_plot_name() {
        let mut save = request(Path::new("out"), false);
        save.plot_name = "../../etc/passwd".to_owned();
        let err = destination_path(&save, None, at(2024, 3, 5, 9)).unwrap_err();
        assert!(err.to_string().contains("plot name"));
    }

    #[test]
    fn test_ensure_directory_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("a").join("b").join("c");
        ensure_directory(&nested)?;
        ensure_directory(&nested)?;
        assert!(nested.is_dir());
        Ok(())
    }

    #[test]
    fn test_rotation_moves_previous_latest() -> Result<()> {
        let dir = tempdir()?;
        let save = request(dir.path(), true);

        let first = resolve_destination(&save, None, at(2024, 3, 5, 9))?;
        assert_eq!(first.rotation, Rotation::NoPreviousLatest);
        fs::write(&first.path, b"version one")?;

        let second = resolve_destination(&save, None, at(2024, 3, 6, 9))?;
        let archived = dir.path().join("archive").join("scatter_240306.png");
        assert_eq!(second.rotation, Rotation::Archived(std::path::absolute(&archived)?));
        assert_eq!(fs::read(&archived)?, b"version one");
        assert!(!second.path.exists());
        Ok(())
    }

    #[test]
    fn test_rotation_keeps_existing_archive_entry() -> Result<()> {
        let dir = tempdir()?;
        let save = request(dir.path(), true);
        let now = at(2024, 3, 5, 9);

        let dest = resolve_destination(&save, None, now)?;
        fs::write(&dest.path, b"one")?;
        let dest = resolve_destination(&save, None, now)?;
        assert!(matches!(dest.rotation, Rotation::Archived(_)));
        fs::write(&dest.path, b"two")?;

        let dest = resolve_destination(&save, None, now)?;
        assert!(matches!(dest.rotation, Rotation::ArchiveExists(_)));
        // latest untouched until the writer overwrites it
        assert_eq!(fs::read(&dest.path)?, b"two");
        let archived = dir.path().join("archive").join("scatter_240305.png");
        assert_eq!(fs::read(archived)?, b"one");
        Ok(())
    }

    #[test]
    fn test_rotation_copies_when_source_is_latest() -> Result<()> {
        let dir = tempdir()?;
        let save = request(dir.path(), true);

        let first = resolve_destination(&save, None, at(2024, 3, 5, 9))?;
        fs::write(&first.path, b"current")?;

        let (second, in_place) =
            resolve_destination_from(&save, None, at(2024, 3, 6, 9), Some(&first.path))?;
        assert!(in_place);
        assert!(matches!(second.rotation, Rotation::Archived(_)));
        assert_eq!(fs::read(&second.path)?, b"current");
        let archived = dir.path().join("archive").join("scatter_240306.png");
        assert_eq!(fs::read(archived)?, b"current");
        Ok(())
    }

    #[test]
    fn test_same_file_needs_both_paths_to_exist() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("a.png");
        fs::write(&file, b"x")?;
        assert!(is_same_file(&file, &dir.path().join(".").join("a.png")));
        assert!(!is_same_file(&file, &dir.path().join("b.png")));
        Ok(())
    }
}
