//! JSON sidecar persistence for column metadata.
//!
//! A dataset `data/cars.csv` keeps its metadata in `data/cars.meta.json`
//! unless a path is given explicitly.

use super::record::{ColumnMetadata, MetadataRecord, MetadataRecords};
use super::store::{SetMetadataReport, set_metadata_unchecked};
use crate::dataset::Dataset;
use crate::error::{PlotaidError, Result, ResultExt as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix replacing the dataset's extension.
pub const SIDECAR_SUFFIX: &str = "meta.json";

const SIDECAR_VERSION: u32 = 1;

/// On-disk form of a dataset's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sidecar {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    /// Column name to fields, in dataset column order. Columns without any
    /// metadata are omitted.
    pub columns: Vec<SidecarColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarColumn {
    pub name: String,
    pub metadata: ColumnMetadata,
}

impl Sidecar {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let columns = dataset
            .columns()
            .iter()
            .filter(|c| !c.metadata().is_empty())
            .map(|c| SidecarColumn {
                name: c.name().to_owned(),
                metadata: c.metadata().clone(),
            })
            .collect();
        Self {
            version: SIDECAR_VERSION,
            saved_at: Utc::now(),
            columns,
        }
    }

    fn into_records(self) -> MetadataRecords {
        self.columns
            .into_iter()
            .map(|c| {
                let record: MetadataRecord = c
                    .metadata
                    .iter()
                    .map(|(k, v)| (k, Some(v.to_owned())))
                    .collect();
                (c.name, record)
            })
            .collect()
    }
}

/// `<dir>/<stem>.meta.json` for a dataset at `<dir>/<stem>.<ext>`.
pub fn sidecar_path_for(dataset_path: &Path) -> PathBuf {
    let stem = dataset_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dataset_path.with_file_name(format!("{stem}.{SIDECAR_SUFFIX}"))
}

/// Writes the dataset's metadata to `path` as pretty JSON.
///
/// # Errors
///
/// Serialization or filesystem failures.
pub fn save_sidecar(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| PlotaidError::filesystem("create directory", parent, e))?;
    }
    let json = serde_json::to_string_pretty(&Sidecar::from_dataset(dataset))
        .context("Failed to serialize column metadata")?;
    fs::write(path, json).map_err(|e| PlotaidError::filesystem("write sidecar", path, e))?;
    tracing::info!("Saved column metadata to {}", path.display());
    Ok(())
}

/// # Errors
///
/// Missing file, unreadable JSON or an unsupported sidecar version.
pub fn load_sidecar(path: &Path) -> Result<Sidecar> {
    let json = fs::read_to_string(path)
        .map_err(|e| PlotaidError::filesystem("read sidecar", path, e))?;
    let sidecar: Sidecar = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse metadata sidecar {}", path.display()))?;
    if sidecar.version > SIDECAR_VERSION {
        return Err(PlotaidError::Validation(format!(
            "Sidecar {} has version {}, newest supported is {SIDECAR_VERSION}",
            path.display(),
            sidecar.version
        )));
    }
    Ok(sidecar)
}

/// Restores metadata from `path` onto `dataset`. Columns the dataset lacks
/// are warned about and skipped. Returns `None` when there is no sidecar.
///
/// # Errors
///
/// Same as [`load_sidecar`] for an existing file.
pub fn apply_sidecar(dataset: &mut Dataset, path: &Path) -> Result<Option<SetMetadataReport>> {
    if !path.exists() {
        tracing::debug!("No metadata sidecar at {}", path.display());
        return Ok(None);
    }
    let records = load_sidecar(path)?.into_records();
    Ok(Some(set_metadata_unchecked(dataset, records)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ValueClass};
    use crate::metadata::record::{DESCRIPTION, UNIT};
    use tempfile::tempdir;

    fn dataset() -> Dataset {
        let mut mpg = Column::new("mpg", ValueClass::Numeric);
        mpg.metadata_mut().set(DESCRIPTION, "Miles per gallon");
        mpg.metadata_mut().set(UNIT, "mi/gal");
        let cyl = Column::new("cyl", ValueClass::Integer);
        Dataset::from_columns(vec![mpg, cyl]).unwrap()
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path_for(Path::new("data/cars.csv")),
            Path::new("data/cars.meta.json")
        );
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("cars.meta.json");
        save_sidecar(&dataset(), &path)?;

        let sidecar = load_sidecar(&path)?;
        assert_eq!(sidecar.columns.len(), 1);

        let mut fresh = Dataset::from_columns(vec![
            Column::new("mpg", ValueClass::Numeric),
            Column::new("cyl", ValueClass::Integer),
        ])?;
        let report = apply_sidecar(&mut fresh, &path)?.unwrap();
        assert_eq!(report.applied, ["mpg"]);
        assert_eq!(fresh, dataset());
        Ok(())
    }

    #[test]
    fn test_unknown_columns_skipped() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cars.meta.json");
        save_sidecar(&dataset(), &path)?;

        let mut other = Dataset::from_columns(vec![Column::new("hp", ValueClass::Integer)])?;
        let report = apply_sidecar(&mut other, &path)?.unwrap();
        assert_eq!(report.skipped, ["mpg"]);
        assert!(other.column("hp").unwrap().metadata().is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_sidecar() -> Result<()> {
        let dir = tempdir()?;
        let mut ds = dataset();
        assert!(apply_sidecar(&mut ds, &dir.path().join("none.meta.json"))?.is_none());
        Ok(())
    }
}
