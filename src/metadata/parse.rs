//! Converting a tabular description of metadata (one row per target column)
//! into [`MetadataRecords`].

use super::record::{DESCRIPTION, MetadataRecord, MetadataRecords};
use crate::error::{PlotaidError, Result, ResultExt as _};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Key field used when a table is passed straight to
/// [`set_metadata`](super::set_metadata).
pub const DEFAULT_KEY_FIELD: &str = "Column";

/// Cells read from CSV that count as missing.
const MISSING_CELLS: &[&str] = &["", "NA"];

/// Rows of named cells. A `None` cell is present-but-missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl MetadataTable {
    /// # Errors
    ///
    /// Returns [`PlotaidError::Validation`] on duplicate column names.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(PlotaidError::Validation(format!(
                "Duplicate column in metadata table: {dup}"
            )));
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// # Errors
    ///
    /// Returns [`PlotaidError::Validation`] when the row width differs from
    /// the header.
    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PlotaidError::Validation(format!(
                "Metadata row has {} cells, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Convenience for literal tables; empty strings become missing cells.
    #[must_use]
    pub fn with_row(mut self, row: &[&str]) -> Self {
        let cells = row
            .iter()
            .map(|c| (!c.is_empty()).then(|| (*c).to_owned()))
            .collect();
        if let Err(e) = self.push_row(cells) {
            tracing::warn!("Dropping metadata row: {e}");
        }
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// # Errors
    ///
    /// Fails on malformed CSV, ragged rows or duplicate headers.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut table = Self::new(rdr.headers()?.iter())?;
        for record in rdr.records() {
            let record = record?;
            let cells = record
                .iter()
                .map(|c| (!MISSING_CELLS.contains(&c)).then(|| c.to_owned()))
                .collect();
            table.push_row(cells)?;
        }
        Ok(table)
    }

    /// # Errors
    ///
    /// Fails if the file cannot be opened or parsed.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open metadata table {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("Failed to read metadata table {}", path.display()))
    }
}

/// Turns `table` into records keyed by the values of `key_field`.
///
/// The value of `description_field` is stored under `Description`, which
/// is always part of each record. `fields` are deduplicated and may not
/// repeat the key. Missing cells come back as `None` rather than being
/// dropped.
///
/// # Errors
///
/// [`PlotaidError::Validation`] if `key_field`, `description_field` or a
/// requested field is not a table column, or a row has no key value.
pub fn parse_metadata(
    table: &MetadataTable,
    key_field: &str,
    description_field: &str,
    fields: &[&str],
) -> Result<MetadataRecords> {
    let require = |name: &str| {
        table.column_index(name).ok_or_else(|| {
            PlotaidError::Validation(format!("Metadata table has no column named '{name}'"))
        })
    };

    let key_idx = require(key_field)?;
    let mut projection = vec![(DESCRIPTION.to_owned(), require(description_field)?)];
    for &field in fields {
        if field == key_field || field == description_field || field == DESCRIPTION {
            continue;
        }
        if projection.iter().any(|(name, _)| name == field) {
            continue;
        }
        projection.push((field.to_owned(), require(field)?));
    }

    let mut records = MetadataRecords::new();
    for (row_no, row) in table.rows().iter().enumerate() {
        let key = row[key_idx].as_deref().ok_or_else(|| {
            PlotaidError::Validation(format!(
                "Metadata row {} has no value in key field '{key_field}'",
                row_no + 1
            ))
        })?;
        let record: MetadataRecord = projection
            .iter()
            .map(|(name, idx)| (name.as_str(), row[*idx].clone()))
            .collect();
        records.insert(key, record);
    }
    Ok(records)
}

/// Every table column except the key, in table order.
pub(crate) fn all_fields<'a>(table: &'a MetadataTable, key_field: &str) -> Vec<&'a str> {
    table
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| *c != key_field)
        .collect()
}
