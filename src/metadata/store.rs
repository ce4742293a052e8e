use super::parse::{DEFAULT_KEY_FIELD, MetadataTable, all_fields, parse_metadata};
use super::record::{DESCRIPTION, MetadataRecords};
use crate::dataset::Dataset;
use crate::error::{PlotaidError, Result};

/// Input accepted by [`set_metadata`].
#[derive(Debug, Clone)]
pub enum MetadataInput {
    /// Records keyed by target column.
    Records(MetadataRecords),
    /// A table with a `Column` key and a `Description` column. Every other
    /// table column becomes a field.
    Table(MetadataTable),
}

impl From<MetadataRecords> for MetadataInput {
    fn from(records: MetadataRecords) -> Self {
        Self::Records(records)
    }
}

impl From<MetadataTable> for MetadataInput {
    fn from(table: MetadataTable) -> Self {
        Self::Table(table)
    }
}

impl MetadataInput {
    fn into_records(self) -> Result<MetadataRecords> {
        match self {
            Self::Records(records) => Ok(records),
            Self::Table(table) => {
                let fields = all_fields(&table, DEFAULT_KEY_FIELD);
                parse_metadata(&table, DEFAULT_KEY_FIELD, DESCRIPTION, &fields)
            }
        }
    }
}

/// What a successful [`set_metadata`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetMetadataReport {
    /// Columns whose metadata was merged, in input order.
    pub applied: Vec<String>,
    /// Target columns not present in the dataset.
    pub skipped: Vec<String>,
}

/// Reads `fields` from every column, in column order.
///
/// The result has one record per column and exactly `fields` in each,
/// with unset fields as `None`.
pub fn get_metadata(dataset: &Dataset, fields: &[&str]) -> MetadataRecords {
    dataset
        .columns()
        .iter()
        .map(|col| (col.name(), col.metadata().project(fields)))
        .collect()
}

/// Merges metadata records into the dataset's columns.
///
/// Each record must carry a non-blank Description. Records for columns the
/// dataset lacks are logged and skipped. Present values overwrite, missing
/// values leave existing fields alone, so applying the same input twice is
/// a no-op the second time.
///
/// # Errors
///
/// [`PlotaidError::Validation`] if a table cannot be converted, or if some
/// records lack a Description. In the latter case every other record has
/// already been applied and the error names the rejected columns.
pub fn set_metadata(
    dataset: &mut Dataset,
    input: impl Into<MetadataInput>,
) -> Result<SetMetadataReport> {
    let records = input.into().into_records()?;
    let (report, rejected) = merge_records(dataset, records, true);

    if !rejected.is_empty() {
        return Err(PlotaidError::Validation(format!(
            "Metadata for column(s) {} has no Description",
            rejected.join(", ")
        )));
    }
    Ok(report)
}

/// Like [`set_metadata`] but accepts records without a Description. Used
/// when restoring metadata that was already attached once.
pub(crate) fn set_metadata_unchecked(
    dataset: &mut Dataset,
    records: MetadataRecords,
) -> SetMetadataReport {
    merge_records(dataset, records, false).0
}

fn merge_records(
    dataset: &mut Dataset,
    records: MetadataRecords,
    require_description: bool,
) -> (SetMetadataReport, Vec<String>) {
    let mut report = SetMetadataReport::default();
    let mut rejected = Vec::new();

    for (column_name, record) in records {
        let Some(column) = dataset.column_mut(&column_name) else {
            tracing::warn!("Column '{column_name}' not found in dataset; skipping its metadata");
            report.skipped.push(column_name);
            continue;
        };
        if require_description && record.description().is_none() {
            rejected.push(column_name);
            continue;
        }
        column.metadata_mut().merge(&record);
        report.applied.push(column_name);
    }

    tracing::debug!(
        "Applied metadata to {} column(s), skipped {}, rejected {}",
        report.applied.len(),
        report.skipped.len(),
        rejected.len()
    );
    (report, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ValueClass};
    use crate::metadata::record::{DEFAULT_FIELDS, MetadataRecord, SYMBOL, UNIT};

    fn mtcars() -> Dataset {
        Dataset::from_columns(vec![
            Column::new("mpg", ValueClass::Numeric),
            Column::new("cyl", ValueClass::Integer),
            Column::new("wt", ValueClass::Numeric),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_metadata_shape() {
        let ds = mtcars();
        let records = get_metadata(&ds, DEFAULT_FIELDS);
        assert_eq!(records.column_names().collect::<Vec<_>>(), ["mpg", "cyl", "wt"]);
        for (_, record) in records.iter() {
            assert_eq!(record.field_names().collect::<Vec<_>>(), DEFAULT_FIELDS);
            assert!(record.iter().all(|(_, v)| v.is_none()));
        }
    }

    #[test]
    fn test_set_then_get() -> Result<()> {
        let mut ds = mtcars();
        let records = MetadataRecords::new().with(
            "mpg",
            MetadataRecord::new()
                .with(DESCRIPTION, "Miles per gallon")
                .with(UNIT, "mi/gal"),
        );
        let report = set_metadata(&mut ds, records)?;
        assert_eq!(report.applied, ["mpg"]);

        let out = get_metadata(&ds, DEFAULT_FIELDS);
        let mpg = out.get("mpg").unwrap();
        assert_eq!(mpg.get(DESCRIPTION), Some("Miles per gallon"));
        assert_eq!(mpg.get(UNIT), Some("mi/gal"));
        assert_eq!(mpg.get(SYMBOL), None);
        assert_eq!(out.get("cyl").unwrap().get(DESCRIPTION), None);
        Ok(())
    }

    #[test]
    fn test_set_is_idempotent() -> Result<()> {
        let records = MetadataRecords::new()
            .with("wt", MetadataRecord::new().with(DESCRIPTION, "Weight").with(SYMBOL, "w"));
        let mut once = mtcars();
        set_metadata(&mut once, records.clone())?;
        let mut twice = once.clone();
        set_metadata(&mut twice, records)?;
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn test_unknown_column_skipped() -> Result<()> {
        let mut ds = mtcars();
        let records = MetadataRecords::new()
            .with("hp", MetadataRecord::new().with(DESCRIPTION, "Horsepower"))
            .with("cyl", MetadataRecord::new().with(DESCRIPTION, "Cylinders"));
        let report = set_metadata(&mut ds, records)?;
        assert_eq!(report.skipped, ["hp"]);
        assert_eq!(report.applied, ["cyl"]);
        assert!(ds.column("hp").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_description_names_column() {
        let mut ds = mtcars();
        let records = MetadataRecords::new()
            .with("mpg", MetadataRecord::new().with(UNIT, "mi/gal"))
            .with("wt", MetadataRecord::new().with(DESCRIPTION, "Weight"));
        let err = set_metadata(&mut ds, records).unwrap_err();
        assert!(matches!(err, PlotaidError::Validation(_)));
        assert!(err.to_string().contains("mpg"));
        assert!(!err.to_string().contains("wt"));

        // Valid rows stay applied; the rejected one is untouched.
        assert_eq!(ds.column("wt").unwrap().metadata().get(DESCRIPTION), Some("Weight"));
        assert!(ds.column("mpg").unwrap().metadata().is_empty());
    }

    #[test]
    fn test_table_input_uses_column_key() -> Result<()> {
        let table = MetadataTable::new(["Column", "Description", "Unit"])?
            .with_row(&["mpg", "Miles per gallon", "mi/gal"])
            .with_row(&["cyl", "Number of cylinders", ""]);
        let mut ds = mtcars();
        set_metadata(&mut ds, table)?;
        let cyl = ds.column("cyl").unwrap().metadata();
        assert_eq!(cyl.get(DESCRIPTION), Some("Number of cylinders"));
        assert_eq!(cyl.get(UNIT), None);
        Ok(())
    }
}
