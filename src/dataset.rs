//! Minimal tabular dataset: ordered, named columns that each own their
//! metadata record.

use crate::error::{PlotaidError, Result, ResultExt as _};
use crate::metadata::ColumnMetadata;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Cell values treated as missing when inferring a column's class.
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "null", "NULL"];

/// Value type of a column as shown in the summary's Class column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueClass {
    Integer,
    Numeric,
    Logical,
    Date,
    Character,
    /// Every cell is missing.
    Empty,
}

impl ValueClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Numeric => "numeric",
            Self::Logical => "logical",
            Self::Date => "date",
            Self::Character => "character",
            Self::Empty => "empty",
        }
    }

    /// Narrowest class that fits every non-missing value.
    pub fn infer<S: AsRef<str>>(values: &[S]) -> Self {
        let present: Vec<&str> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !MISSING_TOKENS.contains(v))
            .collect();

        if present.is_empty() {
            return Self::Empty;
        }
        if present.iter().all(|v| v.parse::<i64>().is_ok()) {
            Self::Integer
        } else if present.iter().all(|v| v.parse::<f64>().is_ok()) {
            Self::Numeric
        } else if present.iter().all(|v| is_logical(v)) {
            Self::Logical
        } else if present
            .iter()
            .all(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok())
        {
            Self::Date
        } else {
            Self::Character
        }
    }
}

fn is_logical(value: &str) -> bool {
    matches!(
        value,
        "TRUE" | "FALSE" | "True" | "False" | "true" | "false" | "T" | "F"
    )
}

impl fmt::Display for ValueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named column. The metadata record lives as long as the column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    class: ValueClass,
    values: Vec<String>,
    metadata: ColumnMetadata,
}

impl Column {
    pub fn new(name: impl Into<String>, class: ValueClass) -> Self {
        Self {
            name: name.into(),
            class,
            values: Vec::new(),
            metadata: ColumnMetadata::default(),
        }
    }

    /// Builds a column from raw cells, inferring its class.
    pub fn from_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            class: ValueClass::infer(&values),
            values,
            metadata: ColumnMetadata::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> ValueClass {
        self.class
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn metadata(&self) -> &ColumnMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ColumnMetadata {
        &mut self.metadata
    }
}

/// Ordered collection of uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`PlotaidError::Validation`] if two columns share a name.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut dataset = Self::new();
        for column in columns {
            dataset.push(column)?;
        }
        Ok(dataset)
    }

    /// Appends a column.
    ///
    /// # Errors
    ///
    /// Returns [`PlotaidError::Validation`] if the name is already taken.
    pub fn push(&mut self, column: Column) -> Result<()> {
        if self.column(column.name()).is_some() {
            return Err(PlotaidError::Validation(format!(
                "Duplicate column name: {}",
                column.name()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of data rows (the longest column).
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Column::len).max().unwrap_or(0)
    }

    /// Reads a CSV with a header row. Classes are inferred per column.
    ///
    /// # Errors
    ///
    /// Fails on malformed CSV, ragged rows or duplicate header names.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
        let mut seen = HashSet::new();
        for name in &headers {
            if !seen.insert(name.as_str()) {
                return Err(PlotaidError::Validation(format!(
                    "Duplicate column name in CSV header: {name}"
                )));
            }
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (column, value) in cells.iter_mut().zip(record.iter()) {
                column.push(value.to_owned());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::from_values(name, values))
            .collect();
        Self::from_columns(columns)
    }

    /// # Errors
    ///
    /// Fails if the file cannot be opened or parsed.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open dataset {}", path.display()))?;
        let dataset = Self::from_csv_reader(file)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        tracing::debug!(
            "Loaded {} columns x {} rows from {}",
            dataset.len(),
            dataset.row_count(),
            path.display()
        );
        Ok(dataset)
    }
}
