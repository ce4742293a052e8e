//! Tabular summary of a dataset's column metadata, plus Markdown and plain
//! text renderings of it.

use super::record::DEFAULT_FIELDS;
use crate::dataset::{Dataset, ValueClass};
use serde::Serialize;

pub const COLUMN_HEADER: &str = "Column";
pub const CLASS_HEADER: &str = "Class";

/// One line of the summary: a dataset column and its field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub column: String,
    pub class: ValueClass,
    /// Aligned with [`SummaryTable::fields`].
    pub values: Vec<Option<String>>,
}

impl SummaryRow {
    /// Cell text for header position `index` (0 = Column, 1 = Class).
    pub fn cell(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.column),
            1 => Some(self.class.as_str()),
            i => self.values.get(i - 2).and_then(|v| v.as_deref()),
        }
    }
}

/// `Column, Class, field1, field2, ...` with one row per dataset column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryTable {
    pub header: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Metadata field names, i.e. the header without Column and Class.
    pub fn fields(&self) -> &[String] {
        &self.header[2..]
    }

    pub fn row(&self, column: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.column == column)
    }

    /// Value of `field` for `column`; `None` if either is unknown or unset.
    pub fn value(&self, column: &str, field: &str) -> Option<&str> {
        let idx = self.fields().iter().position(|f| f == field)?;
        self.row(column)?.values.get(idx)?.as_deref()
    }
}

/// Every field name attached to any column: the default fields first (in
/// their canonical order, only if present), then the rest in the order
/// they are first seen scanning columns left to right.
pub fn discover_fields(dataset: &Dataset) -> Vec<String> {
    let mut seen: Vec<&str> = Vec::new();
    for column in dataset.columns() {
        for key in column.metadata().keys() {
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
    }

    let defaults = DEFAULT_FIELDS
        .iter()
        .filter(|f| seen.contains(*f))
        .map(|f| (*f).to_owned());
    let extras = seen
        .iter()
        .filter(|f| !DEFAULT_FIELDS.contains(*f))
        .map(|f| (*f).to_owned());
    defaults.chain(extras).collect()
}

/// Projects the dataset's metadata into a [`SummaryTable`]. With `fields`
/// unset the field list is [`discover_fields`]. Never mutates.
pub fn render_summary(dataset: &Dataset, fields: Option<&[&str]>) -> SummaryTable {
    let fields: Vec<String> = match fields {
        Some(f) => f.iter().map(|s| (*s).to_owned()).collect(),
        None => discover_fields(dataset),
    };

    let rows = dataset
        .columns()
        .iter()
        .map(|col| SummaryRow {
            column: col.name().to_owned(),
            class: col.class(),
            values: fields
                .iter()
                .map(|f| col.metadata().get(f).map(str::to_owned))
                .collect(),
        })
        .collect();

    let mut header = vec![COLUMN_HEADER.to_owned(), CLASS_HEADER.to_owned()];
    header.extend(fields);
    SummaryTable { header, rows }
}

/// Renders the summary as a GitHub-flavoured Markdown table.
pub fn render_markdown(table: &SummaryTable) -> String {
    let mut md = String::new();
    md.push_str(&markdown_line(table.header.iter().map(String::as_str)));
    md.push_str(&markdown_line(table.header.iter().map(|_| "---")));
    for row in &table.rows {
        let cells = (0..table.header.len()).map(|i| row.cell(i).unwrap_or(""));
        md.push_str(&markdown_line(cells));
    }
    md
}

fn markdown_line<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let escaped: Vec<String> = cells
        .map(|c| c.replace('|', "\\|").replace('\n', " "))
        .collect();
    format!("| {} |\n", escaped.join(" | "))
}

/// Fixed-width plain text, for terminals. Missing values print as `NA`.
pub fn render_text(table: &SummaryTable) -> String {
    let width = table.header.len();
    let cell = |row: &SummaryRow, i: usize| row.cell(i).unwrap_or("NA").replace('\n', " ");

    let mut widths: Vec<usize> = table.header.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, w) in widths.iter_mut().enumerate() {
            *w = (*w).max(cell(row, i).chars().count());
        }
    }

    let line = |cells: Vec<String>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(table.header.clone());
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in &table.rows {
        out.push_str(&line((0..width).map(|i| cell(row, i)).collect()));
    }
    out
}
