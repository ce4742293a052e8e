//! Column metadata: descriptive fields (Description, Unit, Symbol and any
//! others) attached to the columns of a [`Dataset`](crate::dataset::Dataset).
//!
//! ## Core Concepts
//!
//! - **Record**: field name to value for one column. Reads report unset
//!   fields as `None`; writes merge field by field and never clear.
//! - **Metadata table**: one row per target column, keyed by a column-name
//!   field. Converted to records by [`parse_metadata`].
//! - **Summary**: `Column, Class, field...` projection of a dataset, shown
//!   as text, Markdown or in the interactive viewer.
//! - **Sidecar**: JSON file next to the dataset holding its metadata.
//!
//! ## Usage
//!
//! ```no_run
//! use plotaid::dataset::Dataset;
//! use plotaid::metadata::{MetadataTable, render_markdown, render_summary, set_metadata};
//! use std::path::Path;
//!
//! # fn example() -> plotaid::error::Result<()> {
//! let mut cars = Dataset::from_csv_path(Path::new("mtcars.csv"))?;
//! let table = MetadataTable::new(["Column", "Description", "Unit"])?
//!     .with_row(&["mpg", "Miles per gallon", "mi/gal"])
//!     .with_row(&["wt", "Weight", "1000 lbs"]);
//! set_metadata(&mut cars, table)?;
//!
//! println!("{}", render_markdown(&render_summary(&cars, None)));
//! # Ok(())
//! # }
//! ```

pub mod parse;
pub mod record;
pub mod storage;
pub mod store;
pub mod summary;

pub use parse::{DEFAULT_KEY_FIELD, MetadataTable, parse_metadata};
pub use record::{
    ColumnMetadata, DEFAULT_FIELDS, DESCRIPTION, MetadataRecord, MetadataRecords, SYMBOL, UNIT,
};
pub use storage::{Sidecar, apply_sidecar, load_sidecar, save_sidecar, sidecar_path_for};
pub use store::{MetadataInput, SetMetadataReport, get_metadata, set_metadata};
pub use summary::{
    SummaryRow, SummaryTable, discover_fields, render_markdown, render_summary, render_text,
};
