//! # Plotaid - Column Metadata and Versioned Figures
//!
//! Plotaid is a helper library for plotting workflows. It does two things:
//! it attaches descriptive metadata (description, unit, symbol and any
//! other fields) to the columns of a table, and it saves figures under
//! predictable, versioned filenames.
//!
//! ## Quick Start
//!
//! ```no_run
//! use plotaid::dataset::Dataset;
//! use plotaid::metadata::{MetadataRecord, MetadataRecords, render_summary, render_text, set_metadata};
//! use std::path::Path;
//!
//! # fn example() -> plotaid::error::Result<()> {
//! let mut cars = Dataset::from_csv_path(Path::new("mtcars.csv"))?;
//! let records = MetadataRecords::new().with(
//!     "mpg",
//!     MetadataRecord::new()
//!         .with("Description", "Miles per gallon")
//!         .with("Unit", "mi/gal"),
//! );
//! set_metadata(&mut cars, records)?;
//! print!("{}", render_text(&render_summary(&cars, None)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`dataset`]: Named columns loaded from CSV, each owning its metadata
//! - [`metadata`]: Get, set, parse and summarize column metadata
//!   - [`metadata::storage`]: JSON sidecar files
//! - [`viewer`]: Interactive summary window (egui)
//! - [`figure`]: Filename policy, latest/archive rotation and export
//! - [`config`]: Figure-saving defaults loaded from JSON
//! - [`error`]: Error types and handling utilities
//! - [`logging`]: Console and rolling file logs for the binary
//!
//! ## Figure Filenames
//!
//! A figure named `scatter` produced by `analysis.rs` on 5 March 2024 is
//! saved as `<save_dir>/analysis_scatter_240305.png`. With preserve-latest
//! enabled it goes to `<save_dir>/latest/analysis_scatter.png` instead, and
//! the file it replaces moves to `<save_dir>/archive/analysis_scatter_240305.png`.

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod figure;
pub mod logging;
pub mod metadata;
pub mod viewer;
