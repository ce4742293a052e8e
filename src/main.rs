//! # Plotaid Command Line
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize logging (console + rolling files)
//!   └─> Run the command
//!         ├─> meta show | set | view
//!         └─> figure save | path
//! ```
//!
//! ```bash
//! plotaid meta set data/mtcars.csv --from data/mtcars_meta.csv
//! plotaid meta show data/mtcars.csv --format markdown
//! plotaid figure save tmp/scatter.png --name scatter --dir out --preserve-latest
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Command output goes to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG overrides the -v derived level.
    plotaid::logging::init(cli.verbose)?;

    cli::run_command(cli)
}
