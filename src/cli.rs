use anyhow::{Context as _, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use plotaid::config::SaveConfig;
use plotaid::dataset::Dataset;
use plotaid::figure::{
    FigureDestination, FigureSource, FigureWriter, FileCopyBackend, FileType, FixedScript,
    PrefixPolicy, RenderedFile, Rotation, SaveRequest, destination_path, resolve_prefix,
};
use plotaid::metadata::{
    MetadataTable, apply_sidecar, parse_metadata, render_markdown, render_summary, render_text,
    save_sidecar, set_metadata, sidecar_path_for,
};
use plotaid::viewer::render_interactive_view;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "plotaid",
    version,
    about = "Column metadata annotations and versioned figure saving"
)]
pub struct Cli {
    /// JSON file with figure-saving defaults
    #[arg(long, global = true, env = "PLOTAID_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and edit column metadata of a CSV dataset
    #[command(subcommand)]
    Meta(MetaCommand),
    /// File rendered figures under versioned names
    #[command(subcommand)]
    Figure(FigureCommand),
}

#[derive(Subcommand)]
pub enum MetaCommand {
    /// Print the metadata summary table
    Show {
        /// Dataset CSV file
        data: PathBuf,

        /// Fields to show, comma separated. Defaults to every field in use.
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Metadata sidecar. Defaults to `<data stem>.meta.json`.
        #[arg(long)]
        sidecar: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Attach metadata from a CSV table with one row per column
    Set {
        /// Dataset CSV file
        data: PathBuf,

        /// Metadata table CSV
        #[arg(long = "from")]
        table: PathBuf,

        /// Table column naming the target dataset column
        #[arg(long, default_value = "Column")]
        key: String,

        /// Table column holding the description
        #[arg(long, default_value = "Description")]
        description: String,

        /// Metadata sidecar. Defaults to `<data stem>.meta.json`.
        #[arg(long)]
        sidecar: Option<PathBuf>,
    },
    /// Open the interactive summary viewer
    View {
        /// Dataset CSV file
        data: PathBuf,

        /// Metadata sidecar. Defaults to `<data stem>.meta.json`.
        #[arg(long)]
        sidecar: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Subcommand)]
pub enum FigureCommand {
    /// Copy a rendered figure to its versioned destination
    Save {
        /// Rendered figure file. Its extension determines the format.
        file: PathBuf,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Print where a figure would be saved, without touching the disk
    Path {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Plot name used in the filename
    #[arg(short, long)]
    pub name: String,

    /// Save directory
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output format (png, jpeg, tiff, bmp, svg, pdf, eps, ps, tex)
    #[arg(short = 't', long = "type")]
    pub file_type: Option<FileType>,

    /// Explicit filename prefix
    #[arg(long, conflicts_with = "no_prefix")]
    pub prefix: Option<String>,

    /// Omit the filename prefix
    #[arg(long)]
    pub no_prefix: bool,

    /// Script whose name becomes the automatic prefix
    #[arg(long, env = "PLOTAID_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Keep a dateless copy under `latest/` and archive the previous one
    #[arg(long)]
    pub preserve_latest: bool,

    /// strftime pattern for the timestamp
    #[arg(long)]
    pub timestamp_format: Option<String>,
}

impl TargetArgs {
    fn request(&self, default_type: Option<FileType>) -> SaveRequest {
        let mut request = SaveRequest::new(&self.name);
        if let Some(dir) = &self.dir {
            request = request.save_dir(dir);
        }
        if let Some(file_type) = self.file_type.or(default_type) {
            request = request.file_type(file_type);
        }
        if self.no_prefix {
            request = request.prefix(PrefixPolicy::Disabled);
        } else if let Some(prefix) = &self.prefix {
            request = request.prefix(PrefixPolicy::Explicit(prefix.clone()));
        }
        if self.preserve_latest {
            request = request.preserve_latest(true);
        }
        if let Some(format) = &self.timestamp_format {
            request = request.timestamp_format(format);
        }
        request
    }

    fn script(&self) -> FixedScript {
        FixedScript(self.script.clone())
    }
}

pub fn run_command(cli: Cli) -> Result<()> {
    let config = SaveConfig::load_or_default(cli.config.as_deref())?;
    match cli.command {
        Commands::Meta(MetaCommand::Show {
            data,
            fields,
            sidecar,
            format,
        }) => handle_show(&data, &fields, sidecar, format),
        Commands::Meta(MetaCommand::Set {
            data,
            table,
            key,
            description,
            sidecar,
        }) => handle_set(&data, &table, &key, &description, sidecar),
        Commands::Meta(MetaCommand::View { data, sidecar }) => handle_view(&data, sidecar),
        Commands::Figure(FigureCommand::Save { file, target }) => {
            handle_figure_save(config, &file, &target)
        }
        Commands::Figure(FigureCommand::Path { target }) => handle_figure_path(&config, &target),
    }
}

/// Loads a dataset and restores its sidecar metadata, if any.
fn load_annotated(data: &Path, sidecar: Option<PathBuf>) -> Result<(Dataset, PathBuf)> {
    let mut dataset = Dataset::from_csv_path(data)?;
    let sidecar = sidecar.unwrap_or_else(|| sidecar_path_for(data));
    if let Some(report) = apply_sidecar(&mut dataset, &sidecar)?
        && !report.skipped.is_empty()
    {
        tracing::warn!(
            "Sidecar {} names columns missing from {}: {}",
            sidecar.display(),
            data.display(),
            report.skipped.join(", ")
        );
    }
    Ok((dataset, sidecar))
}

fn handle_show(
    data: &Path,
    fields: &[String],
    sidecar: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let (dataset, _) = load_annotated(data, sidecar)?;
    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    let table = render_summary(&dataset, (!fields.is_empty()).then_some(fields.as_slice()));

    match format {
        OutputFormat::Text => print!("{}", render_text(&table)),
        OutputFormat::Markdown => print!("{}", render_markdown(&table)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&table).context("Failed to serialize summary")?
        ),
    }
    Ok(())
}

fn handle_set(
    data: &Path,
    table_path: &Path,
    key: &str,
    description: &str,
    sidecar: Option<PathBuf>,
) -> Result<()> {
    let (mut dataset, sidecar) = load_annotated(data, sidecar)?;
    let table = MetadataTable::from_csv_path(table_path)?;
    let fields: Vec<&str> = table
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| *c != key && *c != description)
        .collect();
    let records = parse_metadata(&table, key, description, &fields)?;

    // Nothing is written unless every row is accepted.
    let report = set_metadata(&mut dataset, records)?;
    save_sidecar(&dataset, &sidecar)?;

    println!(
        "Updated {} column(s) in {}",
        report.applied.len(),
        sidecar.display()
    );
    if !report.skipped.is_empty() {
        println!("Skipped unknown column(s): {}", report.skipped.join(", "));
    }
    Ok(())
}

fn handle_view(data: &Path, sidecar: Option<PathBuf>) -> Result<()> {
    let (dataset, _) = load_annotated(data, sidecar)?;
    let title = data
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plotaid".to_owned());
    render_interactive_view(&title, render_summary(&dataset, None))
}

fn handle_figure_save(config: SaveConfig, file: &Path, target: &TargetArgs) -> Result<()> {
    let plot = RenderedFile::open(file)?;
    let request = target.request(Some(plot.file_type));
    let writer = FigureWriter::with_script(config, target.script());

    let saved = writer.save(&FileCopyBackend::new(), FigureSource::Plot(&plot), &request)?;
    report_destination(&saved);
    Ok(())
}

fn handle_figure_path(config: &SaveConfig, target: &TargetArgs) -> Result<()> {
    let save = target.request(None).resolve(config);
    let prefix = resolve_prefix(&save.prefix, &target.script())?;
    let destination = destination_path(&save, prefix.as_deref(), Local::now().naive_local())?;
    println!("{}", destination.path.display());
    if let Some(archive) = &destination.archive_path {
        println!("previous latest would be archived to {}", archive.display());
    }
    Ok(())
}

fn report_destination(destination: &FigureDestination) {
    println!("{}", destination.path.display());
    match &destination.rotation {
        Rotation::Archived(archive) => println!("archived previous latest to {}", archive.display()),
        Rotation::ArchiveExists(archive) => println!(
            "archive entry {} already exists, previous latest overwritten",
            archive.display()
        ),
        Rotation::NotApplicable | Rotation::NoPreviousLatest => {}
    }
}
