/// Command-line front end for RVB1 export and inspection
use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{stdout, BufReader, Write};
use std::path::PathBuf;
use tracing::info;

use rvb_core::{export_scene, load_scene, ExportSummary, RvbReader};

pub mod config;
pub mod logging;
pub mod report;

pub use config::ExportConfig;

#[derive(Debug, Parser)]
#[command(version, about = "Write meshes as RVB1 raw vertex buffers")]
pub enum Cli {
    /// Export the active object of an .obj or .stl file to an .rvb file.
    Export(ExportArgs),

    /// Print the header and leading records of an .rvb file.
    Inspect(InspectArgs),
}

#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// Input mesh (.obj or .stl)
    pub input: PathBuf,

    /// Output .rvb file
    pub output: PathBuf,

    /// Object to export (defaults to the first object in the file)
    #[arg(long)]
    pub object: Option<String>,

    /// Export polygons as they are instead of triangulating first
    #[arg(long)]
    pub no_triangulate: bool,

    /// Keep the source Z-up axes
    #[arg(long)]
    pub no_y_up: bool,

    /// TOML file with export settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct InspectArgs {
    /// The .rvb file
    pub file: PathBuf,

    /// Number of records to print
    #[arg(long, default_value_t = 3)]
    pub records: usize,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli {
        Cli::Export(args) => export(&args).map(|_| ()),
        Cli::Inspect(args) => inspect(&args),
    }
}

pub fn export(args: &ExportArgs) -> anyhow::Result<ExportSummary> {
    let config = match &args.config {
        Some(path) => ExportConfig::load(path)?,
        None => ExportConfig::default(),
    }
    .with_overrides(args.object.as_deref(), args.no_triangulate, args.no_y_up);

    let mut scene = load_scene(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    info!(
        "loaded {} object(s) from {}",
        scene.objects.len(),
        args.input.display()
    );
    if let Some(name) = &config.object {
        scene.set_active(name);
    }

    let summary = export_scene(&scene, &args.output, &config.options)
        .with_context(|| format!("exporting to {}", args.output.display()))?;
    report::print_summary(&mut stdout(), &summary, &args.output)?;
    Ok(summary)
}

pub fn inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let f = File::open(&args.file).with_context(|| format!("opening {}", args.file.display()))?;
    let reader = RvbReader::new(BufReader::new(f))
        .with_context(|| format!("reading header of {}", args.file.display()))?;

    let mut out = stdout();
    report::print_header(&mut out, reader.header())?;
    let total = reader.header().vertex_count as usize;
    for (index, record) in reader.take(args.records).enumerate() {
        report::print_record(&mut out, index, &record?)?;
    }
    if total > args.records {
        writeln!(out, "       ... {} more", total - args.records)?;
    }
    out.flush()?;
    Ok(())
}
