//! 在参考标签质心所在的切片上统计各标签的面积、体积与强度, 写出 CSV.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ct_areas::consts::DEFAULT_SLICE_AXIS;
use ct_areas::prelude::*;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    /// One row per (label, metric)
    Long,
    /// One row per label
    Wide,
}

impl From<FormatArg> for Format {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Long => Format::Long,
            FormatArg::Wide => Format::Wide,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "areas-at-label")]
#[command(about = "Per-label area, volume and intensity statistics on the slice through a label centroid")]
struct Cli {
    /// Intensity image
    #[arg(short, long)]
    input: PathBuf,

    /// Segmentation to measure (defaults to the reference image)
    #[arg(short, long)]
    segmentation: Option<PathBuf>,

    /// Reference label image used to locate the slice
    #[arg(short, long)]
    reference: PathBuf,

    /// Labels to measure, in output order
    #[arg(short, long, required = true, num_args = 1.., action = clap::ArgAction::Append)]
    labels: Vec<LabelId>,

    /// Reference label whose centroid selects the slice
    #[arg(short, long)]
    centroid: LabelId,

    /// Output CSV file (".gz" suffix writes gzip)
    #[arg(short, long)]
    output: PathBuf,

    /// Axis along which the slice is taken (0 = x, 1 = y, 2 = z)
    #[arg(short, long, default_value_t = DEFAULT_SLICE_AXIS as u8, value_parser = clap::value_parser!(u8).range(0..=2))]
    dimension: u8,

    /// One free-form string, or "subject session"
    #[arg(short, long, required = true, num_args = 1..=2)]
    metadata: Vec<String>,

    /// Table layout
    #[arg(short, long, value_enum, default_value_t = FormatArg::Long)]
    format: FormatArg,

    /// Only report shape metrics; the intensity image is not read
    #[arg(long)]
    shape_only: bool,

    /// Log progress and print the table
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    SimpleLogger::new().with_level(level).env().init()?;

    let job = SliceStatsJob {
        axis: SliceAxis::try_from(cli.dimension as usize)?,
        metadata: cli.metadata,
        input: cli.input,
        segmentation: cli.segmentation,
        reference: cli.reference,
        labels: cli.labels,
        centroid: cli.centroid,
        format: cli.format.into(),
        metrics: if cli.shape_only {
            MetricSet::Shape
        } else {
            MetricSet::ShapeAndIntensity
        },
    };

    let output = match job.run() {
        Ok(output) => output,
        Err(e @ Error::CentroidLabelNotFound(_)) => {
            println!("{e}");
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e.into()),
    };

    if cli.verbose {
        println!("{}", output.table);
    }

    output
        .table
        .save(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    log::info!("Wrote {}", cli.output.display());

    Ok(ExitCode::SUCCESS)
}
