/// Road segmenter: cuts every line of a GeoJSON road network into pieces of a
/// fixed path length.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use hexrisk_core::io::{lines_to_collection, read_lines, write_collection};
use hexrisk_core::segment::path_length;
use hexrisk_core::{segment, Crs};

#[derive(Parser, Debug)]
#[command(name = "segmenter", about = "Split road lines into fixed-length segments")]
struct Args {
    /// Input GeoJSON of LineString / MultiLineString features, planar metres.
    #[arg(short, long)]
    input: PathBuf,

    /// Segment length in metres.
    #[arg(long, default_value_t = 50.0)]
    interval: f64,

    /// Output GeoJSON path.
    #[arg(short, long, default_value = "segments.geojson")]
    output: PathBuf,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let lines = read_lines(&args.input, Crs::BRITISH_NATIONAL_GRID)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let pieces = segment(&lines, args.interval)?;

    let total: f64 = lines.iter().map(path_length).sum();
    tracing::info!(lines = lines.len(), segments = pieces.len(), total_length = total, "segmented");

    write_collection(&args.output, lines_to_collection(&pieces))
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "{}",
        json!({
            "lines": lines.len(),
            "segments": pieces.len(),
            "total_length": total,
            "output": args.output.display().to_string(),
        })
    );
    Ok(())
}
