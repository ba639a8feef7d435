/// k-nearest-neighbour risk classifier: labels every query point with the
/// majority risk of its nearest reference points.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use hexrisk_core::config::ClassifyConfig;
use hexrisk_core::io::{classified_to_collection, read_references, read_sites, write_collection};
use hexrisk_core::pipeline::risk_histogram;
use hexrisk_core::{classify, Crs};

#[derive(Parser, Debug)]
#[command(name = "classifier", about = "Assign risk bands to query points by k-nearest-neighbour vote")]
struct Args {
    /// Query points GeoJSON, planar metres.
    #[arg(short, long)]
    queries: PathBuf,

    /// Reference points GeoJSON with a `risk` or `prob_4band` property.
    #[arg(short, long)]
    references: PathBuf,

    /// Neighbours per vote.
    #[arg(short, default_value_t = 5)]
    k: usize,

    /// Half-width of the square search window, metres.
    #[arg(short, long, default_value_t = 500.0)]
    window: f64,

    /// Grow the window by this factor while fewer than k references are found.
    #[arg(long)]
    expand_factor: Option<f64>,

    /// Largest window the growth may reach. Defaults to 8 × window.
    #[arg(long, requires = "expand_factor")]
    max_window: Option<f64>,

    /// Output GeoJSON path.
    #[arg(short, long, default_value = "classified.geojson")]
    output: PathBuf,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let params = ClassifyConfig {
        k: args.k,
        window: args.window,
        expand_factor: args.expand_factor,
        max_window: args.max_window,
    }
    .params();

    let crs = Crs::BRITISH_NATIONAL_GRID;
    let queries = read_sites(&args.queries, crs)
        .with_context(|| format!("reading queries {}", args.queries.display()))?;
    let references = read_references(&args.references, crs)
        .with_context(|| format!("reading references {}", args.references.display()))?;

    let result = classify(&queries, &references, params)?;
    write_collection(&args.output, classified_to_collection(&result.layer))
        .with_context(|| format!("writing {}", args.output.display()))?;
    tracing::info!(queries = queries.len(), path = %args.output.display(), "wrote classification");

    let by_risk: serde_json::Map<String, serde_json::Value> = risk_histogram(&result.layer)
        .into_iter()
        .map(|(risk, n)| (risk.label().to_string(), json!(n)))
        .collect();
    println!(
        "{}",
        json!({
            "queries": queries.len(),
            "references": references.len(),
            "degraded": result.degraded,
            "empty": result.empty,
            "by_risk": by_risk,
        })
    );
    Ok(())
}
