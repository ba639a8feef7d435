/// Hex sampling-grid builder: one point per H3 cell in a disk around a centre,
/// projected to British National Grid and written as GeoJSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use hexrisk_core::config::LatticeConfig;
use hexrisk_core::io::{sites_to_collection, write_collection};
use hexrisk_core::{build_lattice, BritishNationalGrid, LatLon, H3};

#[derive(Parser, Debug)]
#[command(name = "lattice", about = "Build a hex-lattice sampling grid around a WGS84 centre")]
struct Args {
    /// Centre latitude, WGS84 degrees.
    #[arg(long)]
    lat: f64,

    /// Centre longitude, WGS84 degrees.
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// H3 resolution, 0 (coarsest) to 15.
    #[arg(long, default_value_t = 9)]
    resolution: u8,

    /// Number of rings around the centre cell.
    #[arg(long, default_value_t = 10, allow_hyphen_values = true)]
    radius: i64,

    /// Output GeoJSON path.
    #[arg(short, long, default_value = "lattice.geojson")]
    output: PathBuf,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let config = LatticeConfig { resolution: args.resolution, radius: args.radius };
    let rings = config.rings().context("invalid lattice parameters")?;

    let center = LatLon::new(args.lat, args.lon);
    let grid = build_lattice(&H3, &BritishNationalGrid, center, config.resolution, rings)
        .with_context(|| format!("building lattice around ({}, {})", args.lat, args.lon))?;

    write_collection(&args.output, sites_to_collection(&grid))
        .with_context(|| format!("writing {}", args.output.display()))?;
    tracing::info!(cells = grid.len(), path = %args.output.display(), "wrote lattice");

    println!(
        "{}",
        json!({ "cells": grid.len(), "crs": grid.crs.to_string(), "output": args.output.display().to_string() })
    );
    Ok(())
}
