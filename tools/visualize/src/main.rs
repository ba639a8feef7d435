//! Diagnostic risk map: renders classified points or road segments to a PNG.
//! Not part of the main pipeline.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use geojson::Value;

use hexrisk_core::io::read_collection;
use hexrisk_core::Risk;

#[derive(Parser, Debug)]
#[command(name = "visualize", about = "Render a classified GeoJSON layer to a PNG risk map")]
struct Args {
    /// Classified points or segments GeoJSON (needs a `risk` property).
    #[arg(short, long)]
    input: PathBuf,

    /// Output PNG path.
    #[arg(short, long, default_value = "risk_map.png")]
    output: PathBuf,

    /// Image width and height in pixels.
    #[arg(short, long, default_value_t = 1024)]
    size: u32,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

// ── Colour helpers ────────────────────────────────────────────────────────────

fn risk_color(risk: Risk) -> image::Rgb<u8> {
    match risk {
        Risk::High    => image::Rgb([200,  30,  30]), // red
        Risk::Medium  => image::Rgb([240, 140,   0]), // orange
        Risk::Low     => image::Rgb([240, 220,  60]), // yellow
        Risk::VeryLow => image::Rgb([ 70, 160,  70]), // green
        Risk::Unknown => image::Rgb([150, 150, 150]), // grey
    }
}

// ── Raster mapping ────────────────────────────────────────────────────────────

/// Planar bounds → pixel grid, preserving aspect ratio with a 2% margin.
struct Frame {
    min_x: f64,
    max_y: f64,
    scale: f64,
    size: u32,
}

impl Frame {
    fn fit(points: &[[f64; 2]], size: u32) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first[0], first[1], first[0], first[1]);
        for p in points {
            min_x = min_x.min(p[0]);
            max_x = max_x.max(p[0]);
            min_y = min_y.min(p[1]);
            max_y = max_y.max(p[1]);
        }
        let span = (max_x - min_x).max(max_y - min_y).max(1.0) * 1.04;
        let pad = span * 0.02;
        Some(Self { min_x: min_x - pad, max_y: max_y + pad, scale: size as f64 / span, size })
    }

    fn pixel(&self, p: [f64; 2]) -> (i64, i64) {
        (
            ((p[0] - self.min_x) * self.scale) as i64,
            ((self.max_y - p[1]) * self.scale) as i64,
        )
    }
}

fn plot(img: &mut image::RgbImage, x: i64, y: i64, color: image::Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn dot(img: &mut image::RgbImage, (cx, cy): (i64, i64), color: image::Rgb<u8>) {
    for dy in -2..=2 {
        for dx in -2..=2 {
            if dx * dx + dy * dy <= 4 {
                plot(img, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham segment.
fn stroke(img: &mut image::RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: image::Rgb<u8>) {
    let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
    let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    loop {
        plot(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

enum Shape {
    Dot([f64; 2]),
    Path(Vec<[f64; 2]>),
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let fc = read_collection(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    let xy = |p: &Vec<f64>| [p.first().copied().unwrap_or(0.0), p.get(1).copied().unwrap_or(0.0)];
    let mut shapes: Vec<(Shape, Risk)> = Vec::with_capacity(fc.features.len());
    for feature in &fc.features {
        let risk = feature
            .property("risk")
            .and_then(|v| v.as_str())
            .map(Risk::from_label)
            .unwrap_or(Risk::Unknown);
        match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(p)) => shapes.push((Shape::Dot(xy(p)), risk)),
            Some(Value::LineString(ps)) => shapes.push((Shape::Path(ps.iter().map(xy).collect()), risk)),
            Some(Value::MultiLineString(parts)) => {
                for ps in parts {
                    shapes.push((Shape::Path(ps.iter().map(xy).collect()), risk));
                }
            }
            _ => tracing::debug!("skipping feature without point or line geometry"),
        }
    }

    let all: Vec<[f64; 2]> = shapes
        .iter()
        .flat_map(|(s, _)| match s {
            Shape::Dot(p) => vec![*p],
            Shape::Path(ps) => ps.clone(),
        })
        .collect();
    let Some(frame) = Frame::fit(&all, args.size) else {
        bail!("{} has no drawable features", args.input.display());
    };

    let mut img = image::RgbImage::from_pixel(frame.size, frame.size, image::Rgb([255, 255, 255]));
    for (shape, risk) in &shapes {
        let color = risk_color(*risk);
        match shape {
            Shape::Dot(p) => dot(&mut img, frame.pixel(*p), color),
            Shape::Path(ps) => {
                for pair in ps.windows(2) {
                    stroke(&mut img, frame.pixel(pair[0]), frame.pixel(pair[1]), color);
                }
            }
        }
    }

    img.save(&args.output).with_context(|| format!("writing {}", args.output.display()))?;
    tracing::info!(features = shapes.len(), path = %args.output.display(), "wrote risk map");
    Ok(())
}
