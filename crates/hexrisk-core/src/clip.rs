//! Study-area clipping.
//!
//! The study area is a circular buffer around a geodetic centre, built in the
//! planar frame. Points are kept when inside or on its boundary; lines are cut
//! at the boundary and only the inside pieces are kept.

use std::f64::consts::TAU;

use geo::{BooleanOps, Intersects};
use geo_types::{Coord, LineString, MultiLineString, Point, Polygon};

use crate::coords::LatLon;
use crate::error::{ConfigError, Result};
use crate::layer::{Layer, ReferencePoint, Site};
use crate::projection::Projection;

/// Vertices used to approximate the buffer circle.
pub const CIRCLE_SEGMENTS: usize = 64;

/// Anything with a planar position.
pub trait Located {
    fn location(&self) -> Coord<f64>;
}

impl Located for Site {
    fn location(&self) -> Coord<f64> {
        self.position
    }
}

impl Located for ReferencePoint {
    fn location(&self) -> Coord<f64> {
        self.position()
    }
}

/// Regular polygon of [`CIRCLE_SEGMENTS`] vertices on a circle.
pub fn circle(center: Coord<f64>, radius: f64) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let theta = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
            Coord { x: center.x + radius * theta.cos(), y: center.y + radius * theta.sin() }
        })
        .collect();
    // Polygon::new closes the ring.
    Polygon::new(LineString::new(ring), Vec::new())
}

/// Circle of `distance` planar units around the projected `center`.
pub fn study_area<P: Projection + ?Sized>(projection: &P, center: LatLon, distance: f64) -> Result<Polygon<f64>> {
    if !(distance.is_finite() && distance > 0.0) {
        return Err(ConfigError::NonPositiveClipDistance(distance).into());
    }
    let origin = projection.to_planar(center)?;
    Ok(circle(origin, distance))
}

/// Keep the features lying inside or on the boundary of `area`.
pub fn clip_points<T: Located + Clone>(layer: &Layer<T>, area: &Polygon<f64>) -> Layer<T> {
    let kept: Vec<T> = layer
        .iter()
        .filter(|f| area.intersects(&Point::from(f.location())))
        .cloned()
        .collect();
    tracing::debug!(before = layer.len(), after = kept.len(), "clipped points to study area");
    Layer::new(layer.crs, kept)
}

/// Cut every line at the boundary of `area`, keeping the inside pieces.
///
/// A line crossing the boundary several times yields several pieces, in the
/// order the clipper reports them.
pub fn clip_lines(layer: &Layer<LineString<f64>>, area: &Polygon<f64>) -> Layer<LineString<f64>> {
    let mut kept = Vec::new();
    for line in layer {
        let clipped = area.clip(&MultiLineString::new(vec![line.clone()]), false);
        kept.extend(clipped.into_iter().filter(|piece| piece.0.len() >= 2));
    }
    tracing::debug!(before = layer.len(), after = kept.len(), "clipped lines to study area");
    Layer::new(layer.crs, kept)
}
