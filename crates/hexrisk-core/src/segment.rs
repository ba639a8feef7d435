//! Road resampling: cut each polyline into pieces of a fixed path length.
//!
//! A line of length L at interval I yields `floor(L / I)` full pieces followed
//! by one trailing remainder piece `[n·I, L]`. The remainder is emitted even
//! when it is zero-length (L an exact multiple of I) so downstream consumers
//! see a consistent piece count. Lines shorter than I pass through unchanged.
//!
//! All cuts follow the vertex path, so curved roads keep their shape.

use geo::{Distance, Euclidean};
use geo_types::{Coord, Line, LineString, Point};

use crate::error::{ConfigError, Result};
use crate::layer::Layer;

/// Planar length of a single straight piece.
fn line_length(line: Line<f64>) -> f64 {
    Euclidean.distance(Point::from(line.start), Point::from(line.end))
}

/// Planar path length: sum of consecutive vertex distances.
pub fn path_length(line: &LineString<f64>) -> f64 {
    line.lines().map(line_length).sum()
}

/// Coordinate `along` units from `line.start`, clamped to the piece.
fn interpolate(line: Line<f64>, along: f64, len: f64) -> Coord<f64> {
    if len <= 0.0 {
        return line.start;
    }
    let along = along.clamp(0.0, len);
    Coord {
        x: line.start.x + (line.end.x - line.start.x) * along / len,
        y: line.start.y + (line.end.y - line.start.y) * along / len,
    }
}

fn push_distinct(coords: &mut Vec<Coord<f64>>, c: Coord<f64>) {
    if coords.last() != Some(&c) {
        coords.push(c);
    }
}

/// Portion of `line` between path distances `start` and `end`.
///
/// Distances are clamped to `[0, L]` and `end` is raised to `start` if it
/// falls below it. When both cut points coincide the result is a degenerate
/// two-vertex line at that position, so the output is always a valid
/// `LineString` with at least two coordinates.
pub fn substring(line: &LineString<f64>, start: f64, end: f64) -> LineString<f64> {
    let total = path_length(line);
    let start = start.clamp(0.0, total);
    let end = end.clamp(start, total);

    let mut coords: Vec<Coord<f64>> = Vec::new();
    let mut travelled = 0.0;

    for piece in line.lines() {
        let len = line_length(piece);
        let next = travelled + len;

        if coords.is_empty() {
            if next < start {
                travelled = next;
                continue;
            }
            coords.push(interpolate(piece, start - travelled, len));
        }

        if next >= end {
            push_distinct(&mut coords, interpolate(piece, end - travelled, len));
            break;
        }
        push_distinct(&mut coords, piece.end);
        travelled = next;
    }

    match coords.len() {
        0 => {
            let c = line.0.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
            LineString::new(vec![c, c])
        }
        1 => LineString::new(vec![coords[0], coords[0]]),
        _ => LineString::new(coords),
    }
}

/// Position `distance` units along the path, clamped to the line's extent.
pub fn point_along(line: &LineString<f64>, distance: f64) -> Option<Coord<f64>> {
    let first = *line.0.first()?;
    let mut travelled = 0.0;
    for piece in line.lines() {
        let len = line_length(piece);
        if travelled + len >= distance {
            return Some(interpolate(piece, distance - travelled, len));
        }
        travelled += len;
    }
    Some(line.0.last().copied().unwrap_or(first))
}

/// Point halfway along the path.
pub fn midpoint(line: &LineString<f64>) -> Option<Coord<f64>> {
    point_along(line, path_length(line) / 2.0)
}

/// Cut one line, appending its pieces to `out` in direction of travel.
fn segment_line_into(line: &LineString<f64>, interval: f64, out: &mut Vec<LineString<f64>>) {
    let length = path_length(line);
    if length < interval {
        out.push(line.clone());
        return;
    }

    let n = (length / interval).floor() as usize;
    for count in 1..=n {
        let from = interval * (count - 1) as f64;
        let to = interval * count as f64;
        out.push(substring(line, from, to));
    }
    out.push(substring(line, interval * n as f64, length));
}

/// Cut every line of `lines` into pieces no longer than `interval`.
///
/// Output preserves input order; the pieces of one input line are contiguous.
/// Degenerate lines are not an error. Fails only on a non-positive or
/// non-finite `interval`, before any line is touched.
pub fn segment(lines: &Layer<LineString<f64>>, interval: f64) -> Result<Layer<LineString<f64>>> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err(ConfigError::NonPositiveInterval(interval).into());
    }

    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        segment_line_into(line, interval, &mut out);
    }
    tracing::debug!(input = lines.len(), output = out.len(), interval, "segmented road network");
    Ok(Layer::new(lines.crs, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Crs;
    use approx::assert_relative_eq;
    use geo_types::line_string;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn layer(lines: Vec<LineString<f64>>) -> Layer<LineString<f64>> {
        Layer::new(Crs::BRITISH_NATIONAL_GRID, lines)
    }

    #[test]
    fn straight_line_cut_into_four_four_two() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)];
        let out = segment(&layer(vec![line]), 4.0).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out.features[0], line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0)]);
        assert_eq!(out.features[1], line_string![(x: 4.0, y: 0.0), (x: 8.0, y: 0.0)]);
        assert_eq!(out.features[2], line_string![(x: 8.0, y: 0.0), (x: 10.0, y: 0.0)]);
        let lengths: Vec<f64> = out.iter().map(path_length).collect();
        assert_eq!(lengths, vec![4.0, 4.0, 2.0]);
    }

    #[test]
    fn short_line_passes_through_unchanged() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 1.0)];
        let out = segment(&layer(vec![line.clone()]), 10.0).unwrap();
        assert_eq!(out.features, vec![line]);
    }

    #[test]
    fn zero_length_line_is_single_segment() {
        let line = line_string![(x: 3.0, y: 3.0), (x: 3.0, y: 3.0)];
        let out = segment(&layer(vec![line.clone()]), 1.0).unwrap();
        assert_eq!(out.features, vec![line]);
    }

    /// Exact multiple: two full pieces plus one zero-length remainder, no duplicate.
    #[test]
    fn exact_multiple_emits_single_zero_length_remainder() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 8.0, y: 0.0)];
        let out = segment(&layer(vec![line]), 4.0).unwrap();

        let lengths: Vec<f64> = out.iter().map(path_length).collect();
        assert_eq!(lengths, vec![4.0, 4.0, 0.0]);
        assert_eq!(out.features[2].0, vec![Coord { x: 8.0, y: 0.0 }, Coord { x: 8.0, y: 0.0 }]);
    }

    #[test]
    fn cuts_follow_the_vertex_path() {
        // L-shaped road: 6 east then 6 north.
        let line = line_string![(x: 0.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 6.0)];
        let out = segment(&layer(vec![line]), 4.0).unwrap();

        assert_eq!(out.len(), 4);
        // Second piece turns the corner.
        assert_eq!(
            out.features[1],
            line_string![(x: 4.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 2.0)]
        );
        assert_relative_eq!(path_length(&out.features[1]), 4.0, epsilon = 1e-12);
        assert_eq!(out.features[2], line_string![(x: 6.0, y: 2.0), (x: 6.0, y: 6.0)]);
        // 12 / 4 is exact, so the remainder is a zero-length piece at the end.
        assert_relative_eq!(path_length(&out.features[3]), 0.0);
    }

    #[test]
    fn pieces_of_each_line_stay_contiguous_and_ordered() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)];
        let b = line_string![(x: 0.0, y: 10.0), (x: 1.0, y: 10.0)];
        let out = segment(&layer(vec![a, b.clone()]), 2.0).unwrap();

        // a → [0,2], [2,4], [4,5]; b unchanged.
        assert_eq!(out.len(), 4);
        assert_eq!(out.features[0].0[0], Coord { x: 0.0, y: 0.0 });
        assert_eq!(out.features[2].0[1], Coord { x: 5.0, y: 0.0 });
        assert_eq!(out.features[3], b);
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)];
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = segment(&layer(vec![line.clone()]), bad).unwrap_err();
            assert!(err.is_config(), "interval {bad} should be a configuration error");
        }
    }

    /// Lengths sum to L and only the final remainder may differ from the interval.
    #[test]
    fn random_polylines_are_fully_covered() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let n_vertices = rng.gen_range(2..8);
            let coords: Vec<Coord<f64>> = (0..n_vertices)
                .map(|_| Coord { x: rng.gen_range(-50.0..50.0), y: rng.gen_range(-50.0..50.0) })
                .collect();
            let line = LineString::new(coords);
            let interval = rng.gen_range(0.5..40.0);
            let total = path_length(&line);

            let out = segment(&layer(vec![line]), interval).unwrap();
            let lengths: Vec<f64> = out.iter().map(path_length).collect();

            assert_relative_eq!(lengths.iter().sum::<f64>(), total, epsilon = 1e-6);
            if total >= interval {
                let (last, full) = lengths.split_last().unwrap();
                for &l in full {
                    assert_relative_eq!(l, interval, epsilon = 1e-6);
                }
                assert!(*last <= interval + 1e-6, "remainder {last} exceeds interval {interval}");
            } else {
                assert_eq!(lengths.len(), 1);
            }
        }
    }

    #[test]
    fn substring_clamps_and_degenerates() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)];
        let sub = substring(&line, -5.0, 3.0);
        assert_eq!(sub, line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 0.0)]);
        let sub = substring(&line, 7.0, 99.0);
        assert_eq!(sub, line_string![(x: 7.0, y: 0.0), (x: 10.0, y: 0.0)]);
        let point = substring(&line, 5.0, 5.0);
        assert_eq!(point.0, vec![Coord { x: 5.0, y: 0.0 }, Coord { x: 5.0, y: 0.0 }]);
    }

    #[test]
    fn midpoint_walks_the_path() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 6.0)];
        assert_eq!(midpoint(&line), Some(Coord { x: 6.0, y: 0.0 }));
        let straight = line_string![(x: 2.0, y: 2.0), (x: 2.0, y: 4.0)];
        assert_eq!(midpoint(&straight), Some(Coord { x: 2.0, y: 3.0 }));
    }
}
