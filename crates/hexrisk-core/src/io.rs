//! GeoJSON reading and writing.
//!
//! Geometries are taken as planar coordinates in whatever frame the caller
//! tags the layer with; a GeoJSON `crs` member is ignored.
//!
//! Recognised properties:
//! - sites: `id`, falling back to `gridid`, falling back to feature position
//! - references: `risk` (alias `prob_4band`) and optional `score`
//! - classified output: `id`, `risk`, `risk_ordinal`, `support`, `voters`

use std::path::Path;

use geo_types::{Coord, LineString, Point};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use serde_json::json;

use crate::coords::Crs;
use crate::error::{HexriskError, Result};
use crate::layer::{ClassifiedSite, Layer, ReferencePoint, Site};
use crate::risk::Risk;

// ── Reading ──────────────────────────────────────────────────────────────────

/// Parse GeoJSON text into a feature collection.
pub fn parse_collection(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

pub fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path)?;
    parse_collection(&text)
}

fn invalid(index: usize, reason: impl Into<String>) -> HexriskError {
    HexriskError::InvalidFeature { index, reason: reason.into() }
}

fn position(index: usize, pos: &[f64]) -> Result<Coord<f64>> {
    match pos {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(invalid(index, "position needs at least two components")),
    }
}

fn point_of(index: usize, feature: &Feature) -> Result<Coord<f64>> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(pos)) => position(index, pos),
        Some(_) => Err(invalid(index, "expected a Point geometry")),
        None => Err(invalid(index, "missing geometry")),
    }
}

/// Non-negative integer id, accepting integral floats such as `3.0`.
fn integral_id(value: &JsonValue) -> Option<usize> {
    if let Some(id) = value.as_u64() {
        return Some(id as usize);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
        .map(|f| f as usize)
}

/// Id from the first present of `id`, `gridid`; feature position otherwise.
/// A present id that is not a non-negative integer is an error.
fn site_id(index: usize, feature: &Feature) -> Result<usize> {
    for key in ["id", "gridid"] {
        match feature.property(key) {
            None | Some(JsonValue::Null) => continue,
            Some(value) => {
                return integral_id(value)
                    .ok_or_else(|| invalid(index, format!("`{key}` is not a non-negative integer: {value}")));
            }
        }
    }
    Ok(index)
}

fn risk_of(feature: &Feature) -> Risk {
    ["risk", "prob_4band"]
        .iter()
        .find_map(|key| feature.property(key).and_then(JsonValue::as_str))
        .map(Risk::from_label)
        .unwrap_or(Risk::Unknown)
}

/// Point features as unlabeled sites.
pub fn sites_from_collection(fc: &FeatureCollection, crs: Crs) -> Result<Layer<Site>> {
    let mut sites = Vec::with_capacity(fc.features.len());
    for (index, feature) in fc.features.iter().enumerate() {
        let at = point_of(index, feature)?;
        sites.push(Site::new(site_id(index, feature)?, at.x, at.y));
    }
    Ok(Layer::new(crs, sites))
}

/// Point features carrying a risk band.
pub fn references_from_collection(fc: &FeatureCollection, crs: Crs) -> Result<Layer<ReferencePoint>> {
    let mut refs = Vec::with_capacity(fc.features.len());
    for (index, feature) in fc.features.iter().enumerate() {
        let at = point_of(index, feature)?;
        let score = feature.property("score").and_then(JsonValue::as_f64);
        refs.push(Site::new(site_id(index, feature)?, at.x, at.y).with_risk(risk_of(feature), score));
    }
    Ok(Layer::new(crs, refs))
}

fn line_from(index: usize, positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    if positions.len() < 2 {
        return Err(invalid(index, "line needs at least two positions"));
    }
    positions
        .iter()
        .map(|p| position(index, p))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

/// LineString features, with MultiLineString parts flattened in order.
pub fn lines_from_collection(fc: &FeatureCollection, crs: Crs) -> Result<Layer<LineString<f64>>> {
    let mut lines = Vec::with_capacity(fc.features.len());
    for (index, feature) in fc.features.iter().enumerate() {
        match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(positions)) => lines.push(line_from(index, positions)?),
            Some(Value::MultiLineString(parts)) => {
                for part in parts {
                    lines.push(line_from(index, part)?);
                }
            }
            Some(_) => return Err(invalid(index, "expected a LineString or MultiLineString geometry")),
            None => return Err(invalid(index, "missing geometry")),
        }
    }
    Ok(Layer::new(crs, lines))
}

pub fn read_sites(path: &Path, crs: Crs) -> Result<Layer<Site>> {
    sites_from_collection(&read_collection(path)?, crs)
}

pub fn read_references(path: &Path, crs: Crs) -> Result<Layer<ReferencePoint>> {
    references_from_collection(&read_collection(path)?, crs)
}

pub fn read_lines(path: &Path, crs: Crs) -> Result<Layer<LineString<f64>>> {
    lines_from_collection(&read_collection(path)?, crs)
}

// ── Writing ──────────────────────────────────────────────────────────────────

fn feature(geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { bbox: None, features, foreign_members: None }
}

fn point_geometry(at: Coord<f64>) -> Geometry {
    Geometry::from(&Point::from(at))
}

fn risk_properties(id: usize, risk: Risk) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("id".into(), json!(id));
    props.insert("risk".into(), json!(risk.label()));
    props.insert("risk_ordinal".into(), json!(risk.ordinal()));
    props
}

fn classified_properties(c: &ClassifiedSite) -> JsonObject {
    let mut props = risk_properties(c.site.id.0, c.risk);
    props.insert("support".into(), json!(c.support.label()));
    props.insert("voters".into(), json!(c.support.voters()));
    props
}

pub fn sites_to_collection(layer: &Layer<Site>) -> FeatureCollection {
    collection(
        layer
            .iter()
            .map(|s| {
                let mut props = JsonObject::new();
                props.insert("id".into(), json!(s.id.0));
                feature(point_geometry(s.position), props)
            })
            .collect(),
    )
}

pub fn references_to_collection(layer: &Layer<ReferencePoint>) -> FeatureCollection {
    collection(
        layer
            .iter()
            .map(|r| {
                let mut props = risk_properties(r.site.id.0, r.risk);
                if let Some(score) = r.score {
                    props.insert("score".into(), json!(score));
                }
                feature(point_geometry(r.position()), props)
            })
            .collect(),
    )
}

pub fn lines_to_collection(layer: &Layer<LineString<f64>>) -> FeatureCollection {
    collection(
        layer
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let mut props = JsonObject::new();
                props.insert("id".into(), json!(i));
                feature(Geometry::from(line), props)
            })
            .collect(),
    )
}

pub fn classified_to_collection(layer: &Layer<ClassifiedSite>) -> FeatureCollection {
    collection(
        layer
            .iter()
            .map(|c| feature(point_geometry(c.site.position), classified_properties(c)))
            .collect(),
    )
}

/// Road segments carrying the classification of their query point.
///
/// `classes` must be positionally aligned with `segments`.
pub fn classified_lines_to_collection(
    segments: &Layer<LineString<f64>>,
    classes: &Layer<ClassifiedSite>,
) -> FeatureCollection {
    collection(
        segments
            .iter()
            .zip(classes.iter())
            .map(|(line, c)| feature(Geometry::from(line), classified_properties(c)))
            .collect(),
    )
}

pub fn write_collection(path: &Path, fc: FeatureCollection) -> Result<()> {
    std::fs::write(path, GeoJson::from(fc).to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{PointId, Support};
    use geo_types::line_string;

    const BNG: Crs = Crs::BRITISH_NATIONAL_GRID;

    #[test]
    fn site_ids_fall_back_through_gridid_to_position() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}, "properties": {"id": 40}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [3.0, 4.0]}, "properties": {"gridid": 9}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [5.0, 6.0]}, "properties": {}}
            ]
        }"#;
        let sites = sites_from_collection(&parse_collection(text).unwrap(), BNG).unwrap();
        let ids: Vec<PointId> = sites.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![PointId(40), PointId(9), PointId(2)]);
        assert_eq!(sites.features[1].position, Coord { x: 3.0, y: 4.0 });
    }

    #[test]
    fn reference_risk_reads_label_and_alias() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {"risk": "High", "score": 0.8}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 0]}, "properties": {"prob_4band": "Very Low"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [2, 0]}, "properties": {"risk": null}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [3, 0]}, "properties": {"risk": "Severe"}}
            ]
        }"#;
        let refs = references_from_collection(&parse_collection(text).unwrap(), BNG).unwrap();
        let risks: Vec<Risk> = refs.iter().map(|r| r.risk).collect();
        assert_eq!(risks, vec![Risk::High, Risk::VeryLow, Risk::Unknown, Risk::Unknown]);
        assert_eq!(refs.features[0].score, Some(0.8));
        assert_eq!(refs.features[1].score, None);
    }

    #[test]
    fn multilinestrings_are_flattened() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 0]]}, "properties": {}},
                {"type": "Feature", "geometry": {"type": "MultiLineString", "coordinates": [[[0, 1], [1, 1]], [[0, 2], [2, 2]]]}, "properties": {}}
            ]
        }"#;
        let lines = lines_from_collection(&parse_collection(text).unwrap(), BNG).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.features[2], line_string![(x: 0.0, y: 2.0), (x: 2.0, y: 2.0)]);
    }

    #[test]
    fn wrong_geometry_is_reported_with_index() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {}},
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 0]]}, "properties": {}}
            ]
        }"#;
        let err = sites_from_collection(&parse_collection(text).unwrap(), BNG).unwrap_err();
        assert!(matches!(err, HexriskError::InvalidFeature { index: 1, .. }));
    }

    #[test]
    fn malformed_text_is_a_geojson_error() {
        assert!(matches!(parse_collection("{ not json"), Err(HexriskError::GeoJson(_))));
    }

    #[test]
    fn references_survive_write_then_read() {
        let layer = Layer::new(
            BNG,
            vec![
                ReferencePoint::new(3, 10.0, 20.0, Risk::Medium),
                Site::new(8, -1.5, 2.5).with_risk(Risk::VeryLow, Some(0.25)),
            ],
        );
        let text = GeoJson::from(references_to_collection(&layer)).to_string();
        let back = references_from_collection(&parse_collection(&text).unwrap(), BNG).unwrap();
        assert_eq!(back, layer);
    }

    #[test]
    fn classified_output_carries_ordinal_and_support() {
        let layer = Layer::new(
            BNG,
            vec![ClassifiedSite {
                site: Site::new(5, 1.0, 1.0),
                risk: Risk::Low,
                support: Support::Degraded { found: 2, wanted: 3 },
            }],
        );
        let fc = classified_to_collection(&layer);
        let f = &fc.features[0];
        assert_eq!(f.property("id"), Some(&json!(5)));
        assert_eq!(f.property("risk"), Some(&json!("Low")));
        assert_eq!(f.property("risk_ordinal"), Some(&json!(2)));
        assert_eq!(f.property("support"), Some(&json!("degraded")));
        assert_eq!(f.property("voters"), Some(&json!(2)));
    }

    #[test]
    fn integral_float_ids_are_kept() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {"gridid": 3.0}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 0]}, "properties": {"id": 12.0, "gridid": 1}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [2, 0]}, "properties": {"id": null, "gridid": 5}}
            ]
        }"#;
        let sites = sites_from_collection(&parse_collection(text).unwrap(), BNG).unwrap();
        let ids: Vec<PointId> = sites.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![PointId(3), PointId(12), PointId(5)]);
    }

    #[test]
    fn malformed_ids_are_reported_not_renumbered() {
        for bad in [r#""abc""#, "2.5", "-1"] {
            let text = format!(
                r#"{{"type": "FeatureCollection", "features": [
                    {{"type": "Feature", "geometry": {{"type": "Point", "coordinates": [0, 0]}}, "properties": {{"gridid": {bad}}}}}
                ]}}"#
            );
            let err = sites_from_collection(&parse_collection(&text).unwrap(), BNG).unwrap_err();
            assert!(
                matches!(err, HexriskError::InvalidFeature { index: 0, .. }),
                "gridid {bad} should be rejected, got {err}"
            );
        }
    }
}
