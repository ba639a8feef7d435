//! Study-area orchestrator: clip, segment, classify.
//!
//! Two products are available from one configured [`StudyArea`]:
//! - road risk: each road piece takes the risk voted at its midpoint;
//! - grid risk: each hex-lattice sample takes the risk voted at its centroid.

use std::collections::BTreeMap;

use geo_types::{LineString, Polygon};

use crate::classify::{classify, Classification};
use crate::clip::{clip_lines, clip_points, study_area};
use crate::config::StudyConfig;
use crate::error::{ConfigError, HexriskError, Result};
use crate::hexgrid::HexIndex;
use crate::lattice::build_lattice;
use crate::layer::{ClassifiedSite, Layer, ReferencePoint, Site};
use crate::projection::{BritishNationalGrid, Projection};
use crate::risk::Risk;
use crate::segment::{midpoint, segment};

// ── Output ───────────────────────────────────────────────────────────────────

/// Road pieces paired positionally with their classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadRiskReport {
    pub segments: Layer<LineString<f64>>,
    pub classification: Classification,
}

impl RoadRiskReport {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LineString<f64>, &ClassifiedSite)> {
        self.segments.iter().zip(self.classification.layer.iter())
    }

    /// Segment count per assigned risk.
    pub fn counts_by_risk(&self) -> BTreeMap<Risk, usize> {
        risk_histogram(&self.classification.layer)
    }
}

pub fn risk_histogram(layer: &Layer<ClassifiedSite>) -> BTreeMap<Risk, usize> {
    let mut counts = BTreeMap::new();
    for c in layer {
        *counts.entry(c.risk).or_insert(0) += 1;
    }
    counts
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// A validated configuration bound to a planar projection.
pub struct StudyArea<P: Projection = BritishNationalGrid> {
    config: StudyConfig,
    projection: P,
}

impl StudyArea<BritishNationalGrid> {
    pub fn new(config: StudyConfig) -> Result<Self> {
        Self::with_projection(config, BritishNationalGrid)
    }
}

impl<P: Projection> StudyArea<P> {
    pub fn with_projection(config: StudyConfig, projection: P) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, projection })
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Planar buffer polygon of the study area.
    pub fn area(&self) -> Result<Polygon<f64>> {
        study_area(&self.projection, self.config.center, self.config.clip_distance)
    }

    fn check_frame<T>(&self, layer: &Layer<T>) -> Result<()> {
        let frame = self.projection.crs();
        if layer.crs != frame {
            return Err(ConfigError::CrsMismatch { queries: layer.crs, references: frame }.into());
        }
        Ok(())
    }

    /// Road risk: clip both inputs, segment the roads, classify segment midpoints.
    ///
    /// Query ids are segment indices, so report entries line up with
    /// `segments` by position.
    pub fn road_risk(
        &self,
        roads: &Layer<LineString<f64>>,
        references: &Layer<ReferencePoint>,
    ) -> Result<RoadRiskReport> {
        self.check_frame(roads)?;
        self.check_frame(references)?;

        // ── 1. Clip ─────────────────────────────────────────────────────────
        let area = self.area()?;
        let roads = clip_lines(roads, &area);
        let references = clip_points(references, &area);

        // ── 2. Segment ──────────────────────────────────────────────────────
        let segments = segment(&roads, self.config.segment.interval)?;

        // ── 3. Query points ─────────────────────────────────────────────────
        let mut queries = Vec::with_capacity(segments.len());
        for (index, piece) in segments.iter().enumerate() {
            let at = midpoint(piece).ok_or_else(|| HexriskError::InvalidFeature {
                index,
                reason: "road segment has no vertices".into(),
            })?;
            queries.push(Site::new(index, at.x, at.y));
        }
        let queries = Layer::new(segments.crs, queries);

        // ── 4. Classify ─────────────────────────────────────────────────────
        let classification = classify(&queries, &references, self.config.classify.params())?;

        tracing::info!(
            roads = roads.len(),
            segments = segments.len(),
            references = references.len(),
            degraded = classification.degraded,
            empty = classification.empty,
            "road risk complete"
        );
        Ok(RoadRiskReport { segments, classification })
    }

    /// Hex sampling grid around the study centre.
    pub fn sampling_grid<H: HexIndex>(&self, index: &H) -> Result<Layer<Site>> {
        let lattice = &self.config.lattice;
        build_lattice(index, &self.projection, self.config.center, lattice.resolution, lattice.rings()?)
    }

    /// Grid risk: classify every lattice sample against the clipped references.
    pub fn grid_risk<H: HexIndex>(
        &self,
        index: &H,
        references: &Layer<ReferencePoint>,
    ) -> Result<Classification> {
        self.check_frame(references)?;
        let grid = self.sampling_grid(index)?;
        let references = clip_points(references, &self.area()?);
        let classification = classify(&grid, &references, self.config.classify.params())?;
        tracing::info!(
            cells = grid.len(),
            references = references.len(),
            degraded = classification.degraded,
            empty = classification.empty,
            "grid risk complete"
        );
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifyConfig, LatticeConfig, SegmentConfig};
    use crate::coords::{Crs, LatLon};
    use crate::hexgrid::H3;
    use crate::lattice::expected_cell_count;
    use crate::layer::{PointId, Support};
    use geo_types::Coord;

    const CENTRE: LatLon = LatLon { lat: 52.2053, lon: 0.1218 };

    fn config() -> StudyConfig {
        StudyConfig {
            center: CENTRE,
            clip_distance: 500.0,
            segment: SegmentConfig { interval: 100.0 },
            lattice: LatticeConfig { resolution: 10, radius: 3 },
            classify: ClassifyConfig { k: 3, window: 150.0, ..ClassifyConfig::default() },
        }
    }

    fn origin() -> Coord<f64> {
        BritishNationalGrid.to_planar(CENTRE).unwrap()
    }

    /// West half High, east half Low, on a 50 m grid.
    fn references() -> Layer<ReferencePoint> {
        let o = origin();
        let mut refs = Vec::new();
        for i in -12..=12 {
            for j in -12..=12 {
                let (dx, dy) = (i as f64 * 50.0, j as f64 * 50.0);
                let risk = if dx < 0.0 { Risk::High } else { Risk::Low };
                refs.push(ReferencePoint::new(refs.len(), o.x + dx, o.y + dy, risk));
            }
        }
        Layer::new(Crs::BRITISH_NATIONAL_GRID, refs)
    }

    fn east_west_road() -> Layer<LineString<f64>> {
        let o = origin();
        let road = LineString::new(vec![
            Coord { x: o.x - 2_000.0, y: o.y + 25.0 },
            Coord { x: o.x + 2_000.0, y: o.y + 25.0 },
        ]);
        Layer::new(Crs::BRITISH_NATIONAL_GRID, vec![road])
    }

    #[test]
    fn road_is_clipped_segmented_and_classified() {
        let study = StudyArea::new(config()).unwrap();
        let report = study.road_risk(&east_west_road(), &references()).unwrap();

        // Chord of ~999 m inside the 500 m circle → 9 full pieces + remainder.
        assert_eq!(report.len(), 10);
        let ids: Vec<PointId> = report.classification.layer.iter().map(|c| c.site.id).collect();
        assert_eq!(ids, (0..10).map(PointId).collect::<Vec<_>>());

        // The road crosses from the High half into the Low half.
        let risks = report.classification.risks();
        assert!(risks.contains(&Risk::High) && risks.contains(&Risk::Low));
        assert_ne!(risks.first(), risks.last());
        assert!(report.iter().all(|(_, c)| c.support.is_full()));

        let counts = report.counts_by_risk();
        assert_eq!(counts.values().sum::<usize>(), 10);
        assert!(!counts.contains_key(&Risk::Unknown));
    }

    #[test]
    fn sparse_references_surface_as_degraded() {
        let o = origin();
        let refs = Layer::new(
            Crs::BRITISH_NATIONAL_GRID,
            vec![ReferencePoint::new(0, o.x, o.y, Risk::Medium)],
        );
        let study = StudyArea::new(config()).unwrap();
        let report = study.road_risk(&east_west_road(), &refs).unwrap();

        assert!(report.classification.degraded > 0);
        assert!(report.classification.empty > 0);
        for (_, c) in report.iter() {
            match c.support {
                Support::Empty => assert_eq!(c.risk, Risk::Unknown),
                _ => assert_eq!(c.risk, Risk::Medium),
            }
        }
    }

    #[test]
    fn grid_risk_covers_every_cell() {
        let study = StudyArea::new(config()).unwrap();
        let classes = study.grid_risk(&H3, &references()).unwrap();
        assert_eq!(classes.layer.len(), expected_cell_count(3));
        assert!(classes.layer.iter().all(|c| c.risk == Risk::High || c.risk == Risk::Low));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut cfg = config();
        cfg.classify.window = 0.0;
        assert!(StudyArea::new(cfg).err().is_some_and(|e| e.is_config()));
    }

    #[test]
    fn inputs_outside_the_planar_frame_are_rejected() {
        let study = StudyArea::new(config()).unwrap();
        let roads = Layer::new(Crs::WGS84, east_west_road().features);
        assert!(study.road_risk(&roads, &references()).unwrap_err().is_config());
    }
}
