//! k-nearest-neighbour risk classification.
//!
//! For every query point the classifier:
//! 1. pre-filters references to an axis-aligned window of half-width `w`
//!    (inclusive bounds), in original reference order;
//! 2. ranks candidates by planar Euclidean distance with a stable sort, so
//!    equidistant references keep their original order;
//! 3. keeps the first `k`;
//! 4. takes the most frequent risk among them. On a count tie the value seen
//!    first in the ranked selection wins, i.e. the closer point.
//!
//! `Unknown` labels vote like any other value. A query whose window holds
//! fewer than `k` references still gets a vote over what was found and is
//! reported through [`Support`]; an empty window yields `Unknown`.
//!
//! The window pre-filter runs on an R-tree bulk-loaded once per call.

use geo::{Distance, Euclidean};
use geo_types::{Coord, Point};
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use serde::{Deserialize, Serialize};

#[cfg(feature = "threading")]
use rayon::prelude::*;

use crate::error::{ConfigError, HexriskError, Result};
use crate::layer::{ClassifiedSite, Layer, ReferencePoint, Site, Support};
use crate::risk::Risk;

// ── Parameters ───────────────────────────────────────────────────────────────

/// What to do when the window holds fewer than `k` references.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Vote with whatever the window holds.
    #[default]
    Fixed,
    /// Multiply the half-width by `factor` until `k` candidates are found or
    /// `max_window` is reached.
    Expanding { factor: f64, max_window: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifyParams {
    /// Neighbours per vote.
    pub k: usize,
    /// Half-width of the square pre-filter window, planar units.
    pub window: f64,
    #[serde(default)]
    pub policy: WindowPolicy,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self { k: 5, window: 500.0, policy: WindowPolicy::Fixed }
    }
}

impl ClassifyParams {
    pub fn new(k: usize, window: f64) -> Self {
        Self { k, window, policy: WindowPolicy::Fixed }
    }

    pub fn expanding(self, factor: f64, max_window: f64) -> Self {
        Self { policy: WindowPolicy::Expanding { factor, max_window }, ..self }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::ZeroNeighbours);
        }
        if !(self.window.is_finite() && self.window > 0.0) {
            return Err(ConfigError::NonPositiveWindow(self.window));
        }
        if let WindowPolicy::Expanding { factor, max_window } = self.policy {
            let ok = factor.is_finite()
                && factor > 1.0
                && max_window.is_finite()
                && max_window >= self.window;
            if !ok {
                return Err(ConfigError::InvalidExpansion { factor, max_window });
            }
        }
        Ok(())
    }
}

// ── Results ──────────────────────────────────────────────────────────────────

/// One ranked neighbour: position in the reference layer plus distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    pub index: usize,
    pub distance: f64,
}

/// Classified queries in input order, with support counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub layer: Layer<ClassifiedSite>,
    /// Queries that voted with fewer than `k` neighbours.
    pub degraded: usize,
    /// Queries with no reference inside the window.
    pub empty: usize,
}

impl Classification {
    pub fn risks(&self) -> Vec<Risk> {
        self.layer.iter().map(|c| c.risk).collect()
    }
}

// ── Window index ─────────────────────────────────────────────────────────────

/// Reference positions keyed by layer index.
struct ReferenceIndex {
    tree: RTree<GeomWithData<[f64; 2], usize>>,
}

/// First feature whose position is not finite, as an error.
fn ensure_finite(positions: impl Iterator<Item = Coord<f64>>, role: &str) -> Result<()> {
    for (index, at) in positions.enumerate() {
        if !(at.x.is_finite() && at.y.is_finite()) {
            return Err(HexriskError::InvalidFeature {
                index,
                reason: format!("{role} position ({}, {}) is not finite", at.x, at.y),
            });
        }
    }
    Ok(())
}

impl ReferenceIndex {
    fn build(references: &[ReferencePoint]) -> Result<Self> {
        ensure_finite(references.iter().map(ReferencePoint::position), "reference")?;
        let items = references
            .iter()
            .enumerate()
            .map(|(i, r)| GeomWithData::new([r.position().x, r.position().y], i))
            .collect();
        Ok(Self { tree: RTree::bulk_load(items) })
    }

    /// Reference indices inside the closed square of half-width `window`,
    /// in reference order.
    fn candidates(&self, at: Coord<f64>, window: f64) -> Vec<usize> {
        let envelope = AABB::from_corners([at.x - window, at.y - window], [at.x + window, at.y + window]);
        let mut found: Vec<usize> = self.tree.locate_in_envelope(&envelope).map(|g| g.data).collect();
        found.sort_unstable();
        found
    }
}

fn rank(at: Coord<f64>, references: &[ReferencePoint], candidates: Vec<usize>, k: usize) -> Vec<Neighbour> {
    let query = Point::from(at);
    let mut ranked: Vec<Neighbour> = candidates
        .into_iter()
        .map(|index| Neighbour {
            index,
            distance: Euclidean.distance(query, Point::from(references[index].position())),
        })
        .collect();
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked.truncate(k);
    ranked
}

fn search(
    index: &ReferenceIndex,
    references: &[ReferencePoint],
    at: Coord<f64>,
    params: &ClassifyParams,
) -> Vec<Neighbour> {
    let mut window = params.window;
    let mut candidates = index.candidates(at, window);
    if let WindowPolicy::Expanding { factor, max_window } = params.policy {
        while candidates.len() < params.k && window < max_window {
            window = (window * factor).min(max_window);
            candidates = index.candidates(at, window);
        }
    }
    rank(at, references, candidates, params.k)
}

/// Most frequent risk; ties go to the value met first in `neighbours`.
fn majority_vote(neighbours: &[Neighbour], references: &[ReferencePoint]) -> Risk {
    let mut tally: Vec<(Risk, usize)> = Vec::with_capacity(neighbours.len());
    for n in neighbours {
        let risk = references[n.index].risk;
        match tally.iter_mut().find(|(r, _)| *r == risk) {
            Some((_, count)) => *count += 1,
            None => tally.push((risk, 1)),
        }
    }

    let mut best: Option<(Risk, usize)> = None;
    for (risk, count) in tally {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((risk, count));
        }
    }
    best.map(|(r, _)| r).unwrap_or(Risk::Unknown)
}

// ── Entry points ─────────────────────────────────────────────────────────────

/// Ranked neighbours of one point: at most `k`, all inside the fixed window.
///
/// Fails when the query or any reference position is not finite.
pub fn nearest(
    query: Coord<f64>,
    references: &Layer<ReferencePoint>,
    k: usize,
    window: f64,
) -> Result<Vec<Neighbour>> {
    ensure_finite(std::iter::once(query), "query")?;
    let index = ReferenceIndex::build(&references.features)?;
    Ok(rank(query, &references.features, index.candidates(query, window), k))
}

/// Classify every query against `references`.
///
/// Fails before any work on invalid parameters, when the two layers are in
/// different coordinate references, or when any position is not finite.
pub fn classify(
    queries: &Layer<Site>,
    references: &Layer<ReferencePoint>,
    params: ClassifyParams,
) -> Result<Classification> {
    params.validate()?;
    if queries.crs != references.crs {
        return Err(ConfigError::CrsMismatch { queries: queries.crs, references: references.crs }.into());
    }

    ensure_finite(queries.iter().map(|q| q.position), "query")?;
    let refs = &references.features;
    let index = ReferenceIndex::build(refs)?;

    #[cfg(feature = "threading")]
    let hits: Vec<Vec<Neighbour>> = queries
        .features
        .par_iter()
        .map(|q| search(&index, refs, q.position, &params))
        .collect();

    #[cfg(not(feature = "threading"))]
    let hits: Vec<Vec<Neighbour>> = queries
        .features
        .iter()
        .map(|q| search(&index, refs, q.position, &params))
        .collect();

    let mut degraded = 0;
    let mut empty = 0;
    let mut out = Vec::with_capacity(queries.len());
    for (site, neighbours) in queries.features.iter().zip(hits) {
        let support = Support::from_counts(neighbours.len(), params.k);
        match support {
            Support::Full { .. } => {}
            Support::Degraded { found, wanted } => {
                degraded += 1;
                tracing::debug!(query = %site.id, found, wanted, "degraded vote");
            }
            Support::Empty => {
                empty += 1;
                tracing::debug!(query = %site.id, window = params.window, "no reference inside window");
            }
        }
        out.push(ClassifiedSite { site: *site, risk: majority_vote(&neighbours, refs), support });
    }

    if degraded + empty > 0 {
        tracing::warn!(
            queries = queries.len(),
            degraded,
            empty,
            k = params.k,
            "some queries voted with fewer than k neighbours"
        );
    }

    Ok(Classification { layer: Layer::new(queries.crs, out), degraded, empty })
}
