//! Point roles and ordered, CRS-tagged collections.
//!
//! Identity flows through the pipeline as a [`PointId`] plus position inside a
//! [`Layer`]; coordinates are never used to match records back up.

use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::coords::Crs;
use crate::risk::Risk;

/// Stable, opaque key for a point. Never interpreted numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointId(pub usize);

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An unlabeled planar point: a query point or a lattice sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: PointId,
    pub position: Coord<f64>,
}

impl Site {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Self { id: PointId(id), position: Coord { x, y } }
    }

    pub fn point(&self) -> Point<f64> {
        Point::from(self.position)
    }

    /// Attach a known risk band, turning this site into a reference point.
    pub fn with_risk(self, risk: Risk, score: Option<f64>) -> ReferencePoint {
        ReferencePoint { site: self, risk, score }
    }
}

/// A point with a known risk band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub site: Site,
    pub risk: Risk,
    /// Optional scalar carried alongside the band (e.g. a probability score).
    pub score: Option<f64>,
}

impl ReferencePoint {
    pub fn new(id: usize, x: f64, y: f64, risk: Risk) -> Self {
        Site::new(id, x, y).with_risk(risk, None)
    }

    pub fn position(&self) -> Coord<f64> {
        self.site.position
    }
}

/// How many neighbours actually took part in a query's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Support {
    /// All `k` neighbours were found.
    Full { neighbours: usize },
    /// Fewer than `k` references fell inside the window; the vote used `found`.
    Degraded { found: usize, wanted: usize },
    /// No reference inside the window; risk is `Unknown`.
    Empty,
}

impl Support {
    pub fn from_counts(found: usize, wanted: usize) -> Self {
        if found == 0 {
            Support::Empty
        } else if found < wanted {
            Support::Degraded { found, wanted }
        } else {
            Support::Full { neighbours: found }
        }
    }

    pub fn voters(self) -> usize {
        match self {
            Support::Full { neighbours } => neighbours,
            Support::Degraded { found, .. } => found,
            Support::Empty => 0,
        }
    }

    pub fn is_full(self) -> bool {
        matches!(self, Support::Full { .. })
    }

    pub fn label(self) -> &'static str {
        match self {
            Support::Full { .. } => "full",
            Support::Degraded { .. } => "degraded",
            Support::Empty => "empty",
        }
    }
}

/// A query site with its assigned risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSite {
    pub site: Site,
    pub risk: Risk,
    pub support: Support,
}

/// Ordered collection of features sharing one coordinate reference.
///
/// Order is preserved for deterministic output and has no other meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer<T> {
    pub crs: Crs,
    pub features: Vec<T>,
}

impl<T> Layer<T> {
    pub fn new(crs: Crs, features: Vec<T>) -> Self {
        Self { crs, features }
    }

    pub fn empty(crs: Crs) -> Self {
        Self { crs, features: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.features.iter()
    }

    /// Build a new layer in the same CRS by mapping every feature.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Layer<U> {
        Layer { crs: self.crs, features: self.features.iter().map(f).collect() }
    }
}

impl<'a, T> IntoIterator for &'a Layer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
