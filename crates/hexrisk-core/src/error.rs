//! Error taxonomy for the hexrisk pipeline.
//!
//! Configuration errors are raised before any computation starts and abort the
//! call. Collaborator errors come from reprojection and hex indexing and are
//! passed through unchanged. Too few neighbours for a vote is not an error; see
//! [`crate::layer::Support`].

use thiserror::Error;

use crate::coords::Crs;

pub type Result<T> = std::result::Result<T, HexriskError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("segment interval must be positive, got {0}")]
    NonPositiveInterval(f64),
    #[error("bounding window half-width must be positive, got {0}")]
    NonPositiveWindow(f64),
    #[error("k must be at least 1")]
    ZeroNeighbours,
    #[error("ring radius must be non-negative, got {0}")]
    NegativeRadius(i64),
    #[error("window expansion needs factor > 1 and max_window >= window, got factor {factor}, max_window {max_window}")]
    InvalidExpansion { factor: f64, max_window: f64 },
    #[error("clip distance must be positive, got {0}")]
    NonPositiveClipDistance(f64),
    #[error("query layer is in {queries} but reference layer is in {references}")]
    CrsMismatch { queries: Crs, references: Crs },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("coordinate ({0}, {1}) is outside the projection domain")]
    OutOfDomain(f64, f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("invalid geodetic coordinate: {0}")]
    InvalidLatLng(String),
    #[error("invalid hex resolution {resolution}: {reason}")]
    InvalidResolution { resolution: u8, reason: String },
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

#[derive(Error, Debug)]
pub enum HexriskError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feature {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

impl From<ProjectionError> for HexriskError {
    fn from(e: ProjectionError) -> Self {
        HexriskError::Collaborator(CollaboratorError::Projection(e))
    }
}

impl From<geojson::Error> for HexriskError {
    fn from(e: geojson::Error) -> Self {
        HexriskError::GeoJson(Box::new(e))
    }
}

impl HexriskError {
    pub fn is_config(&self) -> bool {
        matches!(self, HexriskError::Config(_))
    }
}
