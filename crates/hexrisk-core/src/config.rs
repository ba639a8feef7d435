//! Study configuration, loaded from JSON.
//!
//! Every section has calibrated defaults, so a config file only needs the
//! fields it changes. `validate` checks everything up front; nothing else in
//! the pipeline re-checks parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::{ClassifyParams, WindowPolicy};
use crate::coords::LatLon;
use crate::error::{ConfigError, Result};

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Metres, default 50. Road piece length.
    pub interval: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { interval: 50.0 }
    }
}

impl SegmentConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(ConfigError::NonPositiveInterval(self.interval));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    /// H3 resolution 0-15, default 9 (~175 m cells). Checked by the hex index.
    pub resolution: u8,
    /// Ring count around the centre cell, default 10.
    pub radius: i64,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self { resolution: 9, radius: 10 }
    }
}

impl LatticeConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.radius < 0 {
            return Err(ConfigError::NegativeRadius(self.radius));
        }
        Ok(())
    }

    /// Validated ring count.
    pub fn rings(&self) -> std::result::Result<u32, ConfigError> {
        self.validate()?;
        Ok(u32::try_from(self.radius).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Neighbours per vote, default 5.
    pub k: usize,
    /// Metres, default 500. Half-width of the search window.
    pub window: f64,
    /// When set, the window grows by this factor while short of `k` references.
    pub expand_factor: Option<f64>,
    /// Upper bound for a growing window. Defaults to 8 × `window`.
    pub max_window: Option<f64>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self { k: 5, window: 500.0, expand_factor: None, max_window: None }
    }
}

impl ClassifyConfig {
    pub fn params(&self) -> ClassifyParams {
        let policy = match self.expand_factor {
            Some(factor) => WindowPolicy::Expanding {
                factor,
                max_window: self.max_window.unwrap_or(self.window * 8.0),
            },
            None => WindowPolicy::Fixed,
        };
        ClassifyParams { k: self.k, window: self.window, policy }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.params().validate()
    }
}

// ── Study ────────────────────────────────────────────────────────────────────

/// Full study-area run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// WGS84 centre of the study area, default central London.
    pub center: LatLon,
    /// Metres, default 1000. Radius of the circular study area.
    pub clip_distance: f64,
    pub segment: SegmentConfig,
    pub lattice: LatticeConfig,
    pub classify: ClassifyConfig,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            center: LatLon::new(51.5074, -0.1278),
            clip_distance: 1_000.0,
            segment: SegmentConfig::default(),
            lattice: LatticeConfig::default(),
            classify: ClassifyConfig::default(),
        }
    }
}

impl StudyConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.clip_distance.is_finite() && self.clip_distance > 0.0) {
            return Err(ConfigError::NonPositiveClipDistance(self.clip_distance));
        }
        self.segment.validate()?;
        self.lattice.validate()?;
        self.classify.validate()
    }
}
