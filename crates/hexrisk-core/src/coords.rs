/// Geodetic coordinate types and coordinate reference tags.
/// All coordinate math uses f64 for precision.
use serde::{Deserialize, Serialize};

/// A point on the ellipsoid in geographic coordinates (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Convert to radians.
    pub fn to_radians(self) -> (f64, f64) {
        (self.lat.to_radians(), self.lon.to_radians())
    }

    /// True when both components are finite and latitude lies within ±90°.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.lat.abs() <= 90.0
    }
}

/// Coordinate reference tag carried by every layer, as an EPSG code.
///
/// Planar computations (distances, bounding windows) are only meaningful
/// between layers that share the same tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(pub u32);

impl Crs {
    /// WGS84 geographic coordinates.
    pub const WGS84: Crs = Crs(4326);
    /// OSGB36 / British National Grid, metres.
    pub const BRITISH_NATIONAL_GRID: Crs = Crs(27700);

    pub fn epsg(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}
