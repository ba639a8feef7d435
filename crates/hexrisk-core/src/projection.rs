//! Geodetic ↔ planar reprojection.
//!
//! All planar work (distances, bounding windows, buffers) happens in one fixed
//! frame. The reference frame is the British National Grid (EPSG:27700):
//! WGS84 coordinates are shifted to the OSGB36 datum with a 7-parameter
//! Helmert transform and then projected with Transverse Mercator on the
//! Airy 1830 ellipsoid.

use geo_types::Coord;

use crate::coords::{Crs, LatLon};
use crate::error::ProjectionError;

/// Converts between geodetic coordinates and one planar frame.
pub trait Projection: Send + Sync {
    /// Planar frame produced by `to_planar`.
    fn crs(&self) -> Crs;

    fn to_planar(&self, at: LatLon) -> Result<Coord<f64>, ProjectionError>;

    fn to_geodetic(&self, at: Coord<f64>) -> Result<LatLon, ProjectionError>;
}

// ── Ellipsoids and datum shift ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    const WGS84: Ellipsoid = Ellipsoid { a: 6_378_137.000, b: 6_356_752.314_245 };
    const AIRY_1830: Ellipsoid = Ellipsoid { a: 6_377_563.396, b: 6_356_256.909 };

    fn e2(self) -> f64 {
        1.0 - (self.b * self.b) / (self.a * self.a)
    }
}

/// Seven-parameter Helmert transform. Translations in metres, scale in ppm,
/// rotations in arc-seconds.
#[derive(Debug, Clone, Copy)]
struct Helmert {
    tx: f64,
    ty: f64,
    tz: f64,
    s_ppm: f64,
    rx_sec: f64,
    ry_sec: f64,
    rz_sec: f64,
}

impl Helmert {
    /// WGS84 → OSGB36 (Ordnance Survey published parameters).
    const WGS84_TO_OSGB36: Helmert = Helmert {
        tx: -446.448,
        ty: 125.157,
        tz: -542.060,
        s_ppm: 20.4894,
        rx_sec: -0.1502,
        ry_sec: -0.2470,
        rz_sec: -0.8421,
    };

    fn inverse(self) -> Helmert {
        Helmert {
            tx: -self.tx,
            ty: -self.ty,
            tz: -self.tz,
            s_ppm: -self.s_ppm,
            rx_sec: -self.rx_sec,
            ry_sec: -self.ry_sec,
            rz_sec: -self.rz_sec,
        }
    }

    fn apply(self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let sec = (1.0_f64 / 3600.0).to_radians();
        let s1 = 1.0 + self.s_ppm * 1e-6;
        let rx = self.rx_sec * sec;
        let ry = self.ry_sec * sec;
        let rz = self.rz_sec * sec;
        [
            self.tx + s1 * x - rz * y + ry * z,
            self.ty + rz * x + s1 * y - rx * z,
            self.tz - ry * x + rx * y + s1 * z,
        ]
    }
}

/// Geodetic (radians, height 0) → earth-centred cartesian.
fn to_cartesian(lat: f64, lon: f64, e: Ellipsoid) -> [f64; 3] {
    let e2 = e.e2();
    let nu = e.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    [
        nu * lat.cos() * lon.cos(),
        nu * lat.cos() * lon.sin(),
        (1.0 - e2) * nu * lat.sin(),
    ]
}

/// Earth-centred cartesian → geodetic (radians), iterating on latitude.
fn from_cartesian([x, y, z]: [f64; 3], e: Ellipsoid) -> (f64, f64) {
    let e2 = e.e2();
    let p = (x * x + y * y).sqrt();
    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..16 {
        let nu = e.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        let next = (z + e2 * nu * lat.sin()).atan2(p);
        if (next - lat).abs() < 1e-13 {
            lat = next;
            break;
        }
        lat = next;
    }
    (lat, y.atan2(x))
}

// ── Transverse Mercator ──────────────────────────────────────────────────────

/// Transverse Mercator grid definition.
#[derive(Debug, Clone, Copy)]
struct TransverseMercator {
    ellipsoid: Ellipsoid,
    /// Central meridian scale factor.
    f0: f64,
    lat0: f64,
    lon0: f64,
    e0: f64,
    n0: f64,
}

impl TransverseMercator {
    const NATIONAL_GRID: TransverseMercator = TransverseMercator {
        ellipsoid: Ellipsoid::AIRY_1830,
        f0: 0.999_601_271_7,
        lat0: 49.0,
        lon0: -2.0,
        e0: 400_000.0,
        n0: -100_000.0,
    };

    /// Developed meridional arc from the true origin to `lat` (radians).
    fn meridional_arc(&self, lat: f64) -> f64 {
        let Ellipsoid { a, b } = self.ellipsoid;
        let n = (a - b) / (a + b);
        let (n2, n3) = (n * n, n * n * n);
        let lat0 = self.lat0.to_radians();
        let d = lat - lat0;
        let s = lat + lat0;
        let ma = (1.0 + n + 1.25 * n2 + 1.25 * n3) * d;
        let mb = (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * d.sin() * s.cos();
        let mc = (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * d).sin() * (2.0 * s).cos();
        let md = 35.0 / 24.0 * n3 * (3.0 * d).sin() * (3.0 * s).cos();
        b * self.f0 * (ma - mb + mc - md)
    }

    /// Radii of curvature (nu, rho) and eta² at `lat`.
    fn curvature(&self, lat: f64) -> (f64, f64, f64) {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let sin2 = lat.sin().powi(2);
        let nu = a * self.f0 / (1.0 - e2 * sin2).sqrt();
        let rho = a * self.f0 * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);
        (nu, rho, nu / rho - 1.0)
    }

    /// Datum-local lat/lon (radians) → easting, northing.
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (nu, rho, eta2) = self.curvature(lat);
        let m = self.meridional_arc(lat);
        let (sin, cos) = lat.sin_cos();
        let tan2 = lat.tan().powi(2);
        let tan4 = tan2 * tan2;

        let i = m + self.n0;
        let ii = nu / 2.0 * sin * cos;
        let iii = nu / 24.0 * sin * cos.powi(3) * (5.0 - tan2 + 9.0 * eta2);
        let iiia = nu / 720.0 * sin * cos.powi(5) * (61.0 - 58.0 * tan2 + tan4);
        let iv = nu * cos;
        let v = nu / 6.0 * cos.powi(3) * (nu / rho - tan2);
        let vi = nu / 120.0
            * cos.powi(5)
            * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

        let dl = lon - self.lon0.to_radians();
        let northing = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);
        let easting = self.e0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);
        (easting, northing)
    }

    /// Easting, northing → datum-local lat/lon (radians).
    fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let a = self.ellipsoid.a;
        let mut lat = self.lat0.to_radians();
        let mut m = 0.0;
        for _ in 0..64 {
            lat += (northing - self.n0 - m) / (a * self.f0);
            m = self.meridional_arc(lat);
            if (northing - self.n0 - m).abs() < 1e-5 {
                break;
            }
        }

        let (nu, rho, eta2) = self.curvature(lat);
        let tan = lat.tan();
        let (tan2, tan4, tan6) = (tan * tan, tan.powi(4), tan.powi(6));
        let sec = 1.0 / lat.cos();

        let vii = tan / (2.0 * rho * nu);
        let viii = tan / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
        let ix = tan / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
        let x = sec / nu;
        let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
        let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
        let xiia = sec / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

        let de = easting - self.e0;
        let lat = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
        let lon = self.lon0.to_radians() + x * de - xi * de.powi(3) + xii * de.powi(5)
            - xiia * de.powi(7);
        (lat, lon)
    }
}

// ── British National Grid ────────────────────────────────────────────────────

/// WGS84 ↔ British National Grid (EPSG:27700), metres.
///
/// Accuracy is that of the published Helmert shift (a few metres), which is
/// well inside any sensible bounding window.
#[derive(Debug, Clone, Copy, Default)]
pub struct BritishNationalGrid;

/// Easting/northing envelope accepted by the inverse projection.
const GRID_EXTENT: (f64, f64, f64, f64) = (-1_000_000.0, -1_000_000.0, 2_000_000.0, 2_500_000.0);

impl Projection for BritishNationalGrid {
    fn crs(&self) -> Crs {
        Crs::BRITISH_NATIONAL_GRID
    }

    fn to_planar(&self, at: LatLon) -> Result<Coord<f64>, ProjectionError> {
        if !at.is_valid() || at.lat.abs() >= 89.0 {
            return Err(ProjectionError::OutOfDomain(at.lat, at.lon));
        }
        let (lat, lon) = at.to_radians();
        let xyz = Helmert::WGS84_TO_OSGB36.apply(to_cartesian(lat, lon, Ellipsoid::WGS84));
        let (lat, lon) = from_cartesian(xyz, Ellipsoid::AIRY_1830);
        let (x, y) = TransverseMercator::NATIONAL_GRID.forward(lat, lon);
        Ok(Coord { x, y })
    }

    fn to_geodetic(&self, at: Coord<f64>) -> Result<LatLon, ProjectionError> {
        let (min_e, min_n, max_e, max_n) = GRID_EXTENT;
        if !(at.x.is_finite() && at.y.is_finite())
            || at.x < min_e
            || at.x > max_e
            || at.y < min_n
            || at.y > max_n
        {
            return Err(ProjectionError::OutOfDomain(at.x, at.y));
        }
        let (lat, lon) = TransverseMercator::NATIONAL_GRID.inverse(at.x, at.y);
        let xyz = Helmert::WGS84_TO_OSGB36
            .inverse()
            .apply(to_cartesian(lat, lon, Ellipsoid::AIRY_1830));
        let (lat, lon) = from_cartesian(xyz, Ellipsoid::WGS84);
        Ok(LatLon::new(lat.to_degrees(), lon.to_degrees()))
    }
}
