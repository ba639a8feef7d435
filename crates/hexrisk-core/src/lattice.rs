//! Hex-lattice sampling grid.
//!
//! The grid is the disk of hexagonal cells around a geodetic centre, one point
//! per cell at the cell centroid, projected into the planar frame. Points are
//! numbered `0..N-1` in the order the hex index enumerates the disk.

use crate::coords::LatLon;
use crate::error::Result;
use crate::hexgrid::HexIndex;
use crate::layer::{Layer, Site};
use crate::projection::Projection;

/// Number of cells in a disk of `radius` rings: `3r² + 3r + 1`.
pub fn expected_cell_count(radius: u32) -> usize {
    let r = radius as usize;
    3 * r * r + 3 * r + 1
}

/// Build the sampling grid around `center`.
///
/// Invalid coordinates, resolutions and projection failures surface as
/// collaborator errors. Cells are not deduplicated and the output carries no
/// spatial ordering beyond the index's enumeration order.
pub fn build_lattice<H, P>(
    index: &H,
    projection: &P,
    center: LatLon,
    resolution: u8,
    radius: u32,
) -> Result<Layer<Site>>
where
    H: HexIndex,
    P: Projection + ?Sized,
{
    let origin = index.cell_for_point(center, resolution)?;
    let cells = index.ring_around(origin, radius);

    let mut sites = Vec::with_capacity(cells.len());
    for (id, cell) in cells.into_iter().enumerate() {
        let at = projection.to_planar(index.cell_centroid(cell))?;
        sites.push(Site::new(id, at.x, at.y));
    }

    tracing::debug!(
        lat = center.lat,
        lon = center.lon,
        resolution,
        radius,
        cells = sites.len(),
        "built hex lattice"
    );
    Ok(Layer::new(projection.crs(), sites))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Crs;
    use crate::error::HexriskError;
    use crate::hexgrid::H3;
    use crate::layer::PointId;
    use crate::projection::BritishNationalGrid;

    const LEEDS: LatLon = LatLon { lat: 53.8008, lon: -1.5491 };

    #[test]
    fn cardinality_follows_hexagonal_numbers() {
        assert_eq!(expected_cell_count(0), 1);
        assert_eq!(expected_cell_count(1), 7);
        assert_eq!(expected_cell_count(10), 331);

        for radius in [0, 1, 2, 5] {
            let grid = build_lattice(&H3, &BritishNationalGrid, LEEDS, 9, radius).unwrap();
            assert_eq!(
                grid.len(),
                expected_cell_count(radius),
                "radius {radius} should give {} cells",
                expected_cell_count(radius)
            );
        }
    }

    #[test]
    fn ids_are_sequential_from_zero() {
        let grid = build_lattice(&H3, &BritishNationalGrid, LEEDS, 9, 3).unwrap();
        let ids: Vec<PointId> = grid.iter().map(|s| s.id).collect();
        let expected: Vec<PointId> = (0..grid.len()).map(PointId).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn points_are_planar_and_near_the_centre() {
        let centre = BritishNationalGrid.to_planar(LEEDS).unwrap();
        let grid = build_lattice(&H3, &BritishNationalGrid, LEEDS, 9, 2).unwrap();
        assert_eq!(grid.crs, Crs::BRITISH_NATIONAL_GRID);
        for site in &grid {
            let dx = site.position.x - centre.x;
            let dy = site.position.y - centre.y;
            // Two rings of ~175 m cells.
            assert!((dx * dx + dy * dy).sqrt() < 1_000.0, "site {} too far from centre", site.id);
        }
    }

    #[test]
    fn invalid_resolution_propagates() {
        let err = build_lattice(&H3, &BritishNationalGrid, LEEDS, 16, 1).unwrap_err();
        assert!(matches!(err, HexriskError::Collaborator(_)));
    }
}
