//! Hexagonal cell indexing.
//!
//! [`HexIndex`] is the seam between lattice construction and a concrete
//! hierarchical hex grid. [`H3`] backs it with the `h3o` implementation of
//! Uber's H3 system.

use h3o::{CellIndex, LatLng, Resolution};

use crate::coords::LatLon;
use crate::error::CollaboratorError;

/// Addresses a hexagonal tessellation by opaque cell ids.
pub trait HexIndex {
    type Cell: Copy;

    /// Cell containing `at` at the given resolution.
    fn cell_for_point(&self, at: LatLon, resolution: u8) -> Result<Self::Cell, CollaboratorError>;

    /// Every cell within `radius` adjacency steps of `cell`, `cell` included.
    fn ring_around(&self, cell: Self::Cell, radius: u32) -> Vec<Self::Cell>;

    /// Geodetic centre of `cell`.
    fn cell_centroid(&self, cell: Self::Cell) -> LatLon;
}

/// H3 grid, resolutions 0 (coarsest) to 15.
#[derive(Debug, Clone, Copy, Default)]
pub struct H3;

impl HexIndex for H3 {
    type Cell = CellIndex;

    fn cell_for_point(&self, at: LatLon, resolution: u8) -> Result<CellIndex, CollaboratorError> {
        let res = Resolution::try_from(resolution).map_err(|e| CollaboratorError::InvalidResolution {
            resolution,
            reason: e.to_string(),
        })?;
        let ll = LatLng::new(at.lat, at.lon).map_err(|e| CollaboratorError::InvalidLatLng(e.to_string()))?;
        Ok(ll.to_cell(res))
    }

    fn ring_around(&self, cell: CellIndex, radius: u32) -> Vec<CellIndex> {
        cell.grid_disk::<Vec<_>>(radius)
    }

    fn cell_centroid(&self, cell: CellIndex) -> LatLon {
        let ll = LatLng::from(cell);
        LatLon::new(ll.lat(), ll.lng())
    }
}
