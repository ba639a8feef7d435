pub mod classify;
pub mod clip;
pub mod config;
pub mod coords;
pub mod error;
pub mod hexgrid;
pub mod io;
pub mod lattice;
pub mod layer;
pub mod pipeline;
pub mod projection;
pub mod risk;
pub mod segment;

pub use classify::{classify, nearest, Classification, ClassifyParams, Neighbour, WindowPolicy};
pub use config::StudyConfig;
pub use coords::{Crs, LatLon};
pub use error::{ConfigError, HexriskError, Result};
pub use hexgrid::{HexIndex, H3};
pub use lattice::{build_lattice, expected_cell_count};
pub use layer::{ClassifiedSite, Layer, PointId, ReferencePoint, Site, Support};
pub use pipeline::{RoadRiskReport, StudyArea};
pub use projection::{BritishNationalGrid, Projection};
pub use risk::Risk;
pub use segment::segment;
