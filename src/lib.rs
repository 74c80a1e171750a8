//! Coordinate transformation between geodetic and projected CRSs.
//!
//! A CRS is given as a registry key (`"EPSG:4326"`), a key/value string
//! (`"+proj=utm +zone=33 +datum=WGS84"`) or WKT. [`transform`] converts one
//! point; a [`Pipeline`] resolves both CRSs once and converts many.
//!
//! ```
//! let [x, y]: [f64; 2] = reproj::transform("EPSG:4326", "EPSG:3857", [90.0, 0.0]).unwrap();
//! assert!((x - 10_018_754.171_394_622).abs() < 1e-6);
//! assert!(y.abs() < 1e-9);
//! ```

pub mod crs;
pub mod datum;
pub mod error;
pub mod point;
pub mod proj;

pub use crs::{Definition, DefinitionRegistry};
pub use datum::{Datum, GridShift};
pub use error::{ParseError, ProjError};
pub use point::{Coord, Point};
pub use proj::pipeline::{transform, Pipeline, PipelineBuilder};
pub use proj::{Projection, ProjectionRegistry};
