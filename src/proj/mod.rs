pub mod common;
pub mod ellipsoid;
pub mod equirectangular;
pub mod etmerc;
pub mod lambert_conformal;
pub mod longlat;
pub mod mercator;
pub mod pipeline;
pub mod registry;
pub mod transverse_mercator;

pub use registry::{Method, ProjectionRegistry};

use crate::error::ProjError;

/// Trait for map projections supporting forward and inverse transforms.
///
/// An instance is built once from a [`Definition`](crate::crs::Definition) and
/// then shared; implementations hold only precomputed constants. Out-of-domain
/// input returns `Err(ProjError::Singularity | ProjError::Convergence)` rather
/// than a NaN or a panic.
pub trait Projection: Send + Sync {
    /// Method name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Forward: (lon_rad, lat_rad) -> (easting, northing), false origin applied.
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError>;

    /// Inverse: (easting, northing) -> (lon_rad, lat_rad)
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError>;

    /// Geographic pass-through: ordinates are angles, not linear units.
    fn is_latlong(&self) -> bool {
        false
    }

    /// Batch forward transform (default: loop).
    fn forward_batch(&self, coords: &mut [(f64, f64)]) -> Result<(), ProjError> {
        for c in coords.iter_mut() {
            *c = self.forward(c.0, c.1)?;
        }
        Ok(())
    }

    /// Batch inverse transform.
    fn inverse_batch(&self, coords: &mut [(f64, f64)]) -> Result<(), ProjError> {
        for c in coords.iter_mut() {
            *c = self.inverse(c.0, c.1)?;
        }
        Ok(())
    }
}
