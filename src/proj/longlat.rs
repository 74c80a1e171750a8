//! Geographic pass-through for long/lat CRSs.

use crate::crs::Definition;
use crate::error::ProjError;
use crate::proj::{Method, Projection};

pub const METHOD: Method = Method {
    names: &["longlat", "identity", "latlong", "lonlat", "latlon"],
    init,
};

pub fn init(_def: &Definition) -> Result<Box<dyn Projection>, ProjError> {
    Ok(Box::new(LongLat))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LongLat;

impl Projection for LongLat {
    fn name(&self) -> &'static str {
        "longlat"
    }

    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        Ok((lon, lat))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        Ok((x, y))
    }

    fn is_latlong(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        let p = LongLat;
        assert_eq!(p.forward(0.1, -0.2).unwrap(), (0.1, -0.2));
        assert_eq!(p.inverse(0.1, -0.2).unwrap(), (0.1, -0.2));
        assert!(p.is_latlong());
    }
}
