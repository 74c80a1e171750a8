//! Equirectangular (Plate Carrée) projection.
//!
//! forward: x = x₀ + a·(λ - λ₀)·cos(φts), y = y₀ + a·(φ - φ₀)
//! inverse: λ = λ₀ + (x - x₀)/(a·cos(φts)), φ = φ₀ + (y - y₀)/a

use crate::crs::Definition;
use crate::error::ProjError;
use crate::proj::common::{adjust_lat, adjust_lon, check_lat, EPSLN};
use crate::proj::{Method, Projection};

pub const METHOD: Method = Method {
    names: &[
        "eqc",
        "Equirectangular",
        "Equidistant_Cylindrical",
        "Plate_Carree",
    ],
    init,
};

pub fn init(def: &Definition) -> Result<Box<dyn Projection>, ProjError> {
    Ok(Box::new(Equirectangular::from_definition(def)?))
}

#[derive(Clone, Debug)]
pub struct Equirectangular {
    a: f64,
    lon0: f64,
    lat0: f64,
    cos_lat_ts: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Equirectangular {
    pub fn from_definition(def: &Definition) -> Result<Self, ProjError> {
        Self::new(
            def.a,
            def.long0(),
            def.lat0(),
            def.params.lat_ts.unwrap_or(0.0),
            def.x0(),
            def.y0(),
        )
    }

    pub fn new(
        a: f64,
        lon0: f64,
        lat0: f64,
        lat_ts: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<Self, ProjError> {
        let cos_lat_ts = lat_ts.cos();
        if cos_lat_ts.abs() < EPSLN {
            return Err(ProjError::InvalidParameter(
                "eqc: lat_ts must not be a pole".to_string(),
            ));
        }
        Ok(Self {
            a,
            lon0,
            lat0,
            cos_lat_ts,
            false_easting,
            false_northing,
        })
    }
}

impl Projection for Equirectangular {
    fn name(&self) -> &'static str {
        "eqc"
    }

    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        check_lat(lat, "eqc")?;
        let x = self.false_easting + self.a * adjust_lon(lon - self.lon0) * self.cos_lat_ts;
        let y = self.false_northing + self.a * adjust_lat(lat - self.lat0);
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::singularity("eqc", "non-finite input"));
        }
        let lon = adjust_lon(self.lon0 + (x - self.false_easting) / (self.a * self.cos_lat_ts));
        let lat = self.lat0 + (y - self.false_northing) / self.a;
        check_lat(lat, "eqc")?;
        Ok((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::parse_definition;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn eqc(text: &str) -> Equirectangular {
        Equirectangular::from_definition(&parse_definition(text).unwrap()).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let proj = eqc("+proj=eqc +ellps=WGS84");
        let lon = 10.0_f64.to_radians();
        let lat = 45.0_f64.to_radians();
        let (x, y) = proj.forward(lon, lat).unwrap();
        let (lon2, lat2) = proj.inverse(x, y).unwrap();
        assert_relative_eq!(lon2, lon, epsilon = 1e-12);
        assert_relative_eq!(lat2, lat, epsilon = 1e-12);
    }

    #[test]
    fn test_plate_carree_scale() {
        let proj = eqc("+proj=eqc +ellps=WGS84");
        let lon = 15.0_f64.to_radians();
        let lat = 52.0_f64.to_radians();
        let (x, y) = proj.forward(lon, lat).unwrap();
        assert_relative_eq!(x, WGS84.a * lon, epsilon = 1e-6);
        assert_relative_eq!(y, WGS84.a * lat, epsilon = 1e-6);
    }

    #[test]
    fn test_with_standard_parallel() {
        let proj = eqc("+proj=eqc +lat_ts=30 +lon_0=0 +x_0=100 +ellps=WGS84");
        let lon = 1.0_f64.to_radians();
        let (x, _) = proj.forward(lon, 0.0).unwrap();
        let expected_x = 100.0 + WGS84.a * lon * 30.0_f64.to_radians().cos();
        assert_relative_eq!(x, expected_x, epsilon = 1e-6);
    }

    #[test]
    fn test_dateline() {
        let proj = eqc("+proj=eqc +ellps=WGS84");
        let (xe, _) = proj.forward(PI, 0.0).unwrap();
        let (xw, _) = proj.forward(-PI, 0.0).unwrap();
        assert_relative_eq!(xe, -xw, epsilon = 1e-6);
    }

    #[test]
    fn test_latitude_beyond_pole_rejected() {
        let proj = eqc("+proj=eqc +ellps=WGS84");
        let err = proj.forward(0.0, 95.0_f64.to_radians()).unwrap_err();
        assert!(err.is_domain_error(), "{err}");
        // A northing past the pole does not fold back onto the other side.
        let err = proj.inverse(0.0, WGS84.a * 95.0_f64.to_radians()).unwrap_err();
        assert!(err.is_domain_error(), "{err}");
        assert!(proj.forward(0.0, std::f64::consts::FRAC_PI_2).is_ok());
    }

    #[test]
    fn test_polar_lat_ts_rejected() {
        let def = parse_definition("+proj=eqc +lat_ts=90").unwrap();
        assert!(matches!(
            Equirectangular::from_definition(&def),
            Err(ProjError::InvalidParameter(_))
        ));
    }
}
