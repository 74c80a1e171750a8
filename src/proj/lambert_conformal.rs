//! Lambert Conformal Conic projection, 1SP and 2SP variants.
//!
//! A single standard parallel (`lat_1` only, or `lat_1 == lat_2`) gives the
//! tangent cone with n = sin φ₁; two give the secant cone. k₀ scales both
//! ordinates. The inverse latitude uses the same capped solver as Mercator.

use std::f64::consts::FRAC_PI_2;

use crate::crs::Definition;
use crate::error::ProjError;
use crate::proj::common::{adjust_lon, check_lat, msfn, phi_from_ts, tsfn, EPSLN};
use crate::proj::{Method, Projection};

pub const METHOD: Method = Method {
    names: &[
        "lcc",
        "Lambert_Conformal_Conic",
        "Lambert_Conformal_Conic_1SP",
        "Lambert_Conformal_Conic_2SP",
        "Lambert Conic Conformal (1SP)",
        "Lambert Conic Conformal (2SP)",
    ],
    init,
};

pub fn init(def: &Definition) -> Result<Box<dyn Projection>, ProjError> {
    Ok(Box::new(LambertConformalConic::from_definition(def)?))
}

#[derive(Clone, Debug)]
pub struct LambertConformalConic {
    a: f64,
    e: f64,
    lon0: f64,
    k0: f64,
    n: f64,     // cone constant
    f_val: f64, // F = m₁/(n·t₁ⁿ)
    rho0: f64,  // ρ₀ = a·F·t₀ⁿ
    false_easting: f64,
    false_northing: f64,
}

impl LambertConformalConic {
    pub fn from_definition(def: &Definition) -> Result<Self, ProjError> {
        let lat1 = def.params.lat1.unwrap_or(0.0);
        let lat2 = def.params.lat2.unwrap_or(lat1);
        Self::new(
            def.a,
            def.es,
            def.long0(),
            def.lat0(),
            lat1,
            lat2,
            def.k0,
            def.x0(),
            def.y0(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a: f64,
        es: f64,
        lon0: f64,
        lat0: f64,
        lat1: f64,
        lat2: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<Self, ProjError> {
        if (lat1 + lat2).abs() < EPSLN {
            return Err(ProjError::InvalidParameter(
                "lcc: standard parallels symmetric about the equator".to_string(),
            ));
        }
        let e = es.sqrt();

        let m1 = msfn(lat1, es);
        let m2 = msfn(lat2, es);
        let t1 = tsfn(lat1, e);
        let t2 = tsfn(lat2, e);
        let t0 = if (lat0.abs() - FRAC_PI_2).abs() < EPSLN {
            0.0
        } else {
            tsfn(lat0, e)
        };

        let mut n = if (lat1 - lat2).abs() > EPSLN {
            (m1 / m2).ln() / (t1 / t2).ln()
        } else {
            lat1.sin()
        };
        if n.is_nan() {
            n = lat1.sin();
        }

        let f_val = m1 / (n * t1.powf(n));
        let rho0 = a * f_val * t0.powf(n);
        if !(f_val.is_finite() && rho0.is_finite()) {
            return Err(ProjError::InvalidParameter(
                "lcc: degenerate cone for the given parallels".to_string(),
            ));
        }

        Ok(Self {
            a,
            e,
            lon0,
            k0,
            n,
            f_val,
            rho0,
            false_easting,
            false_northing,
        })
    }
}

impl Projection for LambertConformalConic {
    fn name(&self) -> &'static str {
        "lcc"
    }

    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        check_lat(lat, "lcc")?;
        // The apex pole maps to a point; the opposite one to infinity.
        let rho = if (lat.abs() - FRAC_PI_2).abs() > EPSLN {
            self.a * self.f_val * tsfn(lat, self.e).powf(self.n)
        } else {
            if lat * self.n <= 0.0 {
                return Err(ProjError::singularity("lcc", "pole opposite the cone apex"));
            }
            0.0
        };
        let theta = self.n * adjust_lon(lon - self.lon0);

        let x = self.k0 * (rho * theta.sin()) + self.false_easting;
        let y = self.k0 * (self.rho0 - rho * theta.cos()) + self.false_northing;
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::singularity("lcc", "non-finite result"));
        }
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let x_ = (x - self.false_easting) / self.k0;
        let y_ = self.rho0 - (y - self.false_northing) / self.k0;
        if !(x_.is_finite() && y_.is_finite()) {
            return Err(ProjError::singularity("lcc", "non-finite input"));
        }

        // For n < 0, flip signs before computing angle and radius
        let (rho, sign) = if self.n > 0.0 {
            (x_.hypot(y_), 1.0)
        } else {
            (-x_.hypot(y_), -1.0)
        };
        let theta = if rho != 0.0 {
            (sign * x_).atan2(sign * y_)
        } else {
            0.0
        };

        let lat = if rho != 0.0 || self.n > 0.0 {
            let ts = (rho / (self.a * self.f_val)).powf(1.0 / self.n);
            phi_from_ts(ts, self.e)?
        } else {
            -FRAC_PI_2
        };
        let lon = adjust_lon(theta / self.n + self.lon0);

        Ok((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::parse_definition;
    use approx::assert_relative_eq;

    fn lcc(text: &str) -> LambertConformalConic {
        LambertConformalConic::from_definition(&parse_definition(text).unwrap()).unwrap()
    }

    const LAMBERT_93: &str = "+proj=lcc +lat_1=49 +lat_2=44 +lat_0=46.5 +lon_0=3 +x_0=700000 +y_0=6600000 +ellps=GRS80";

    #[test]
    fn test_2sp_roundtrip() {
        let proj = lcc(LAMBERT_93);
        let cases: &[(f64, f64)] = &[
            (3.0, 46.5),    // origin
            (2.35, 48.86),  // Paris
            (-1.55, 47.22), // Nantes
            (7.75, 48.58),  // Strasbourg
        ];
        for &(lon_deg, lat_deg) in cases {
            let lon = lon_deg.to_radians();
            let lat = lat_deg.to_radians();
            let (x, y) = proj.forward(lon, lat).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_origin_point() {
        let proj = lcc(LAMBERT_93);
        let (x, y) = proj
            .forward(3.0_f64.to_radians(), 46.5_f64.to_radians())
            .unwrap();
        assert_relative_eq!(x, 700_000.0, epsilon = 1e-6);
        assert_relative_eq!(y, 6_600_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lambert_93_paris() {
        // Paris (2.3522E, 48.8566N) in RGF93 / Lambert-93.
        let (x, y) = lcc(LAMBERT_93)
            .forward(2.3522_f64.to_radians(), 48.8566_f64.to_radians())
            .unwrap();
        assert_relative_eq!(x, 652_469.02, epsilon = 0.05);
        assert_relative_eq!(y, 6_862_035.26, epsilon = 0.05);
    }

    #[test]
    fn test_1sp_roundtrip() {
        // lat_1 defaults to lat_0: tangent cone.
        let proj = lcc("+proj=lcc +lat_0=45 +lon_0=0 +k_0=0.99987742 +ellps=WGS84");
        assert_relative_eq!(proj.n, 45.0_f64.to_radians().sin(), epsilon = 1e-12);
        let lon = 5.0_f64.to_radians();
        let lat = 48.0_f64.to_radians();
        let (x, y) = proj.forward(lon, lat).unwrap();
        let (lon2, lat2) = proj.inverse(x, y).unwrap();
        assert_relative_eq!(lon2, lon, epsilon = 1e-9);
        assert_relative_eq!(lat2, lat, epsilon = 1e-9);
    }

    #[test]
    fn test_k0_scales_both_axes() {
        let unit = lcc("+proj=lcc +lat_1=33 +lat_2=45 +lat_0=39 +lon_0=-96 +ellps=WGS84");
        let scaled = lcc("+proj=lcc +lat_1=33 +lat_2=45 +lat_0=39 +lon_0=-96 +k=0.5 +ellps=WGS84");
        let p = ((-87.6_f64).to_radians(), 41.9_f64.to_radians());
        let (x1, y1) = unit.forward(p.0, p.1).unwrap();
        let (x2, y2) = scaled.forward(p.0, p.1).unwrap();
        assert_relative_eq!(x2, 0.5 * x1, epsilon = 1e-6);
        assert_relative_eq!(y2, 0.5 * y1, epsilon = 1e-6);
    }

    #[test]
    fn test_southern_cone() {
        let proj = lcc("+proj=lcc +lat_1=-20 +lat_2=-40 +lat_0=-30 +lon_0=130 +ellps=GRS80");
        assert!(proj.n < 0.0);
        let lon = 135.0_f64.to_radians();
        let lat = (-25.0_f64).to_radians();
        let (x, y) = proj.forward(lon, lat).unwrap();
        let (lon2, lat2) = proj.inverse(x, y).unwrap();
        assert_relative_eq!(lon2, lon, epsilon = 1e-9);
        assert_relative_eq!(lat2, lat, epsilon = 1e-9);
    }

    #[test]
    fn test_opposite_pole_is_singular() {
        let proj = lcc(LAMBERT_93);
        assert!(proj.forward(0.0, -FRAC_PI_2).unwrap_err().is_domain_error());
        // The apex pole itself maps to a point.
        assert!(proj.forward(0.0, FRAC_PI_2).is_ok());
    }

    #[test]
    fn test_symmetric_parallels_rejected() {
        let def = parse_definition("+proj=lcc +lat_1=30 +lat_2=-30").unwrap();
        assert!(matches!(
            LambertConformalConic::from_definition(&def),
            Err(ProjError::InvalidParameter(_))
        ));
    }
}
