//! Mercator projection, ellipsoidal and spherical.
//!
//! Ellipsoidal:
//!   forward: x = x₀ + a·k₀·(λ - λ₀), y = y₀ - a·k₀·ln(tsfn(φ, e))
//!   inverse: λ = λ₀ + (x - x₀)/(a·k₀), φ = phi_from_ts(exp(-(y - y₀)/(a·k₀)), e)
//!
//! Spherical (e.g. EPSG:3857):
//!   forward: y = y₀ + a·k₀·ln(tan(π/4 + φ/2))
//!   inverse: φ = π/2 - 2·atan(exp(-(y - y₀)/(a·k₀)))
//!
//! A standard parallel `lat_ts` overrides k₀ with the parallel's scale.
//! Both poles are singular.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::crs::Definition;
use crate::error::ProjError;
use crate::proj::common::{adjust_lon, msfn, phi_from_ts, tsfn, EPSLN};
use crate::proj::{Method, Projection};

pub const METHOD: Method = Method {
    names: &[
        "merc",
        "Mercator",
        "Mercator_1SP",
        "Mercator_2SP",
        "Mercator_Auxiliary_Sphere",
        "Popular Visualisation Pseudo Mercator",
        "Pseudo_Mercator",
    ],
    init,
};

pub fn init(def: &Definition) -> Result<Box<dyn Projection>, ProjError> {
    Ok(Box::new(Mercator::from_definition(def)))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mercator {
    a: f64,
    e: f64,
    sphere: bool,
    long0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Mercator {
    pub fn from_definition(def: &Definition) -> Self {
        let k0 = match def.params.lat_ts {
            Some(lat_ts) if lat_ts != 0.0 => {
                if def.sphere {
                    lat_ts.cos()
                } else {
                    msfn(lat_ts, def.es)
                }
            }
            _ => def.k0,
        };
        Self {
            a: def.a,
            e: def.e,
            sphere: def.sphere,
            long0: def.long0(),
            k0,
            false_easting: def.x0(),
            false_northing: def.y0(),
        }
    }

    /// Spherical Web Mercator (EPSG:3857 parameters).
    pub fn web() -> Self {
        Self {
            a: 6_378_137.0,
            e: 0.0,
            sphere: true,
            long0: 0.0,
            k0: 1.0,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }
}

impl Projection for Mercator {
    fn name(&self) -> &'static str {
        "merc"
    }

    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        if (lat.abs() - FRAC_PI_2).abs() <= EPSLN {
            return Err(ProjError::singularity("merc", "latitude at a pole"));
        }
        let ak0 = self.a * self.k0;
        let x = self.false_easting + ak0 * adjust_lon(lon - self.long0);
        let y = if self.sphere {
            self.false_northing + ak0 * (FRAC_PI_4 + 0.5 * lat).tan().ln()
        } else {
            self.false_northing - ak0 * tsfn(lat, self.e).ln()
        };
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::singularity("merc", "latitude outside the projection"));
        }
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::singularity("merc", "non-finite input"));
        }
        let ak0 = self.a * self.k0;
        let ts = (-(y - self.false_northing) / ak0).exp();
        let lat = if self.sphere {
            FRAC_PI_2 - 2.0 * ts.atan()
        } else {
            phi_from_ts(ts, self.e)?
        };
        // Large |y| lands on a pole, where longitude is undefined.
        if (lat.abs() - FRAC_PI_2).abs() <= EPSLN {
            return Err(ProjError::singularity("merc", "northing maps to a pole"));
        }
        let lon = adjust_lon(self.long0 + (x - self.false_easting) / ak0);
        Ok((lon, lat))
    }
}
