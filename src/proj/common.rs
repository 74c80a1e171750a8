//! Common helpers for projection math (meridional arc, latitude conversions, etc.).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use crate::error::ProjError;

/// Tolerance used for pole and singularity tests.
pub const EPSLN: f64 = 1.0e-10;

/// Slack allowed on a trigonometric inverse argument before it is a failure.
pub const ASIN_TOLERANCE: f64 = 1.0e-9;

/// Iteration cap of the conformal-latitude solve.
pub const PHI2Z_MAX_ITER: usize = 15;

/// Iteration cap of the inverse meridional arc.
pub const INV_MLFN_MAX_ITER: usize = 6;

/// Just above π, so that ±π itself is never wrapped.
const SPI: f64 = 3.141_592_653_59;

/// Wraps a longitude difference back into [-π, π].
pub fn adjust_lon(x: f64) -> f64 {
    if x.abs() <= SPI {
        x
    } else {
        x - x.signum() * TAU
    }
}

/// Folds a latitude into [-π/2, π/2].
pub fn adjust_lat(x: f64) -> f64 {
    if x.abs() < FRAC_PI_2 {
        x
    } else {
        x - x.signum() * PI
    }
}

/// `asin` that tolerates rounding just past ±1 and rejects anything further.
pub fn asin_checked(v: f64, method: &'static str) -> Result<f64, ProjError> {
    if v.abs() > 1.0 + ASIN_TOLERANCE || v.is_nan() {
        return Err(ProjError::singularity(method, "asin argument out of range"));
    }
    Ok(v.clamp(-1.0, 1.0).asin())
}

/// Rejects a latitude past either pole; rounding within [`EPSLN`] is allowed.
pub fn check_lat(lat: f64, method: &'static str) -> Result<(), ProjError> {
    if lat.abs() > FRAC_PI_2 + EPSLN || lat.is_nan() {
        return Err(ProjError::singularity(method, "latitude beyond a pole"));
    }
    Ok(())
}

/// m(φ) = cos φ / sqrt(1 - e² sin² φ), the parallel radius on a unit ellipsoid.
pub fn msfn(phi: f64, e2: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e2 * s * s).sqrt()
}

/// t(φ) = tan(π/4 - φ/2) / ((1 - e sin φ) / (1 + e sin φ))^(e/2).
pub fn tsfn(phi: f64, e: f64) -> f64 {
    let con = e * phi.sin();
    (FRAC_PI_4 - 0.5 * phi).tan() / ((1.0 - con) / (1.0 + con)).powf(0.5 * e)
}

/// Inverse of [`tsfn`]: recovers φ from t by fixed-point iteration.
///
/// Stops once the step drops to [`EPSLN`]; fails after [`PHI2Z_MAX_ITER`]
/// steps instead of looping on.
pub fn phi_from_ts(ts: f64, e: f64) -> Result<f64, ProjError> {
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..PHI2Z_MAX_ITER {
        let con = e * phi.sin();
        let dphi = FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(half_e)).atan() - phi;
        phi += dphi;
        if dphi.abs() <= EPSLN {
            return Ok(phi);
        }
    }
    log::debug!("phi2z: no convergence for ts={ts:e} after {PHI2Z_MAX_ITER} iterations");
    Err(ProjError::Convergence {
        method: "phi2z",
        iterations: PHI2Z_MAX_ITER,
    })
}

/// Coefficients of the meridional arc series in powers of e².
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeridianArc {
    en: [f64; 5],
    es: f64,
}

impl MeridianArc {
    pub fn new(es: f64) -> Self {
        const C00: f64 = 1.0;
        const C02: f64 = 0.25;
        const C04: f64 = 0.046_875;
        const C06: f64 = 0.019_531_25;
        const C08: f64 = 0.010_681_152_343_75;
        const C22: f64 = 0.75;
        const C44: f64 = 0.468_75;
        const C46: f64 = 0.013_020_833_333_333_333;
        const C48: f64 = 0.007_120_768_229_166_667;
        const C66: f64 = 0.364_583_333_333_333_3;
        const C68: f64 = 0.005_696_614_583_333_333;
        const C88: f64 = 0.307_617_187_5;

        let mut en = [0.0; 5];
        en[0] = C00 - es * (C02 + es * (C04 + es * (C06 + es * C08)));
        en[1] = es * (C22 - es * (C04 + es * (C06 + es * C08)));
        let mut t = es * es;
        en[2] = t * (C44 - es * (C46 + es * C48));
        t *= es;
        en[3] = t * (C66 - es * C68);
        en[4] = t * es * C88;
        Self { en, es }
    }

    /// Meridional distance from the equator to φ on an ellipsoid with a = 1.
    pub fn distance(&self, phi: f64) -> f64 {
        let (sphi, cphi) = phi.sin_cos();
        let cs = cphi * sphi;
        let s2 = sphi * sphi;
        let en = &self.en;
        en[0] * phi - cs * (en[1] + s2 * (en[2] + s2 * (en[3] + s2 * en[4])))
    }

    /// Footpoint latitude for a unit-ellipsoid meridional distance, by Newton
    /// refinement capped at [`INV_MLFN_MAX_ITER`] steps.
    pub fn latitude(&self, arc: f64) -> Result<f64, ProjError> {
        let k = 1.0 / (1.0 - self.es);
        let mut phi = arc;
        for _ in 0..INV_MLFN_MAX_ITER {
            let s = phi.sin();
            let t = 1.0 - self.es * s * s;
            let step = (self.distance(phi) - arc) * (t * t.sqrt()) * k;
            phi -= step;
            if step.abs() < EPSLN {
                return Ok(phi);
            }
        }
        log::debug!("inv_mlfn: no convergence for arc={arc} after {INV_MLFN_MAX_ITER} iterations");
        Err(ProjError::Convergence {
            method: "inv_mlfn",
            iterations: INV_MLFN_MAX_ITER,
        })
    }
}
