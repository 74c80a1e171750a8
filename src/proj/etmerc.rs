//! Extended Transverse Mercator: Krüger n-series, 6th order.
//!
//! Implements the Karney (2011) formulation with 6th-order α/β series
//! coefficients, accurate far from the central meridian. `utm` is this
//! projection with the zone's fixed origin and scale.

use std::f64::consts::PI;

use crate::crs::Definition;
use crate::error::ProjError;
use crate::proj::common::{adjust_lon, check_lat};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::{Method, Projection};

pub const METHOD: Method = Method {
    names: &[
        "etmerc",
        "Extended_Transverse_Mercator",
        "Extended Transverse Mercator",
    ],
    init,
};

pub const UTM_METHOD: Method = Method {
    names: &["utm", "Universal Transverse Mercator System"],
    init: init_utm,
};

/// Newton iteration cap when recovering τ from τ'.
const TAU_MAX_ITER: usize = 15;

pub fn init(def: &Definition) -> Result<Box<dyn Projection>, ProjError> {
    Ok(Box::new(ExtendedTransverseMercator::new(
        def.ellipsoid(),
        def.long0(),
        def.lat0(),
        def.k0,
        def.x0(),
        def.y0(),
    )))
}

pub fn init_utm(def: &Definition) -> Result<Box<dyn Projection>, ProjError> {
    let zone = match def.params.zone {
        Some(zone) => zone,
        None => zone_from_longitude(def.long0()),
    };
    let mut tm = ExtendedTransverseMercator::utm_zone(def.ellipsoid(), zone, def.params.south);
    tm.name = "utm";
    Ok(Box::new(tm))
}

/// UTM zone containing a longitude in radians.
pub fn zone_from_longitude(lon: f64) -> u8 {
    let zone = ((adjust_lon(lon) + PI) * 30.0 / PI).floor() as i64 + 1;
    zone.clamp(1, 60) as u8
}

#[derive(Clone, Debug)]
pub struct ExtendedTransverseMercator {
    name: &'static str,
    ellipsoid: Ellipsoid,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    // Precomputed constants
    a_hat: f64,      // A = a/(1+n) * (1 + n²/4 + n⁴/64)
    alpha: [f64; 6], // Forward series coefficients
    beta: [f64; 6],  // Inverse series coefficients
    m0: f64,         // Normalized meridional arc at lat0
}

impl ExtendedTransverseMercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = ellipsoid.n;
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let a_hat = ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0);

        let alpha = Self::alpha_coefficients(n, n2, n3, n4, n5, n6);
        let beta = Self::beta_coefficients(n, n2, n3, n4, n5, n6);

        let m0 = Self::meridional_arc_normalized(lat0, n);

        Self {
            name: "etmerc",
            ellipsoid,
            lon0,
            k0,
            false_easting,
            false_northing,
            a_hat,
            alpha,
            beta,
            m0,
        }
    }

    /// UTM zone `zone` on `ellipsoid`: central meridian (6·zone - 183)°,
    /// k₀ = 0.9996, false easting 500 km, false northing 10 000 km when south.
    pub fn utm_zone(ellipsoid: Ellipsoid, zone: u8, south: bool) -> Self {
        let lon0 = (6.0 * f64::from(zone) - 183.0).to_radians();
        let false_northing = if south { 10_000_000.0 } else { 0.0 };
        Self::new(ellipsoid, lon0, 0.0, 0.9996, 500_000.0, false_northing)
    }

    /// Forward series coefficients α₁..α₆ (Krüger, 6th order).
    fn alpha_coefficients(n: f64, n2: f64, n3: f64, n4: f64, n5: f64, n6: f64) -> [f64; 6] {
        [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5
                + 7891.0 / 37800.0 * n6,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
                - 1983433.0 / 1935360.0 * n6,
            61.0 / 240.0 * n3 - 103.0 / 140.0 * n4
                + 15061.0 / 26880.0 * n5
                + 167603.0 / 181440.0 * n6,
            49561.0 / 161280.0 * n4 - 179.0 / 168.0 * n5 + 6601661.0 / 7257600.0 * n6,
            34729.0 / 80640.0 * n5 - 3418889.0 / 1995840.0 * n6,
            212378941.0 / 319334400.0 * n6,
        ]
    }

    /// Inverse series coefficients β₁..β₆ (Krüger, 6th order).
    fn beta_coefficients(n: f64, n2: f64, n3: f64, n4: f64, n5: f64, n6: f64) -> [f64; 6] {
        [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
                + 96199.0 / 604800.0 * n6,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                - 1118711.0 / 3870720.0 * n6,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
            4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5 - 830251.0 / 7257600.0 * n6,
            4583.0 / 161280.0 * n5 - 108847.0 / 3991680.0 * n6,
            20648693.0 / 638668800.0 * n6,
        ]
    }

    /// Rectifying latitude μ(φ), the meridional arc in units of A.
    fn meridional_arc_normalized(phi: f64, n: f64) -> f64 {
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;

        let a2 = -3.0 / 2.0 * n + 9.0 / 16.0 * n3;
        let a4 = 15.0 / 16.0 * n2 - 15.0 / 32.0 * n4;
        let a6 = -35.0 / 48.0 * n3;
        let a8 = 315.0 / 512.0 * n4;

        phi + a2 * (2.0 * phi).sin()
            + a4 * (4.0 * phi).sin()
            + a6 * (6.0 * phi).sin()
            + a8 * (8.0 * phi).sin()
    }

    /// Geodetic tangent τ to conformal tangent τ'.
    fn tau_to_tau_prime(&self, tau: f64) -> f64 {
        let e = self.ellipsoid.eccentricity();
        let tau1 = tau.hypot(1.0);
        let sigma = (e * (e * tau / tau1).atanh()).sinh();
        tau * sigma.hypot(1.0) - sigma * tau1
    }

    /// Conformal tangent τ' back to geodetic tangent τ by Newton iteration.
    fn tau_prime_to_tau(&self, tau_prime: f64) -> Result<f64, ProjError> {
        let e = self.ellipsoid.eccentricity();
        let e2 = self.ellipsoid.e2;
        let mut tau = tau_prime;

        for _ in 0..TAU_MAX_ITER {
            let tau1 = tau.hypot(1.0);
            let sigma = (e * (e * tau / tau1).atanh()).sinh();
            let tau_prime_est = tau * sigma.hypot(1.0) - sigma * tau1;
            let dtau = (tau_prime - tau_prime_est) * (1.0 + (1.0 - e2) * tau * tau)
                / ((1.0 - e2) * tau1 * tau_prime_est.hypot(1.0));
            tau += dtau;
            if dtau.abs() < 1e-12 * (1.0 + tau.abs()) {
                return Ok(tau);
            }
        }
        log::debug!("etmerc: tau iteration did not converge for tau'={tau_prime}");
        Err(ProjError::Convergence {
            method: self.name,
            iterations: TAU_MAX_ITER,
        })
    }
}

impl Projection for ExtendedTransverseMercator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        check_lat(lat, self.name)?;
        let dlam = adjust_lon(lon - self.lon0);

        let tau = lat.tan();
        let tau_prime = self.tau_to_tau_prime(tau);

        let xi_prime = tau_prime.atan2(dlam.cos());
        let eta_prime = (dlam.sin() / tau_prime.hypot(dlam.cos())).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, &a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += a * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        let x = self.k0 * self.a_hat * eta + self.false_easting;
        let y = self.k0 * self.a_hat * (xi - self.m0) + self.false_northing;
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::singularity(self.name, "point outside the projection"));
        }
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let eta = (x - self.false_easting) / (self.k0 * self.a_hat);
        let xi = (y - self.false_northing) / (self.k0 * self.a_hat) + self.m0;
        if !(eta.is_finite() && xi.is_finite()) {
            return Err(ProjError::singularity(self.name, "non-finite input"));
        }

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, &b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_prime -= b * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let cos_xi = xi_prime.cos();
        let tau_prime = xi_prime.sin() / sinh_eta.hypot(cos_xi);

        let tau = self.tau_prime_to_tau(tau_prime)?;

        let lat = tau.atan();
        let lon = adjust_lon(self.lon0 + sinh_eta.atan2(cos_xi));
        Ok((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::parse_definition;
    use crate::proj::ellipsoid::WGS84;
    use approx::assert_relative_eq;

    fn utm(zone: u8, south: bool) -> ExtendedTransverseMercator {
        ExtendedTransverseMercator::utm_zone(WGS84, zone, south)
    }

    #[test]
    fn test_roundtrip_utm33() {
        let tm = utm(33, false);
        let cases: &[(f64, f64)] = &[
            (15.0, 52.0), // Berlin area (central meridian)
            (12.0, 50.0), // near zone boundary
            (18.0, 50.0), // near other boundary
            (15.0, 0.0),  // equator
            (15.0, 80.0), // high latitude
            (13.5, 52.5), // off-center
        ];
        for &(lon_deg, lat_deg) in cases {
            let lon = lon_deg.to_radians();
            let lat = lat_deg.to_radians();
            let (x, y) = tm.forward(lon, lat).unwrap();
            let (lon2, lat2) = tm.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_utm_zone33n_known_point() {
        let tm = utm(33, false);
        let (e, n) = tm
            .forward(15.0_f64.to_radians(), 52.0_f64.to_radians())
            .unwrap();
        assert_relative_eq!(e, 500_000.0, epsilon = 1e-6);
        assert_relative_eq!(n, 5_761_038.212_6, epsilon = 1e-3);
    }

    #[test]
    fn test_utm_zone_central_meridian() {
        assert_relative_eq!(utm(1, false).lon0, (-177.0_f64).to_radians(), epsilon = 1e-10);
        assert_relative_eq!(utm(33, false).lon0, 15.0_f64.to_radians(), epsilon = 1e-10);
        assert_relative_eq!(utm(60, false).lon0, 177.0_f64.to_radians(), epsilon = 1e-10);
    }

    #[test]
    fn test_southern_hemisphere() {
        let tm = utm(33, true);
        let lon = 15.0_f64.to_radians();
        let lat = (-30.0_f64).to_radians();
        let (x, y) = tm.forward(lon, lat).unwrap();
        assert!(y > 0.0, "Southing should be positive with FN=10M, got {y}");
        let (lon2, lat2) = tm.inverse(x, y).unwrap();
        assert_relative_eq!(lon2, lon, epsilon = 1e-9);
        assert_relative_eq!(lat2, lat, epsilon = 1e-9);
    }

    #[test]
    fn test_wide_offsets_stay_accurate() {
        let tm = ExtendedTransverseMercator::new(WGS84, 0.0, 0.0, 1.0, 0.0, 0.0);
        for &(lon_deg, lat_deg) in &[(20.0, 10.0), (35.0, 60.0), (-40.0, -45.0)] {
            let lon = f64::to_radians(lon_deg);
            let lat = f64::to_radians(lat_deg);
            let (x, y) = tm.forward(lon, lat).unwrap();
            let (lon2, lat2) = tm.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zone_from_longitude() {
        assert_eq!(zone_from_longitude(15.0_f64.to_radians()), 33);
        assert_eq!(zone_from_longitude((-177.0_f64).to_radians()), 1);
        assert_eq!(zone_from_longitude(179.9_f64.to_radians()), 60);
        assert_eq!(zone_from_longitude(PI), 60);
    }

    #[test]
    fn test_init_utm_from_definition() {
        let def = parse_definition("+proj=utm +zone=32 +south +ellps=GRS80").unwrap();
        let proj = init_utm(&def).unwrap();
        assert_eq!(proj.name(), "utm");
        let (x, y) = proj.forward(9.0_f64.to_radians(), 0.0).unwrap();
        assert_relative_eq!(x, 500_000.0, epsilon = 1e-6);
        assert_relative_eq!(y, 10_000_000.0, epsilon = 1e-6);

        let inferred = parse_definition("+proj=utm +lon_0=-74").unwrap();
        let (x, _) = init_utm(&inferred)
            .unwrap()
            .forward((-75.0_f64).to_radians(), 40.0_f64.to_radians())
            .unwrap();
        assert_relative_eq!(x, 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_rejects_non_finite() {
        assert!(utm(31, false).inverse(f64::INFINITY, 0.0).unwrap_err().is_domain_error());
    }

    #[test]
    fn test_forward_rejects_latitude_past_pole() {
        let tm = utm(33, false);
        for lat in [95.0_f64, -90.5, f64::NAN] {
            let err = tm.forward(15.0_f64.to_radians(), lat.to_radians()).unwrap_err();
            assert!(matches!(err, ProjError::Singularity { .. }), "{err}");
        }
    }
}
