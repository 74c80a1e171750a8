//! Transverse Mercator projection, Snyder's series.
//!
//! Ellipsoidal forward expands in powers of the longitude offset around the
//! meridional arc; the inverse recovers the footpoint latitude from the arc
//! by Newton refinement (see [`MeridianArc::latitude`]). A sphere uses the
//! closed forms. For the wide-zone Krüger series see [`crate::proj::etmerc`].

use std::f64::consts::FRAC_PI_2;

use crate::crs::Definition;
use crate::error::ProjError;
use crate::proj::common::{adjust_lon, asin_checked, check_lat, MeridianArc, EPSLN};
use crate::proj::{Method, Projection};

pub const METHOD: Method = Method {
    names: &[
        "tmerc",
        "Transverse_Mercator",
        "Transverse Mercator",
        "Gauss_Kruger",
        "Gauss Kruger",
    ],
    init,
};

pub fn init(def: &Definition) -> Result<Box<dyn Projection>, ProjError> {
    Ok(Box::new(TransverseMercator::from_definition(def)))
}

#[derive(Clone, Debug)]
pub struct TransverseMercator {
    a: f64,
    es: f64,
    ep2: f64,
    long0: f64,
    lat0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    /// Meridional arc series; `None` on a sphere.
    arc: Option<MeridianArc>,
    /// Unit-ellipsoid arc length at lat0.
    ml0: f64,
}

impl TransverseMercator {
    pub fn from_definition(def: &Definition) -> Self {
        let lat0 = def.lat0();
        let arc = (def.es != 0.0).then(|| MeridianArc::new(def.es));
        let ml0 = arc.map_or(0.0, |arc| arc.distance(lat0));
        Self {
            a: def.a,
            es: def.es,
            ep2: def.ep2,
            long0: def.long0(),
            lat0,
            k0: def.k0,
            false_easting: def.x0(),
            false_northing: def.y0(),
            arc,
            ml0,
        }
    }

    fn forward_sphere(&self, dlon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let cos_phi = lat.cos();
        let b = cos_phi * dlon.sin();
        if (b.abs() - 1.0).abs() < EPSLN {
            return Err(ProjError::singularity("tmerc", "point 90 degrees from the central meridian"));
        }
        let x = 0.5 * self.a * self.k0 * ((1.0 + b) / (1.0 - b)).ln();
        let mut y = cos_phi * dlon.cos() / (1.0 - b * b).sqrt();
        if y.abs() >= 1.0 {
            if y.abs() - 1.0 > EPSLN {
                return Err(ProjError::singularity("tmerc", "acos argument out of range"));
            }
            y = 0.0;
        } else {
            y = y.acos();
        }
        if lat < 0.0 {
            y = -y;
        }
        Ok((
            x + self.false_easting,
            self.a * self.k0 * (y - self.lat0) + self.false_northing,
        ))
    }

    fn inverse_sphere(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let f = (x / self.k0).exp();
        let g = 0.5 * (f - 1.0 / f);
        let d = self.lat0 + y / self.k0;
        let h = d.cos();
        let con = ((1.0 - h * h) / (1.0 + g * g)).sqrt();
        let mut lat = asin_checked(con, "tmerc")?;
        if d < 0.0 {
            lat = -lat;
        }
        let lon = if g == 0.0 && h == 0.0 {
            0.0
        } else {
            adjust_lon(g.atan2(h) + self.long0)
        };
        Ok((lon, lat))
    }
}

impl Projection for TransverseMercator {
    fn name(&self) -> &'static str {
        "tmerc"
    }

    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        check_lat(lat, "tmerc")?;
        let dlon = adjust_lon(lon - self.long0);
        let Some(arc) = &self.arc else {
            return self.forward_sphere(dlon, lat);
        };

        let (sin_phi, cos_phi) = lat.sin_cos();
        let mut al = cos_phi * dlon;
        let als = al * al;
        let c = self.ep2 * cos_phi * cos_phi;
        let cs = c * c;
        let tq = if cos_phi.abs() > EPSLN { lat.tan() } else { 0.0 };
        let t = tq * tq;
        let ts = t * t;
        let con = 1.0 - self.es * sin_phi * sin_phi;
        al /= con.sqrt();
        let ml = arc.distance(lat);

        let x = self.a
            * (self.k0
                * al
                * (1.0
                    + als / 6.0
                        * (1.0 - t
                            + c
                            + als / 20.0
                                * (5.0 - 18.0 * t + ts + 14.0 * c - 58.0 * t * c
                                    + als / 42.0 * (61.0 + 179.0 * ts - ts * t - 479.0 * t)))))
            + self.false_easting;
        let y = self.a
            * (self.k0
                * (ml - self.ml0
                    + sin_phi * dlon * al / 2.0
                        * (1.0
                            + als / 12.0
                                * (5.0 - t + 9.0 * c + 4.0 * cs
                                    + als / 30.0
                                        * (61.0 + ts - 58.0 * t + 270.0 * c - 330.0 * t * c
                                            + als / 56.0
                                                * (1385.0 + 543.0 * ts - ts * t - 3111.0 * t))))))
            + self.false_northing;

        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::singularity("tmerc", "non-finite result"));
        }
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::singularity("tmerc", "non-finite input"));
        }
        let x = (x - self.false_easting) / self.a;
        let y = (y - self.false_northing) / self.a;
        let Some(arc) = &self.arc else {
            return self.inverse_sphere(x, y);
        };

        let phi = arc.latitude(self.ml0 + y / self.k0)?;
        if phi.abs() > FRAC_PI_2 + EPSLN {
            return Err(ProjError::singularity("tmerc", "northing beyond the pole"));
        }
        if phi.abs() >= FRAC_PI_2 {
            return Ok((self.long0, FRAC_PI_2.copysign(phi)));
        }

        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = if cos_phi.abs() > EPSLN { phi.tan() } else { 0.0 };
        let c = self.ep2 * cos_phi * cos_phi;
        let cs = c * c;
        let t = tan_phi * tan_phi;
        let ts = t * t;
        let mut con = 1.0 - self.es * sin_phi * sin_phi;
        let d = x * con.sqrt() / self.k0;
        let ds = d * d;
        con *= tan_phi;

        let lat = phi
            - (con * ds / (1.0 - self.es))
                * 0.5
                * (1.0
                    - ds / 12.0
                        * (5.0 + 3.0 * t - 9.0 * c * t + c - 4.0 * cs
                            - ds / 30.0
                                * (61.0 + 90.0 * t - 252.0 * c * t + 45.0 * ts + 46.0 * c
                                    - ds / 56.0
                                        * (1385.0 + 3633.0 * t + 4095.0 * ts + 1574.0 * ts * t))));
        let lon = adjust_lon(
            self.long0
                + d * (1.0
                    - ds / 6.0
                        * (1.0 + 2.0 * t + c
                            - ds / 20.0
                                * (5.0 + 28.0 * t + 24.0 * ts + 8.0 * c * t + 6.0 * c
                                    - ds / 42.0
                                        * (61.0 + 662.0 * t + 1320.0 * ts + 720.0 * ts * t))))
                    / cos_phi,
        );
        Ok((lon, lat))
    }
}
