//! Datum shift between two geodetic positions, through geocentric WGS84.
//!
//! All positions are (longitude, latitude, height) in radians and metres.

use std::f64::consts::{FRAC_PI_2, PI};

use super::{Datum, DatumKind};
use crate::error::ProjError;

pub const WGS84_SEMI_MAJOR: f64 = 6_378_137.0;
pub const WGS84_SEMI_MINOR: f64 = 6_356_752.314;
pub const WGS84_ES: f64 = 0.006_694_379_990_141_316_5;

/// Convergence tolerance of the geocentric to geodetic iteration.
const GENAU: f64 = 1.0e-12;
const GEOCENTRIC_MAX_ITER: usize = 30;

/// Applies horizontal grid shifts for [`DatumKind::GridShift`] datums.
///
/// No grid loader ships with the crate; callers that have grids plug one in
/// through the pipeline builder.
pub trait GridShift: Send + Sync {
    /// Shifts `(lon, lat)` in radians onto WGS84, or back when `inverse`.
    fn shift(&self, grids: &[String], lon: f64, lat: f64, inverse: bool)
        -> Result<(f64, f64), ProjError>;
}

/// Geodetic (lon, lat, h) to earth-centred earth-fixed (x, y, z).
///
/// Latitudes overshooting a pole by less than 0.1% are clamped onto it;
/// anything further out is an error.
pub fn geodetic_to_geocentric(
    (lon, lat, h): (f64, f64, f64),
    es: f64,
    a: f64,
) -> Result<(f64, f64, f64), ProjError> {
    let lat = if lat < -FRAC_PI_2 && lat > -1.001 * FRAC_PI_2 {
        -FRAC_PI_2
    } else if lat > FRAC_PI_2 && lat < 1.001 * FRAC_PI_2 {
        FRAC_PI_2
    } else if !(-FRAC_PI_2..=FRAC_PI_2).contains(&lat) {
        return Err(ProjError::singularity("geocentric", "latitude out of range"));
    } else {
        lat
    };
    let lon = if lon > PI { lon - 2.0 * PI } else { lon };

    let (sin_lat, cos_lat) = lat.sin_cos();
    let rn = a / (1.0 - es * sin_lat * sin_lat).sqrt();
    Ok((
        (rn + h) * cos_lat * lon.cos(),
        (rn + h) * cos_lat * lon.sin(),
        (rn * (1.0 - es) + h) * sin_lat,
    ))
}

/// Earth-centred (x, y, z) back to geodetic (lon, lat, h).
///
/// Iterates on the latitude until the sine of the step falls under 1e-12.
/// At the iteration cap the last estimate is returned and a warning logged.
pub fn geocentric_to_geodetic((x, y, z): (f64, f64, f64), es: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let p = x.hypot(y);
    let rr = (x * x + y * y + z * z).sqrt();

    let lon = if p / a < GENAU {
        if rr / a < GENAU {
            return (0.0, FRAC_PI_2, -b);
        }
        0.0
    } else {
        y.atan2(x)
    };

    let ct = z / rr;
    let st = p / rr;
    let mut rx = 1.0 / (1.0 - es * (2.0 - es) * st * st).sqrt();
    let mut cphi0 = st * (1.0 - es) * rx;
    let mut sphi0 = ct * rx;
    let mut height;

    let mut iter = 0;
    loop {
        iter += 1;
        let rn = a / (1.0 - es * sphi0 * sphi0).sqrt();
        height = p * cphi0 + z * sphi0 - rn * (1.0 - es * sphi0 * sphi0);
        let rk = es * rn / (rn + height);
        rx = 1.0 / (1.0 - rk * (2.0 - rk) * st * st).sqrt();
        let cphi = st * (1.0 - rk) * rx;
        let sphi = ct * rx;
        let sdphi = sphi * cphi0 - cphi * sphi0;
        cphi0 = cphi;
        sphi0 = sphi;
        if sdphi * sdphi <= GENAU * GENAU {
            break;
        }
        if iter >= GEOCENTRIC_MAX_ITER {
            log::warn!(
                "geocentric to geodetic: no convergence after {GEOCENTRIC_MAX_ITER} iterations at ({x}, {y}, {z})"
            );
            break;
        }
    }

    (lon, (sphi0 / cphi0.abs()).atan(), height)
}

/// Geocentric coordinates of a datum onto WGS84.
pub fn geocentric_to_wgs84((x, y, z): (f64, f64, f64), kind: &DatumKind) -> (f64, f64, f64) {
    match *kind {
        DatumKind::ThreeParam { dx, dy, dz } => (x + dx, y + dy, z + dz),
        DatumKind::SevenParam {
            dx,
            dy,
            dz,
            rx,
            ry,
            rz,
            scale,
        } => (
            scale * (x - rz * y + ry * z) + dx,
            scale * (rz * x + y - rx * z) + dy,
            scale * (-ry * x + rx * y + z) + dz,
        ),
        _ => (x, y, z),
    }
}

/// Geocentric WGS84 coordinates onto a datum; inverse of [`geocentric_to_wgs84`].
pub fn geocentric_from_wgs84((x, y, z): (f64, f64, f64), kind: &DatumKind) -> (f64, f64, f64) {
    match *kind {
        DatumKind::ThreeParam { dx, dy, dz } => (x - dx, y - dy, z - dz),
        DatumKind::SevenParam {
            dx,
            dy,
            dz,
            rx,
            ry,
            rz,
            scale,
        } => {
            let xt = (x - dx) / scale;
            let yt = (y - dy) / scale;
            let zt = (z - dz) / scale;
            (
                xt + rz * yt - ry * zt,
                -rz * xt + yt + rx * zt,
                ry * xt - rx * yt + zt,
            )
        }
        _ => (x, y, z),
    }
}

/// Moves a geodetic position from the `src` datum to the `dst` datum.
///
/// Comparable datums, or either side without datum information, return the
/// input untouched. Grid-shift datums need a `grid_shift` hook.
pub fn datum_transform(
    src: &Datum,
    dst: &Datum,
    point: (f64, f64, f64),
    grid_shift: Option<&dyn GridShift>,
) -> Result<(f64, f64, f64), ProjError> {
    if src.is_comparable(dst) || src.is_none() || dst.is_none() {
        log::trace!("datum shift skipped: {:?} -> {:?}", src.kind, dst.kind);
        return Ok(point);
    }
    let (mut lon, mut lat, h) = point;

    let (src_a, src_es) = match &src.kind {
        DatumKind::GridShift { grids } => {
            (lon, lat) = apply_grid_shift(grid_shift, grids, lon, lat, false)?;
            (WGS84_SEMI_MAJOR, WGS84_ES)
        }
        _ => (src.a, src.es),
    };
    let (dst_a, dst_b, dst_es) = match &dst.kind {
        DatumKind::GridShift { .. } => (WGS84_SEMI_MAJOR, WGS84_SEMI_MINOR, WGS84_ES),
        _ => (dst.a, dst.b, dst.es),
    };

    let (mut lon, mut lat, h) = if src_es == dst_es
        && src_a == dst_a
        && !src.kind.has_helmert()
        && !dst.kind.has_helmert()
    {
        (lon, lat, h)
    } else {
        log::trace!("datum shift via geocentric: {:?} -> {:?}", src.kind, dst.kind);
        let mut xyz = geodetic_to_geocentric((lon, lat, h), src_es, src_a)?;
        xyz = geocentric_to_wgs84(xyz, &src.kind);
        xyz = geocentric_from_wgs84(xyz, &dst.kind);
        geocentric_to_geodetic(xyz, dst_es, dst_a, dst_b)
    };

    if let DatumKind::GridShift { grids } = &dst.kind {
        (lon, lat) = apply_grid_shift(grid_shift, grids, lon, lat, true)?;
    }
    if !(lon.is_finite() && lat.is_finite() && h.is_finite()) {
        return Err(ProjError::TransformFailed(format!(
            "datum shift produced a non-finite position ({lon}, {lat}, {h})"
        )));
    }
    Ok((lon, lat, h))
}

fn apply_grid_shift(
    hook: Option<&dyn GridShift>,
    grids: &[String],
    lon: f64,
    lat: f64,
    inverse: bool,
) -> Result<(f64, f64), ProjError> {
    match hook {
        Some(hook) => hook.shift(grids, lon, lat, inverse),
        None => Err(ProjError::GridShiftUnavailable(grids.join(","))),
    }
}
