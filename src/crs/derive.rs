//! Turns a [`RawDefinition`] into a [`Definition`]: resolves the ellipsoid,
//! derives its eccentricities and attaches the datum.

use crate::crs::units;
use crate::crs::{Definition, RawDefinition};
use crate::datum::{self, Datum};
use crate::error::ParseError;
use crate::proj::common::EPSLN;
use crate::proj::ellipsoid::{self, Ellipsoid, WGS84};

/// Authalic radius series coefficients.
const SIXTH: f64 = 1.0 / 6.0;
const RA4: f64 = 17.0 / 360.0;
const RA6: f64 = 67.0 / 3024.0;

pub fn derive(raw: &RawDefinition) -> Result<Definition, ParseError> {
    let method = raw.proj.clone().ok_or(ParseError::MissingProjection)?;

    let named_datum = match raw.datum.as_deref() {
        None | Some("none") => None,
        Some(code) => Some(datum::lookup(code)?),
    };
    // The datum's own ellipsoid applies unless the axes were given outright.
    let ellps = match named_datum {
        Some(named) if raw.a.is_none() && raw.r.is_none() => Some(named.ellps.to_string()),
        _ => raw.ellps.clone(),
    };

    let (a, b, sphere) = shape(raw, ellps.as_deref())?;
    let true_ellipsoid = Ellipsoid::from_axes(a, b);

    let (a, b, es) = if raw.r_a && !sphere {
        let es = true_ellipsoid.e2;
        let r = a * (1.0 - es * (SIXTH + es * (RA4 + es * RA6)));
        (r, r, 0.0)
    } else {
        (a, b, true_ellipsoid.e2)
    };
    let ep2 = (a * a - b * b) / (b * b);

    let to_meter = match (raw.to_meter, raw.units.as_deref()) {
        (Some(factor), _) => Some(factor),
        (None, Some(name)) if !units::is_angular(name) => Some(
            units::to_meter(name).ok_or_else(|| ParseError::UnknownUnit(name.to_string()))?,
        ),
        _ => None,
    };

    let mut params = raw.params.clone();
    if params.lat1.is_none() {
        params.lat1 = params.lat0;
    }

    let datum = Datum::resolve(
        raw.datum.as_deref(),
        raw.towgs84.as_deref(),
        raw.nadgrids.as_deref(),
        &true_ellipsoid,
    )?;

    Ok(Definition {
        title: raw.title.clone(),
        method,
        ellps,
        a,
        b,
        es,
        e: es.sqrt(),
        ep2,
        sphere: sphere || raw.r_a,
        k0: params.k0.unwrap_or(1.0),
        params,
        axis: raw.axis.unwrap_or_default(),
        to_meter,
        units: raw.units.clone(),
        from_greenwich: raw.from_greenwich.unwrap_or(0.0),
        datum,
        extra: raw.extra.clone(),
    })
}

/// Semi-axes and sphere flag.
///
/// `R` fixes both axes. Otherwise `a` comes from the definition or the named
/// ellipsoid (WGS84 when neither is given), and `b` from `b`, `rf`, or the
/// table. An `a` with nothing else describes a sphere.
fn shape(raw: &RawDefinition, ellps: Option<&str>) -> Result<(f64, f64, bool), ParseError> {
    if let Some(r) = raw.r {
        return Ok((r, r, true));
    }
    let (a, b, rf) = match raw.a {
        Some(a) => (a, raw.b, raw.rf),
        None => {
            let named = match ellps {
                Some(name) => ellipsoid::lookup(name)?.ellipsoid(),
                None => WGS84,
            };
            (named.a, raw.b.or(Some(named.b)), raw.rf)
        }
    };
    let b = match (b, rf) {
        (Some(b), _) => b,
        (None, Some(rf)) if rf != 0.0 => a * (1.0 - 1.0 / rf),
        _ => a,
    };
    if !(a.is_finite() && a > 0.0 && b.is_finite() && b > 0.0) {
        return Err(ParseError::InvalidValue {
            key: "a".to_string(),
            value: format!("{a} (b = {b})"),
        });
    }
    if rf == Some(0.0) || (a - b).abs() < EPSLN {
        Ok((a, a, true))
    } else {
        Ok((a, b, false))
    }
}
