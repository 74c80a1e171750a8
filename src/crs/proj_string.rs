//! PROJ-style `+key=value` definitions.
//!
//! Tokens are split on `+`, then on the first `=`. A key without `=` is a flag
//! with value `true`. Keys are case-folded; values are kept as written.
//! Unknown keys land in [`RawDefinition::extra`].

use crate::crs::units;
use crate::crs::{AxisOrder, RawDefinition};
use crate::error::ParseError;

pub fn parse(text: &str) -> Result<RawDefinition, ParseError> {
    let mut raw = RawDefinition::default();
    for token in text.split('+').map(str::trim).filter(|t| !t.is_empty()) {
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (token, None),
        };
        apply(&mut raw, &key.to_ascii_lowercase(), value)?;
    }
    Ok(raw)
}

fn apply(raw: &mut RawDefinition, key: &str, value: Option<&str>) -> Result<(), ParseError> {
    let p = &mut raw.params;
    match key {
        "proj" => raw.proj = Some(text(key, value)?),
        "title" => raw.title = Some(text(key, value)?),
        "ellps" => raw.ellps = Some(text(key, value)?),
        "datum" => raw.datum = Some(text(key, value)?.to_ascii_lowercase()),
        "a" => raw.a = Some(number(key, value)?),
        "b" => raw.b = Some(number(key, value)?),
        "rf" => raw.rf = Some(number(key, value)?),
        "r" => raw.r = Some(number(key, value)?),
        "r_a" => raw.r_a = true,
        "lat_0" => p.lat0 = Some(degrees(key, value)?),
        "lat_1" => p.lat1 = Some(degrees(key, value)?),
        "lat_2" => p.lat2 = Some(degrees(key, value)?),
        "lat_ts" => p.lat_ts = Some(degrees(key, value)?),
        "lon_0" => p.long0 = Some(degrees(key, value)?),
        "lon_1" => p.long1 = Some(degrees(key, value)?),
        "lon_2" => p.long2 = Some(degrees(key, value)?),
        "lonc" => p.longc = Some(degrees(key, value)?),
        "alpha" => p.alpha = Some(degrees(key, value)?),
        "gamma" => p.gamma = Some(degrees(key, value)?),
        "x_0" => p.x0 = Some(number(key, value)?),
        "y_0" => p.y0 = Some(number(key, value)?),
        "k" | "k_0" => p.k0 = Some(number(key, value)?),
        "zone" => p.zone = Some(zone(key, value)?),
        "south" => p.south = true,
        "towgs84" => raw.towgs84 = Some(towgs84(key, value)?),
        "to_meter" => raw.to_meter = Some(number(key, value)?),
        "units" => {
            let name = text(key, value)?;
            if !units::is_angular(&name) && units::to_meter(&name).is_none() {
                return Err(ParseError::UnknownUnit(name));
            }
            raw.units = Some(name);
        }
        "from_greenwich" => raw.from_greenwich = Some(degrees(key, value)?),
        "pm" => {
            let name = text(key, value)?;
            let offset = units::prime_meridian(&name)
                .or_else(|| name.parse::<f64>().ok())
                .ok_or(ParseError::UnknownPrimeMeridian(name))?;
            raw.from_greenwich = Some(offset.to_radians());
        }
        "nadgrids" => {
            let grids = text(key, value)?;
            if grids == "@null" {
                raw.datum = Some("none".to_string());
            } else {
                raw.nadgrids = Some(grids);
            }
        }
        "axis" => raw.axis = Some(text(key, value)?.parse::<AxisOrder>()?),
        _ => {
            raw.extra
                .insert(key.to_string(), value.unwrap_or("true").to_string());
        }
    }
    Ok(())
}

fn invalid(key: &str, value: Option<&str>) -> ParseError {
    ParseError::InvalidValue {
        key: key.to_string(),
        value: value.unwrap_or_default().to_string(),
    }
}

fn text(key: &str, value: Option<&str>) -> Result<String, ParseError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(invalid(key, value)),
    }
}

fn number(key: &str, value: Option<&str>) -> Result<f64, ParseError> {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(key, value))
}

fn degrees(key: &str, value: Option<&str>) -> Result<f64, ParseError> {
    number(key, value).map(f64::to_radians)
}

fn zone(key: &str, value: Option<&str>) -> Result<u8, ParseError> {
    value
        .and_then(|v| v.parse::<u8>().ok())
        .filter(|z| (1..=60).contains(z))
        .ok_or_else(|| invalid(key, value))
}

fn towgs84(key: &str, value: Option<&str>) -> Result<Vec<f64>, ParseError> {
    let v = value.ok_or_else(|| invalid(key, value))?;
    let params = v
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|_| invalid(key, value)))
        .collect::<Result<Vec<_>, _>>()?;
    match params.len() {
        3 | 7 => Ok(params),
        n => Err(ParseError::Towgs84Length(n)),
    }
}
