//! CRS definitions: parsing text into a raw parameter record and deriving the
//! complete [`Definition`] the projections and datum shift run on.
//!
//! Three syntaxes are accepted. A string starting with `+` is a PROJ-style
//! key/value list, a string opening with a WKT keyword and a bracket is WKT,
//! and anything else is a key into the [`DefinitionRegistry`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::datum::Datum;
use crate::error::ParseError;
use crate::proj::ellipsoid::Ellipsoid;

pub mod derive;
pub mod proj_string;
pub mod registry;
pub mod units;
pub mod wkt;

pub use registry::DefinitionRegistry;

/// The syntax a definition string is written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Syntax {
    ProjString,
    Wkt,
    RegistryKey,
}

impl Syntax {
    /// Classifies `text` by its structure alone.
    pub fn detect(text: &str) -> Self {
        let text = text.trim_start();
        if text.starts_with('+') {
            Syntax::ProjString
        } else if wkt::looks_like_wkt(text) {
            Syntax::Wkt
        } else {
            Syntax::RegistryKey
        }
    }
}

/// Parses a key/value or WKT string and derives its constants.
///
/// Registry keys are not resolved here; use [`DefinitionRegistry::resolve`].
pub fn parse_definition(text: &str) -> Result<Definition, ParseError> {
    let raw = parse_raw(text)?;
    derive::derive(&raw)
}

/// Parses a key/value or WKT string into an un-derived record.
pub fn parse_raw(text: &str) -> Result<RawDefinition, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    match Syntax::detect(text) {
        Syntax::ProjString => proj_string::parse(text),
        Syntax::Wkt => wkt::parse(text),
        Syntax::RegistryKey => Err(ParseError::UnknownCrs(text.to_string())),
    }
}

/// Method-specific projection parameters, angles in radians.
///
/// Every field is optional: each projection applies its own defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectionParams {
    pub lat0: Option<f64>,
    pub long0: Option<f64>,
    pub lat1: Option<f64>,
    pub lat2: Option<f64>,
    pub lat_ts: Option<f64>,
    pub long1: Option<f64>,
    pub long2: Option<f64>,
    pub longc: Option<f64>,
    pub alpha: Option<f64>,
    pub gamma: Option<f64>,
    pub x0: Option<f64>,
    pub y0: Option<f64>,
    pub k0: Option<f64>,
    pub zone: Option<u8>,
    pub south: bool,
}

/// Parser output: everything the text said, nothing derived yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDefinition {
    pub proj: Option<String>,
    pub title: Option<String>,
    pub ellps: Option<String>,
    pub datum: Option<String>,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub rf: Option<f64>,
    /// Sphere radius; sets both axes.
    pub r: Option<f64>,
    /// Replace the ellipsoid by its authalic sphere.
    pub r_a: bool,
    pub towgs84: Option<Vec<f64>>,
    pub nadgrids: Option<String>,
    pub to_meter: Option<f64>,
    pub units: Option<String>,
    /// Prime meridian offset in radians.
    pub from_greenwich: Option<f64>,
    pub axis: Option<AxisOrder>,
    pub params: ProjectionParams,
    /// Keys nothing downstream understands, kept verbatim.
    pub extra: BTreeMap<String, String>,
}

/// A complete CRS definition: ellipsoid constants, projection parameters,
/// axis order, units and the attached [`Datum`].
#[derive(Clone, Debug, PartialEq)]
pub struct Definition {
    pub title: Option<String>,
    /// Projection method name as written in the definition.
    pub method: String,
    pub ellps: Option<String>,
    /// Semi-major axis used by the projection (authalic radius under `R_A`).
    pub a: f64,
    pub b: f64,
    /// Squared eccentricity, `(a² - b²) / a²`.
    pub es: f64,
    pub e: f64,
    /// Second eccentricity squared, `(a² - b²) / b²`.
    pub ep2: f64,
    pub sphere: bool,
    pub k0: f64,
    pub params: ProjectionParams,
    pub axis: AxisOrder,
    /// Linear unit to metre factor of projected ordinates.
    pub to_meter: Option<f64>,
    pub units: Option<String>,
    /// Prime meridian offset in radians.
    pub from_greenwich: f64,
    pub datum: Datum,
    pub extra: BTreeMap<String, String>,
}

impl Definition {
    /// The ellipsoid the projection math runs on.
    pub fn ellipsoid(&self) -> Ellipsoid {
        Ellipsoid::from_axes(self.a, self.b)
    }

    pub fn lat0(&self) -> f64 {
        self.params.lat0.unwrap_or(0.0)
    }

    pub fn long0(&self) -> f64 {
        self.params.long0.unwrap_or(0.0)
    }

    pub fn x0(&self) -> f64 {
        self.params.x0.unwrap_or(0.0)
    }

    pub fn y0(&self) -> f64 {
        self.params.y0.unwrap_or(0.0)
    }
}

impl FromStr for Definition {
    type Err = ParseError;

    /// Parses key/value or WKT text; registry keys are looked up in the
    /// process-wide registry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Syntax::detect(s) {
            Syntax::RegistryKey => DefinitionRegistry::global()
                .resolve(s)
                .map(|def| def.as_ref().clone()),
            _ => parse_definition(s),
        }
    }
}

/// One axis direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    East,
    West,
    North,
    South,
    Up,
    Down,
}

impl Axis {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'e' => Some(Axis::East),
            'w' => Some(Axis::West),
            'n' => Some(Axis::North),
            's' => Some(Axis::South),
            'u' => Some(Axis::Up),
            'd' => Some(Axis::Down),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Axis::East => 'e',
            Axis::West => 'w',
            Axis::North => 'n',
            Axis::South => 's',
            Axis::Up => 'u',
            Axis::Down => 'd',
        }
    }

    fn is_easting(self) -> bool {
        matches!(self, Axis::East | Axis::West)
    }

    fn is_northing(self) -> bool {
        matches!(self, Axis::North | Axis::South)
    }

    fn sign(self) -> f64 {
        match self {
            Axis::West | Axis::South | Axis::Down => -1.0,
            _ => 1.0,
        }
    }
}

/// Order and direction of the three ordinates, e.g. `enu` or `neu`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct AxisOrder([Axis; 3]);

impl AxisOrder {
    pub const ENU: AxisOrder = AxisOrder([Axis::East, Axis::North, Axis::Up]);

    pub fn is_enu(&self) -> bool {
        *self == Self::ENU
    }

    pub fn axes(&self) -> [Axis; 3] {
        self.0
    }

    /// Maps ordinates written in this order to internal east-north-up.
    pub fn normalize(&self, (a, b, c): (f64, f64, f64)) -> (f64, f64, f64) {
        let (mut x, mut y) = (0.0, 0.0);
        for (axis, v) in self.0[..2].iter().zip([a, b]) {
            if axis.is_easting() {
                x = axis.sign() * v;
            } else {
                y = axis.sign() * v;
            }
        }
        (x, y, self.0[2].sign() * c)
    }

    /// Maps internal east-north-up ordinates back to this order.
    pub fn denormalize(&self, (x, y, z): (f64, f64, f64)) -> (f64, f64, f64) {
        let pick = |axis: Axis| axis.sign() * if axis.is_easting() { x } else { y };
        (pick(self.0[0]), pick(self.0[1]), self.0[2].sign() * z)
    }
}

impl Default for AxisOrder {
    fn default() -> Self {
        Self::ENU
    }
}

impl FromStr for AxisOrder {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidAxis(s.to_string());
        let axes = s
            .chars()
            .map(Axis::from_char)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;
        let [first, second, third] = <[Axis; 3]>::try_from(axes).map_err(|_| invalid())?;
        let horizontal_ok = (first.is_easting() && second.is_northing())
            || (first.is_northing() && second.is_easting());
        if !horizontal_ok || !matches!(third, Axis::Up | Axis::Down) {
            return Err(invalid());
        }
        Ok(AxisOrder([first, second, third]))
    }
}

impl TryFrom<String> for AxisOrder {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AxisOrder> for String {
    fn from(axis: AxisOrder) -> Self {
        axis.to_string()
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for axis in self.0 {
            write!(f, "{}", axis.as_char())?;
        }
        Ok(())
    }
}
