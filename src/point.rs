//! Coordinate tuples as they enter and leave a transform.
//!
//! A [`Point`] carries two or three ordinates with positional meaning
//! (easting/longitude, northing/latitude, optional height). The [`Coord`]
//! trait lets [`crate::transform`] hand back the caller's own shape: an
//! array comes back as an array, a `"x,y"` string as a string.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A 2D or 3D coordinate tuple.
///
/// ```
/// use reproj::Point;
///
/// let p: Point = "2,41".parse().unwrap();
/// assert_eq!(p, Point::new(2.0, 41.0));
/// assert_eq!(p.to_string(), "2,41");
///
/// let q = Point::from([1.0, 2.0, 3.0]);
/// assert_eq!(q.z, Some(3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub z: Option<f64>,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub const fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Number of ordinates, 2 or 3.
    pub fn dim(&self) -> usize {
        if self.z.is_some() {
            3
        } else {
            2
        }
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    /// Ordinates as a vector of length [`Point::dim`].
    pub fn to_vec(&self) -> Vec<f64> {
        match self.z {
            Some(z) => vec![self.x, self.y, z],
            None => vec![self.x, self.y],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f64::is_finite)
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<(f64, f64, f64)> for Point {
    fn from(v: (f64, f64, f64)) -> Self {
        Self::new_3d(v.0, v.1, v.2)
    }
}

impl From<[f64; 2]> for Point {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<[f64; 3]> for Point {
    fn from(v: [f64; 3]) -> Self {
        Self::new_3d(v[0], v[1], v[2])
    }
}

impl TryFrom<&[f64]> for Point {
    type Error = ParseError;

    fn try_from(v: &[f64]) -> Result<Self, Self::Error> {
        match *v {
            [x, y] => Ok(Self::new(x, y)),
            [x, y, z] => Ok(Self::new_3d(x, y, z)),
            _ => Err(ParseError::InvalidPoint(format!(
                "expected 2 or 3 ordinates, got {}",
                v.len()
            ))),
        }
    }
}

impl FromStr for Point {
    type Err = ParseError;

    /// Parses a comma-delimited `"x,y"` or `"x,y,z"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ordinates = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidPoint(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_from(ordinates.as_slice())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "{},{},{}", self.x, self.y, z),
            None => write!(f, "{},{}", self.x, self.y),
        }
    }
}

/// A value that can be read as a [`Point`] and rebuilt in the same shape.
pub trait Coord: Sized {
    fn to_point(&self) -> Result<Point, ParseError>;

    /// Builds a value shaped like `self` holding the ordinates of `p`.
    fn with_point(&self, p: &Point) -> Self;
}

impl Coord for Point {
    fn to_point(&self) -> Result<Point, ParseError> {
        Ok(*self)
    }

    fn with_point(&self, p: &Point) -> Self {
        Point {
            x: p.x,
            y: p.y,
            z: self.z.and(p.z),
        }
    }
}

impl Coord for (f64, f64) {
    fn to_point(&self) -> Result<Point, ParseError> {
        Ok(Point::from(*self))
    }

    fn with_point(&self, p: &Point) -> Self {
        (p.x, p.y)
    }
}

impl Coord for (f64, f64, f64) {
    fn to_point(&self) -> Result<Point, ParseError> {
        Ok(Point::from(*self))
    }

    fn with_point(&self, p: &Point) -> Self {
        (p.x, p.y, p.z.unwrap_or(self.2))
    }
}

impl Coord for [f64; 2] {
    fn to_point(&self) -> Result<Point, ParseError> {
        Ok(Point::from(*self))
    }

    fn with_point(&self, p: &Point) -> Self {
        [p.x, p.y]
    }
}

impl Coord for [f64; 3] {
    fn to_point(&self) -> Result<Point, ParseError> {
        Ok(Point::from(*self))
    }

    fn with_point(&self, p: &Point) -> Self {
        [p.x, p.y, p.z.unwrap_or(self[2])]
    }
}

impl Coord for Vec<f64> {
    fn to_point(&self) -> Result<Point, ParseError> {
        Point::try_from(self.as_slice())
    }

    fn with_point(&self, p: &Point) -> Self {
        let mut out = vec![p.x, p.y];
        if self.len() == 3 {
            out.push(p.z.unwrap_or(self[2]));
        }
        out
    }
}

impl Coord for String {
    fn to_point(&self) -> Result<Point, ParseError> {
        self.parse()
    }

    fn with_point(&self, p: &Point) -> Self {
        p.to_string()
    }
}
