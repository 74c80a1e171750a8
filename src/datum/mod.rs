//! Geodetic datums: how a CRS's ellipsoid relates to WGS84.
//!
//! A [`Datum`] pairs its [`DatumKind`] with the ellipsoid it is realised on.
//! Helmert parameters are stored in transform-ready units: rotations in
//! radians and scale as a factor `1 + ppm * 1e-6`.

use crate::error::ParseError;
use crate::proj::ellipsoid::Ellipsoid;

pub mod transform;

pub use transform::{datum_transform, GridShift};

/// Arc-seconds to radians.
pub const SEC_TO_RAD: f64 = 4.848_136_811_095_359_935_899_141_023_57e-6;

/// Tolerance on squared eccentricity when comparing two datums.
const ES_TOLERANCE: f64 = 5.0e-11;

#[derive(Clone, Debug, PartialEq)]
pub enum DatumKind {
    /// No datum information; the datum step is skipped.
    None,
    /// Coincident with WGS84.
    Wgs84,
    /// Geocentric translation in metres.
    ThreeParam { dx: f64, dy: f64, dz: f64 },
    /// Position-vector Helmert transform to WGS84.
    SevenParam {
        dx: f64,
        dy: f64,
        dz: f64,
        rx: f64,
        ry: f64,
        rz: f64,
        scale: f64,
    },
    /// Horizontal grid shift. Names prefixed with `@` are optional grids.
    GridShift { grids: Vec<String> },
}

impl DatumKind {
    /// Builds the kind from raw `towgs84` values (metres, arc-seconds, ppm).
    ///
    /// All-zero parameters mean WGS84, and a seven-value list whose rotations
    /// and scale are zero is a plain translation.
    pub fn from_towgs84(params: &[f64]) -> Result<Self, ParseError> {
        match *params {
            [dx, dy, dz] => Ok(Self::translation(dx, dy, dz)),
            [dx, dy, dz, rx, ry, rz, ppm] => {
                if rx == 0.0 && ry == 0.0 && rz == 0.0 && ppm == 0.0 {
                    Ok(Self::translation(dx, dy, dz))
                } else {
                    Ok(Self::SevenParam {
                        dx,
                        dy,
                        dz,
                        rx: rx * SEC_TO_RAD,
                        ry: ry * SEC_TO_RAD,
                        rz: rz * SEC_TO_RAD,
                        scale: 1.0 + ppm * 1.0e-6,
                    })
                }
            }
            _ => Err(ParseError::Towgs84Length(params.len())),
        }
    }

    fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        if dx == 0.0 && dy == 0.0 && dz == 0.0 {
            Self::Wgs84
        } else {
            Self::ThreeParam { dx, dy, dz }
        }
    }

    /// Parses a comma separated `nadgrids` list.
    pub fn from_nadgrids(list: &str) -> Self {
        let grids = list
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        Self::GridShift { grids }
    }

    /// Whether the kind goes through a Helmert step on the way to WGS84.
    pub fn has_helmert(&self) -> bool {
        matches!(self, Self::ThreeParam { .. } | Self::SevenParam { .. })
    }
}

/// A datum kind realised on a particular ellipsoid.
#[derive(Clone, Debug, PartialEq)]
pub struct Datum {
    pub kind: DatumKind,
    pub a: f64,
    pub b: f64,
    pub es: f64,
    pub ep2: f64,
}

impl Datum {
    pub fn new(kind: DatumKind, ellipsoid: &Ellipsoid) -> Self {
        Self {
            kind,
            a: ellipsoid.a,
            b: ellipsoid.b,
            es: ellipsoid.e2,
            ep2: ellipsoid.ep2,
        }
    }

    /// Resolves the datum of a definition.
    ///
    /// Explicit `towgs84` wins, then explicit grids. Without either, a named
    /// datum contributes its own parameters; `"none"` or no information at
    /// all gives [`DatumKind::None`].
    pub fn resolve(
        code: Option<&str>,
        towgs84: Option<&[f64]>,
        nadgrids: Option<&str>,
        ellipsoid: &Ellipsoid,
    ) -> Result<Self, ParseError> {
        let named = match code {
            None | Some("none") => None,
            Some(code) => Some(lookup(code)?),
        };
        let kind = if let Some(params) = towgs84 {
            DatumKind::from_towgs84(params)?
        } else if let Some(grids) = nadgrids {
            DatumKind::from_nadgrids(grids)
        } else if let Some(named) = named {
            named.kind()?
        } else {
            DatumKind::None
        };
        Ok(Self::new(kind, ellipsoid))
    }

    pub fn is_none(&self) -> bool {
        self.kind == DatumKind::None
    }

    /// Two datums are interchangeable when their kinds and parameters match
    /// and they sit on the same ellipsoid.
    pub fn is_comparable(&self, other: &Datum) -> bool {
        self.kind == other.kind && self.a == other.a && (self.es - other.es).abs() <= ES_TOLERANCE
    }
}

/// An entry of the named datum table.
#[derive(Clone, Copy, Debug)]
pub struct NamedDatum {
    pub code: &'static str,
    pub description: &'static str,
    pub towgs84: &'static [f64],
    pub nadgrids: Option<&'static str>,
    pub ellps: &'static str,
}

impl NamedDatum {
    pub fn kind(&self) -> Result<DatumKind, ParseError> {
        match self.nadgrids {
            Some(grids) => Ok(DatumKind::from_nadgrids(grids)),
            None => DatumKind::from_towgs84(self.towgs84),
        }
    }
}

const fn helmert(
    code: &'static str,
    description: &'static str,
    towgs84: &'static [f64],
    ellps: &'static str,
) -> NamedDatum {
    NamedDatum {
        code,
        description,
        towgs84,
        nadgrids: None,
        ellps,
    }
}

static DATUMS: &[NamedDatum] = &[
    helmert("wgs84", "WGS84", &[0.0, 0.0, 0.0], "WGS84"),
    helmert("ch1903", "swiss", &[674.374, 15.056, 405.346], "bessel"),
    helmert("ggrs87", "Greek_Geodetic_Reference_System_1987", &[-199.87, 74.79, 246.62], "GRS80"),
    helmert("nad83", "North_American_Datum_1983", &[0.0, 0.0, 0.0], "GRS80"),
    NamedDatum {
        code: "nad27",
        description: "North_American_Datum_1927",
        towgs84: &[],
        nadgrids: Some("@conus,@alaska,@ntv2_0.gsb,@ntv1_can.dat"),
        ellps: "clrk66",
    },
    helmert(
        "potsdam",
        "Potsdam Rauenberg 1950 DHDN",
        &[598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7],
        "bessel",
    ),
    helmert("carthage", "Carthage 1934 Tunisia", &[-263.0, 6.0, 431.0], "clrk80"),
    helmert(
        "hermannskogel",
        "Hermannskogel",
        &[577.326, 90.129, 463.919, 5.137, 1.474, 5.297, 2.4232],
        "bessel",
    ),
    helmert(
        "osni52",
        "Irish National",
        &[482.530, -130.596, 564.557, -1.042, -0.214, -0.631, 8.15],
        "airy",
    ),
    helmert(
        "ire65",
        "Ireland 1965",
        &[482.530, -130.596, 564.557, -1.042, -0.214, -0.631, 8.15],
        "mod_airy",
    ),
    helmert("rassadiran", "Rassadiran", &[-133.63, -157.5, -158.62], "intl"),
    helmert(
        "nzgd49",
        "New Zealand Geodetic Datum 1949",
        &[59.47, -5.04, 187.44, 0.47, -0.1, 1.024, -4.5993],
        "intl",
    ),
    helmert(
        "osgb36",
        "Airy 1830",
        &[446.448, -125.157, 542.060, 0.1502, 0.2470, 0.8421, -20.4894],
        "airy",
    ),
    helmert("s_jtsk", "S-JTSK (Ferro)", &[589.0, 76.0, 480.0], "bessel"),
    helmert("beduaram", "Beduaram", &[-106.0, -87.0, 188.0], "clrk80"),
    helmert("gunung_segara", "Gunung Segara Jakarta", &[-403.0, 684.0, 41.0], "bessel"),
    helmert(
        "rnb72",
        "Reseau National Belge 1972",
        &[106.869, -52.2978, 103.724, -0.33657, 0.456955, -1.84218, 1.0],
        "intl",
    ),
];

/// Looks up a named datum, ignoring case.
pub fn lookup(code: &str) -> Result<&'static NamedDatum, ParseError> {
    DATUMS
        .iter()
        .find(|d| d.code.eq_ignore_ascii_case(code))
        .ok_or_else(|| ParseError::UnknownDatum(code.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::{self, GRS80, WGS84};
    use approx::assert_relative_eq;

    #[test]
    fn test_towgs84_classification() {
        assert_eq!(DatumKind::from_towgs84(&[0.0, 0.0, 0.0]).unwrap(), DatumKind::Wgs84);
        assert_eq!(
            DatumKind::from_towgs84(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]).unwrap(),
            DatumKind::ThreeParam {
                dx: 1.0,
                dy: 2.0,
                dz: 3.0
            }
        );
        assert!(matches!(
            DatumKind::from_towgs84(&[1.0, 2.0]),
            Err(ParseError::Towgs84Length(2))
        ));
    }

    #[test]
    fn test_seven_param_units() {
        let kind = DatumKind::from_towgs84(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 10.0]).unwrap();
        let DatumKind::SevenParam { rx, scale, .. } = kind else {
            panic!("expected seven parameters, got {kind:?}");
        };
        assert_relative_eq!(rx, SEC_TO_RAD);
        assert_relative_eq!(scale, 1.000_01);
    }

    #[test]
    fn test_named_datums() {
        assert_eq!(lookup("WGS84").unwrap().kind().unwrap(), DatumKind::Wgs84);
        assert_eq!(lookup("nad83").unwrap().kind().unwrap(), DatumKind::Wgs84);
        assert!(matches!(
            lookup("nad27").unwrap().kind().unwrap(),
            DatumKind::GridShift { grids } if grids.len() == 4 && grids[0] == "@conus"
        ));
        assert!(matches!(
            lookup("osgb36").unwrap().kind().unwrap(),
            DatumKind::SevenParam { .. }
        ));
        assert!(matches!(lookup("mars2000"), Err(ParseError::UnknownDatum(_))));
    }

    #[test]
    fn test_every_named_datum_has_a_known_ellipsoid() {
        for datum in DATUMS {
            assert!(ellipsoid::lookup(datum.ellps).is_ok(), "{}", datum.code);
            assert!(datum.kind().is_ok(), "{}", datum.code);
        }
    }

    #[test]
    fn test_resolve_precedence() {
        let explicit = Datum::resolve(Some("osgb36"), Some(&[1.0, 2.0, 3.0]), None, &WGS84).unwrap();
        assert!(matches!(explicit.kind, DatumKind::ThreeParam { .. }));

        let named = Datum::resolve(Some("ch1903"), None, None, &WGS84).unwrap();
        assert!(matches!(named.kind, DatumKind::ThreeParam { dx, .. } if dx == 674.374));

        let grids = Datum::resolve(None, None, Some("@null2"), &WGS84).unwrap();
        assert!(matches!(grids.kind, DatumKind::GridShift { .. }));

        assert!(Datum::resolve(None, None, None, &WGS84).unwrap().is_none());
        assert!(Datum::resolve(Some("none"), None, None, &WGS84).unwrap().is_none());
        assert!(Datum::resolve(Some("atlantis"), None, None, &WGS84).is_err());
    }

    #[test]
    fn test_comparable_requires_same_ellipsoid() {
        let wgs = Datum::new(DatumKind::Wgs84, &WGS84);
        let grs = Datum::new(DatumKind::Wgs84, &GRS80);
        // WGS84 and GRS80 differ in es by ~1e-12, within tolerance.
        assert!(wgs.is_comparable(&grs));

        let bessel = ellipsoid::lookup("bessel").unwrap().ellipsoid();
        assert!(!wgs.is_comparable(&Datum::new(DatumKind::Wgs84, &bessel)));
        assert!(!wgs.is_comparable(&Datum::new(DatumKind::None, &WGS84)));
    }
}
