use crate::error::ParseError;

/// Reference ellipsoid parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (metres)
    pub a: f64,
    /// Semi-minor axis (metres)
    pub b: f64,
    /// Flattening (dimensionless)
    pub f: f64,
    /// First eccentricity squared: (a² - b²) / a²
    pub e2: f64,
    /// Second eccentricity squared: (a² - b²) / b²
    pub ep2: f64,
    /// Third flattening: f / (2 - f)
    pub n: f64,
}

impl Ellipsoid {
    pub const fn new(a: f64, f: f64) -> Self {
        Self::from_axes(a, a * (1.0 - f))
    }

    pub const fn from_axes(a: f64, b: f64) -> Self {
        let a2 = a * a;
        let b2 = b * b;
        let f = (a - b) / a;
        Self {
            a,
            b,
            f,
            e2: (a2 - b2) / a2,
            ep2: (a2 - b2) / b2,
            n: f / (2.0 - f),
        }
    }

    pub const fn sphere(radius: f64) -> Self {
        Self::from_axes(radius, radius)
    }

    /// First eccentricity.
    pub fn eccentricity(&self) -> f64 {
        self.e2.sqrt()
    }

    pub fn is_sphere(&self) -> bool {
        self.e2 == 0.0
    }
}

pub const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563);
pub const GRS80: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_222_101);

/// How a table entry pins down its minor axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    InverseFlattening(f64),
    SemiMinor(f64),
}

/// An entry of the named ellipsoid table.
#[derive(Clone, Copy, Debug)]
pub struct NamedEllipsoid {
    pub name: &'static str,
    pub description: &'static str,
    pub a: f64,
    pub shape: Shape,
}

impl NamedEllipsoid {
    pub fn semi_minor(&self) -> f64 {
        match self.shape {
            Shape::SemiMinor(b) => b,
            Shape::InverseFlattening(rf) => self.a * (1.0 - 1.0 / rf),
        }
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        Ellipsoid::from_axes(self.a, self.semi_minor())
    }
}

const fn rf(name: &'static str, description: &'static str, a: f64, rf: f64) -> NamedEllipsoid {
    NamedEllipsoid {
        name,
        description,
        a,
        shape: Shape::InverseFlattening(rf),
    }
}

const fn ab(name: &'static str, description: &'static str, a: f64, b: f64) -> NamedEllipsoid {
    NamedEllipsoid {
        name,
        description,
        a,
        shape: Shape::SemiMinor(b),
    }
}

static ELLIPSOIDS: &[NamedEllipsoid] = &[
    rf("MERIT", "MERIT 1983", 6_378_137.0, 298.257),
    rf("SGS85", "Soviet Geodetic System 85", 6_378_136.0, 298.257),
    rf("GRS80", "GRS 1980(IUGG, 1980)", 6_378_137.0, 298.257_222_101),
    rf("IAU76", "IAU 1976", 6_378_140.0, 298.257),
    ab("airy", "Airy 1830", 6_377_563.396, 6_356_256.910),
    rf("APL4", "Appl. Physics. 1965", 6_378_137.0, 298.25),
    rf("NWL9D", "Naval Weapons Lab., 1965", 6_378_145.0, 298.25),
    ab("mod_airy", "Modified Airy", 6_377_340.189, 6_356_034.446),
    rf("andrae", "Andrae 1876 (Den., Iclnd.)", 6_377_104.43, 300.0),
    rf("aust_SA", "Australian Natl & S. Amer. 1969", 6_378_160.0, 298.25),
    rf("GRS67", "GRS 67(IUGG 1967)", 6_378_160.0, 298.247_167_427),
    rf("bessel", "Bessel 1841", 6_377_397.155, 299.152_812_8),
    rf("bess_nam", "Bessel 1841 (Namibia)", 6_377_483.865, 299.152_812_8),
    ab("clrk66", "Clarke 1866", 6_378_206.4, 6_356_583.8),
    rf("clrk80", "Clarke 1880 mod.", 6_378_249.145, 293.466_3),
    rf("clrk58", "Clarke 1858", 6_378_293.645_208_759, 294.260_676_369_261_4),
    rf("CPM", "Comm. des Poids et Mesures 1799", 6_375_738.7, 334.29),
    rf("delmbr", "Delambre 1810 (Belgium)", 6_376_428.0, 311.5),
    rf("engelis", "Engelis 1985", 6_378_136.05, 298.256_6),
    rf("evrst30", "Everest 1830", 6_377_276.345, 300.801_7),
    rf("evrst48", "Everest 1948", 6_377_304.063, 300.801_7),
    rf("evrst56", "Everest 1956", 6_377_301.243, 300.801_7),
    rf("evrst69", "Everest 1969", 6_377_295.664, 300.801_7),
    rf("evrstSS", "Everest (Sabah & Sarawak)", 6_377_298.556, 300.801_7),
    rf("fschr60", "Fischer (Mercury Datum) 1960", 6_378_166.0, 298.3),
    rf("fschr60m", "Fischer 1960", 6_378_155.0, 298.3),
    rf("fschr68", "Fischer 1968", 6_378_150.0, 298.3),
    rf("helmert", "Helmert 1906", 6_378_200.0, 298.3),
    rf("hough", "Hough", 6_378_270.0, 297.0),
    rf("intl", "International 1909 (Hayford)", 6_378_388.0, 297.0),
    rf("kaula", "Kaula 1961", 6_378_163.0, 298.24),
    rf("lerch", "Lerch 1979", 6_378_139.0, 298.257),
    rf("mprts", "Maupertius 1738", 6_397_300.0, 191.0),
    ab("new_intl", "New International 1967", 6_378_157.5, 6_356_772.2),
    rf("krass", "Krassovsky, 1942", 6_378_245.0, 298.3),
    ab("SEasia", "Southeast Asia", 6_378_155.0, 6_356_773.320_5),
    ab("walbeck", "Walbeck", 6_376_896.0, 6_355_834.846_7),
    rf("WGS60", "WGS 60", 6_378_165.0, 298.3),
    rf("WGS66", "WGS 66", 6_378_145.0, 298.25),
    rf("WGS72", "WGS 72", 6_378_135.0, 298.26),
    rf("WGS84", "WGS 84", 6_378_137.0, 298.257_223_563),
    ab("sphere", "Normal Sphere (r=6370997)", 6_370_997.0, 6_370_997.0),
];

/// Looks up a named ellipsoid. Names match exactly first, then ignoring case.
pub fn lookup(name: &str) -> Result<&'static NamedEllipsoid, ParseError> {
    ELLIPSOIDS
        .iter()
        .find(|e| e.name == name)
        .or_else(|| ELLIPSOIDS.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
        .ok_or_else(|| ParseError::UnknownEllipsoid(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axes_table_entry_derives_flattening() {
        // Airy 1830 is tabulated by its axes; the flattening follows from them.
        let airy = lookup("Airy").unwrap();
        assert_eq!(airy.name, "airy");
        let e = airy.ellipsoid();
        assert_relative_eq!(e.b, 6_356_256.910);
        assert_relative_eq!(1.0 / e.f, 299.324_975_315, epsilon = 1e-6);
        assert!(!e.is_sphere());
    }

    #[test]
    fn test_lookup_matches_constants() {
        let wgs = lookup("WGS84").unwrap().ellipsoid();
        assert_relative_eq!(wgs.b, WGS84.b, epsilon = 1e-9);
        assert_relative_eq!(wgs.e2, WGS84.e2, epsilon = 1e-15);

        let clrk66 = lookup("clrk66").unwrap();
        assert_relative_eq!(clrk66.semi_minor(), 6_356_583.8);
    }

    #[test]
    fn test_lookup_case_insensitive_fallback() {
        assert_eq!(lookup("grs80").unwrap().name, "GRS80");
        assert!(matches!(
            lookup("potato"),
            Err(ParseError::UnknownEllipsoid(name)) if name == "potato"
        ));
    }

    #[test]
    fn test_sphere_entry() {
        let sphere = lookup("sphere").unwrap().ellipsoid();
        assert!(sphere.is_sphere());
        assert_eq!(sphere.ep2, 0.0);
    }
}
