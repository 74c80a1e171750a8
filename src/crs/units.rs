//! Linear unit and prime meridian tables.

/// Metres per unit for the linear units accepted by `+units=`.
static LINEAR_UNITS: &[(&str, f64)] = &[
    ("km", 1000.0),
    ("m", 1.0),
    ("dm", 0.1),
    ("cm", 0.01),
    ("mm", 0.001),
    ("kmi", 1852.0),
    ("in", 0.0254),
    ("ft", 0.3048),
    ("yd", 0.9144),
    ("mi", 1609.344),
    ("fath", 1.8288),
    ("ch", 20.1168),
    ("link", 0.201_168),
    ("us-in", 1.0 / 39.37),
    ("us-ft", 1200.0 / 3937.0),
    ("us-yd", 3600.0 / 3937.0),
    ("us-ch", 79_200.0 / 3937.0),
    ("us-mi", 6_336_000.0 / 3937.0),
];

/// Prime meridians, degrees east of Greenwich.
static PRIME_MERIDIANS: &[(&str, f64)] = &[
    ("greenwich", 0.0),
    ("lisbon", -9.131_906_111_111),
    ("paris", 2.337_229_166_667),
    ("bogota", -74.080_916_666_667),
    ("madrid", -3.687_938_888_889),
    ("rome", 12.452_333_333_333),
    ("bern", 7.439_583_333_333),
    ("jakarta", 106.807_719_444_444),
    ("ferro", -17.666_666_666_667),
    ("brussels", 4.367_975),
    ("stockholm", 18.058_277_777_778),
    ("athens", 23.716_337_5),
    ("oslo", 10.722_916_666_667),
];

/// Metres per unit, or `None` when the name is not a linear unit.
pub fn to_meter(name: &str) -> Option<f64> {
    let name = name.to_ascii_lowercase();
    let name = match name.as_str() {
        "meter" | "metre" | "meters" | "metres" => "m",
        "foot" | "feet" => "ft",
        "us survey foot" | "us_survey_foot" | "foot_us" => "us-ft",
        "kilometre" | "kilometer" => "km",
        other => other,
    };
    LINEAR_UNITS
        .iter()
        .find(|(unit, _)| *unit == name)
        .map(|&(_, factor)| factor)
}

/// Whether `name` spells the angular unit of a geographic CRS.
pub fn is_angular(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "degree" | "degrees" | "deg"
    )
}

/// Prime meridian longitude in degrees.
pub fn prime_meridian(name: &str) -> Option<f64> {
    let name = name.to_ascii_lowercase();
    PRIME_MERIDIANS
        .iter()
        .find(|(pm, _)| *pm == name)
        .map(|&(_, degrees)| degrees)
}
