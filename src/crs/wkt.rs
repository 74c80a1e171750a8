//! WKT1 (`GEOGCS[...]` / `PROJCS[...]`) definitions.
//!
//! The text is tokenized into a tree of [`Node`]s and then folded into the
//! same [`RawDefinition`] the key/value parser produces: datum and ellipsoid
//! names are normalized to table keys, and `PARAMETER` names are renamed to
//! the key/value vocabulary.

use crate::crs::units;
use crate::crs::{AxisOrder, RawDefinition};
use crate::datum;
use crate::error::ParseError;

/// Top-level keywords that mark a string as WKT.
const WKT_KEYWORDS: &[&str] = &[
    "PROJCS",
    "GEOGCS",
    "GEOCCS",
    "LOCAL_CS",
    "COMPD_CS",
    "VERT_CS",
    "PROJCRS",
    "GEOGCRS",
    "GEODCRS",
    "GEODETICCRS",
    "ENGCRS",
    "ENGINEERINGCRS",
    "BOUNDCRS",
];

/// A value inside a WKT node.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Node(Node),
    Text(String),
    Number(f64),
    /// A bare enumeration word such as `NORTH` in `AXIS["Lat",NORTH]`.
    Keyword(String),
}

/// `KEYWORD[arg, arg, ...]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub keyword: String,
    pub args: Vec<Value>,
}

impl Node {
    /// First quoted argument, conventionally the node's name.
    pub fn name(&self) -> Option<&str> {
        self.args.iter().find_map(|v| match v {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        self.args.iter().filter_map(Value::as_number).nth(index)
    }

    pub fn child<'a>(&'a self, keyword: &'a str) -> Option<&'a Node> {
        self.children(keyword).next()
    }

    pub fn children<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.args.iter().filter_map(move |v| match v {
            Value::Node(n) if n.keyword == keyword => Some(n),
            _ => None,
        })
    }
}

impl Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Whether `text` opens with a WKT keyword followed by a bracket.
pub fn looks_like_wkt(text: &str) -> bool {
    let text = text.trim_start();
    let word_end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let (word, rest) = text.split_at(word_end);
    WKT_KEYWORDS.contains(&word.to_ascii_uppercase().as_str())
        && matches!(rest.trim_start().chars().next(), Some('[') | Some('('))
}

pub fn parse(text: &str) -> Result<RawDefinition, ParseError> {
    let root = tokenize(text)?;
    normalize(&root)
}

/// Parses WKT text into its node tree.
pub fn tokenize(text: &str) -> Result<Node, ParseError> {
    let mut parser = Parser {
        src: text.as_bytes(),
        pos: 0,
    };
    parser.skip_ws();
    let root = parser.node()?;
    parser.skip_ws();
    if parser.pos != parser.src.len() {
        return Err(parser.error("trailing characters after root node"));
    }
    Ok(root)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> ParseError {
        ParseError::MalformedWkt {
            pos: self.pos,
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn node(&mut self) -> Result<Node, ParseError> {
        let keyword = self.word();
        if keyword.is_empty() {
            return Err(self.error("expected keyword"));
        }
        self.skip_ws();
        self.node_body(keyword.to_ascii_uppercase())
    }

    fn node_body(&mut self, keyword: String) -> Result<Node, ParseError> {
        let close = match self.peek() {
            Some(b'[') => b']',
            Some(b'(') => b')',
            _ => return Err(self.error("expected '[' or '('")),
        };
        self.pos += 1;
        let mut args = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) && args.is_empty() {
                self.pos += 1;
                break;
            }
            args.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    break;
                }
                Some(b']') | Some(b')') => return Err(self.error("mismatched closing bracket")),
                Some(_) => return Err(self.error("expected ',' or closing bracket")),
                None => return Err(self.error("unterminated node")),
            }
        }
        Ok(Node { keyword, args })
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            Some(b'"') => self.text().map(Value::Text),
            Some(c) if c == b'-' || c == b'+' || c == b'.' || c.is_ascii_digit() => {
                self.number().map(Value::Number)
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.word();
                self.skip_ws();
                match self.peek() {
                    Some(b'[') | Some(b'(') => {
                        self.node_body(word.to_ascii_uppercase()).map(Value::Node)
                    }
                    _ => Ok(Value::Keyword(word)),
                }
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn text(&mut self) -> Result<String, ParseError> {
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                Some(b'"') if self.src.get(self.pos + 1) == Some(&b'"') => {
                    out.push(b'"');
                    self.pos += 2;
                }
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(String::from_utf8_lossy(&out).into_owned());
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, b'-' | b'+' | b'.' | b'e' | b'E'))
        {
            self.pos += 1;
        }
        std::str::from_utf8(&self.src[start..self.pos])
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| ParseError::MalformedWkt {
                pos: start,
                reason: "invalid number".to_string(),
            })
    }
}

/// Folds a node tree into a raw definition.
pub fn normalize(root: &Node) -> Result<RawDefinition, ParseError> {
    let mut raw = RawDefinition {
        title: root.name().map(str::to_string),
        ..Default::default()
    };
    match root.keyword.as_str() {
        "GEOGCS" => {
            raw.proj = Some("longlat".to_string());
            apply_geogcs(&mut raw, root);
            raw.units = Some("degrees".to_string());
        }
        "PROJCS" => {
            let geogcs = root
                .child("GEOGCS")
                .ok_or_else(|| ParseError::UnsupportedWktNode("PROJCS without GEOGCS".into()))?;
            apply_geogcs(&mut raw, geogcs);
            let projection = root
                .child("PROJECTION")
                .and_then(Node::name)
                .ok_or(ParseError::MissingProjection)?;
            raw.proj = Some(projection.to_string());
            if let Some(unit) = root.child("UNIT") {
                raw.to_meter = unit.number(0);
                raw.units = unit.name().and_then(|name| {
                    units::to_meter(name).map(|_| name.to_ascii_lowercase())
                });
            }
            apply_parameters(&mut raw, root);
            if projection.eq_ignore_ascii_case("Mercator_Auxiliary_Sphere") {
                raw.r = raw.a;
            }
        }
        other => return Err(ParseError::UnsupportedWktNode(other.to_string())),
    }
    if let Some(axis) = axis_order(root)? {
        raw.axis = Some(axis);
    }
    Ok(raw)
}

fn apply_geogcs(raw: &mut RawDefinition, geogcs: &Node) {
    if let Some(datum) = geogcs.child("DATUM") {
        if let Some(name) = datum.name() {
            let code = datum_code(name);
            if datum::lookup(&code).is_ok() {
                raw.datum = Some(code);
            } else {
                raw.extra.insert("datum_name".to_string(), name.to_string());
            }
        }
        if let Some(spheroid) = datum.child("SPHEROID") {
            raw.ellps = spheroid.name().map(ellipsoid_code);
            raw.a = spheroid.number(0);
            raw.rf = spheroid.number(1);
        }
        if let Some(towgs84) = datum.child("TOWGS84") {
            let params: Vec<f64> = towgs84.args.iter().filter_map(Value::as_number).collect();
            if matches!(params.len(), 3 | 7) {
                raw.towgs84 = Some(params);
            }
        }
    }
    if let Some(primem) = geogcs.child("PRIMEM") {
        raw.from_greenwich = primem.number(0).map(f64::to_radians);
    }
}

/// Renames WKT `PARAMETER`s to the key/value vocabulary.
fn apply_parameters(raw: &mut RawDefinition, projcs: &Node) {
    let to_meter = raw.to_meter.unwrap_or(1.0);
    let is_mercator = raw
        .proj
        .as_deref()
        .is_some_and(|p| p.to_ascii_lowercase().contains("mercator") && !p.to_ascii_lowercase().contains("transverse"));
    let p = &mut raw.params;
    let mut standard_parallel_1 = None;

    for param in projcs.children("PARAMETER") {
        let (Some(name), Some(value)) = (param.name(), param.number(0)) else {
            continue;
        };
        let key = name.to_ascii_lowercase().replace(' ', "_");
        match key.as_str() {
            "false_easting" | "easting_at_false_origin" => p.x0 = Some(value * to_meter),
            "false_northing" | "northing_at_false_origin" => p.y0 = Some(value * to_meter),
            "central_meridian"
            | "longitude_of_origin"
            | "longitude_of_natural_origin"
            | "longitude_of_false_origin" => p.long0 = Some(value.to_radians()),
            "latitude_of_origin"
            | "latitude_of_center"
            | "central_parallel"
            | "latitude_of_natural_origin"
            | "latitude_of_false_origin" => p.lat0 = Some(value.to_radians()),
            "longitude_of_center" => p.longc = Some(value.to_radians()),
            "standard_parallel_1" | "latitude_of_1st_standard_parallel" => {
                standard_parallel_1 = Some(value.to_radians());
                p.lat1 = standard_parallel_1;
            }
            "standard_parallel_2" | "latitude_of_2nd_standard_parallel" => {
                p.lat2 = Some(value.to_radians())
            }
            "scale_factor" | "scale_factor_at_natural_origin" => p.k0 = Some(value),
            "azimuth" => p.alpha = Some(value.to_radians()),
            "rectified_grid_angle" => p.gamma = Some(value.to_radians()),
            _ => {
                raw.extra.insert(key, value.to_string());
            }
        }
    }

    if p.long0.is_none() {
        p.long0 = p.longc;
    }
    if is_mercator && p.lat_ts.is_none() {
        p.lat_ts = standard_parallel_1;
    }
    if p.lat0.is_none() && !is_mercator {
        p.lat0 = standard_parallel_1;
    }
}

fn axis_order(node: &Node) -> Result<Option<AxisOrder>, ParseError> {
    let letters: String = node
        .children("AXIS")
        .filter_map(|axis| {
            axis.args.iter().find_map(|v| match v {
                Value::Keyword(dir) => dir.chars().next().map(|c| c.to_ascii_lowercase()),
                _ => None,
            })
        })
        .collect();
    match letters.len() {
        0 => Ok(None),
        2 => format!("{letters}u").parse().map(Some),
        _ => letters.parse().map(Some),
    }
}

/// Maps a WKT datum name to a datum table key.
pub fn datum_code(name: &str) -> String {
    let mut code = name.to_ascii_lowercase().replace([' ', '-'], "_");
    if let Some(rest) = code.strip_prefix("d_") {
        code = rest.to_string();
    }
    for suffix in ["_ferro", "_jakarta"] {
        if let Some(rest) = code.strip_suffix(suffix) {
            code = rest.to_string();
        }
    }
    let alias = match code.as_str() {
        "wgs_1984" | "world_geodetic_system_1984" | "wgs84" => "wgs84",
        "new_zealand_geodetic_datum_1949" | "new_zealand_1949" => "nzgd49",
        "north_american_datum_1983" | "north_american_1983" => "nad83",
        "north_american_datum_1927" | "north_american_1927" => "nad27",
        "ch1903+" => "ch1903",
        c if c.contains("belge") => "rnb72",
        c if c.contains("osgb_1936") => "osgb36",
        c if c.contains("osni_1952") => "osni52",
        c if c.contains("tm65") || c.contains("geodetic_datum_of_1965") => "ire65",
        _ => return code,
    };
    alias.to_string()
}

/// Maps a WKT spheroid name to an ellipsoid table key.
pub fn ellipsoid_code(name: &str) -> String {
    let code = name.replace(' ', "_").replace("_19", "");
    let lower = code.to_ascii_lowercase();
    if lower.starts_with("international") {
        "intl".to_string()
    } else if lower.starts_with("clarke_18") {
        format!("clrk{}", &code["clarke_18".len()..])
    } else if lower.starts_with("wgs_84") || lower == "wgs84" {
        "WGS84".to_string()
    } else if lower.starts_with("grs_80") || lower.starts_with("grs80") {
        "GRS80".to_string()
    } else {
        code
    }
}
