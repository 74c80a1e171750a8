//! Named CRS definitions.
//!
//! A registry maps keys such as `EPSG:4326` to parsed [`Definition`]s. Keys
//! are case-insensitive. Resolving raw definition text caches the result under
//! the trimmed text itself, so repeated lookups of the same string are map hits.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::crs::{parse_definition, Definition, Syntax};
use crate::error::ParseError;

const WGS84_LONGLAT: &str =
    "+title=WGS 84 (long/lat) +proj=longlat +ellps=WGS84 +datum=WGS84 +units=degrees";
const NAD83_LONGLAT: &str = "+title=NAD83 (long/lat) +proj=longlat +a=6378137.0 +b=6356752.31414036 +ellps=GRS80 +datum=NAD83 +units=degrees";
const PSEUDO_MERCATOR: &str = "+title=WGS 84 / Pseudo-Mercator +proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0 +k=1.0 +units=m +nadgrids=@null +no_defs";

/// Definitions every registry starts with, as `(keys, text)`.
const BUILTINS: &[(&[&str], &str)] = &[
    (&["EPSG:4326", "WGS84"], WGS84_LONGLAT),
    (&["EPSG:4269"], NAD83_LONGLAT),
    (
        &["EPSG:3857", "EPSG:3785", "GOOGLE", "EPSG:900913", "EPSG:102113"],
        PSEUDO_MERCATOR,
    ),
];

static GLOBAL: LazyLock<DefinitionRegistry> = LazyLock::new(DefinitionRegistry::with_builtins);

#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    entries: RwLock<HashMap<String, Arc<Definition>>>,
}

impl DefinitionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding WGS84, NAD83 and Pseudo-Mercator under their
    /// usual keys.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        {
            let mut entries = registry.entries.write();
            for (keys, text) in BUILTINS {
                // Built-in text is fixed; a failure here is a bug caught by tests.
                match parse_definition(text) {
                    Ok(def) => {
                        let def = Arc::new(def);
                        for key in keys.iter() {
                            entries.insert(key.to_ascii_uppercase(), Arc::clone(&def));
                        }
                    }
                    Err(e) => log::error!("built-in definition {keys:?} failed to parse: {e}"),
                }
            }
        }
        registry
    }

    /// The process-wide registry, created with the built-ins on first use.
    pub fn global() -> &'static DefinitionRegistry {
        &GLOBAL
    }

    /// Parses `text` and stores it under `name`. When `text` is itself a
    /// key, `name` becomes an alias of that entry.
    ///
    /// Entries are never replaced: registering an equal definition again
    /// returns the stored one, a different one is [`ParseError::AlreadyRegistered`].
    pub fn register(&self, name: &str, text: &str) -> Result<Arc<Definition>, ParseError> {
        let def = match Syntax::detect(text) {
            Syntax::RegistryKey => self.resolve(text)?,
            _ => Arc::new(parse_definition(text)?),
        };
        self.insert(name, def)
    }

    /// Stores an already parsed definition under `name` unless the key is
    /// taken; see [`register`](Self::register).
    pub fn insert(&self, name: &str, def: Arc<Definition>) -> Result<Arc<Definition>, ParseError> {
        let mut entries = self.entries.write();
        let stored = entries.entry(cache_key(name)).or_insert_with(|| Arc::clone(&def));
        if Arc::ptr_eq(stored, &def) || **stored == *def {
            Ok(Arc::clone(stored))
        } else {
            Err(ParseError::AlreadyRegistered(name.trim().to_string()))
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Definition>> {
        self.entries.read().get(&cache_key(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(&cache_key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Resolves a registry key or definition text to a shared definition.
    ///
    /// Keys are looked up (UTM keys `EPSG:326zz`/`EPSG:327zz` are built on
    /// demand); key/value and WKT text is parsed once and cached under the
    /// trimmed text. Concurrent first use of the same text stores exactly one
    /// entry and every caller gets that entry.
    pub fn resolve(&self, text: &str) -> Result<Arc<Definition>, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }
        if let Some(def) = self.get(text) {
            log::debug!("definition cache hit: {text}");
            return Ok(def);
        }

        let def = match Syntax::detect(text) {
            Syntax::RegistryKey => {
                let synthesized =
                    utm_definition(text).ok_or_else(|| ParseError::UnknownCrs(text.to_string()))?;
                parse_definition(&synthesized)?
            }
            _ => parse_definition(text)?,
        };

        let mut entries = self.entries.write();
        let entry = entries
            .entry(cache_key(text))
            .or_insert_with(|| {
                log::debug!("definition cached: {text}");
                Arc::new(def)
            });
        Ok(Arc::clone(entry))
    }
}

/// Registry keys fold case; definition text is kept as written.
fn cache_key(name: &str) -> String {
    let name = name.trim();
    match Syntax::detect(name) {
        Syntax::RegistryKey => name.to_ascii_uppercase(),
        _ => name.to_string(),
    }
}

/// Key/value text for `EPSG:326zz` (north) and `EPSG:327zz` (south).
fn utm_definition(key: &str) -> Option<String> {
    let key = key.to_ascii_uppercase();
    let code: u32 = key.strip_prefix("EPSG:")?.parse().ok()?;
    let (zone, south) = match code {
        32601..=32660 => (code - 32600, false),
        32701..=32760 => (code - 32700, true),
        _ => return None,
    };
    let south = if south { " +south" } else { "" };
    Some(format!(
        "+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs"
    ))
}
