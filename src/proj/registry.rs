//! Projection method lookup.
//!
//! Maps normalized method names (lowercase, spaces as `_`) to constructors.
//! A registry is assembled up front and only read afterwards; the process-wide
//! default is immutable.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::crs::Definition;
use crate::error::{ParseError, ProjError};
use crate::proj::{equirectangular, etmerc, lambert_conformal, longlat, mercator, transverse_mercator};
use crate::proj::Projection;

/// Builds a projection instance from a definition.
pub type InitFn = fn(&Definition) -> Result<Box<dyn Projection>, ProjError>;

/// A projection method: the names it answers to and its constructor.
#[derive(Clone, Copy)]
pub struct Method {
    pub names: &'static [&'static str],
    pub init: InitFn,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("names", &self.names).finish()
    }
}

static DEFAULT: LazyLock<ProjectionRegistry> = LazyLock::new(ProjectionRegistry::with_defaults);

#[derive(Clone, Debug, Default)]
pub struct ProjectionRegistry {
    methods: HashMap<String, Method>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reference projections shipped with the crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for method in [
            longlat::METHOD,
            mercator::METHOD,
            transverse_mercator::METHOD,
            etmerc::METHOD,
            etmerc::UTM_METHOD,
            lambert_conformal::METHOD,
            equirectangular::METHOD,
        ] {
            registry.register(method);
        }
        registry
    }

    /// The shared built-in registry.
    pub fn global() -> &'static ProjectionRegistry {
        &DEFAULT
    }

    /// Adds a method under all its names. A later registration of the same
    /// name replaces the earlier one.
    pub fn register(&mut self, method: Method) {
        for name in method.names {
            self.methods.insert(normalize(name), method);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(&normalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Builds the projection a definition names.
    pub fn init(&self, def: &Definition) -> Result<Box<dyn Projection>, ProjError> {
        let method = self
            .get(&def.method)
            .ok_or_else(|| ParseError::UnknownProjection(def.method.clone()))?;
        (method.init)(def)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(' ', "_")
}
