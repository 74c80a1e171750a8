use thiserror::Error;

/// Errors raised while turning definition text (or a point literal) into
/// typed values. Always surfaced to the caller, never defaulted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("empty CRS definition")]
    Empty,

    #[error("unknown CRS: {0}")]
    UnknownCrs(String),

    #[error("unknown projection method: {0}")]
    UnknownProjection(String),

    #[error("definition has no projection method")]
    MissingProjection,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("towgs84 takes 3 or 7 values, got {0}")]
    Towgs84Length(usize),

    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("unknown ellipsoid: {0}")]
    UnknownEllipsoid(String),

    #[error("CRS key already registered with a different definition: {0}")]
    AlreadyRegistered(String),

    #[error("unknown datum: {0}")]
    UnknownDatum(String),

    #[error("unknown prime meridian: {0}")]
    UnknownPrimeMeridian(String),

    #[error("invalid axis order: {0:?}")]
    InvalidAxis(String),

    #[error("malformed WKT at byte {pos}: {reason}")]
    MalformedWkt { pos: usize, reason: String },

    #[error("unsupported WKT node: {0}")]
    UnsupportedWktNode(String),

    #[error("invalid point: {0}")]
    InvalidPoint(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The input is outside the analytic domain of a projection (pole,
    /// antipode, out-of-range trigonometric argument).
    #[error("Projection singularity in {method}: {reason}")]
    Singularity {
        method: &'static str,
        reason: &'static str,
    },

    /// An iterative inverse hit its iteration cap without reaching tolerance.
    #[error("{method} did not converge within {iterations} iterations")]
    Convergence {
        method: &'static str,
        iterations: usize,
    },

    #[error("Grid-shift datum ({0}) requested but no grid-shift hook is installed")]
    GridShiftUnavailable(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Transform failed: {0}")]
    TransformFailed(String),
}

impl ProjError {
    pub(crate) fn singularity(method: &'static str, reason: &'static str) -> Self {
        Self::Singularity { method, reason }
    }

    /// True for the per-point failures a point-stream caller can skip:
    /// singularities and non-convergent iterative inverses.
    pub fn is_domain_error(&self) -> bool {
        matches!(self, Self::Singularity { .. } | Self::Convergence { .. })
    }
}

pub type Result<T, E = ProjError> = std::result::Result<T, E>;
