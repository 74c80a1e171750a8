//! Pipeline: CRS-to-CRS transform chain.
//!
//! Both endpoints are resolved once (through the definition registry and the
//! projection registry) and then reused for every point:
//!
//! source axis/units -> source inverse -> prime meridian -> datum shift
//! -> prime meridian -> target forward -> target units/axis
//!
//! Geographic endpoints skip the projection step and convert degrees to
//! radians instead. Nothing here special-cases a projection method.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::crs::{Definition, DefinitionRegistry};
use crate::datum::{datum_transform, GridShift};
use crate::error::ProjError;
use crate::point::{Coord, Point};
use crate::proj::common::check_lat;
use crate::proj::{Projection, ProjectionRegistry};

/// A resolved CRS endpoint: its definition plus the projection built from it.
#[derive(Clone)]
pub struct Crs {
    definition: Arc<Definition>,
    projection: Arc<dyn Projection>,
}

impl Crs {
    pub fn new(definition: Arc<Definition>, projections: &ProjectionRegistry) -> Result<Self, ProjError> {
        let projection = Arc::from(projections.init(&definition)?);
        Ok(Self {
            definition,
            projection,
        })
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    pub fn is_latlong(&self) -> bool {
        self.projection.is_latlong()
    }

    /// Native ordinates (axis order and units as written) -> (lon_rad, lat_rad, h).
    fn to_geodetic(&self, p: (f64, f64, f64)) -> Result<(f64, f64, f64), ProjError> {
        let def = &self.definition;
        let (x, y, z) = def.axis.normalize(p);
        let (lon, lat) = if self.is_latlong() {
            let lat = y.to_radians();
            check_lat(lat, self.projection.name())?;
            (x.to_radians(), lat)
        } else {
            let k = def.to_meter.unwrap_or(1.0);
            self.projection.inverse(x * k, y * k)?
        };
        Ok((lon + def.from_greenwich, lat, z))
    }

    /// (lon_rad, lat_rad, h) -> native ordinates.
    fn from_geodetic(&self, (lon, lat, h): (f64, f64, f64)) -> Result<(f64, f64, f64), ProjError> {
        let def = &self.definition;
        let lon = lon - def.from_greenwich;
        let (x, y) = if self.is_latlong() {
            (lon.to_degrees(), lat.to_degrees())
        } else {
            let (x, y) = self.projection.forward(lon, lat)?;
            let k = def.to_meter.unwrap_or(1.0);
            (x / k, y / k)
        };
        Ok(def.axis.denormalize((x, y, h)))
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crs")
            .field("method", &self.definition.method)
            .field("projection", &self.projection.name())
            .finish()
    }
}

/// A CRS-to-CRS transform between two resolved endpoints.
///
/// ```
/// use reproj::{Pipeline, Point};
///
/// let pipe = Pipeline::new("EPSG:4326", "EPSG:3857").unwrap();
/// let p = pipe.transform(Point::new(90.0, 0.0)).unwrap();
/// assert!((p.x - 10_018_754.171_394_622).abs() < 1e-6);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    src: Crs,
    dst: Crs,
    grid_shift: Option<Arc<dyn GridShift>>,
}

impl Pipeline {
    /// Resolves both CRSs through the process-wide registries.
    ///
    /// Accepts registry keys (`"EPSG:4326"`), key/value strings and WKT.
    pub fn new(src_crs: &str, dst_crs: &str) -> Result<Self, ProjError> {
        PipelineBuilder::new().build(src_crs, dst_crs)
    }

    pub fn builder<'a>() -> PipelineBuilder<'a> {
        PipelineBuilder::new()
    }

    pub fn source(&self) -> &Crs {
        &self.src
    }

    pub fn target(&self) -> &Crs {
        &self.dst
    }

    /// True when both endpoints resolve to the same definition; transforms
    /// then return their input untouched.
    pub fn is_identity(&self) -> bool {
        Arc::ptr_eq(&self.src.definition, &self.dst.definition)
            || self.src.definition == self.dst.definition
    }

    /// The pipeline running the other way.
    pub fn inverse(&self) -> Self {
        Self {
            src: self.dst.clone(),
            dst: self.src.clone(),
            grid_shift: self.grid_shift.clone(),
        }
    }

    /// Transforms a single point. A 2D input gives a 2D output.
    pub fn transform(&self, point: Point) -> Result<Point, ProjError> {
        if self.is_identity() {
            return Ok(point);
        }
        if !(point.x.is_finite() && point.y.is_finite()) {
            return Err(ProjError::TransformFailed(format!("non-finite input point {point}")));
        }

        let geodetic = self.src.to_geodetic((point.x, point.y, point.z.unwrap_or(0.0)))?;
        let shifted = datum_transform(
            &self.src.definition.datum,
            &self.dst.definition.datum,
            geodetic,
            self.grid_shift.as_deref(),
        )?;
        let (x, y, z) = self.dst.from_geodetic(shifted)?;

        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjError::TransformFailed(format!(
                "non-finite output ({x}, {y}) for input {point}"
            )));
        }
        Ok(Point {
            x,
            y,
            z: point.z.map(|_| z),
        })
    }

    /// Transforms any [`Coord`] shape and returns the same shape.
    pub fn transform_coord<C: Coord>(&self, coord: &C) -> Result<C, ProjError> {
        let p = self.transform(coord.to_point()?)?;
        Ok(coord.with_point(&p))
    }

    /// Transforms points in parallel; one result per input, in input order.
    ///
    /// A failing point does not stop the others, so callers can skip
    /// domain errors and keep the rest.
    pub fn transform_batch(&self, points: &[Point]) -> Vec<Result<Point, ProjError>> {
        points.par_iter().map(|p| self.transform(*p)).collect()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("src", &self.src)
            .field("dst", &self.dst)
            .field("grid_shift", &self.grid_shift.is_some())
            .finish()
    }
}

/// Configures where a [`Pipeline`] resolves CRS text and projection methods.
pub struct PipelineBuilder<'a> {
    definitions: &'a DefinitionRegistry,
    projections: &'a ProjectionRegistry,
    grid_shift: Option<Arc<dyn GridShift>>,
}

impl Default for PipelineBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> PipelineBuilder<'a> {
    pub fn new() -> Self {
        Self {
            definitions: DefinitionRegistry::global(),
            projections: ProjectionRegistry::global(),
            grid_shift: None,
        }
    }

    pub fn definitions(mut self, registry: &'a DefinitionRegistry) -> Self {
        self.definitions = registry;
        self
    }

    pub fn projections(mut self, registry: &'a ProjectionRegistry) -> Self {
        self.projections = registry;
        self
    }

    /// Installs the hook used for grid-shift datums.
    pub fn grid_shift(mut self, hook: Arc<dyn GridShift>) -> Self {
        self.grid_shift = Some(hook);
        self
    }

    pub fn build(self, src_crs: &str, dst_crs: &str) -> Result<Pipeline, ProjError> {
        let src = Crs::new(self.definitions.resolve(src_crs)?, self.projections)?;
        let dst = Crs::new(self.definitions.resolve(dst_crs)?, self.projections)?;
        log::debug!(
            "pipeline {} -> {}",
            src.projection.name(),
            dst.projection.name()
        );
        Ok(Pipeline {
            src,
            dst,
            grid_shift: self.grid_shift,
        })
    }
}

/// One-shot transform of `coord` from `src_crs` to `dst_crs`.
///
/// Definitions are cached in the process-wide registry, so repeated calls do
/// not re-parse. Build a [`Pipeline`] to transform many points.
pub fn transform<C: Coord>(src_crs: &str, dst_crs: &str, coord: C) -> Result<C, ProjError> {
    Pipeline::new(src_crs, dst_crs)?.transform_coord(&coord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use approx::assert_relative_eq;

    const OSGB36: &str = "+proj=longlat +datum=OSGB36 +no_defs";
    const OSGB36_EXPLICIT: &str =
        "+proj=longlat +ellps=airy +towgs84=446.448,-125.157,542.06,0.1502,0.247,0.8421,-20.4894 +no_defs";

    #[test]
    fn test_web_mercator_control_points() {
        let pipe = Pipeline::new("EPSG:4326", "EPSG:3857").unwrap();
        let origin = pipe.transform(Point::new(0.0, 0.0)).unwrap();
        assert_relative_eq!(origin.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(origin.y, 0.0, epsilon = 1e-9);

        let p = pipe.transform(Point::new(90.0, 0.0)).unwrap();
        assert_relative_eq!(p.x, 10_018_754.171_394_622, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_identity_same_crs() {
        let pipe = Pipeline::new("EPSG:4326", "EPSG:4326").unwrap();
        assert!(pipe.is_identity());
        let p = pipe.transform(Point::new(2.0, 41.0)).unwrap();
        assert_eq!(p.x.to_bits(), 2.0_f64.to_bits());
        assert_eq!(p.y.to_bits(), 41.0_f64.to_bits());

        // Alias keys share the definition.
        assert!(Pipeline::new("WGS84", "EPSG:4326").unwrap().is_identity());
        let utm = Pipeline::new("EPSG:32633", "EPSG:32633").unwrap();
        let q = utm.transform(Point::new(500_000.0, 5_760_000.0)).unwrap();
        assert_eq!(q, Point::new(500_000.0, 5_760_000.0));
    }

    #[test]
    fn test_utm33_roundtrip() {
        let fwd = Pipeline::new("EPSG:4326", "EPSG:32633").unwrap();
        let inv = fwd.inverse();
        for &(lon, lat) in &[(15.0, 52.0), (12.0, 50.0), (18.0, 60.0), (13.5, 0.5)] {
            let p = fwd.transform(Point::new(lon, lat)).unwrap();
            let q = inv.transform(p).unwrap();
            assert_relative_eq!(q.x, lon, epsilon = 1e-9);
            assert_relative_eq!(q.y, lat, epsilon = 1e-9);
        }
        let centre = fwd.transform(Point::new(15.0, 52.0)).unwrap();
        assert_relative_eq!(centre.x, 500_000.0, epsilon = 1e-6);
        assert_relative_eq!(centre.y, 5_761_038.212_6, epsilon = 1e-3);
    }

    #[test]
    fn test_utm_matches_proj4rs() {
        let native = Pipeline::new("EPSG:4326", "+proj=utm +zone=33 +datum=WGS84 +units=m").unwrap();
        let src = proj4rs::Proj::from_proj_string("+proj=longlat +datum=WGS84").unwrap();
        let dst = proj4rs::Proj::from_proj_string("+proj=utm +zone=33 +datum=WGS84 +units=m").unwrap();

        for &(lon, lat) in &[(15.0_f64, 52.0_f64), (13.2, 48.1), (16.9, 58.4), (14.0, -33.0)] {
            let p = native.transform(Point::new(lon, lat)).unwrap();
            let mut reference = (lon.to_radians(), lat.to_radians());
            proj4rs::transform::transform(&src, &dst, &mut reference).unwrap();
            assert_relative_eq!(p.x, reference.0, epsilon = 1e-2);
            assert_relative_eq!(p.y, reference.1, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_seven_parameter_shift_matches_proj4rs() {
        let native = Pipeline::new(OSGB36, "EPSG:4326").unwrap();
        let src = proj4rs::Proj::from_proj_string(OSGB36_EXPLICIT).unwrap();
        let dst = proj4rs::Proj::from_proj_string("+proj=longlat +datum=WGS84").unwrap();

        for &(lon, lat) in &[(-0.1275_f64, 51.5072_f64), (-3.19, 55.95), (-5.7, 50.07)] {
            let p = native.transform(Point::new(lon, lat)).unwrap();
            // The shift between OSGB36 and WGS84 is on the order of 100 m.
            assert!((p.x - lon).abs() > 1e-4 && (p.x - lon).abs() < 1e-2, "{p}");

            let mut reference = (lon.to_radians(), lat.to_radians());
            proj4rs::transform::transform(&src, &dst, &mut reference).unwrap();
            assert_relative_eq!(p.x, reference.0.to_degrees(), epsilon = 1e-7);
            assert_relative_eq!(p.y, reference.1.to_degrees(), epsilon = 1e-7);
        }
    }

    #[test]
    fn test_named_and_explicit_datums_agree() {
        let named = Pipeline::new(OSGB36, "EPSG:4326").unwrap();
        let explicit = Pipeline::new(OSGB36_EXPLICIT, "EPSG:4326").unwrap();
        let a = named.transform(Point::new(-1.5, 53.0)).unwrap();
        let b = explicit.transform(Point::new(-1.5, 53.0)).unwrap();
        assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-12);

        // The reverse Helmert negates the small-angle rotation, which is not
        // an exact inverse; the residual is about a millimetre.
        let back = named.inverse().transform(a).unwrap();
        assert_relative_eq!(back.x, -1.5, epsilon = 1e-7);
        assert_relative_eq!(back.y, 53.0, epsilon = 1e-7);
    }

    #[test]
    fn test_axis_order_swaps_components() {
        let enu = Pipeline::new("EPSG:4326", "EPSG:3857").unwrap();
        let neu = Pipeline::new(
            "EPSG:4326",
            "+proj=merc +a=6378137 +b=6378137 +nadgrids=@null +axis=neu",
        )
        .unwrap();
        let a = enu.transform(Point::new(10.0, 45.0)).unwrap();
        let b = neu.transform(Point::new(10.0, 45.0)).unwrap();
        assert_relative_eq!(a.x, b.y, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.x, epsilon = 1e-9);

        let lat_first = Pipeline::new("+proj=longlat +datum=WGS84 +axis=neu", "EPSG:3857").unwrap();
        let c = lat_first.transform(Point::new(45.0, 10.0)).unwrap();
        assert_relative_eq!(c.x, a.x, epsilon = 1e-9);
        assert_relative_eq!(c.y, a.y, epsilon = 1e-9);
    }

    #[test]
    fn test_units_scale_output() {
        let metres = Pipeline::new("EPSG:4326", "+proj=tmerc +lon_0=-100 +ellps=GRS80 +units=m").unwrap();
        let feet = Pipeline::new("EPSG:4326", "+proj=tmerc +lon_0=-100 +ellps=GRS80 +units=us-ft").unwrap();
        let a = metres.transform(Point::new(-99.0, 40.0)).unwrap();
        let b = feet.transform(Point::new(-99.0, 40.0)).unwrap();
        assert_relative_eq!(b.x, a.x * 3937.0 / 1200.0, epsilon = 1e-6);
        assert_relative_eq!(b.y, a.y * 3937.0 / 1200.0, epsilon = 1e-6);

        let back = feet.inverse().transform(b).unwrap();
        assert_relative_eq!(back.x, -99.0, epsilon = 1e-9);
        assert_relative_eq!(back.y, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_prime_meridian_offset() {
        // Paris meridian is 2°20'14.025" east of Greenwich.
        let pipe = Pipeline::new("+proj=longlat +ellps=WGS84 +pm=paris", "+proj=longlat +ellps=WGS84").unwrap();
        let p = pipe.transform(Point::new(0.0, 48.0)).unwrap();
        assert_relative_eq!(p.x, 2.337_229_166_666_667, epsilon = 1e-9);
        assert_relative_eq!(p.y, 48.0, epsilon = 1e-12);
    }

    #[test]
    fn test_height_is_kept_only_for_3d_input() {
        let pipe = Pipeline::new("EPSG:4326", "EPSG:3857").unwrap();
        assert_eq!(pipe.transform(Point::new(1.0, 2.0)).unwrap().z, None);
        let p = pipe.transform(Point::new_3d(1.0, 2.0, 150.0)).unwrap();
        assert_eq!(p.z, Some(150.0));
    }

    #[test]
    fn test_pole_returns_domain_error() {
        let pipe = Pipeline::new("EPSG:4326", "EPSG:3857").unwrap();
        assert!(pipe.transform(Point::new(0.0, 90.0)).unwrap_err().is_domain_error());
        let err = pipe.inverse().transform(Point::new(0.0, 1.0e9)).unwrap_err();
        assert!(err.is_domain_error(), "{err}");
    }

    #[test]
    fn test_geographic_latitude_out_of_range_rejected() {
        for dst in ["EPSG:32633", "+proj=eqc +ellps=WGS84", "EPSG:3857", "EPSG:4269"] {
            let pipe = Pipeline::new("EPSG:4326", dst).unwrap();
            for lat in [95.0, -90.5] {
                let err = pipe.transform(Point::new(15.0, lat)).unwrap_err();
                assert!(err.is_domain_error(), "{dst} at {lat}: {err}");
            }
            assert!(pipe.transform(Point::new(15.0, 89.0)).is_ok(), "{dst}");
        }
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let pipe = Pipeline::new("EPSG:4326", "EPSG:3857").unwrap();
        assert!(matches!(
            pipe.transform(Point::new(f64::NAN, 0.0)),
            Err(ProjError::TransformFailed(_))
        ));
    }

    #[test]
    fn test_grid_shift_without_hook_fails() {
        let pipe = Pipeline::new("+proj=longlat +datum=NAD27", "EPSG:4326").unwrap();
        let err = pipe.transform(Point::new(-100.0, 40.0)).unwrap_err();
        assert!(matches!(err, ProjError::GridShiftUnavailable(ref grids) if grids.starts_with("@conus")));
    }

    struct Offset;

    impl GridShift for Offset {
        fn shift(&self, _grids: &[String], lon: f64, lat: f64, inverse: bool) -> Result<(f64, f64), ProjError> {
            let d = if inverse { -1.0e-5 } else { 1.0e-5 };
            Ok((lon + d, lat))
        }
    }

    #[test]
    fn test_grid_shift_hook_is_applied() {
        let pipe = Pipeline::builder()
            .grid_shift(Arc::new(Offset))
            .build("+proj=longlat +ellps=clrk66 +nadgrids=ntv1_can.dat", "EPSG:4326")
            .unwrap();
        let p = pipe.transform(Point::new(-100.0, 40.0)).unwrap();
        assert_relative_eq!(p.x, -100.0 + 1.0e-5_f64.to_degrees(), epsilon = 1e-9);
        assert_relative_eq!(p.y, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_batch_keeps_failures_per_point() {
        let pipe = Pipeline::new("EPSG:4326", "EPSG:3857").unwrap();
        let points = vec![Point::new(0.0, 0.0), Point::new(0.0, 90.0), Point::new(90.0, 0.0)];
        let results = pipe.transform_batch(&points);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].as_ref().unwrap_err().is_domain_error());
        assert_relative_eq!(results[2].as_ref().unwrap().x, 10_018_754.171_394_622, epsilon = 1e-6);
    }

    #[test]
    fn test_transform_keeps_caller_shape() {
        let arr: [f64; 2] = transform("EPSG:4326", "EPSG:3857", [90.0, 0.0]).unwrap();
        assert_relative_eq!(arr[0], 10_018_754.171_394_622, epsilon = 1e-6);

        let s: String = transform("EPSG:4326", "EPSG:4326", "2,41".to_string()).unwrap();
        assert_eq!(s, "2,41");

        let v: Vec<f64> = transform("EPSG:3857", "EPSG:4326", vec![0.0, 0.0, 10.0]).unwrap();
        assert_eq!(v.len(), 3);
        assert_relative_eq!(v[2], 10.0);
    }

    #[test]
    fn test_injected_registry() {
        let registry = DefinitionRegistry::new();
        registry.register("LOCAL:1", "+proj=longlat +ellps=WGS84").unwrap();
        let pipe = Pipeline::builder()
            .definitions(&registry)
            .build("LOCAL:1", "+proj=eqc +ellps=WGS84")
            .unwrap();
        let p = pipe.transform(Point::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(p.x, 6_378_137.0 * 1.0_f64.to_radians(), epsilon = 1e-6);

        let err = Pipeline::builder()
            .definitions(&registry)
            .build("EPSG:4326", "LOCAL:1")
            .unwrap_err();
        assert!(matches!(err, ProjError::Parse(ParseError::UnknownCrs(_))));
    }

    #[test]
    fn test_equal_definitions_under_two_keys_are_identity() {
        let registry = DefinitionRegistry::new();
        let a = registry.register("SITE:A", "+proj=utm +zone=33 +datum=WGS84").unwrap();
        let b = registry.register("SITE:B", "+proj=utm +zone=33 +datum=WGS84").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        let pipe = Pipeline::builder()
            .definitions(&registry)
            .build("SITE:A", "SITE:B")
            .unwrap();
        assert!(pipe.is_identity());
        let p = Point::new_3d(500_000.123_456_789, 5_000_000.987_654_321, 12.5);
        let out = pipe.transform(p).unwrap();
        assert_eq!(out.x.to_bits(), p.x.to_bits());
        assert_eq!(out.y.to_bits(), p.y.to_bits());
        assert_eq!(out.z, p.z);
    }

    #[test]
    fn test_unknown_projection_surfaces_parse_error() {
        let err = Pipeline::new("EPSG:4326", "+proj=robin").unwrap_err();
        assert!(matches!(err, ProjError::Parse(ParseError::UnknownProjection(_))));
    }
}
