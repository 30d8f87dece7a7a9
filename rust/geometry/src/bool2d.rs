// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Polygon Repair and Boolean Operations
//!
//! Wraps the i_overlay boolean engine (repair, union, difference) and the geo
//! predicates (intersects, distance). Every backend call is guarded: a panic
//! inside the backend or non-finite input is reported as
//! [`GeomOutcome::Failed`] (or the documented fallback value for predicates),
//! never propagated. Callers decide per operation what a failure means.

use crate::error::{Error, Result};
use geo::{EuclideanDistance, Intersects, LineString};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;
use std::panic::{self, AssertUnwindSafe};

/// Minimum area threshold - polygons smaller than this are considered degenerate
pub const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Distance reported when the distance predicate itself fails
pub const FAR_DISTANCE: f64 = 999_999_999.0;

/// Ring of 2D points. Closure (first == last) is not required.
pub type Ring2 = Vec<Point2<f64>>;

type Path = Vec<[f64; 2]>;
type Shapes = Vec<Vec<Path>>;

/// Polygon with one exterior ring and optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2D {
    pub exterior: Ring2,
    pub interiors: Vec<Ring2>,
}

impl Polygon2D {
    pub fn new(exterior: Ring2) -> Self {
        Self {
            exterior,
            interiors: Vec::new(),
        }
    }

    /// Unsigned area, holes subtracted
    pub fn area(&self) -> f64 {
        let holes: f64 = self
            .interiors
            .iter()
            .map(|h| compute_signed_area(h).abs())
            .sum();
        compute_signed_area(&self.exterior).abs() - holes
    }

    /// Exterior followed by holes
    pub fn rings(&self) -> impl Iterator<Item = &Ring2> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    fn is_finite(&self) -> bool {
        self.rings()
            .flatten()
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }
}

/// A single polygon or a collection of (ideally disjoint) polygons
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonSet {
    pub polygons: Vec<Polygon2D>,
}

impl PolygonSet {
    pub fn new(polygons: Vec<Polygon2D>) -> Self {
        Self { polygons }
    }

    pub fn from_polygon(polygon: Polygon2D) -> Self {
        Self {
            polygons: vec![polygon],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn area(&self) -> f64 {
        self.polygons.iter().map(Polygon2D::area).sum()
    }

    /// Every ring of every polygon, exteriors and holes
    pub fn rings(&self) -> impl Iterator<Item = &Ring2> {
        self.polygons.iter().flat_map(Polygon2D::rings)
    }

    /// Exterior rings only
    pub fn exteriors(&self) -> impl Iterator<Item = &Ring2> {
        self.polygons.iter().map(|p| &p.exterior)
    }

    /// Bounding box over all rings
    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        rings_bounds(self.rings())
    }

    fn is_finite(&self) -> bool {
        self.polygons.iter().all(Polygon2D::is_finite)
    }
}

/// Result of a guarded geometry operation
#[derive(Debug, Clone, PartialEq)]
pub enum GeomOutcome<T> {
    /// Non-empty result
    Valid(T),
    /// The operation succeeded but nothing of positive area is left
    Empty,
    /// The backend failed; the message says where
    Failed(String),
}

impl<T> GeomOutcome<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, GeomOutcome::Valid(_))
    }

    /// The value, treating `Empty` and `Failed` alike
    pub fn valid(self) -> Option<T> {
        match self {
            GeomOutcome::Valid(value) => Some(value),
            GeomOutcome::Empty | GeomOutcome::Failed(_) => None,
        }
    }
}

/// Build a polygon from a ring. The ring may self-intersect; see [`repair`].
pub fn build_polygon(ring: &[Point2<f64>]) -> Result<Polygon2D> {
    if ring.len() < 3 {
        return Err(Error::TooFewPoints(ring.len()));
    }
    Ok(Polygon2D::new(ring.to_vec()))
}

/// Resolve self-intersections by re-filling the rings with the even-odd rule.
///
/// The result may split into several polygons, or be empty when nothing of
/// positive area remains. Callers drop `Empty` and `Failed` shapes.
pub fn repair(set: &PolygonSet) -> GeomOutcome<PolygonSet> {
    if set.is_empty() {
        return GeomOutcome::Empty;
    }
    if !set.is_finite() {
        return GeomOutcome::Failed("repair: non-finite coordinates".to_string());
    }

    let subject: Vec<Path> = set.rings().map(|r| contour_to_path(r)).collect();
    let clip: Vec<Path> = Vec::new();

    match guarded("repair", || {
        subject.overlay(&clip, OverlayRule::Union, FillRule::EvenOdd)
    }) {
        Ok(shapes) => shapes_to_outcome(shapes),
        Err(message) => GeomOutcome::Failed(message),
    }
}

/// Merge polygon sets into one (possibly multi-part) set.
///
/// Rings are normalised (exteriors counter-clockwise, holes clockwise) and
/// filled with the non-zero rule, so overlapping inputs merge instead of
/// cancelling out.
pub fn union(sets: &[PolygonSet]) -> GeomOutcome<PolygonSet> {
    let polygons: Vec<&Polygon2D> = sets.iter().flat_map(|s| s.polygons.iter()).collect();
    if polygons.is_empty() {
        return GeomOutcome::Empty;
    }
    if !polygons.iter().all(|p| p.is_finite()) {
        return GeomOutcome::Failed("union: non-finite coordinates".to_string());
    }

    let subject: Vec<Path> = polygons.into_iter().flat_map(oriented_paths).collect();
    let clip: Vec<Path> = Vec::new();

    match guarded("union", || {
        subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero)
    }) {
        Ok(shapes) => shapes_to_outcome(shapes),
        Err(message) => GeomOutcome::Failed(message),
    }
}

/// Subtract `b` from `a`.
///
/// An empty `b` returns `a` unchanged. `Empty` means `b` covers all of `a`.
pub fn difference(a: &PolygonSet, b: &PolygonSet) -> GeomOutcome<PolygonSet> {
    if a.is_empty() {
        return GeomOutcome::Empty;
    }
    if b.is_empty() {
        return GeomOutcome::Valid(a.clone());
    }
    if !a.is_finite() || !b.is_finite() {
        return GeomOutcome::Failed("difference: non-finite coordinates".to_string());
    }

    let subject: Vec<Path> = a.polygons.iter().flat_map(oriented_paths).collect();
    let clip: Vec<Path> = b.polygons.iter().flat_map(oriented_paths).collect();

    match guarded("difference", || {
        subject.overlay(&clip, OverlayRule::Difference, FillRule::NonZero)
    }) {
        Ok(shapes) => shapes_to_outcome(shapes),
        Err(message) => GeomOutcome::Failed(message),
    }
}

/// True if the sets share at least one point (touching counts).
///
/// Returns `false` if the predicate fails.
pub fn intersects(a: &PolygonSet, b: &PolygonSet) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return false;
    }

    let (ga, gb) = (to_geo(a), to_geo(b));
    guarded("intersects", || {
        ga.iter().any(|pa| gb.iter().any(|pb| pa.intersects(pb)))
    })
    .unwrap_or_else(|message| {
        tracing::warn!(%message, "Intersects predicate failed");
        false
    })
}

/// Minimum Euclidean distance between two sets, zero when they intersect.
///
/// Returns [`FAR_DISTANCE`] if the predicate fails or either set is empty.
pub fn distance(a: &PolygonSet, b: &PolygonSet) -> f64 {
    if a.is_empty() || b.is_empty() || !a.is_finite() || !b.is_finite() {
        return FAR_DISTANCE;
    }

    let (ga, gb) = (to_geo(a), to_geo(b));
    guarded("distance", || {
        ga.iter()
            .flat_map(|pa| gb.iter().map(move |pb| pa.euclidean_distance(pb)))
            .fold(f64::INFINITY, f64::min)
    })
    .ok()
    .filter(|d| d.is_finite())
    .unwrap_or_else(|| {
        tracing::warn!("Distance predicate failed");
        FAR_DISTANCE
    })
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let area = compute_signed_area(contour).abs();
    area > MIN_AREA_THRESHOLD
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let area = compute_signed_area(contour);
    if area < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let area = compute_signed_area(contour);
    if area > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Compute bounding box over several rings
pub fn rings_bounds<'a, I>(rings: I) -> Option<(Point2<f64>, Point2<f64>)>
where
    I: IntoIterator<Item = &'a Ring2>,
{
    let mut points = rings.into_iter().flatten();
    let first = *points.next()?;
    let mut min = first;
    let mut max = first;

    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some((min, max))
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Run a backend call, turning a panic into an error message
fn guarded<T>(op: &str, f: impl FnOnce() -> T) -> std::result::Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        format!("{op}: {detail}")
    })
}

/// Exterior counter-clockwise, holes clockwise
fn oriented_paths(polygon: &Polygon2D) -> Vec<Path> {
    let mut paths = Vec::with_capacity(1 + polygon.interiors.len());
    paths.push(contour_to_path(&ensure_ccw(&polygon.exterior)));
    for hole in &polygon.interiors {
        paths.push(contour_to_path(&ensure_cw(hole)));
    }
    paths
}

/// Convert a Point2 contour to i_overlay path format
fn contour_to_path(contour: &[Point2<f64>]) -> Path {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Ring2 {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// Convert i_overlay result shapes to a polygon set.
///
/// Each shape is a list of contours: the first is the outer boundary, the
/// rest are holes. Degenerate shapes and holes are dropped.
fn shapes_to_outcome(shapes: Shapes) -> GeomOutcome<PolygonSet> {
    let mut polygons = Vec::with_capacity(shapes.len());

    for shape in &shapes {
        let Some((outer, holes)) = shape.split_first() else {
            continue;
        };
        let exterior = path_to_contour(outer);
        if !is_valid_contour(&exterior) {
            continue;
        }
        let interiors = holes
            .iter()
            .map(|h| path_to_contour(h))
            .filter(|h| is_valid_contour(h))
            .collect();
        let polygon = Polygon2D {
            exterior,
            interiors,
        };
        if polygon.area() > MIN_AREA_THRESHOLD {
            polygons.push(polygon);
        }
    }

    if polygons.is_empty() {
        GeomOutcome::Empty
    } else {
        GeomOutcome::Valid(PolygonSet::new(polygons))
    }
}

fn to_geo(set: &PolygonSet) -> Vec<geo::Polygon<f64>> {
    let line = |ring: &Ring2| LineString::from(ring.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>());
    set.polygons
        .iter()
        .map(|p| geo::Polygon::new(line(&p.exterior), p.interiors.iter().map(line).collect()))
        .collect()
}
