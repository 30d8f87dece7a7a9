// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane projection: flatten a near-planar facade into a 2D frame.
//!
//! A frame is derived once per wall from its facade and reused for every ring
//! of that wall, so facade and openings always share one coordinate system.
//!
//! Two strategies are available behind [`PlaneProjector`]:
//! - [`NormalProjector`]: axes from the first facade polygon's normal and world
//!   up. Deterministic orientation (y points up the wall).
//! - [`PcaProjector`]: best-fit plane of all facade and opening points via SVD.
//!   Tolerates non-planar noise but has no canonical orientation.

use crate::error::{Error, Result};
use facade_mask_core::Ring3;
use nalgebra::{DMatrix, Point2, Point3, Vector3};

/// Cross products / projected vectors below this length are degenerate
pub const DEGENERATE_EPSILON: f64 = 1e-8;

/// Singular values below this are treated as zero
const RANK_EPSILON: f64 = 1e-12;

/// Iteration cap for the PCA decomposition
const SVD_MAX_ITERATIONS: usize = 1_000;

/// Orthonormal 2D basis embedded in 3D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionFrame {
    /// Point mapped to (0, 0). The world origin for normal-based frames,
    /// the point cloud mean for PCA frames.
    pub origin: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub y_axis: Vector3<f64>,
    /// Unit normal of the plane (x_axis × y_axis up to sign)
    pub normal: Vector3<f64>,
}

impl ProjectionFrame {
    /// Project a 3D point onto the frame
    #[inline]
    pub fn project(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.x_axis), d.dot(&self.y_axis))
    }

    /// Project every point of a ring
    pub fn project_ring(&self, ring: &[Point3<f64>]) -> Vec<Point2<f64>> {
        ring.iter().map(|p| self.project(p)).collect()
    }

    /// Map frame coordinates back onto the plane in 3D
    #[inline]
    pub fn unproject(&self, p: &Point2<f64>) -> Point3<f64> {
        self.origin + self.x_axis * p.x + self.y_axis * p.y
    }
}

/// Strategy for deriving a projection frame from a wall's rings
pub trait PlaneProjector: Send + Sync {
    fn derive_frame(&self, facade: &[Ring3], openings: &[Ring3]) -> Result<ProjectionFrame>;
}

/// Projection strategy selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectionMode {
    #[default]
    Normal,
    Pca,
}

impl ProjectionMode {
    pub fn projector(self) -> &'static dyn PlaneProjector {
        match self {
            ProjectionMode::Normal => &NormalProjector,
            ProjectionMode::Pca => &PcaProjector,
        }
    }
}

/// Unit normal of a ring from the cross product of its first two edges
pub fn ring_normal(ring: &[Point3<f64>]) -> Result<Vector3<f64>> {
    if ring.len() < 3 {
        return Err(Error::TooFewPoints(ring.len()));
    }

    let cross = (ring[1] - ring[0]).cross(&(ring[2] - ring[0]));
    let magnitude = cross.norm();
    // Also rejects NaN
    if !(magnitude >= DEGENERATE_EPSILON) {
        return Err(Error::DegenerateNormal);
    }
    Ok(cross / magnitude)
}

/// Build (x_axis, y_axis) from a unit normal using world up (Gram-Schmidt)
pub fn axes_from_normal(normal: &Vector3<f64>) -> Result<(Vector3<f64>, Vector3<f64>)> {
    let up = Vector3::z();
    let tangent = up - normal * up.dot(normal);
    let magnitude = tangent.norm();
    if !(magnitude >= DEGENERATE_EPSILON) {
        return Err(Error::NearlyHorizontal);
    }

    let y_axis = tangent / magnitude;
    let x_axis = normal.cross(&y_axis).normalize();
    Ok((x_axis, y_axis))
}

/// Frame from the normal of the first facade polygon
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalProjector;

impl PlaneProjector for NormalProjector {
    fn derive_frame(&self, facade: &[Ring3], _openings: &[Ring3]) -> Result<ProjectionFrame> {
        let first = facade.first().ok_or(Error::EmptyFacade)?;
        let normal = ring_normal(first)?;
        let (x_axis, y_axis) = axes_from_normal(&normal)?;

        Ok(ProjectionFrame {
            origin: Point3::origin(),
            x_axis,
            y_axis,
            normal,
        })
    }
}

/// Frame from the two principal directions of all wall points
#[derive(Debug, Clone, Copy, Default)]
pub struct PcaProjector;

impl PlaneProjector for PcaProjector {
    fn derive_frame(&self, facade: &[Ring3], openings: &[Ring3]) -> Result<ProjectionFrame> {
        let points: Vec<&Point3<f64>> = facade.iter().chain(openings).flatten().collect();
        if points.len() < 3 {
            return Err(Error::DegenerateCloud(format!(
                "{} points, need at least 3",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(Error::DegenerateCloud("non-finite coordinate".to_string()));
        }

        let count = points.len() as f64;
        let mean = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / count;

        let centered = DMatrix::from_fn(points.len(), 3, |r, c| points[r][c] - mean[c]);
        let svd = centered
            .try_svd(false, true, f64::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or_else(|| Error::DegenerateCloud("SVD did not converge".to_string()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| Error::DegenerateCloud("SVD did not converge".to_string()))?;

        // Order components by singular value, largest first
        let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
        order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));
        if order.len() < 2 || svd.singular_values[order[1]] < RANK_EPSILON {
            return Err(Error::DegenerateCloud("points are collinear".to_string()));
        }

        let row = |i: usize| Vector3::new(v_t[(i, 0)], v_t[(i, 1)], v_t[(i, 2)]).normalize();
        let x_axis = row(order[0]);
        let y_axis = row(order[1]);

        Ok(ProjectionFrame {
            origin: Point3::from(mean),
            x_axis,
            y_axis,
            normal: x_axis.cross(&y_axis).normalize(),
        })
    }
}
