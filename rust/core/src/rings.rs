// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ring extraction: turn polygon nodes into shifted 3D point rings.
//!
//! Malformed coordinate text never aborts a walk. A ring that fails to parse,
//! or that has fewer than three points, is skipped and extraction continues
//! with the next polygon.

use crate::tree::{CityNode, OpeningKind, PolygonNode, RingNode};
use nalgebra::{Point3, Vector3};

/// Ring of 3D points. Closure (first == last) is not required.
pub type Ring3 = Vec<Point3<f64>>;

/// Minimum number of points for a usable ring
pub const MIN_RING_POINTS: usize = 3;

/// An opening ring together with its category
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningRing {
    pub kind: OpeningKind,
    pub ring: Ring3,
}

/// Parse a `posList` into points with `shift` subtracted.
///
/// Returns `None` if the text is empty, contains a token that is not a
/// finite number (`nan` and `inf` included), or does not hold a whole number
/// of `x y z` triples.
pub fn parse_pos_list(text: &str, shift: &Vector3<f64>) -> Option<Vec<Point3<f64>>> {
    let mut coords = Vec::new();
    for token in text.split_ascii_whitespace() {
        let value = fast_float::parse::<f64, _>(token).ok()?;
        if !value.is_finite() {
            return None;
        }
        coords.push(value);
    }

    if coords.is_empty() || coords.len() % 3 != 0 {
        return None;
    }

    Some(
        coords
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]) - shift)
            .collect(),
    )
}

fn ring_points(ring: &RingNode, shift: &Vector3<f64>) -> Option<Ring3> {
    let points = parse_pos_list(&ring.pos_list, shift)?;
    if points.len() < MIN_RING_POINTS {
        return None;
    }
    Some(points)
}

/// Exterior ring of a polygon, if present and well formed
pub fn exterior_ring(polygon: &PolygonNode, shift: &Vector3<f64>) -> Option<Ring3> {
    polygon
        .exterior
        .as_ref()
        .and_then(|ring| ring_points(ring, shift))
}

/// Interior rings (holes) declared directly on a polygon
pub fn interior_rings(polygon: &PolygonNode, shift: &Vector3<f64>) -> Vec<Ring3> {
    polygon
        .interiors
        .iter()
        .filter_map(|ring| ring_points(ring, shift))
        .collect()
}

/// Every exterior ring found anywhere beneath `node`, in document order
pub fn all_exterior_rings(node: &CityNode, shift: &Vector3<f64>) -> Vec<Ring3> {
    node.polygons()
        .filter_map(|polygon| exterior_ring(polygon, shift))
        .collect()
}

/// Opening rings of a wall.
///
/// Interior rings of every polygon beneath the wall count as punched holes.
/// Exterior rings count as openings when the polygon sits below a door,
/// window or opening property element.
pub fn collect_openings(wall: &CityNode, shift: &Vector3<f64>) -> Vec<OpeningRing> {
    let mut openings = Vec::new();

    wall.visit_polygons(|polygon, context| {
        for ring in interior_rings(polygon, shift) {
            openings.push(OpeningRing {
                kind: OpeningKind::Hole,
                ring,
            });
        }
        if let Some(kind) = context {
            if let Some(ring) = exterior_ring(polygon, shift) {
                openings.push(OpeningRing { kind, ring });
            }
        }
    });

    openings
}
