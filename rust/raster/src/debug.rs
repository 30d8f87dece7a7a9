// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostic renders of intermediate ring sets.
//!
//! Purely for inspection: each ring is drawn in its own grey shade so
//! overlapping parts remain distinguishable. Nothing downstream reads these.

use crate::frame::{Flip, RasterFrame};
use facade_mask_geometry::bool2d::rings_bounds;
use facade_mask_geometry::Ring2;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

/// Shades cycled through per ring
pub const DEBUG_SHADES: [u8; 5] = [50, 100, 150, 200, 255];

/// Smallest side of a diagnostic image
const MIN_DEBUG_SIDE: u32 = 2;

/// Render rings into a greyscale image fitted to their bounds.
///
/// Returns `None` when no ring has three points or the image would be
/// smaller than 2×2 pixels.
pub fn render_rings(rings: &[Ring2], scale: f64, flip: Flip) -> Option<GrayImage> {
    let usable: Vec<&Ring2> = rings.iter().filter(|r| r.len() >= 3).collect();
    if usable.is_empty() {
        return None;
    }

    let (min, max) = rings_bounds(usable.iter().copied())?;
    let frame = RasterFrame::from_bounds(min, max, scale, flip).ok()?;
    if frame.width < MIN_DEBUG_SIDE || frame.height < MIN_DEBUG_SIDE {
        return None;
    }

    let mut image = GrayImage::new(frame.width, frame.height);
    for (i, ring) in usable.iter().enumerate() {
        let shade = DEBUG_SHADES[i % DEBUG_SHADES.len()];
        if let Some(points) = pixel_polygon(&frame, ring) {
            draw_polygon_mut(&mut image, &points, Luma([shade]));
        }
    }

    Some(image)
}

/// Integer polygon for imageproc: no repeated vertices, not closed
fn pixel_polygon(frame: &RasterFrame, ring: &Ring2) -> Option<Vec<Point<i32>>> {
    let mut points: Vec<Point<i32>> = frame
        .ring_to_pixels(ring)
        .iter()
        .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect();
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    (points.len() >= 3).then_some(points)
}
