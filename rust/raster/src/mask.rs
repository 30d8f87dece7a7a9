// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mask rasterization.
//!
//! Rings are filled with a scanline pass that samples pixel centres, so a
//! polygon edge on an integer pixel coordinate never bleeds into the
//! neighbouring pixel. A 1×1 world square at scale 100 covers exactly
//! 100×100 pixels.

use crate::frame::RasterFrame;
use facade_mask_geometry::{Polygon2D, PolygonSet};
use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage};
use nalgebra::Point2;

/// Foreground (facade) value of a binary mask
pub const FOREGROUND: u8 = 255;

/// Background value of a binary mask
pub const BACKGROUND: u8 = 0;

/// Door colour of the categorical mask
pub const DOOR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Window colour of the categorical mask
pub const WINDOW_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Binary mask together with the frame that produced it.
///
/// The frame carries the scale and the world origin of the bounding box, so
/// any pixel can be mapped back onto the wall plane.
#[derive(Debug, Clone)]
pub struct Mask {
    pub image: GrayImage,
    pub frame: RasterFrame,
}

impl Mask {
    /// Rasterize a polygon set in the given frame
    pub fn new(set: &PolygonSet, frame: RasterFrame) -> Self {
        tracing::trace!(
            width = frame.width,
            height = frame.height,
            polygons = set.len(),
            "Rasterizing mask"
        );
        Self {
            image: rasterize_mask(set, &frame),
            frame,
        }
    }

    /// Number of foreground pixels
    pub fn foreground_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] == FOREGROUND).count()
    }
}

/// Fill one ring with `color`, even-odd, sampling at pixel centres.
///
/// `ring` is in continuous pixel coordinates. Parts outside the canvas are
/// clipped.
pub fn fill_ring<P>(canvas: &mut ImageBuffer<P, Vec<P::Subpixel>>, ring: &[Point2<f64>], color: P)
where
    P: Pixel,
{
    let n = ring.len();
    if n < 3 {
        return;
    }

    let (width, height) = canvas.dimensions();
    let (min_y, max_y) = ring
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    // Rows whose centre lies in [min_y, max_y)
    let first_row = (min_y - 0.5).ceil().max(0.0) as u32;
    let end_row = ((max_y - 0.5).ceil().min(height as f64)).max(0.0) as u32;

    let mut crossings: Vec<f64> = Vec::with_capacity(8);
    for row in first_row..end_row {
        let yc = row as f64 + 0.5;

        crossings.clear();
        for i in 0..n {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            if (a.y <= yc) != (b.y <= yc) {
                crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0);
            let end = (span[1] - 0.5).ceil().min(width as f64);
            if start >= end {
                continue;
            }
            for col in start as u32..end as u32 {
                canvas.put_pixel(col, row, color);
            }
        }
    }
}

/// Fill a polygon's exterior with `color`, then re-punch its holes with `background`
fn fill_polygon<P>(
    canvas: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    polygon: &Polygon2D,
    frame: &RasterFrame,
    color: P,
    background: P,
) where
    P: Pixel,
{
    fill_ring(canvas, &frame.ring_to_pixels(&polygon.exterior), color);
    for hole in &polygon.interiors {
        fill_ring(canvas, &frame.ring_to_pixels(hole), background);
    }
}

/// Binary mask: 255 inside the polygons, 0 elsewhere (holes included)
pub fn rasterize_mask(set: &PolygonSet, frame: &RasterFrame) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(frame.width, frame.height, Luma([BACKGROUND]));
    for polygon in &set.polygons {
        fill_polygon(
            &mut canvas,
            polygon,
            frame,
            Luma([FOREGROUND]),
            Luma([BACKGROUND]),
        );
    }
    canvas
}

/// Categorical mask: doors in [`DOOR_COLOR`], windows in [`WINDOW_COLOR`], black elsewhere
pub fn rasterize_categories(
    doors: &[PolygonSet],
    windows: &[PolygonSet],
    frame: &RasterFrame,
) -> RgbImage {
    let background = Rgb([0, 0, 0]);
    let mut canvas = RgbImage::from_pixel(frame.width, frame.height, background);

    for (sets, color) in [(doors, DOOR_COLOR), (windows, WINDOW_COLOR)] {
        for polygon in sets.iter().flat_map(|s| s.polygons.iter()) {
            fill_polygon(&mut canvas, polygon, frame, color, background);
        }
    }
    canvas
}
