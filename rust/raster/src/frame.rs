// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! World-to-pixel mapping for masks.

use crate::error::{Error, Result};
use facade_mask_geometry::PolygonSet;
use nalgebra::Point2;

/// Default world-to-pixel scale (pixels per world unit)
pub const DEFAULT_SCALE: f64 = 100.0;

/// Axis mirroring applied after scaling.
///
/// One convention is chosen per run and used for every image it writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flip {
    /// Pixel = (world - min) * scale
    None,
    /// Additionally mirror both axes: x' = width - x, y' = height - y
    #[default]
    Both,
}

/// Pixel grid placement of a piece of geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterFrame {
    /// World coordinates of the bounding box minimum
    pub origin: Point2<f64>,
    pub width: u32,
    pub height: u32,
    /// Pixels per world unit
    pub scale: f64,
    pub flip: Flip,
}

impl RasterFrame {
    /// Frame covering a bounding box.
    ///
    /// `width = round((max.x - min.x) * scale)` and likewise for height; either
    /// dimension below one pixel is an error.
    pub fn from_bounds(
        min: Point2<f64>,
        max: Point2<f64>,
        scale: f64,
        flip: Flip,
    ) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::InvalidScale(scale));
        }

        let width = ((max.x - min.x) * scale).round();
        let height = ((max.y - min.y) * scale).round();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(Error::DegenerateImageSize { width, height });
        }
        Ok(Self {
            origin: min,
            width: width as u32,
            height: height as u32,
            scale,
            flip,
        })
    }

    /// Frame covering every ring of a polygon set
    pub fn covering(set: &PolygonSet, scale: f64, flip: Flip) -> Result<Self> {
        let (min, max) = set.bounds().ok_or(Error::EmptyGeometry)?;
        Self::from_bounds(min, max, scale, flip)
    }

    /// Reject frames with a side longer than `max` pixels
    pub fn ensure_within(&self, max: u32) -> Result<()> {
        if self.width > max || self.height > max {
            return Err(Error::ImageTooLarge {
                width: self.width,
                height: self.height,
                max,
            });
        }
        Ok(())
    }

    /// World point to continuous pixel coordinates
    #[inline]
    pub fn to_pixel(&self, p: &Point2<f64>) -> Point2<f64> {
        let px = (p - self.origin) * self.scale;
        match self.flip {
            Flip::None => Point2::new(px.x, px.y),
            Flip::Both => Point2::new(self.width as f64 - px.x, self.height as f64 - px.y),
        }
    }

    /// Continuous pixel coordinates back to world coordinates
    #[inline]
    pub fn to_world(&self, px: &Point2<f64>) -> Point2<f64> {
        let unflipped = match self.flip {
            Flip::None => *px,
            Flip::Both => Point2::new(self.width as f64 - px.x, self.height as f64 - px.y),
        };
        self.origin + unflipped.coords / self.scale
    }

    pub fn ring_to_pixels(&self, ring: &[Point2<f64>]) -> Vec<Point2<f64>> {
        ring.iter().map(|p| self.to_pixel(p)).collect()
    }
}
