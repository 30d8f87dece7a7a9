// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is passed by reference into every entry point; there
//! is no process-wide state, so runs with different settings can share one
//! process.

use facade_mask_geometry::{ProjectionMode, DEFAULT_DIST_THRESHOLD};
use facade_mask_raster::{Flip, DEFAULT_SCALE};
use nalgebra::Vector3;
use serde::Serialize;

/// Which masks to produce for each wall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskCategory {
    /// Facade, door and window masks plus the categorical RGB mask
    #[default]
    All,
    Door,
    Window,
    /// Facade with openings punched out
    Full,
}

impl MaskCategory {
    pub fn wants_full(self) -> bool {
        matches!(self, MaskCategory::All | MaskCategory::Full)
    }

    pub fn wants_doors(self) -> bool {
        matches!(self, MaskCategory::All | MaskCategory::Door)
    }

    pub fn wants_windows(self) -> bool {
        matches!(self, MaskCategory::All | MaskCategory::Window)
    }

    pub fn wants_categorical(self) -> bool {
        self == MaskCategory::All
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Subtracted from every extracted point. Compensates for large absolute
    /// coordinates (projected CRS origins).
    pub shift: Vector3<f64>,
    pub projection: ProjectionMode,
    /// Openings closer than this (world units) are merged
    pub dist_thresh: f64,
    /// Pixels per world unit
    pub scale: f64,
    pub flip: Flip,
    pub category: MaskCategory,
    /// Produce diagnostic renders
    pub debug: bool,
    /// Skip walls whose image would exceed this many pixels on a side.
    /// Unlimited when `None`.
    pub max_dimension: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shift: Vector3::zeros(),
            projection: ProjectionMode::Normal,
            dist_thresh: DEFAULT_DIST_THRESHOLD,
            scale: DEFAULT_SCALE,
            flip: Flip::Both,
            category: MaskCategory::All,
            debug: false,
            max_dimension: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_shift(mut self, shift: Vector3<f64>) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_category(mut self, category: MaskCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }
}
