// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for rasterization
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rasterizing geometry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Degenerate image size: {width}x{height}")]
    DegenerateImageSize { width: f64, height: f64 },

    #[error("Image too large: {width}x{height} exceeds {max} pixels per side")]
    ImageTooLarge { width: u32, height: u32, max: u32 },

    #[error("Empty geometry: nothing to rasterize")]
    EmptyGeometry,

    #[error("Invalid scale: {0}")]
    InvalidScale(f64),
}
