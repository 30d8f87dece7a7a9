// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facade-Mask Raster
//!
//! Maps planar polygons onto a pixel grid and fills them into binary or
//! categorical masks. All masks of one wall share a single [`RasterFrame`],
//! so their pixels line up.
//!
//! ```rust,ignore
//! use facade_mask_raster::{Flip, Mask, RasterFrame, DEFAULT_SCALE};
//!
//! let frame = RasterFrame::covering(&facade, DEFAULT_SCALE, Flip::Both)?;
//! let mask = Mask::new(&facade, frame);
//! mask.image.save("mask_W1_full.png")?;
//! ```

pub mod debug;
pub mod error;
pub mod frame;
pub mod mask;

pub use debug::{render_rings, DEBUG_SHADES};
pub use error::{Error, Result};
pub use frame::{Flip, RasterFrame, DEFAULT_SCALE};
pub use mask::{
    fill_ring, rasterize_categories, rasterize_mask, Mask, BACKGROUND, DOOR_COLOR, FOREGROUND,
    WINDOW_COLOR,
};
