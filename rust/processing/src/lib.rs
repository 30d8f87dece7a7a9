// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facade-Mask Processing
//!
//! Turns the walls of a CityGML model into segmentation masks:
//! [`process_wall`] runs the pipeline for one wall in memory, and
//! [`process_city_file`] runs every wall of a file in parallel with `rayon`
//! and writes the resulting PNGs.
//!
//! ```rust,ignore
//! use facade_mask_processing::{process_city_file, PipelineConfig};
//!
//! let report = process_city_file(path, out_dir, &PipelineConfig::default(), false)?;
//! println!("{} written, {} skipped", report.written(), report.skipped());
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;

pub use batch::{
    collect_inputs, process_city_file, run_walls, BatchReport, FileReport, OutputLayout,
    WallOutcome, WallStatus, DEBUG_DIR, GML_EXTENSION,
};
pub use config::{MaskCategory, PipelineConfig};
pub use error::{Error, Result, SkipReason};
pub use pipeline::{process_wall, DebugRenders, DropStats, WallMasks};
