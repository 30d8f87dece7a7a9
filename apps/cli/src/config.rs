// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line arguments, with `FACADE_MASK_*` environment fallbacks.

use clap::{Parser, ValueEnum};
use facade_mask_geometry::{ProjectionMode, DEFAULT_DIST_THRESHOLD};
use facade_mask_processing::{MaskCategory, PipelineConfig};
use facade_mask_raster::{Flip, DEFAULT_SCALE};
use nalgebra::Vector3;
use std::path::PathBuf;

/// Generate facade segmentation masks from CityGML wall surfaces.
///
/// Every `WallSurface` is projected onto its own plane, its openings are
/// subtracted, and the result is written as PNG masks named after the wall id.
#[derive(Parser, Debug)]
#[command(name = "facade-masks", version, about, long_about = None)]
pub struct Args {
    /// A `.gml` file, or a directory whose `.gml` files are processed in order
    pub input: PathBuf,

    /// Output root; each input file gets a subdirectory named after its stem
    #[arg(short, long, env = "FACADE_MASK_OUTPUT")]
    pub output: PathBuf,

    /// Which masks to write
    #[arg(long, value_enum, default_value_t = Category::All, env = "FACADE_MASK_CATEGORY")]
    pub category: Category,

    /// Also write diagnostic renders to `debug_masks/`
    #[arg(long, env = "FACADE_MASK_DEBUG")]
    pub debug: bool,

    /// Offset subtracted from every coordinate, as `X,Y,Z`
    #[arg(
        long,
        value_parser = parse_shift,
        default_value = "0,0,0",
        allow_hyphen_values = true,
        env = "FACADE_MASK_SHIFT"
    )]
    pub shift: Vector3<f64>,

    /// Openings closer than this (world units) are merged before subtraction
    #[arg(long, default_value_t = DEFAULT_DIST_THRESHOLD, env = "FACADE_MASK_DIST_THRESH")]
    pub dist_thresh: f64,

    /// Pixels per world unit
    #[arg(long, default_value_t = DEFAULT_SCALE, env = "FACADE_MASK_SCALE")]
    pub scale: f64,

    /// How each wall is flattened onto its plane
    #[arg(long, value_enum, default_value_t = Projection::Normal, env = "FACADE_MASK_PROJECTION")]
    pub projection: Projection,

    /// Axis mirroring applied to every written image
    #[arg(long, value_enum, default_value_t = FlipArg::Both, env = "FACADE_MASK_FLIP")]
    pub flip: FlipArg,

    /// Skip walls whose image would be larger than this many pixels per side
    #[arg(long, env = "FACADE_MASK_MAX_DIMENSION")]
    pub max_dimension: Option<u32>,

    /// Nest masks in one directory per building id
    #[arg(long, env = "FACADE_MASK_BY_BUILDING")]
    pub by_building: bool,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long, env = "FACADE_MASK_THREADS")]
    pub threads: Option<usize>,

    /// Write a JSON report of every wall outcome to this file
    #[arg(long, env = "FACADE_MASK_REPORT")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Category {
    All,
    Door,
    Window,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Projection {
    Normal,
    Pca,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlipArg {
    None,
    Both,
}

impl Args {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            shift: self.shift,
            projection: match self.projection {
                Projection::Normal => ProjectionMode::Normal,
                Projection::Pca => ProjectionMode::Pca,
            },
            dist_thresh: self.dist_thresh,
            scale: self.scale,
            flip: match self.flip {
                FlipArg::None => Flip::None,
                FlipArg::Both => Flip::Both,
            },
            category: match self.category {
                Category::All => MaskCategory::All,
                Category::Door => MaskCategory::Door,
                Category::Window => MaskCategory::Window,
                Category::Full => MaskCategory::Full,
            },
            debug: self.debug,
            max_dimension: self.max_dimension,
        }
    }
}

fn parse_shift(value: &str) -> Result<Vector3<f64>, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected X,Y,Z, got '{value}'"));
    }

    let mut coords = [0.0; 3];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{part}': {e}"))?;
    }
    Ok(Vector3::from(coords))
}
