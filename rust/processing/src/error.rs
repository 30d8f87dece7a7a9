// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a wall produced no mask.
///
/// A skip is a terminal state of one wall, never an error for the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("no facade polygons")]
    NoFacade,

    #[error("degenerate normal")]
    DegenerateNormal,

    #[error("facade nearly horizontal")]
    NearlyHorizontal,

    #[error("degenerate point cloud: {0}")]
    DegenerateCloud(String),

    #[error("facade empty after repair")]
    FacadeEmptyAfterRepair,

    #[error("facade union failed: {0}")]
    FacadeUnionFailed(String),

    #[error("facade empty after union")]
    FacadeEmptyAfterUnion,

    #[error("facade with holes empty")]
    FacadeWithHolesEmpty,

    #[error("degenerate image size {width}x{height}")]
    DegenerateImageSize { width: f64, height: f64 },

    #[error("rasterization failed: {0}")]
    Raster(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl From<facade_mask_geometry::Error> for SkipReason {
    fn from(err: facade_mask_geometry::Error) -> Self {
        use facade_mask_geometry::Error as G;
        match err {
            G::DegenerateNormal => SkipReason::DegenerateNormal,
            G::NearlyHorizontal => SkipReason::NearlyHorizontal,
            G::DegenerateCloud(detail) => SkipReason::DegenerateCloud(detail),
            G::EmptyFacade | G::TooFewPoints(_) => SkipReason::NoFacade,
        }
    }
}

impl From<facade_mask_raster::Error> for SkipReason {
    fn from(err: facade_mask_raster::Error) -> Self {
        match err {
            facade_mask_raster::Error::DegenerateImageSize { width, height } => {
                SkipReason::DegenerateImageSize { width, height }
            }
            other => SkipReason::Raster(other.to_string()),
        }
    }
}

/// Errors that stop a whole input file
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: facade_mask_core::Error,
    },

    #[error("Failed to list input directory {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(SkipReason::NoFacade.to_string(), "no facade polygons");
        assert_eq!(
            SkipReason::from(facade_mask_geometry::Error::DegenerateNormal).to_string(),
            "degenerate normal"
        );
        assert_eq!(
            SkipReason::from(facade_mask_geometry::Error::NearlyHorizontal),
            SkipReason::NearlyHorizontal
        );
    }

    #[test]
    fn test_raster_errors_map_to_image_reasons() {
        let reason = SkipReason::from(facade_mask_raster::Error::DegenerateImageSize {
            width: 0.0,
            height: 300.0,
        });
        assert_eq!(reason.to_string(), "degenerate image size 0x300");
        assert!(matches!(
            SkipReason::from(facade_mask_raster::Error::EmptyGeometry),
            SkipReason::Raster(_)
        ));
    }
}
