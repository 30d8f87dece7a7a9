// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during facade geometry processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Too few points: ring has {0}, need at least 3")]
    TooFewPoints(usize),

    #[error("Degenerate normal: first three facade points are collinear")]
    DegenerateNormal,

    #[error("Facade nearly horizontal: degenerate tangent")]
    NearlyHorizontal,

    #[error("Degenerate point cloud: {0}")]
    DegenerateCloud(String),

    #[error("Empty facade: no rings to derive a frame from")]
    EmptyFacade,
}
