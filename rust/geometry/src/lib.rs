// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facade-Mask Geometry Processing
//!
//! Planar projection of facade rings (nalgebra), guarded 2D polygon booleans
//! (i_overlay, geo) and proximity grouping of openings.

pub mod bool2d;
pub mod error;
pub mod grouping;
pub mod projection;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use bool2d::{
    build_polygon, compute_signed_area, difference, distance, intersects, repair, union,
    GeomOutcome, Polygon2D, PolygonSet, Ring2, FAR_DISTANCE, MIN_AREA_THRESHOLD,
};
pub use error::{Error, Result};
pub use grouping::{group_by_proximity, Grouping, DEFAULT_DIST_THRESHOLD};
pub use projection::{
    NormalProjector, PcaProjector, PlaneProjector, ProjectionFrame, ProjectionMode,
};
