// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Facade-Mask Core
//!
//! Reading side of the facade mask pipeline:
//!
//! - **CityGML reader**: converts a document into an owned, typed node tree
//! - **Wall tasks**: every `WallSurface` detached as a self-contained value
//! - **Ring extraction**: polygon rings as shifted 3D point lists
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use facade_mask_core::{all_exterior_rings, collect_openings, CityModel};
//! use nalgebra::Vector3;
//!
//! let model = CityModel::from_path("building.gml")?;
//! let shift = Vector3::new(690_000.0, 5_336_000.0, 500.0);
//! for task in model.walls() {
//!     let facade = all_exterior_rings(&task.wall, &shift);
//!     let openings = collect_openings(&task.wall, &shift);
//!     println!("{}: {} facade rings, {} openings", task.wall_id, facade.len(), openings.len());
//! }
//! ```

pub mod error;
pub mod gml;
pub mod rings;
pub mod tree;

pub use error::{Error, Result};
pub use gml::{CityModel, WallTask};
pub use rings::{
    all_exterior_rings, collect_openings, exterior_ring, interior_rings, parse_pos_list,
    OpeningRing, Ring3, MIN_RING_POINTS,
};
pub use tree::{CityNode, Descendants, NodeKind, OpeningKind, PolygonNode, RingNode};
