// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-wall pipeline.
//!
//! Every wall ends in exactly one of two states: masks produced, or skipped
//! with a [`SkipReason`]. Stages in order:
//!
//! 1. Extract facade rings (skip if none) and opening rings (may be none)
//! 2. Derive the projection frame from the facade
//! 3. Project, repair and union the facade
//! 4. Project and repair each opening, group them by proximity
//! 5. Subtract the grouped openings from the facade
//! 6. Rasterize every requested mask in one shared frame

use crate::config::PipelineConfig;
use crate::error::SkipReason;
use facade_mask_core::{all_exterior_rings, collect_openings, OpeningKind, Ring3, WallTask};
use facade_mask_geometry::{
    build_polygon, difference, group_by_proximity, repair, union, GeomOutcome, PolygonSet,
    ProjectionFrame, Ring2,
};
use facade_mask_raster::{rasterize_categories, rasterize_mask, render_rings, Mask, RasterFrame};
use image::{GrayImage, RgbImage};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shapes lost along the way, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropStats {
    /// Facade rings that were degenerate after projection and repair
    pub facade_rings: usize,
    /// Opening rings that were degenerate after projection and repair
    pub opening_rings: usize,
    /// Opening groups whose union degenerated or failed
    pub opening_groups: usize,
    /// The facade/openings difference failed and the plain facade was used
    pub difference_fallback: bool,
}

impl DropStats {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Diagnostic renders, present only when enabled in the config
#[derive(Debug, Clone, Default)]
pub struct DebugRenders {
    /// Every projected facade and opening ring before repair
    pub all_polygons: Option<GrayImage>,
    /// Exterior rings of the merged opening groups
    pub grouped_openings: Option<GrayImage>,
}

/// Everything produced for one wall
#[derive(Debug, Clone)]
pub struct WallMasks {
    pub wall_id: String,
    pub building_id: Option<String>,
    pub projection: ProjectionFrame,
    /// Pixel frame shared by every mask below
    pub frame: RasterFrame,
    /// Facade with openings punched out
    pub full: Option<Mask>,
    pub door: Option<GrayImage>,
    pub window: Option<GrayImage>,
    /// Doors and windows in fixed colours
    pub categories: Option<RgbImage>,
    pub debug: DebugRenders,
    /// Usable opening rings per kind
    pub openings: BTreeMap<OpeningKind, usize>,
    /// Number of merged opening groups subtracted from the facade
    pub opening_groups: usize,
    pub stats: DropStats,
}

/// Run the whole pipeline for one wall, in memory.
pub fn process_wall(task: &WallTask, config: &PipelineConfig) -> Result<WallMasks, SkipReason> {
    let wall_id = task.wall_id.as_str();

    let facade_rings = all_exterior_rings(&task.wall, &config.shift);
    if facade_rings.is_empty() {
        return Err(SkipReason::NoFacade);
    }
    let openings = collect_openings(&task.wall, &config.shift);
    let opening_rings: Vec<Ring3> = openings.iter().map(|o| o.ring.clone()).collect();

    let projection = config
        .projection
        .projector()
        .derive_frame(&facade_rings, &opening_rings)?;

    let mut stats = DropStats::default();
    let mut debug = DebugRenders::default();

    if config.debug {
        let projected: Vec<Ring2> = facade_rings
            .iter()
            .chain(&opening_rings)
            .map(|ring| projection.project_ring(ring))
            .collect();
        debug.all_polygons = render_rings(&projected, config.scale, config.flip);
    }

    let facade = facade_union(&facade_rings, &projection, &mut stats)?;

    let mut valid_openings: Vec<(OpeningKind, PolygonSet)> = Vec::with_capacity(openings.len());
    for opening in &openings {
        match repaired(&projection.project_ring(&opening.ring)) {
            Some(set) => valid_openings.push((opening.kind, set)),
            None => stats.opening_rings += 1,
        }
    }

    let (final_set, opening_groups) = if valid_openings.is_empty() {
        tracing::debug!(wall_id, "No valid openings, using facade alone");
        (facade, 0)
    } else {
        let shapes: Vec<PolygonSet> = valid_openings.iter().map(|(_, s)| s.clone()).collect();
        let grouping = group_by_proximity(&shapes, config.dist_thresh);
        stats.opening_rings += grouping.dropped_inputs;
        stats.opening_groups += grouping.dropped_groups;

        if config.debug {
            let exteriors: Vec<Ring2> = grouping
                .groups
                .iter()
                .flat_map(|g| g.exteriors().cloned())
                .collect();
            debug.grouped_openings = render_rings(&exteriors, config.scale, config.flip);
        }

        let group_count = grouping.groups.len();
        let punched = punch_openings(facade, &grouping.groups, &mut stats, wall_id)?;
        (punched, group_count)
    };

    let frame = RasterFrame::covering(&final_set, config.scale, config.flip)?;
    if let Some(max) = config.max_dimension {
        frame.ensure_within(max)?;
    }

    let category = config.category;
    let doors = if category.wants_doors() || category.wants_categorical() {
        groups_of_kind(&valid_openings, OpeningKind::Door, config.dist_thresh)
    } else {
        Vec::new()
    };
    let windows = if category.wants_windows() || category.wants_categorical() {
        groups_of_kind(&valid_openings, OpeningKind::Window, config.dist_thresh)
    } else {
        Vec::new()
    };

    let full = category.wants_full().then(|| Mask::new(&final_set, frame));
    let door = category
        .wants_doors()
        .then(|| rasterize_mask(&merged(&doors), &frame));
    let window = category
        .wants_windows()
        .then(|| rasterize_mask(&merged(&windows), &frame));
    let categories = category
        .wants_categorical()
        .then(|| rasterize_categories(&doors, &windows, &frame));

    let mut counts = BTreeMap::new();
    for (kind, _) in &valid_openings {
        *counts.entry(*kind).or_insert(0) += 1;
    }

    tracing::debug!(
        wall_id,
        width = frame.width,
        height = frame.height,
        facade_parts = final_set.len(),
        facade_pixels = full.as_ref().map(Mask::foreground_pixels),
        opening_groups,
        "Wall rasterized"
    );

    Ok(WallMasks {
        wall_id: task.wall_id.clone(),
        building_id: task.building_id.clone(),
        projection,
        frame,
        full,
        door,
        window,
        categories,
        debug,
        openings: counts,
        opening_groups,
        stats,
    })
}

/// Build and repair one projected ring. `None` if nothing of positive area remains.
fn repaired(ring: &Ring2) -> Option<PolygonSet> {
    let polygon = build_polygon(ring).ok()?;
    repair(&PolygonSet::from_polygon(polygon)).valid()
}

fn facade_union(
    rings: &[Ring3],
    projection: &ProjectionFrame,
    stats: &mut DropStats,
) -> Result<PolygonSet, SkipReason> {
    let mut parts = Vec::with_capacity(rings.len());
    for ring in rings {
        match repaired(&projection.project_ring(ring)) {
            Some(set) => parts.push(set),
            None => stats.facade_rings += 1,
        }
    }
    if parts.is_empty() {
        return Err(SkipReason::FacadeEmptyAfterRepair);
    }

    // Union failure has no safe fallback shape
    let merged = match union(&parts) {
        GeomOutcome::Valid(set) => set,
        GeomOutcome::Empty => return Err(SkipReason::FacadeEmptyAfterUnion),
        GeomOutcome::Failed(message) => return Err(SkipReason::FacadeUnionFailed(message)),
    };
    repair(&merged)
        .valid()
        .ok_or(SkipReason::FacadeEmptyAfterUnion)
}

/// Facade minus the union of all opening groups.
///
/// A failed opening union or difference falls back to the plain facade.
fn punch_openings(
    facade: PolygonSet,
    groups: &[PolygonSet],
    stats: &mut DropStats,
    wall_id: &str,
) -> Result<PolygonSet, SkipReason> {
    if groups.is_empty() {
        return Ok(facade);
    }

    let holes = match union(groups) {
        GeomOutcome::Valid(set) => repair(&set),
        other => other,
    };
    let holes = match holes {
        GeomOutcome::Valid(set) => set,
        GeomOutcome::Empty => return Ok(facade),
        GeomOutcome::Failed(message) => {
            tracing::warn!(
                wall_id,
                %message,
                "Union of grouped openings failed, using facade alone"
            );
            stats.opening_groups += groups.len();
            return Ok(facade);
        }
    };

    match difference(&facade, &holes) {
        GeomOutcome::Valid(set) => repair(&set)
            .valid()
            .ok_or(SkipReason::FacadeWithHolesEmpty),
        GeomOutcome::Empty => Err(SkipReason::FacadeWithHolesEmpty),
        GeomOutcome::Failed(message) => {
            tracing::warn!(wall_id, %message, "Difference failed, using facade without holes");
            stats.difference_fallback = true;
            Ok(facade)
        }
    }
}

/// Proximity groups of the openings of one kind
fn groups_of_kind(
    openings: &[(OpeningKind, PolygonSet)],
    kind: OpeningKind,
    dist_thresh: f64,
) -> Vec<PolygonSet> {
    let shapes: Vec<PolygonSet> = openings
        .iter()
        .filter(|(k, _)| *k == kind)
        .map(|(_, s)| s.clone())
        .collect();
    if shapes.is_empty() {
        return Vec::new();
    }
    group_by_proximity(&shapes, dist_thresh).groups
}

/// Groups are pairwise disjoint, so their polygons can share one set
fn merged(groups: &[PolygonSet]) -> PolygonSet {
    PolygonSet::new(
        groups
            .iter()
            .flat_map(|g| g.polygons.iter().cloned())
            .collect(),
    )
}
