// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-wall scenarios on a 10×3 wall standing in the plane y = 0.
//!
//! The normal projector maps (x, y, z) to (-x, z) for this wall, and the
//! default flip mirrors both image axes, so a window at x ∈ [2, 3] and
//! z ∈ [1, 2] lands on columns 200..300 and rows 100..200.

use facade_mask_core::{CityNode, NodeKind, OpeningKind, PolygonNode, RingNode, WallTask};
use facade_mask_geometry::ProjectionMode;
use facade_mask_processing::{process_wall, MaskCategory, PipelineConfig, SkipReason};
use facade_mask_raster::{Flip, BACKGROUND, DOOR_COLOR, FOREGROUND, WINDOW_COLOR};
use image::GrayImage;
use nalgebra::Vector3;

fn pos_list(points: &[[f64; 3]]) -> String {
    points
        .iter()
        .flatten()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn polygon(points: &[[f64; 3]]) -> CityNode {
    CityNode::polygon(PolygonNode {
        exterior: Some(RingNode::new(pos_list(points))),
        interiors: Vec::new(),
    })
}

/// Rectangle in the y = 0 plane
fn rect_xz(x0: f64, z0: f64, x1: f64, z1: f64) -> Vec<[f64; 3]> {
    vec![
        [x0, 0.0, z0],
        [x1, 0.0, z0],
        [x1, 0.0, z1],
        [x0, 0.0, z1],
        [x0, 0.0, z0],
    ]
}

fn opening(kind: NodeKind, points: &[[f64; 3]]) -> CityNode {
    CityNode::new(NodeKind::OpeningProperty)
        .with_child(CityNode::new(kind).with_child(polygon(points)))
}

fn wall(children: Vec<CityNode>) -> WallTask {
    let mut node = CityNode::new(NodeKind::WallSurface).with_id("W1");
    for child in children {
        node = node.with_child(child);
    }
    WallTask {
        wall_id: "W1".to_string(),
        building_id: Some("B1".to_string()),
        wall: node,
    }
}

fn facade() -> CityNode {
    polygon(&rect_xz(0.0, 0.0, 10.0, 3.0))
}

fn count(image: &GrayImage, value: u8) -> usize {
    image.pixels().filter(|p| p.0[0] == value).count()
}

#[test]
fn test_window_punches_exact_hole() {
    let task = wall(vec![
        facade(),
        opening(NodeKind::Window, &rect_xz(2.0, 1.0, 3.0, 2.0)),
    ]);
    let masks = process_wall(&task, &PipelineConfig::default()).unwrap();

    let full = &masks.full.as_ref().unwrap().image;
    assert_eq!(full.dimensions(), (1000, 300));
    for (x, y, p) in full.enumerate_pixels() {
        let in_hole = (200..300).contains(&x) && (100..200).contains(&y);
        let expected = if in_hole { BACKGROUND } else { FOREGROUND };
        assert_eq!(p.0[0], expected, "pixel ({x}, {y})");
    }

    let window = masks.window.as_ref().unwrap();
    assert_eq!(count(window, FOREGROUND), 100 * 100);
    assert_eq!(window.get_pixel(250, 150).0[0], FOREGROUND);
    assert_eq!(count(masks.door.as_ref().unwrap(), FOREGROUND), 0);

    let categories = masks.categories.as_ref().unwrap();
    assert_eq!(*categories.get_pixel(250, 150), WINDOW_COLOR);
    assert_eq!(categories.get_pixel(50, 50).0, [0, 0, 0]);

    assert_eq!(masks.opening_groups, 1);
    assert_eq!(masks.openings.get(&OpeningKind::Window), Some(&1));
    assert!(masks.stats.is_clean());
}

#[test]
fn test_interior_ring_and_door_share_frame() {
    let with_hole = PolygonNode {
        exterior: Some(RingNode::new(pos_list(&rect_xz(0.0, 0.0, 10.0, 3.0)))),
        interiors: vec![RingNode::new(pos_list(&rect_xz(2.0, 1.0, 3.0, 2.0)))],
    };
    let task = wall(vec![
        CityNode::polygon(with_hole),
        opening(NodeKind::Door, &rect_xz(6.0, 0.0, 7.0, 2.0)),
    ]);
    let masks = process_wall(&task, &PipelineConfig::default()).unwrap();

    let full = &masks.full.as_ref().unwrap().image;
    assert_eq!(full.dimensions(), (1000, 300));
    // Hole plus a 1×2 door reaching the bottom edge
    assert_eq!(count(full, BACKGROUND), 100 * 100 + 100 * 200);

    // Door at x ∈ [6, 7] lands on columns 600..700, rows 100..300
    let door = masks.door.as_ref().unwrap();
    assert_eq!(count(door, FOREGROUND), 100 * 200);
    assert_eq!(door.get_pixel(650, 250).0[0], FOREGROUND);
    assert_eq!(*masks.categories.as_ref().unwrap().get_pixel(650, 250), DOOR_COLOR);

    assert_eq!(masks.openings.get(&OpeningKind::Hole), Some(&1));
    assert_eq!(masks.openings.get(&OpeningKind::Door), Some(&1));
}

#[test]
fn test_collinear_start_skips_with_degenerate_normal() {
    let task = wall(vec![polygon(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [2.0, 0.0, 3.0],
        [0.0, 0.0, 3.0],
    ])]);
    let reason = process_wall(&task, &PipelineConfig::default()).unwrap_err();

    assert_eq!(reason, SkipReason::DegenerateNormal);
    assert_eq!(reason.to_string(), "degenerate normal");
}

#[test]
fn test_horizontal_surface_skips() {
    let roof = polygon(&[
        [0.0, 0.0, 5.0],
        [4.0, 0.0, 5.0],
        [4.0, 4.0, 5.0],
        [0.0, 4.0, 5.0],
    ]);
    let reason = process_wall(&wall(vec![roof]), &PipelineConfig::default()).unwrap_err();
    assert_eq!(reason, SkipReason::NearlyHorizontal);
}

#[test]
fn test_wall_without_polygons_skips() {
    let reason = process_wall(&wall(Vec::new()), &PipelineConfig::default()).unwrap_err();
    assert_eq!(reason.to_string(), "no facade polygons");
}

#[test]
fn test_close_openings_merge_into_one_group() {
    let task = wall(vec![
        facade(),
        opening(NodeKind::Window, &rect_xz(2.0, 1.0, 3.0, 2.0)),
        opening(NodeKind::Window, &rect_xz(3.05, 1.0, 4.0, 2.0)),
    ]);
    let masks = process_wall(&task, &PipelineConfig::default()).unwrap();

    assert_eq!(masks.opening_groups, 1);
    let full = &masks.full.as_ref().unwrap().image;
    assert_eq!(count(full, BACKGROUND), 100 * 100 + 95 * 100);
}

#[test]
fn test_distant_openings_stay_separate() {
    let task = wall(vec![
        facade(),
        opening(NodeKind::Window, &rect_xz(2.0, 1.0, 3.0, 2.0)),
        opening(NodeKind::Window, &rect_xz(3.2, 1.0, 4.0, 2.0)),
    ]);
    let masks = process_wall(&task, &PipelineConfig::default()).unwrap();

    assert_eq!(masks.opening_groups, 2);
    let full = &masks.full.as_ref().unwrap().image;
    assert_eq!(full.get_pixel(250, 150).0[0], BACKGROUND);
    assert_eq!(full.get_pixel(310, 150).0[0], FOREGROUND);
    assert_eq!(full.get_pixel(350, 150).0[0], BACKGROUND);
    assert_eq!(count(full, BACKGROUND), 100 * 100 + 80 * 100);
}

#[test]
fn test_facade_only() {
    let masks = process_wall(&wall(vec![facade()]), &PipelineConfig::default()).unwrap();

    let full = &masks.full.as_ref().unwrap().image;
    assert_eq!(full.dimensions(), (1000, 300));
    assert_eq!(count(full, FOREGROUND), 1000 * 300);
    assert_eq!(masks.opening_groups, 0);
    assert!(masks.openings.is_empty());
}

#[test]
fn test_category_filter() {
    let task = wall(vec![
        facade(),
        opening(NodeKind::Window, &rect_xz(2.0, 1.0, 3.0, 2.0)),
    ]);
    let config = PipelineConfig::default().with_category(MaskCategory::Full);
    let masks = process_wall(&task, &config).unwrap();

    assert!(masks.full.is_some());
    assert!(masks.door.is_none() && masks.window.is_none() && masks.categories.is_none());

    let config = PipelineConfig::default().with_category(MaskCategory::Door);
    let masks = process_wall(&task, &config).unwrap();
    assert!(masks.full.is_none() && masks.window.is_none());
    assert_eq!(masks.door.as_ref().unwrap().dimensions(), (1000, 300));
}

#[test]
fn test_flip_none_mirrors_hole() {
    let task = wall(vec![
        facade(),
        opening(NodeKind::Window, &rect_xz(2.0, 1.0, 3.0, 2.0)),
    ]);
    let config = PipelineConfig::default().with_flip(Flip::None);
    let masks = process_wall(&task, &config).unwrap();

    // x' = -x puts the window on columns 700..800 before mirroring
    let full = &masks.full.as_ref().unwrap().image;
    assert_eq!(full.get_pixel(750, 150).0[0], BACKGROUND);
    assert_eq!(full.get_pixel(250, 150).0[0], FOREGROUND);
}

#[test]
fn test_shift_is_subtracted() {
    let offset = [690_000.0, 5_336_000.0, 500.0];
    let shifted = |points: Vec<[f64; 3]>| -> Vec<[f64; 3]> {
        points
            .into_iter()
            .map(|p| [p[0] + offset[0], p[1] + offset[1], p[2] + offset[2]])
            .collect()
    };
    let task = wall(vec![
        polygon(&shifted(rect_xz(0.0, 0.0, 10.0, 3.0))),
        opening(NodeKind::Window, &shifted(rect_xz(2.0, 1.0, 3.0, 2.0))),
    ]);
    let config = PipelineConfig::default().with_shift(Vector3::from(offset));
    let masks = process_wall(&task, &config).unwrap();

    let full = &masks.full.as_ref().unwrap().image;
    assert_eq!(full.dimensions(), (1000, 300));
    assert_eq!(count(full, BACKGROUND), 100 * 100);
}

#[test]
fn test_pca_projection_matches_extent() {
    let config = PipelineConfig {
        projection: ProjectionMode::Pca,
        ..PipelineConfig::default()
    };
    // Open ring: a repeated closing point would skew the principal axes
    let open_ring = &rect_xz(0.0, 0.0, 10.0, 3.0)[..4];
    let masks = process_wall(&wall(vec![polygon(open_ring)]), &config).unwrap();

    let full = &masks.full.as_ref().unwrap().image;
    assert_eq!(full.dimensions(), (1000, 300));
    assert_eq!(count(full, FOREGROUND), 1000 * 300);
}

#[test]
fn test_debug_renders() {
    let task = wall(vec![
        facade(),
        opening(NodeKind::Window, &rect_xz(2.0, 1.0, 3.0, 2.0)),
    ]);
    let config = PipelineConfig {
        debug: true,
        ..PipelineConfig::default()
    };
    let masks = process_wall(&task, &config).unwrap();

    let all = masks.debug.all_polygons.as_ref().unwrap();
    assert_eq!(all.dimensions(), (1000, 300));
    let grouped = masks.debug.grouped_openings.as_ref().unwrap();
    assert_eq!(grouped.dimensions(), (100, 100));

    let quiet = process_wall(&task, &PipelineConfig::default()).unwrap();
    assert!(quiet.debug.all_polygons.is_none() && quiet.debug.grouped_openings.is_none());
}

#[test]
fn test_non_finite_coordinates_never_reach_projection() {
    let poisoned = "0 0 0 10 0 0 nan 0 3 0 0 3";
    let bad_opening = CityNode::new(NodeKind::OpeningProperty).with_child(
        CityNode::new(NodeKind::Window).with_child(CityNode::polygon(PolygonNode {
            exterior: Some(RingNode::new("2 0 1 3 0 1 inf 0 2 2 0 2")),
            interiors: Vec::new(),
        })),
    );

    for projection in [ProjectionMode::Normal, ProjectionMode::Pca] {
        let config = PipelineConfig {
            projection,
            ..PipelineConfig::default()
        };

        let only_nan = wall(vec![CityNode::polygon(PolygonNode {
            exterior: Some(RingNode::new(poisoned)),
            interiors: Vec::new(),
        })]);
        assert_eq!(
            process_wall(&only_nan, &config).unwrap_err(),
            SkipReason::NoFacade
        );

        // Open ring keeps the PCA axes aligned with the wall
        let task = wall(vec![
            polygon(&rect_xz(0.0, 0.0, 10.0, 3.0)[..4]),
            bad_opening.clone(),
        ]);
        let masks = process_wall(&task, &config).unwrap();
        let full = &masks.full.as_ref().unwrap().image;
        assert_eq!(full.dimensions(), (1000, 300));
        assert_eq!(count(full, FOREGROUND), 1000 * 300);
        assert!(masks.openings.is_empty());
    }
}

#[test]
fn test_long_wall_is_rasterized_unless_capped() {
    let task = wall(vec![polygon(&rect_xz(0.0, 0.0, 400.0, 3.0))]);
    let config = PipelineConfig::default().with_category(MaskCategory::Full);

    let masks = process_wall(&task, &config).unwrap();
    let full = masks.full.as_ref().unwrap();
    assert_eq!(full.image.dimensions(), (40_000, 300));
    assert_eq!(full.foreground_pixels(), 40_000 * 300);

    let capped = PipelineConfig {
        max_dimension: Some(32_768),
        ..config
    };
    assert_eq!(
        process_wall(&task, &capped).unwrap_err().to_string(),
        "rasterization failed: Image too large: 40000x300 exceeds 32768 pixels per side"
    );
}
