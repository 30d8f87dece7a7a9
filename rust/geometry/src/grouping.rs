// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Proximity grouping of opening polygons.
//!
//! Openings are often split into several touching or nearly touching parts
//! (window panes, door frames). Grouping merges each connected cluster into a
//! single shape before it is subtracted from the facade, so no thin facade
//! slivers are left between the parts.

use crate::bool2d::{distance, intersects, repair, union, GeomOutcome, PolygonSet};

/// Default adjacency distance in world units
pub const DEFAULT_DIST_THRESHOLD: f64 = 0.1;

/// Output of [`group_by_proximity`]
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    /// One merged, repaired shape per connected component
    pub groups: Vec<PolygonSet>,
    /// Input indices that make up each entry of `groups`
    pub members: Vec<Vec<usize>>,
    /// Inputs dropped because repair left nothing of positive area
    pub dropped_inputs: usize,
    /// Components dropped because their union degenerated or failed
    pub dropped_groups: usize,
}

/// Cluster shapes into connected components under
/// "A ~ B if A intersects B or distance(A, B) < dist_thresh".
///
/// Every input is repaired first. Adjacency is tested for all unordered pairs,
/// which is fine for the handful of openings a wall carries.
pub fn group_by_proximity(shapes: &[PolygonSet], dist_thresh: f64) -> Grouping {
    let mut grouping = Grouping::default();

    let mut fixed: Vec<(usize, PolygonSet)> = Vec::with_capacity(shapes.len());
    for (index, shape) in shapes.iter().enumerate() {
        match repair(shape) {
            GeomOutcome::Valid(set) if set.area() > 0.0 => fixed.push((index, set)),
            _ => grouping.dropped_inputs += 1,
        }
    }

    let n = fixed.len();
    if n == 0 {
        return grouping;
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&fixed[i].1, &fixed[j].1);
            if intersects(a, b) || distance(a, b) < dist_thresh {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }

    let mut visited = vec![false; n];
    for start in 0..n {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        let mut component = vec![start];
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                    component.push(next);
                }
            }
        }
        component.sort_unstable();

        let parts: Vec<PolygonSet> = component.iter().map(|&k| fixed[k].1.clone()).collect();
        let merged = match union(&parts) {
            GeomOutcome::Valid(set) => repair(&set),
            other => other,
        };

        match merged {
            GeomOutcome::Valid(set) if set.area() > 0.0 => {
                grouping.groups.push(set);
                grouping
                    .members
                    .push(component.iter().map(|&k| fixed[k].0).collect());
            }
            GeomOutcome::Failed(message) => {
                tracing::warn!(%message, size = component.len(), "Dropping opening group");
                grouping.dropped_groups += 1;
            }
            _ => grouping.dropped_groups += 1,
        }
    }

    grouping
}
