// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel batch execution and mask persistence.
//!
//! Walls are independent: each task owns its detached sub-tree and shares
//! only the read-only config. A panic inside one wall becomes a skip for that
//! wall and never reaches its siblings.

use crate::config::PipelineConfig;
use crate::error::{Error, Result, SkipReason};
use crate::pipeline::{process_wall, DropStats, WallMasks};
use facade_mask_core::{CityModel, OpeningKind, WallTask};
use image::{ImageBuffer, Pixel, PixelWithColorType};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Subdirectory for diagnostic renders
pub const DEBUG_DIR: &str = "debug_masks";

/// Input file extension picked up from directories
pub const GML_EXTENSION: &str = "gml";

/// Building directory for walls outside any building
const NO_BUILDING_DIR: &str = "no_building";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WallStatus {
    Written,
    Skipped,
}

/// Outcome of one wall
#[derive(Debug, Clone, Serialize)]
pub struct WallOutcome {
    pub wall_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
    pub status: WallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,
    pub openings: BTreeMap<OpeningKind, usize>,
    pub opening_groups: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped: Option<DropStats>,
}

impl WallOutcome {
    fn written(masks: &WallMasks, files: Vec<PathBuf>) -> Self {
        Self {
            wall_id: masks.wall_id.clone(),
            building_id: masks.building_id.clone(),
            status: WallStatus::Written,
            reason: None,
            files,
            size: Some([masks.frame.width, masks.frame.height]),
            openings: masks.openings.clone(),
            opening_groups: masks.opening_groups,
            dropped: Some(masks.stats),
        }
    }

    fn skipped(task: &WallTask, reason: &SkipReason) -> Self {
        Self {
            wall_id: task.wall_id.clone(),
            building_id: task.building_id.clone(),
            status: WallStatus::Skipped,
            reason: Some(reason.to_string()),
            files: Vec::new(),
            size: None,
            openings: BTreeMap::new(),
            opening_groups: 0,
            dropped: None,
        }
    }
}

/// Outcome of one input file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub walls: Vec<WallOutcome>,
}

impl FileReport {
    pub fn written(&self) -> usize {
        self.count(WallStatus::Written)
    }

    pub fn skipped(&self) -> usize {
        self.count(WallStatus::Skipped)
    }

    fn count(&self, status: WallStatus) -> usize {
        self.walls.iter().filter(|w| w.status == status).count()
    }
}

/// Outcome of a whole run, serialized as the JSON report
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub walls_written: usize,
    pub walls_skipped: usize,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn new(files: Vec<FileReport>) -> Self {
        Self {
            walls_written: files.iter().map(FileReport::written).sum(),
            walls_skipped: files.iter().map(FileReport::skipped).sum(),
            files,
        }
    }

    /// Write as pretty-printed JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let write = || -> std::io::Result<()> {
            let file = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(file, self)?;
            Ok(())
        };
        write().map_err(|source| Error::Report {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Run every wall in parallel on the current rayon pool.
///
/// `sink` receives the task index and the masks of a finished wall, persists
/// them and returns the files it wrote; an error from it turns the wall into a
/// skip. Results come back in task order.
pub fn run_walls<F>(tasks: &[WallTask], config: &PipelineConfig, sink: F) -> Vec<WallOutcome>
where
    F: Fn(usize, &WallMasks) -> std::result::Result<Vec<PathBuf>, SkipReason> + Sync,
{
    tasks
        .par_iter()
        .enumerate()
        .map(|(index, task)| run_wall(index, task, config, &sink))
        .collect()
}

fn run_wall<F>(index: usize, task: &WallTask, config: &PipelineConfig, sink: &F) -> WallOutcome
where
    F: Fn(usize, &WallMasks) -> std::result::Result<Vec<PathBuf>, SkipReason>,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let masks = process_wall(task, config)?;
        let files = sink(index, &masks)?;
        Ok::<_, SkipReason>((masks, files))
    }))
    .unwrap_or_else(|payload| Err(SkipReason::Unexpected(panic_message(payload.as_ref()))));

    match result {
        Ok((masks, files)) => {
            if !masks.stats.is_clean() {
                tracing::debug!(wall_id = %task.wall_id, dropped = ?masks.stats, "Shapes dropped");
            }
            tracing::info!(
                wall_id = %task.wall_id,
                width = masks.frame.width,
                height = masks.frame.height,
                files = files.len(),
                "Saved wall masks"
            );
            WallOutcome::written(&masks, files)
        }
        Err(reason) => {
            tracing::warn!(wall_id = %task.wall_id, %reason, "Skipped wall");
            WallOutcome::skipped(task, &reason)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}

/// Where a file's masks go
#[derive(Debug, Clone)]
pub struct OutputLayout {
    /// `<out>/<file stem>`
    pub root: PathBuf,
    /// Nest walls under one directory per building id
    pub by_building: bool,
}

impl OutputLayout {
    pub fn wall_dir(&self, building_id: Option<&str>) -> PathBuf {
        if self.by_building {
            self.root
                .join(file_safe(building_id.unwrap_or(NO_BUILDING_DIR)))
        } else {
            self.root.clone()
        }
    }

    /// File name stem for every task, unique within each output directory.
    ///
    /// Ids that sanitize to a name already taken (`a/b` next to `a_b`, or a
    /// repeated id) get a `_2`, `_3`, ... suffix in task order.
    pub fn file_stems(&self, tasks: &[WallTask]) -> Vec<String> {
        let mut taken: HashSet<(PathBuf, String)> = HashSet::with_capacity(tasks.len());
        tasks
            .iter()
            .map(|task| {
                let dir = self.wall_dir(task.building_id.as_deref());
                let base = file_safe(&task.wall_id);
                let mut stem = base.clone();
                let mut n = 1;
                while taken.contains(&(dir.clone(), stem.clone())) {
                    n += 1;
                    stem = format!("{base}_{n}");
                }
                if n > 1 {
                    tracing::warn!(
                        wall_id = %task.wall_id,
                        file_stem = %stem,
                        "Wall id collides with another output name"
                    );
                }
                taken.insert((dir, stem.clone()));
                stem
            })
            .collect()
    }

    /// Write every mask and render of a wall under the file stem `id`,
    /// returning the written paths
    pub fn write(
        &self,
        masks: &WallMasks,
        id: &str,
    ) -> std::result::Result<Vec<PathBuf>, SkipReason> {
        let dir = self.wall_dir(masks.building_id.as_deref());
        let mut files = Vec::new();

        create_dir(&dir)?;
        if let Some(mask) = &masks.full {
            files.push(save_png(&mask.image, dir.join(format!("mask_{id}_full.png")))?);
        }
        if let Some(image) = &masks.door {
            files.push(save_png(image, dir.join(format!("mask_{id}_door.png")))?);
        }
        if let Some(image) = &masks.window {
            files.push(save_png(image, dir.join(format!("mask_{id}_window.png")))?);
        }
        if let Some(image) = &masks.categories {
            files.push(save_png(image, dir.join(format!("mask_{id}.png")))?);
        }

        let renders = [
            (&masks.debug.all_polygons, "all_polygons"),
            (&masks.debug.grouped_openings, "grouped_openings"),
        ];
        if renders.iter().any(|(image, _)| image.is_some()) {
            let debug_dir = dir.join(DEBUG_DIR);
            create_dir(&debug_dir)?;
            for (image, name) in renders {
                if let Some(image) = image {
                    files.push(save_png(image, debug_dir.join(format!("debug_{id}_{name}.png")))?);
                }
            }
        }

        Ok(files)
    }
}

fn create_dir(dir: &Path) -> std::result::Result<(), SkipReason> {
    fs::create_dir_all(dir)
        .map_err(|e| SkipReason::WriteFailed(format!("{}: {e}", dir.display())))
}

fn save_png<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    path: PathBuf,
) -> std::result::Result<PathBuf, SkipReason>
where
    P: Pixel<Subpixel = u8> + PixelWithColorType,
{
    image
        .save(&path)
        .map_err(|e| SkipReason::WriteFailed(format!("{}: {e}", path.display())))?;
    Ok(path)
}

/// Keep ids usable as file names
fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Parse one CityGML file and write masks for all its walls.
///
/// Output goes to `<out_root>/<file stem>/`, nested per building when
/// `by_building` is set. Failing walls are reported, not returned as errors.
pub fn process_city_file(
    path: &Path,
    out_root: &Path,
    config: &PipelineConfig,
    by_building: bool,
) -> Result<FileReport> {
    let model = CityModel::from_path(path).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let stem = path
        .file_stem()
        .map(|s| file_safe(&s.to_string_lossy()))
        .unwrap_or_else(|| "citymodel".to_string());
    let layout = OutputLayout {
        root: out_root.join(stem),
        by_building,
    };
    fs::create_dir_all(&layout.root).map_err(|source| Error::OutputDir {
        path: layout.root.clone(),
        source,
    })?;

    let tasks = model.walls();
    tracing::info!(file = %path.display(), walls = tasks.len(), "Processing city model");

    let stems = layout.file_stems(&tasks);
    let walls = run_walls(&tasks, config, |index, masks| {
        layout.write(masks, &stems[index])
    });

    let report = FileReport {
        input: path.to_path_buf(),
        output_dir: layout.root,
        walls,
    };
    tracing::info!(
        file = %path.display(),
        written = report.written(),
        skipped = report.skipped(),
        "Finished city model"
    );
    Ok(report)
}

/// Input files: `path` itself, or the `.gml` files directly inside it, sorted
pub fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = fs::read_dir(path).map_err(|source| Error::Input {
        path: path.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(GML_EXTENSION))
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_safe() {
        assert_eq!(file_safe("GML_1a-2.b"), "GML_1a-2.b");
        assert_eq!(file_safe("../wall 3"), ".._wall_3");
    }

    #[test]
    fn test_wall_dir_layout() {
        let flat = OutputLayout {
            root: PathBuf::from("out/city"),
            by_building: false,
        };
        assert_eq!(flat.wall_dir(Some("B1")), PathBuf::from("out/city"));

        let nested = OutputLayout {
            by_building: true,
            ..flat
        };
        assert_eq!(nested.wall_dir(Some("B1")), PathBuf::from("out/city/B1"));
        assert_eq!(nested.wall_dir(None), PathBuf::from("out/city/no_building"));
    }

    #[test]
    fn test_colliding_ids_get_distinct_stems() {
        use facade_mask_core::{CityNode, NodeKind};

        let task = |id: &str, building: Option<&str>| WallTask {
            wall_id: id.to_string(),
            building_id: building.map(str::to_string),
            wall: CityNode::new(NodeKind::WallSurface),
        };
        let tasks = vec![
            task("a_b", Some("B1")),
            task("a/b", Some("B1")),
            task("a_b", Some("B1")),
            task("a_b_2", Some("B1")),
            task("a b", Some("B2")),
        ];

        let flat = OutputLayout {
            root: PathBuf::from("out/city"),
            by_building: false,
        };
        assert_eq!(
            flat.file_stems(&tasks),
            vec!["a_b", "a_b_2", "a_b_3", "a_b_2_2", "a_b_4"]
        );

        // Different building directories never collide
        let nested = OutputLayout {
            by_building: true,
            ..flat
        };
        assert_eq!(
            nested.file_stems(&tasks),
            vec!["a_b", "a_b_2", "a_b_3", "a_b_2_2", "a_b"]
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
