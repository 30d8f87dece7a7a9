// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! facade-masks - CityGML walls to facade segmentation masks.
//!
//! Processes a single `.gml` file or every `.gml` file of a directory. Walls
//! that cannot be rasterized are logged and skipped; the process still exits
//! successfully once the batch completes. It fails only when the input
//! cannot be read at all.

use anyhow::Context;
use clap::Parser;
use facade_mask_processing::{collect_inputs, process_city_file, BatchReport};

mod config;

use config::Args;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = args.pipeline_config();

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = args.threads {
        pool = pool.num_threads(threads);
    }
    pool.build_global()
        .context("Failed to initialize worker pool")?;

    let inputs = collect_inputs(&args.input)
        .with_context(|| format!("Cannot read input {}", args.input.display()))?;
    if inputs.is_empty() {
        tracing::warn!(input = %args.input.display(), "No .gml files found");
    }

    tracing::info!(
        files = inputs.len(),
        output = %args.output.display(),
        threads = rayon::current_num_threads(),
        category = ?config.category,
        projection = ?config.projection,
        flip = ?config.flip,
        scale = config.scale,
        dist_thresh = config.dist_thresh,
        "Starting facade mask extraction"
    );

    let single = inputs.len() == 1;
    let mut files = Vec::with_capacity(inputs.len());
    for path in &inputs {
        match process_city_file(path, &args.output, &config, args.by_building) {
            Ok(report) => files.push(report),
            Err(err) if single => {
                return Err(err).context("Input could not be processed");
            }
            Err(err) => {
                tracing::error!(file = %path.display(), error = %err, "Skipping file");
            }
        }
    }

    let report = BatchReport::new(files);
    tracing::info!(
        walls_written = report.walls_written,
        walls_skipped = report.walls_skipped,
        "Finished"
    );

    if let Some(path) = &args.report {
        report.write(path)?;
        tracing::info!(report = %path.display(), "Wrote report");
    }

    Ok(())
}
