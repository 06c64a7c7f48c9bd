// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thin demonstration binary over [`ifc_lite_engine`]: load a model,
//! stream its batches, or export its entity table to CSV. This is the
//! only outer surface shipped in this workspace; it is not a renderer
//! and carries no picking/camera/UI of its own.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ifc_lite_engine::{LoadConfig, LoadEvent, MappedFile};

#[derive(Parser)]
#[command(name = "ifc-lite", about = "Load, stream and export IFC STEP models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a model to completion (cache-aware) and print a summary.
    Load {
        path: PathBuf,
        /// Directory to read/write a binary cache entry in.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Load a model and print each batch as it is emitted.
    Stream { path: PathBuf },
    /// Load a model and write its entity table as CSV.
    ExportCsv { path: PathBuf, out: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Load { path, cache_dir } => run_load(&path, cache_dir),
        Commands::Stream { path } => run_stream(&path),
        Commands::ExportCsv { path, out } => run_export_csv(&path, &out),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_load(path: &std::path::Path, cache_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = LoadConfig::new();
    config.cache_dir = cache_dir;

    let result = ifc_lite_engine::load_model(path, config)?;

    println!("entities:   {}", result.model.entities.rows().len());
    println!("meshes:     {} (pooled from {} instances)", result.model.meshes.len(), result.model.instances.len());
    println!("from cache: {}", result.from_cache);
    println!("failed:     {}", result.failed_elements.len());
    if result.coordinate_info.is_geo_referenced {
        println!(
            "origin shift: [{:.3}, {:.3}, {:.3}]",
            result.coordinate_info.origin_shift[0], result.coordinate_info.origin_shift[1], result.coordinate_info.origin_shift[2]
        );
    }
    Ok(())
}

fn run_stream(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mapped = MappedFile::open(path)?;
    let mut batch_count = 0usize;
    for event in ifc_lite_engine::stream_model(mapped.as_str(), LoadConfig::new())? {
        match event {
            LoadEvent::Batch { meshes, total_so_far, .. } => {
                batch_count += 1;
                println!("batch {batch_count}: {} meshes ({total_so_far} total so far)", meshes.len());
            }
            LoadEvent::Complete { total_meshes, failed_elements, .. } => {
                println!("complete: {total_meshes} meshes, {} failed", failed_elements.len());
            }
            LoadEvent::ColorUpdate { updates } => {
                println!("color update: {} elements", updates.len());
            }
            LoadEvent::Error { kind, express_id, message } => {
                eprintln!("warning [{kind}] {express_id:?}: {message}");
            }
        }
    }
    Ok(())
}

fn run_export_csv(path: &std::path::Path, out: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let result = ifc_lite_engine::load_model(path, LoadConfig::new())?;
    let mut file = std::fs::File::create(out)?;
    ifc_lite_export::csv::write_entities(&result.model.entities, &result.model.strings, &mut file)?;
    println!("wrote {}", out.display());
    Ok(())
}
