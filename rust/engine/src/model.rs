// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-shot load path (C11+C12 combined): check the cache, and on a miss
//! run the full pipeline to completion and write a fresh entry. This is
//! the surface a renderer or export consumer reaches for when it wants the
//! whole model at once rather than the incremental batch stream in
//! [`crate::stream`].

use std::path::{Path, PathBuf};

use ifc_lite_cache::{CacheHit, CachedModel, Instance, MeshPoolBuilder, PooledMesh};
use ifc_lite_processing::events::{CoordinateInfoSummary, LoadEvent};
use ifc_lite_processing::stream::BatchEmitter;
use ifc_lite_processing::LoadConfig;

use crate::error::Result;
use crate::mapped::MappedFile;

/// An identity placement: the geometry pipeline already bakes each
/// element's world transform into its mesh, so every pooled instance in
/// this facade is placed at the origin rather than carrying its own
/// transform. See `DESIGN.md` for why pool dedup is a by-product rather
/// than a primary goal here.
const IDENTITY_TRANSFORM: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

pub struct LoadResult {
    pub model: CachedModel,
    pub coordinate_info: CoordinateInfoSummary,
    pub failed_elements: Vec<u32>,
    pub from_cache: bool,
}

/// Load `source_path` to completion, consulting `config.cache_dir` first
/// and writing a fresh entry back to it on a miss.
pub fn load_model(source_path: &Path, config: LoadConfig) -> Result<LoadResult> {
    let mapped = MappedFile::open(source_path)?;
    let cache_path = config.cache_dir.as_deref().map(|dir| cache_path_for(dir, source_path));

    if let Some(path) = &cache_path {
        match ifc_lite_cache::read_cache(path, mapped.as_bytes())? {
            CacheHit::Hit(model) => {
                tracing::info!(path = %path.display(), "cache hit");
                return Ok(LoadResult {
                    model,
                    coordinate_info: CoordinateInfoSummary::default(),
                    failed_elements: Vec::new(),
                    from_cache: true,
                });
            }
            CacheHit::Miss => tracing::debug!(path = %path.display(), "cache miss"),
        }
    }

    let span = tracing::info_span!("load_model", path = %source_path.display());
    let _guard = span.enter();

    let loaded = ifc_lite_processing::pipeline::build_model(mapped.as_str())?;
    let emitter = BatchEmitter::new(
        loaded.decoder,
        loaded.router,
        loaded.void_index,
        loaded.spatial.element_to_storey.clone(),
        loaded.jobs,
        config,
    );

    let mut pool = MeshPoolBuilder::new();
    let mut instances = Vec::new();
    let mut coordinate_info = CoordinateInfoSummary::default();
    let mut failed_elements = Vec::new();

    for event in emitter {
        match event {
            LoadEvent::Batch { meshes, coordinate_info: info, .. } => {
                coordinate_info = info;
                for mesh in meshes {
                    let pool_index = pool.intern(PooledMesh {
                        positions: mesh.positions,
                        normals: mesh.normals,
                        indices: mesh.indices,
                    });
                    instances.push(Instance {
                        mesh_pool_index: pool_index,
                        transform: IDENTITY_TRANSFORM,
                        color: mesh.color,
                        express_id: mesh.express_id,
                    });
                }
            }
            LoadEvent::Complete { coordinate_info: info, failed_elements: failed, .. } => {
                coordinate_info = info;
                failed_elements = failed;
            }
            LoadEvent::ColorUpdate { .. } | LoadEvent::Error { .. } => {}
        }
    }

    let model = CachedModel {
        entities: loaded.entities,
        properties: loaded.properties,
        quantities: loaded.quantities,
        relationships: loaded.relationships,
        strings: loaded.strings,
        spatial: loaded.spatial,
        meshes: pool.build(),
        instances,
    };

    if let Some(path) = &cache_path {
        ifc_lite_cache::write_cache(path, mapped.as_bytes(), &model)?;
    }

    Ok(LoadResult { model, coordinate_info, failed_elements, from_cache: false })
}

/// Cache files are keyed by content hash inside the file itself (§C12);
/// the on-disk name only needs to avoid collisions between distinct
/// source files sharing a cache directory.
fn cache_path_for(cache_dir: &Path, source_path: &Path) -> PathBuf {
    let stem = source_path.file_stem().and_then(|s| s.to_str()).unwrap_or("model");
    cache_dir.join(format!("{stem}.ifccache"))
}
