// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Streaming event contract (§4.10/§6), serializable so a consuming
//! binary (server, WASM bindings) can forward events across a wire
//! boundary without re-deriving them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One element's triangle mesh plus its resolved display color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshData {
    pub express_id: u32,
    pub ifc_type: String,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub color: [f32; 4],
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinateInfoSummary {
    pub origin_shift: [f64; 3],
    pub is_geo_referenced: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadEvent {
    Batch {
        meshes: Vec<MeshData>,
        total_so_far: usize,
        coordinate_info: CoordinateInfoSummary,
    },
    ColorUpdate {
        updates: FxHashMap<u32, [f32; 4]>,
    },
    Complete {
        total_meshes: usize,
        coordinate_info: CoordinateInfoSummary,
        /// Elements whose full-fidelity geometry failed and were
        /// substituted with an LOD1 box (§4.12).
        failed_elements: Vec<u32>,
    },
    Error {
        kind: String,
        express_id: Option<u32>,
        message: String,
    },
}
