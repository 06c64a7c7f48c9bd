// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh dedup pool (C12): many instances of the same geometry (a repeated
//! door, a mapped family) share one pooled mesh. Pool membership is keyed
//! by the blake3 hash of `positions ++ normals ++ indices`, so two
//! geometrically identical meshes always collapse to one pool entry
//! regardless of which express id produced them first.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PooledMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl PooledMesh {
    fn content_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(bytemuck_f32(&self.positions));
        hasher.update(bytemuck_f32(&self.normals));
        hasher.update(bytemuck_u32(&self.indices));
        *hasher.finalize().as_bytes()
    }
}

fn bytemuck_f32(v: &[f32]) -> &[u8] {
    // SAFETY: f32 has no padding and any bit pattern is valid; the slice's
    // lifetime and length are preserved across the reinterpretation.
    unsafe { std::slice::from_raw_parts(v.as_ptr() as *const u8, std::mem::size_of_val(v)) }
}

fn bytemuck_u32(v: &[u32]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(v.as_ptr() as *const u8, std::mem::size_of_val(v)) }
}

/// One placed copy of a pooled mesh: which pool entry, where, and in what
/// color, keyed back to the express id that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Instance {
    pub mesh_pool_index: u32,
    pub transform: [f32; 16],
    pub color: [f32; 4],
    pub express_id: u32,
}

/// Builds the dedup pool incrementally: `intern` returns the existing pool
/// index for an identical mesh instead of appending a duplicate.
#[derive(Default)]
pub struct MeshPoolBuilder {
    meshes: Vec<PooledMesh>,
    by_hash: FxHashMap<[u8; 32], u32>,
}

impl MeshPoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, mesh: PooledMesh) -> u32 {
        let hash = mesh.content_hash();
        if let Some(&index) = self.by_hash.get(&hash) {
            return index;
        }
        let index = self.meshes.len() as u32;
        self.by_hash.insert(hash, index);
        self.meshes.push(mesh);
        index
    }

    pub fn build(self) -> Vec<PooledMesh> {
        self.meshes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(x: f32) -> PooledMesh {
        PooledMesh {
            positions: vec![x, 0.0, 0.0],
            normals: vec![0.0, 0.0, 1.0],
            indices: vec![0],
        }
    }

    #[test]
    fn identical_meshes_share_one_pool_slot() {
        let mut pool = MeshPoolBuilder::new();
        let a = pool.intern(mesh(1.0));
        let b = pool.intern(mesh(1.0));
        let c = pool.intern(mesh(2.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.build().len(), 2);
    }
}
