// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF input contract (C15). Shapes [`crate::mesh::MeshIter`] output into
//! one primitive per element, the buffer layout a glTF/GLB encoder would
//! lay out as its POSITION/NORMAL/indices accessors. Encoding the actual
//! binary glTF container is out of scope here.

use crate::mesh::{MeshEntry, MeshIter};

/// One glTF primitive's buffer-ready data, not yet packed into a
/// bufferView/accessor layout.
pub struct GltfPrimitive<'a> {
    pub express_id: u32,
    pub positions: &'a [f32],
    pub normals: &'a [f32],
    pub indices: &'a [u32],
    pub base_color: [f32; 4],
}

impl<'a> From<&'a MeshEntry> for GltfPrimitive<'a> {
    fn from(entry: &'a MeshEntry) -> Self {
        GltfPrimitive {
            express_id: entry.express_id,
            positions: &entry.mesh.positions,
            normals: &entry.mesh.normals,
            indices: &entry.mesh.indices,
            base_color: entry.color,
        }
    }
}

pub fn primitives(meshes: MeshIter<'_>) -> impl Iterator<Item = GltfPrimitive<'_>> {
    meshes.map(GltfPrimitive::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh;
    use ifc_lite_geometry::Mesh;

    #[test]
    fn wraps_every_mesh_entry_as_a_primitive() {
        let entries = vec![MeshEntry {
            express_id: 9,
            mesh: Mesh {
                positions: vec![0.0, 0.0, 0.0],
                normals: vec![0.0, 0.0, 1.0],
                indices: vec![0],
            },
            color: [1.0, 1.0, 1.0, 1.0],
        }];

        let prims: Vec<_> = primitives(mesh::meshes(&entries)).collect();
        assert_eq!(prims.len(), 1);
        assert_eq!(prims[0].express_id, 9);
        assert_eq!(prims[0].indices, &[0]);
    }
}
