// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh reader (C15). A pure view over vertex/index buffers already
//! produced by the geometry pipeline; this crate never triangulates
//! anything itself, it only iterates what it's handed.

use ifc_lite_geometry::Mesh;

/// One element's mesh plus the metadata an export sink needs to place it.
pub struct MeshEntry {
    pub express_id: u32,
    pub mesh: Mesh,
    pub color: [f32; 4],
}

pub struct MeshIter<'a> {
    entries: std::slice::Iter<'a, MeshEntry>,
}

impl<'a> Iterator for MeshIter<'a> {
    type Item = &'a MeshEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}

pub fn meshes(entries: &[MeshEntry]) -> MeshIter<'_> {
    MeshIter { entries: entries.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_every_entry_in_order() {
        let entries = vec![
            MeshEntry {
                express_id: 1,
                mesh: Mesh::new(),
                color: [1.0, 0.0, 0.0, 1.0],
            },
            MeshEntry {
                express_id: 2,
                mesh: Mesh::new(),
                color: [0.0, 1.0, 0.0, 1.0],
            },
        ];

        let ids: Vec<u32> = meshes(&entries).map(|e| e.express_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
