// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adapts a loaded [`CachedModel`] into the export crate's pure reader
//! contract, so an export consumer never has to touch `ifc-lite-store`
//! or `ifc-lite-cache` types directly.

use ifc_lite_cache::CachedModel;
use ifc_lite_export::{ColumnIter, EdgeIter, MeshEntry};
use ifc_lite_geometry::Mesh;

pub fn entity_columns<'a>(model: &'a CachedModel) -> ColumnIter<'a> {
    ifc_lite_export::column::entities(&model.entities, &model.strings)
}

pub fn property_columns<'a>(model: &'a CachedModel) -> ColumnIter<'a> {
    ifc_lite_export::column::properties(&model.properties, &model.strings)
}

pub fn quantity_columns<'a>(model: &'a CachedModel) -> ColumnIter<'a> {
    ifc_lite_export::column::quantities(&model.quantities, &model.strings)
}

pub fn edges(model: &CachedModel) -> EdgeIter<'_> {
    ifc_lite_export::edge::edges(&model.entities, &model.relationships)
}

/// Resolves pooled, instanced geometry into the flat per-element entries
/// the export mesh reader expects. Every instance in this facade carries
/// an identity transform (see `crate::model`), so this is a plain copy
/// rather than a matrix multiply.
pub fn mesh_entries(model: &CachedModel) -> Vec<MeshEntry> {
    model
        .instances
        .iter()
        .filter_map(|instance| {
            let pooled = model.meshes.get(instance.mesh_pool_index as usize)?;
            Some(MeshEntry {
                express_id: instance.express_id,
                mesh: Mesh {
                    positions: pooled.positions.clone(),
                    normals: pooled.normals.clone(),
                    indices: pooled.indices.clone(),
                },
                color: instance.color,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_lite_store::{EntityTableBuilder, PropertyTableBuilder, QuantityTableBuilder, RelationshipGraphBuilder, SpatialHierarchy, StringTable};

    fn empty_model() -> CachedModel {
        CachedModel {
            entities: EntityTableBuilder::default().build(),
            properties: PropertyTableBuilder::default().build(),
            quantities: QuantityTableBuilder::default().build(),
            relationships: RelationshipGraphBuilder::default().build(),
            strings: StringTable::new(),
            spatial: SpatialHierarchy::default(),
            meshes: Vec::new(),
            instances: vec![ifc_lite_cache::Instance {
                mesh_pool_index: 7,
                transform: [0.0; 16],
                color: [1.0, 0.0, 0.0, 1.0],
                express_id: 1,
            }],
        }
    }

    #[test]
    fn mesh_entries_skips_instances_with_a_dangling_pool_index() {
        let model = empty_model();
        assert!(mesh_entries(&model).is_empty());
    }

    #[test]
    fn entity_columns_over_an_empty_table_has_no_rows() {
        let model = empty_model();
        assert_eq!(entity_columns(&model).count(), 0);
    }
}
