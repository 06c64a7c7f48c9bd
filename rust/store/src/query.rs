// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-side query surface (C13) over the entity table, relationship
//! graph, property table and spatial hierarchy. Free functions, no
//! allocation beyond the returned collection.

use ifc_lite_core::IfcType;

use crate::entities::{EntityRow, EntityTable};
use crate::graph::{Direction, RelType, RelationshipGraph};
use crate::properties::{PropertyRow, PropertyTable};
use crate::spatial::SpatialHierarchy;
use crate::strings::StringId;

pub fn by_type<'a>(entities: &'a EntityTable, ifc_type: IfcType) -> &'a [EntityRow] {
    entities.get_by_type(ifc_type)
}

pub fn related(graph: &RelationshipGraph, express_id: u32, rel_type: RelType, direction: Direction) -> Vec<u32> {
    graph.get_related(express_id, Some(rel_type), direction)
}

/// Elements contained directly in `container_id`'s spatial node, plus
/// every element contained by its descendants (storey under building
/// under site, nested spaces, etc).
pub fn by_spatial_container(hierarchy: &SpatialHierarchy, container_id: u32) -> Vec<u32> {
    let mut elements = Vec::new();
    let mut stack = vec![container_id];
    let mut visited = std::collections::HashSet::new();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = hierarchy.node(id) else {
            continue;
        };
        elements.extend_from_slice(&node.elements);
        stack.extend(node.children.iter().copied());
    }

    elements
}

/// Entity ids carrying a property matching `pset_name`/`prop_name` for
/// which `predicate` returns true. Operates on the already-typed
/// [`PropertyRow`] columns rather than re-decoding raw attribute values.
pub fn by_property<'a>(
    properties: &'a PropertyTable,
    pset_name: StringId,
    prop_name: StringId,
    predicate: impl Fn(&PropertyRow) -> bool,
) -> Vec<u32> {
    properties
        .by_pset(pset_name)
        .filter(|row| row.prop_name == prop_name && predicate(row))
        .map(|row| row.entity_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityTableBuilder, NewEntityRow};
    use crate::properties::{PropertyTableBuilder, ValueKind};
    use crate::spatial::{SpatialHierarchy, SpatialNode};
    use crate::strings::StringTable;

    #[test]
    fn spatial_container_query_collects_transitive_elements() {
        let mut hierarchy = SpatialHierarchy::default();
        hierarchy.nodes.insert(
            1,
            SpatialNode {
                express_id: 1,
                ifc_type: IfcType::IfcBuilding,
                name: StringId::EMPTY,
                elevation: None,
                children: vec![2],
                elements: vec![10],
            },
        );
        hierarchy.nodes.insert(
            2,
            SpatialNode {
                express_id: 2,
                ifc_type: IfcType::IfcBuildingStorey,
                name: StringId::EMPTY,
                elevation: Some(0.0),
                children: vec![],
                elements: vec![20, 21],
            },
        );

        let mut found = by_spatial_container(&hierarchy, 1);
        found.sort_unstable();
        assert_eq!(found, vec![10, 20, 21]);
    }

    #[test]
    fn by_type_filters_entity_rows() {
        let mut builder = EntityTableBuilder::default();
        builder.add(NewEntityRow {
            express_id: 1,
            ifc_type: IfcType::IfcWall,
            global_id: StringId::EMPTY,
            name: StringId::EMPTY,
            description: StringId::EMPTY,
            object_type: StringId::EMPTY,
            has_geometry: true,
        });
        builder.add(NewEntityRow {
            express_id: 2,
            ifc_type: IfcType::IfcSlab,
            global_id: StringId::EMPTY,
            name: StringId::EMPTY,
            description: StringId::EMPTY,
            object_type: StringId::EMPTY,
            has_geometry: true,
        });
        let table = builder.build();

        assert_eq!(by_type(&table, IfcType::IfcWall).len(), 1);
        assert_eq!(by_type(&table, IfcType::IfcSlab).len(), 1);
        assert_eq!(by_type(&table, IfcType::IfcDoor).len(), 0);
    }

    #[test]
    fn by_property_filters_on_predicate() {
        let mut strings = StringTable::new();
        let pset = strings.intern("Pset_WallCommon");
        let prop = strings.intern("IsExternal");

        let mut builder = PropertyTableBuilder::default();
        builder.add(PropertyRow {
            entity_id: 5,
            pset_name: pset,
            pset_global_id: StringId::EMPTY,
            prop_name: prop,
            value_kind: ValueKind::Bool,
            value_string: None,
            value_real: f64::NAN,
            value_int: 0,
            value_bool: 1,
            unit_id: -1,
        });
        let table = builder.build();

        let found = by_property(&table, pset, prop, |row| row.value_bool == 1);
        assert_eq!(found, vec![5]);
        let none = by_property(&table, pset, prop, |row| row.value_bool == 0);
        assert!(none.is_empty());
    }
}
