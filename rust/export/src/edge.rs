// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSR relationship edge reader (C15). Walks the forward adjacency of
//! every entity in the table, same endpoint-pair shape as the teacher's
//! `(rel_type, relating_id, related_id)` relationships table.

use ifc_lite_store::{Direction, EntityTable, RelType, RelationshipGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source: u32,
    pub target: u32,
    pub rel_type: RelType,
    pub rel_id: u32,
}

pub struct EdgeIter<'a> {
    graph: &'a RelationshipGraph,
    entity_ids: std::vec::IntoIter<u32>,
    current_source: u32,
    current: Box<dyn Iterator<Item = (u32, RelType, u32)> + 'a>,
}

impl<'a> EdgeIter<'a> {
    fn new(entities: &'a EntityTable, graph: &'a RelationshipGraph) -> Self {
        let mut entity_ids = entities.rows().iter().map(|r| r.express_id).collect::<Vec<_>>().into_iter();
        let current_source = entity_ids.next().unwrap_or(0);
        let current = Box::new(graph.edges_from(current_source, Direction::Forward));
        Self {
            graph,
            entity_ids,
            current_source,
            current,
        }
    }
}

impl<'a> Iterator for EdgeIter<'a> {
    type Item = EdgeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((target, rel_type, rel_id)) = self.current.next() {
                return Some(EdgeRecord {
                    source: self.current_source,
                    target,
                    rel_type,
                    rel_id,
                });
            }
            self.current_source = self.entity_ids.next()?;
            self.current = Box::new(self.graph.edges_from(self.current_source, Direction::Forward));
        }
    }
}

/// All forward edges whose source is an entity present in `entities`.
pub fn edges<'a>(entities: &'a EntityTable, graph: &'a RelationshipGraph) -> EdgeIter<'a> {
    EdgeIter::new(entities, graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_lite_core::IfcType;
    use ifc_lite_store::entities::{EntityTableBuilder, NewEntityRow};
    use ifc_lite_store::{RelationshipGraphBuilder, StringId, StringTable};

    #[test]
    fn walks_forward_edges_for_every_entity_in_the_table() {
        let mut strings = StringTable::new();
        let _ = strings.intern("g");
        let mut builder = EntityTableBuilder::default();
        builder.add(NewEntityRow {
            express_id: 1,
            ifc_type: IfcType::IfcBuildingStorey,
            global_id: StringId::EMPTY,
            name: StringId::EMPTY,
            description: StringId::EMPTY,
            object_type: StringId::EMPTY,
            has_geometry: false,
        });
        builder.add(NewEntityRow {
            express_id: 2,
            ifc_type: IfcType::IfcWall,
            global_id: StringId::EMPTY,
            name: StringId::EMPTY,
            description: StringId::EMPTY,
            object_type: StringId::EMPTY,
            has_geometry: true,
        });
        let entities = builder.build();

        let mut graph_builder = RelationshipGraphBuilder::default();
        graph_builder.add_edge(1, 2, RelType::ContainsElements, 100);
        let graph = graph_builder.build();

        let found: Vec<_> = edges(&entities, &graph).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, 1);
        assert_eq!(found[0].target, 2);
        assert_eq!(found[0].rel_type, RelType::ContainsElements);
    }
}
