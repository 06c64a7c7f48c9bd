// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bidirectional CSR relationship graph (C6). Built in a second pass over
//! every `IfcRel*` entity; queried by either endpoint.

use ifc_lite_core::{DecodedEntity, EntityDecoder, IfcType};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelType {
    ContainsElements,
    Aggregates,
    DefinesByProperties,
    DefinesByType,
    AssociatesMaterial,
    AssociatesClassification,
    VoidsElement,
    FillsElement,
    ConnectsPathElements,
    ConnectsElements,
    SpaceBoundary,
    AssignsToGroup,
    AssignsToProduct,
    ReferencedInSpatialStructure,
}

impl RelType {
    fn from_ifc_type(t: IfcType) -> Option<Self> {
        Some(match t {
            IfcType::IfcRelContainedInSpatialStructure => Self::ContainsElements,
            IfcType::IfcRelAggregates => Self::Aggregates,
            IfcType::IfcRelDefinesByProperties => Self::DefinesByProperties,
            IfcType::IfcRelDefinesByType => Self::DefinesByType,
            IfcType::IfcRelAssociatesMaterial => Self::AssociatesMaterial,
            IfcType::IfcRelAssociatesClassification => Self::AssociatesClassification,
            IfcType::IfcRelVoidsElement => Self::VoidsElement,
            IfcType::IfcRelFillsElement => Self::FillsElement,
            IfcType::IfcRelConnectsPathElements => Self::ConnectsPathElements,
            IfcType::IfcRelConnectsElements => Self::ConnectsElements,
            IfcType::IfcRelSpaceBoundary => Self::SpaceBoundary,
            IfcType::IfcRelAssignsToGroup => Self::AssignsToGroup,
            IfcType::IfcRelAssignsToProduct => Self::AssignsToProduct,
            IfcType::IfcRelReferencedInSpatialStructure => Self::ReferencedInSpatialStructure,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub source: u32,
    pub target: u32,
    pub rel_type: RelType,
    pub rel_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

/// One direction's CSR arrays: `offsets[id] = (start, count)` into the
/// shared `neighbors`/`types`/`rel_ids` arrays, sorted by the indexed id.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Csr {
    offsets: FxHashMap<u32, (u32, u32)>,
    neighbors: Vec<u32>,
    types: Vec<RelType>,
    rel_ids: Vec<u32>,
}

impl Csr {
    fn build(mut edges: Vec<(u32, u32, RelType, u32)>) -> Self {
        edges.sort_by_key(|e| e.0);

        let mut offsets = FxHashMap::default();
        let mut neighbors = Vec::with_capacity(edges.len());
        let mut types = Vec::with_capacity(edges.len());
        let mut rel_ids = Vec::with_capacity(edges.len());

        for (indexed_id, neighbor, rel_type, rel_id) in edges {
            let row = neighbors.len() as u32;
            let entry = offsets.entry(indexed_id).or_insert((row, 0));
            entry.1 += 1;
            neighbors.push(neighbor);
            types.push(rel_type);
            rel_ids.push(rel_id);
        }

        Self {
            offsets,
            neighbors,
            types,
            rel_ids,
        }
    }

    fn slice(&self, id: u32) -> &[u32] {
        match self.offsets.get(&id) {
            Some(&(start, count)) => &self.neighbors[start as usize..(start + count) as usize],
            None => &[],
        }
    }

    fn entries(&self, id: u32) -> impl Iterator<Item = (u32, RelType, u32)> + '_ {
        let (start, count) = self.offsets.get(&id).copied().unwrap_or((0, 0));
        let start = start as usize;
        let end = start + count as usize;
        (start..end).map(move |i| (self.neighbors[i], self.types[i], self.rel_ids[i]))
    }
}

#[derive(Default)]
pub struct RelationshipGraphBuilder {
    edges: Vec<Edge>,
}

impl RelationshipGraphBuilder {
    pub fn add_edge(&mut self, source: u32, target: u32, rel_type: RelType, rel_id: u32) {
        self.edges.push(Edge {
            source,
            target,
            rel_type,
            rel_id,
        });
    }

    pub fn build(self) -> RelationshipGraph {
        let forward_input: Vec<_> = self
            .edges
            .iter()
            .map(|e| (e.source, e.target, e.rel_type, e.rel_id))
            .collect();
        let inverse_input: Vec<_> = self
            .edges
            .iter()
            .map(|e| (e.target, e.source, e.rel_type, e.rel_id))
            .collect();

        RelationshipGraph {
            edge_count: self.edges.len(),
            forward: Csr::build(forward_input),
            inverse: Csr::build(inverse_input),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelationshipGraph {
    edge_count: usize,
    forward: Csr,
    inverse: Csr,
}

impl RelationshipGraph {
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Neighbor ids reachable from `id`, optionally filtered by `rel_type`.
    pub fn get_related(
        &self,
        id: u32,
        rel_type: Option<RelType>,
        direction: Direction,
    ) -> Vec<u32> {
        let csr = match direction {
            Direction::Forward => &self.forward,
            Direction::Inverse => &self.inverse,
        };
        csr.entries(id)
            .filter(|(_, t, _)| rel_type.map_or(true, |rt| *t == rt))
            .map(|(n, _, _)| n)
            .collect()
    }

    /// All forward neighbor ids of `id`, unfiltered (fast path, no alloc
    /// beyond the returned slice view).
    pub fn forward_neighbors(&self, id: u32) -> &[u32] {
        self.forward.slice(id)
    }

    pub fn inverse_neighbors(&self, id: u32) -> &[u32] {
        self.inverse.slice(id)
    }

    pub fn has_relationship(&self, source: u32, target: u32, rel_type: Option<RelType>) -> bool {
        self.forward
            .entries(source)
            .any(|(n, t, _)| n == target && rel_type.map_or(true, |rt| t == rt))
    }

    /// Typed CSR entries for `id` in `direction`: `(neighbor, rel_type, rel_id)`,
    /// unlike [`Self::get_related`] which drops the type and rel id.
    pub fn edges_from(&self, id: u32, direction: Direction) -> impl Iterator<Item = (u32, RelType, u32)> + '_ {
        let csr = match direction {
            Direction::Forward => &self.forward,
            Direction::Inverse => &self.inverse,
        };
        csr.entries(id)
    }
}

/// Scan every relationship entity among `express_ids` and extract its
/// endpoints. Unresolvable or unrecognized relationship shapes are skipped
/// (per §7, `UnresolvedRef`/`UnknownType` never abort the graph build).
pub fn extract_relationships<'a>(
    decoder: &mut EntityDecoder<'a>,
    relationship_ids: impl IntoIterator<Item = u32>,
) -> RelationshipGraph {
    let mut builder = RelationshipGraphBuilder::default();

    for express_id in relationship_ids {
        let entity = match decoder.decode_by_id(express_id) {
            Ok(e) => e,
            Err(_) => continue,
        };
        let Some(rel_type) = RelType::from_ifc_type(entity.ifc_type) else {
            continue;
        };
        extract_one(&entity, rel_type, &mut builder);
    }

    builder.build()
}

fn extract_one(entity: &DecodedEntity, rel_type: RelType, builder: &mut RelationshipGraphBuilder) {
    let rel_id = entity.id;
    match rel_type {
        RelType::ContainsElements => {
            let Some(container) = entity.get_ref(5) else {
                return;
            };
            if let Some(elements) = entity.get(4).and_then(|v| v.as_list()) {
                for el in elements {
                    if let Some(target) = el.as_entity_ref() {
                        builder.add_edge(container, target, rel_type, rel_id);
                    }
                }
            }
        }
        RelType::Aggregates => {
            let Some(parent) = entity.get_ref(4) else {
                return;
            };
            if let Some(children) = entity.get(5).and_then(|v| v.as_list()) {
                for child in children {
                    if let Some(target) = child.as_entity_ref() {
                        builder.add_edge(parent, target, rel_type, rel_id);
                    }
                }
            }
        }
        RelType::DefinesByProperties => {
            let Some(pset) = entity.get_ref(5) else {
                return;
            };
            if let Some(objects) = entity.get(4).and_then(|v| v.as_list()) {
                for obj in objects {
                    if let Some(source) = obj.as_entity_ref() {
                        builder.add_edge(source, pset, rel_type, rel_id);
                    }
                }
            }
        }
        RelType::DefinesByType => {
            let Some(type_obj) = entity.get_ref(5) else {
                return;
            };
            if let Some(objects) = entity.get(4).and_then(|v| v.as_list()) {
                for obj in objects {
                    if let Some(source) = obj.as_entity_ref() {
                        builder.add_edge(source, type_obj, rel_type, rel_id);
                    }
                }
            }
        }
        RelType::AssociatesMaterial => {
            let Some(material) = entity.get_ref(5) else {
                return;
            };
            if let Some(objects) = entity.get(4).and_then(|v| v.as_list()) {
                for obj in objects {
                    if let Some(source) = obj.as_entity_ref() {
                        builder.add_edge(source, material, rel_type, rel_id);
                    }
                }
            }
        }
        RelType::VoidsElement => {
            let (Some(building_element), Some(opening)) = (entity.get_ref(4), entity.get_ref(5))
            else {
                return;
            };
            builder.add_edge(building_element, opening, rel_type, rel_id);
        }
        RelType::FillsElement => {
            let (Some(opening), Some(filling)) = (entity.get_ref(4), entity.get_ref(5)) else {
                return;
            };
            builder.add_edge(opening, filling, rel_type, rel_id);
        }
        // Remaining relationship kinds (connections, space boundaries,
        // group/product assignment, indirect spatial reference) share the
        // common two-entity-reference-then-list-or-single shape; the
        // registry doesn't carry full attribute metadata for them (see
        // DESIGN.md scoping note), so fall back to the first two resolved
        // entity references found anywhere in the decoded attribute list.
        RelType::ConnectsPathElements
        | RelType::ConnectsElements
        | RelType::SpaceBoundary
        | RelType::AssignsToGroup
        | RelType::AssignsToProduct
        | RelType::ReferencedInSpatialStructure => {
            let refs: Vec<u32> = entity
                .attributes
                .iter()
                .skip(4)
                .filter_map(|a| a.as_entity_ref())
                .collect();
            if let [source, target, ..] = refs[..] {
                builder.add_edge(source, target, rel_type, rel_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder_for(content: &str) -> EntityDecoder<'_> {
        EntityDecoder::new(content)
    }

    #[test]
    fn csr_forward_and_inverse_are_symmetric() {
        let content = r#"DATA;
#1=IFCWALL('g1',$,$,$,$,$,$,$);
#2=IFCBUILDINGSTOREY('g2',$,$,$,$,$,$,$,$);
#3=IFCRELCONTAINEDINSPATIALSTRUCTURE('g3',$,$,$,(#1),#2);
ENDSEC;"#;
        let mut decoder = decoder_for(content);
        let graph = extract_relationships(&mut decoder, [3]);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.forward_neighbors(2), &[1]);
        assert_eq!(graph.inverse_neighbors(1), &[2]);
        assert!(graph.has_relationship(2, 1, Some(RelType::ContainsElements)));
        assert!(!graph.has_relationship(1, 2, Some(RelType::ContainsElements)));
    }

    #[test]
    fn unrelated_entity_types_are_skipped() {
        let content = "DATA;\n#1=IFCWALL('g',$,$,$,$,$,$,$);\nENDSEC;";
        let mut decoder = decoder_for(content);
        let graph = extract_relationships(&mut decoder, [1]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn aggregates_links_multiple_children() {
        let content = r#"DATA;
#1=IFCPROJECT('g1',$,$,$,$,$,$,$,$);
#2=IFCSITE('g2',$,$,$,$,$,$,$,$,$,$,$,$,$);
#3=IFCBUILDING('g3',$,$,$,$,$,$,$,$,$,$);
#4=IFCRELAGGREGATES('g4',$,$,$,#1,(#2,#3));
ENDSEC;"#;
        let mut decoder = decoder_for(content);
        let graph = extract_relationships(&mut decoder, [4]);
        let mut children = graph.forward_neighbors(1).to_vec();
        children.sort_unstable();
        assert_eq!(children, vec![2, 3]);
    }
}
