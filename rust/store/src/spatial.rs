// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hierarchy (C8): the project/site/building/storey/space tree,
//! built by walking `Aggregates` edges from the unique `IfcProject`, plus
//! inverse lookup maps from `ContainsElements`.

use ifc_lite_core::{EntityDecoder, IfcType};
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::graph::{Direction, RelType, RelationshipGraph};
use crate::strings::{StringId, StringTable};

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpatialNode {
    pub express_id: u32,
    pub ifc_type: IfcType,
    pub name: StringId,
    pub elevation: Option<f64>,
    pub children: Vec<u32>,
    pub elements: Vec<u32>,
}

#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpatialHierarchy {
    pub project_id: Option<u32>,
    pub nodes: FxHashMap<u32, SpatialNode>,
    pub by_storey: FxHashMap<u32, Vec<u32>>,
    pub by_building: FxHashMap<u32, Vec<u32>>,
    pub by_site: FxHashMap<u32, Vec<u32>>,
    pub by_space: FxHashMap<u32, Vec<u32>>,
    pub element_to_storey: FxHashMap<u32, u32>,
    pub storey_elevations: FxHashMap<u32, f64>,
}

impl SpatialHierarchy {
    pub fn node(&self, express_id: u32) -> Option<&SpatialNode> {
        self.nodes.get(&express_id)
    }
}

/// Build the hierarchy by DFS over `Aggregates` edges starting at
/// `project_id`, recording element containment via `ContainsElements`. An
/// element assigned to more than one storey keeps the first encountered
/// and logs a warning (ties are not a hard error: some authoring tools
/// emit redundant containment relationships).
pub fn build_spatial_hierarchy(
    decoder: &mut EntityDecoder,
    graph: &RelationshipGraph,
    strings: &mut StringTable,
    project_id: Option<u32>,
) -> SpatialHierarchy {
    let mut hierarchy = SpatialHierarchy {
        project_id,
        ..Default::default()
    };

    let Some(root) = project_id else {
        return hierarchy;
    };

    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if hierarchy.nodes.contains_key(&id) {
            continue;
        }

        let (ifc_type, name, elevation) = describe_node(decoder, id, strings);
        let children = graph.get_related(id, Some(RelType::Aggregates), Direction::Forward);
        let elements = graph.get_related(id, Some(RelType::ContainsElements), Direction::Forward);

        if let Some(elev) = elevation {
            hierarchy.storey_elevations.insert(id, elev);
        }

        for &child in &children {
            stack.push(child);
        }

        for &element_id in &elements {
            record_containment(&mut hierarchy, ifc_type, id, element_id);
        }

        hierarchy.nodes.insert(
            id,
            SpatialNode {
                express_id: id,
                ifc_type,
                name,
                elevation,
                children,
                elements,
            },
        );
    }

    hierarchy
}

fn record_containment(hierarchy: &mut SpatialHierarchy, container_type: IfcType, container: u32, element: u32) {
    let bucket = match container_type {
        IfcType::IfcBuildingStorey => Some(&mut hierarchy.by_storey),
        IfcType::IfcBuilding => Some(&mut hierarchy.by_building),
        IfcType::IfcSite => Some(&mut hierarchy.by_site),
        IfcType::IfcSpace => Some(&mut hierarchy.by_space),
        _ => None,
    };
    if let Some(bucket) = bucket {
        bucket.entry(container).or_default().push(element);
    }

    if container_type == IfcType::IfcBuildingStorey {
        if let Some(&existing) = hierarchy.element_to_storey.get(&element) {
            if existing != container {
                warn!(
                    element_id = element,
                    first_storey = existing,
                    duplicate_storey = container,
                    "element contained in multiple storeys, keeping first"
                );
            }
            return;
        }
        hierarchy.element_to_storey.insert(element, container);
    }
}

fn describe_node(
    decoder: &mut EntityDecoder,
    express_id: u32,
    strings: &mut StringTable,
) -> (IfcType, StringId, Option<f64>) {
    let Ok(entity) = decoder.decode_by_id(express_id) else {
        return (IfcType::Unknown(0), StringId::EMPTY, None);
    };

    let all_attrs = entity.ifc_type.all_attributes();
    let name = all_attrs
        .iter()
        .position(|a| a.name == "Name")
        .and_then(|i| entity.get(i))
        .and_then(|v| v.as_string())
        .map(|s| strings.intern(s))
        .unwrap_or(StringId::EMPTY);

    let elevation = if entity.ifc_type == IfcType::IfcBuildingStorey {
        all_attrs
            .iter()
            .position(|a| a.name == "Elevation")
            .and_then(|i| entity.get(i))
            .and_then(|v| v.as_float())
    } else {
        None
    };

    (entity.ifc_type, name, elevation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RelationshipGraphBuilder;

    #[test]
    fn walks_project_to_storey_and_records_elements() {
        let content = r#"DATA;
#1=IFCPROJECT('g1',$,$,$,$,$,$,$,$);
#2=IFCBUILDING('g2',$,$,$,$,$,$,$,$,$,$);
#3=IFCBUILDINGSTOREY('g3',$,'Level 1',$,$,$,$,$,$,3.);
#4=IFCWALL('g4',$,$,$,$,$,$,$);
ENDSEC;"#;
        let mut decoder = EntityDecoder::new(content);
        let mut strings = StringTable::new();

        let mut graph_builder = RelationshipGraphBuilder::default();
        graph_builder.add_edge(1, 2, RelType::Aggregates, 100);
        graph_builder.add_edge(2, 3, RelType::Aggregates, 101);
        graph_builder.add_edge(3, 4, RelType::ContainsElements, 102);
        let graph = graph_builder.build();

        let hierarchy = build_spatial_hierarchy(&mut decoder, &graph, &mut strings, Some(1));

        assert_eq!(hierarchy.by_storey.get(&3), Some(&vec![4]));
        assert_eq!(hierarchy.element_to_storey.get(&4), Some(&3));
        assert_eq!(hierarchy.storey_elevations.get(&3), Some(&3.0));
        assert_eq!(hierarchy.nodes.len(), 3);
    }

    #[test]
    fn no_project_yields_empty_hierarchy() {
        let content = "DATA;\nENDSEC;";
        let mut decoder = EntityDecoder::new(content);
        let mut strings = StringTable::new();
        let graph = RelationshipGraphBuilder::default().build();

        let hierarchy = build_spatial_hierarchy(&mut decoder, &graph, &mut strings, None);
        assert!(hierarchy.nodes.is_empty());
    }
}
