// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ifc_lite_core::EntityDecoder;
use ifc_lite_store::{
    build_spatial_hierarchy, extract_relationships, Direction, RelType, StringTable,
};

const MODEL: &str = r#"DATA;
#1=IFCPROJECT('proj',$,$,$,$,$,$,$,$);
#2=IFCSITE('site',$,$,$,$,$,$,$,$,$,$,$,$,$);
#3=IFCBUILDING('bldg',$,$,$,$,$,$,$,$,$,$);
#4=IFCBUILDINGSTOREY('storey1',$,'L1',$,$,$,$,$,$,0.);
#5=IFCBUILDINGSTOREY('storey2',$,'L2',$,$,$,$,$,$,3.);
#6=IFCWALL('wall1',$,$,$,$,$,$,$);
#7=IFCSLAB('slab1',$,$,$,$,$,$,$);
#10=IFCRELAGGREGATES('r10',$,$,$,#1,(#2));
#11=IFCRELAGGREGATES('r11',$,$,$,#2,(#3));
#12=IFCRELAGGREGATES('r12',$,$,$,#3,(#4,#5));
#13=IFCRELCONTAINEDINSPATIALSTRUCTURE('r13',$,$,$,(#6),#4);
#14=IFCRELCONTAINEDINSPATIALSTRUCTURE('r14',$,$,$,(#7),#5);
ENDSEC;"#;

const RELATIONSHIP_IDS: [u32; 5] = [10, 11, 12, 13, 14];

#[test]
fn csr_forward_and_inverse_edges_are_symmetric() {
    let mut decoder = EntityDecoder::new(MODEL);
    let graph = extract_relationships(&mut decoder, RELATIONSHIP_IDS);

    assert_eq!(graph.edge_count(), 6);

    for &(src, dst) in &[(1, 2), (2, 3), (3, 4), (3, 5), (4, 6), (5, 7)] {
        assert!(
            graph.forward_neighbors(src).contains(&dst),
            "missing forward edge {src} -> {dst}"
        );
        assert!(
            graph.inverse_neighbors(dst).contains(&src),
            "missing inverse edge {dst} -> {src}"
        );
    }

    assert!(graph.has_relationship(3, 4, Some(RelType::Aggregates)));
    assert!(graph.has_relationship(4, 6, Some(RelType::ContainsElements)));
    assert!(!graph.has_relationship(6, 4, Some(RelType::ContainsElements)));
}

#[test]
fn spatial_tree_reaches_every_node_from_project_root() {
    let mut decoder = EntityDecoder::new(MODEL);
    let graph = extract_relationships(&mut decoder, RELATIONSHIP_IDS);
    let mut strings = StringTable::new();

    let hierarchy = build_spatial_hierarchy(&mut decoder, &graph, &mut strings, Some(1));

    assert_eq!(hierarchy.nodes.len(), 5);
    assert_eq!(hierarchy.element_to_storey.get(&6), Some(&4));
    assert_eq!(hierarchy.element_to_storey.get(&7), Some(&5));
    assert_eq!(hierarchy.storey_elevations.get(&4), Some(&0.0));
    assert_eq!(hierarchy.storey_elevations.get(&5), Some(&3.0));

    let related = graph.get_related(1, Some(RelType::Aggregates), Direction::Forward);
    assert_eq!(related, vec![2]);
}
