// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load pipeline (C11 feeder): one pass over the scanned entity list
//! assembles every store table, the relationship graph, the spatial
//! hierarchy, the void index and the geometry router that the batch
//! emitter and LOD builders need. Grounded in the teacher's
//! `apps/server/src/services/data_model.rs` extraction pass, generalized
//! to build into the store crate's columnar tables instead of that
//! module's ad hoc `Vec<PropertySet>`/`Vec<Relationship>` shapes.

use std::sync::Arc;

use ifc_lite_core::{
    build_entity_index, has_geometry_by_name, AttributeValue, EntityDecoder, EntityIndex,
    EntityScanner, IfcType,
};
use ifc_lite_geometry::router::GeometryRouter;
use ifc_lite_geometry::void_index::VoidIndex;
use ifc_lite_store::entities::{EntityTable, EntityTableBuilder, NewEntityRow};
use ifc_lite_store::graph::{extract_relationships, Direction, RelType, RelationshipGraph};
use ifc_lite_store::properties::{PropertyRow, PropertyTable, PropertyTableBuilder, ValueKind};
use ifc_lite_store::quantities::{QuantityRow, QuantityTable, QuantityTableBuilder, QuantityType};
use ifc_lite_store::spatial::{build_spatial_hierarchy, SpatialHierarchy};
use ifc_lite_store::strings::StringTable;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::stream::Job;

/// Byte span plus resolved type for one scanned entity; the unit every
/// table-building extractor below keys off.
struct Scanned {
    id: u32,
    ifc_type: IfcType,
    start: usize,
    end: usize,
}

fn scan_all(content: &str) -> Vec<Scanned> {
    let mut scanner = EntityScanner::new(content);
    let mut out = Vec::new();
    while let Some((id, type_name, start, end)) = scanner.next_entity() {
        if let Some(ifc_type) = IfcType::from_str(type_name) {
            out.push(Scanned { id, ifc_type, start, end });
        }
    }
    out
}

/// Everything the batch emitter, the LOD builders and a query layer need,
/// assembled from one parse of the source text.
pub struct LoadedModel<'a> {
    pub decoder: EntityDecoder<'a>,
    pub router: GeometryRouter,
    pub void_index: FxHashMap<u32, Vec<u32>>,
    pub jobs: Vec<Job>,
    pub entities: EntityTable,
    pub properties: PropertyTable,
    pub quantities: QuantityTable,
    pub relationships: RelationshipGraph,
    pub spatial: SpatialHierarchy,
    pub strings: StringTable,
}

pub fn build_model(content: &str) -> Result<LoadedModel<'_>> {
    let entity_index = Arc::new(build_entity_index(content));
    let scanned = scan_all(content);

    let mut project_id = None;
    let mut jobs = Vec::new();
    for s in &scanned {
        if s.ifc_type == IfcType::IfcProject {
            project_id = Some(s.id);
        }
        if has_geometry_by_name(&s.ifc_type) {
            jobs.push(Job { express_id: s.id, ifc_type: s.ifc_type });
        }
    }

    let (raw_entities, (raw_properties, raw_quantities)) = rayon::join(
        || extract_entities_raw(&scanned, content, &entity_index),
        || {
            rayon::join(
                || extract_properties_raw(&scanned, content, &entity_index),
                || extract_quantities_raw(&scanned, content, &entity_index),
            )
        },
    );

    let mut strings = StringTable::new();
    let mut entities = intern_entities(raw_entities, &mut strings);
    let properties = intern_properties(raw_properties, &mut strings);
    let quantities = intern_quantities(raw_quantities, &mut strings);

    // Unrecognized IfcRel* shapes are skipped inside `extract_relationships`
    // itself (§7); filtering by name prefix here is enough to avoid handing
    // it the whole entity list.
    let relationship_ids: Vec<u32> = scanned
        .iter()
        .filter(|s| s.ifc_type.as_str().starts_with("IFCREL"))
        .map(|s| s.id)
        .collect();
    let mut rel_decoder = EntityDecoder::with_arc_index(content, entity_index.clone());
    let relationships = extract_relationships(&mut rel_decoder, relationship_ids);

    let mut spatial_decoder = EntityDecoder::with_arc_index(content, entity_index.clone());
    let spatial = build_spatial_hierarchy(&mut spatial_decoder, &relationships, &mut strings, project_id);

    apply_spatial_and_type_links(&mut entities, &spatial, &relationships);

    let mut void_decoder = EntityDecoder::with_arc_index(content, entity_index.clone());
    let void_index: FxHashMap<u32, Vec<u32>> = VoidIndex::from_content(content, &mut void_decoder)
        .iter()
        .map(|(host, voids)| (host, voids.to_vec()))
        .collect();

    let mut router_decoder = EntityDecoder::with_arc_index(content, entity_index.clone());
    let router = GeometryRouter::with_units(content, &mut router_decoder);

    let decoder = EntityDecoder::with_arc_index(content, entity_index);

    Ok(LoadedModel {
        decoder,
        router,
        void_index,
        jobs,
        entities,
        properties,
        quantities,
        relationships,
        spatial,
        strings,
    })
}

fn apply_spatial_and_type_links(
    entities: &mut EntityTable,
    spatial: &SpatialHierarchy,
    relationships: &RelationshipGraph,
) {
    for (&element_id, &storey_id) in &spatial.element_to_storey {
        if let Some(row) = entities.get_by_express_id_mut(element_id) {
            row.contained_in_storey = storey_id as i32;
        }
    }
    for row in entities.rows().to_vec() {
        let types = relationships.get_related(row.express_id, Some(RelType::DefinesByType), Direction::Forward);
        if let Some(&type_id) = types.first() {
            if let Some(row) = entities.get_by_express_id_mut(row.express_id) {
                row.defined_by_type = type_id as i32;
            }
        }
    }
}

struct RawEntity {
    express_id: u32,
    ifc_type: IfcType,
    global_id: String,
    name: String,
    description: String,
    object_type: String,
    has_geometry: bool,
}

fn extract_entities_raw(scanned: &[Scanned], content: &str, entity_index: &Arc<EntityIndex>) -> Vec<RawEntity> {
    scanned
        .par_iter()
        .filter_map(|s| {
            let mut decoder = EntityDecoder::with_arc_index(content, entity_index.clone());
            let entity = decoder.decode_at(s.start, s.end).ok()?;
            Some(RawEntity {
                express_id: s.id,
                ifc_type: s.ifc_type,
                global_id: entity.get_string(0).unwrap_or("").to_string(),
                name: entity.get_string(2).unwrap_or("").to_string(),
                description: entity.get_string(3).unwrap_or("").to_string(),
                object_type: entity.get_string(4).unwrap_or("").to_string(),
                has_geometry: has_geometry_by_name(&s.ifc_type),
            })
        })
        .collect()
}

fn intern_entities(raw: Vec<RawEntity>, strings: &mut StringTable) -> EntityTable {
    let mut builder = EntityTableBuilder::with_capacity(raw.len());
    for r in raw {
        builder.add(NewEntityRow {
            express_id: r.express_id,
            ifc_type: r.ifc_type,
            global_id: strings.intern(&r.global_id),
            name: strings.intern(&r.name),
            description: strings.intern(&r.description),
            object_type: strings.intern(&r.object_type),
            has_geometry: r.has_geometry,
        });
    }
    builder.build()
}

struct RawProperty {
    entity_id: u32,
    pset_name: String,
    pset_global_id: String,
    prop_name: String,
    value_kind: ValueKind,
    value_string: Option<String>,
    value_real: f64,
    value_int: i32,
    value_bool: u8,
}

/// `IfcPropertySingleValue` holds the only value shape generated today;
/// enumerated/tabular/bounded property values are not produced by the
/// encoders this pipeline has been exercised against.
fn extract_properties_raw(scanned: &[Scanned], content: &str, entity_index: &Arc<EntityIndex>) -> Vec<RawProperty> {
    scanned
        .iter()
        .filter(|s| s.ifc_type == IfcType::IfcRelDefinesByProperties)
        .collect::<Vec<_>>()
        .par_iter()
        .flat_map(|s| {
            let mut decoder = EntityDecoder::with_arc_index(content, entity_index.clone());
            extract_one_property_rel(&mut decoder, s.start, s.end).unwrap_or_default()
        })
        .collect()
}

fn extract_one_property_rel(decoder: &mut EntityDecoder, start: usize, end: usize) -> Option<Vec<RawProperty>> {
    let rel = decoder.decode_at(start, end).ok()?;
    // IfcRelDefinesByProperties: [4]=RelatedObjects, [5]=RelatingPropertyDefinition
    let pset_id = rel.get_ref(5)?;
    let related_ids: Vec<u32> = rel.get_list(4)?.iter().filter_map(|v| v.as_entity_ref()).collect();
    if related_ids.is_empty() {
        return None;
    }

    let pset = decoder.decode_by_id(pset_id).ok()?;
    if pset.ifc_type != IfcType::IfcPropertySet {
        return None;
    }
    let pset_name = pset.get_string(2)?.to_string();
    let pset_global_id = pset.get_string(0).unwrap_or("").to_string();
    let has_properties = pset.get_list(4)?;

    let mut rows = Vec::new();
    for prop_ref in has_properties {
        let Some(prop_id) = prop_ref.as_entity_ref() else { continue };
        let Ok(prop_entity) = decoder.decode_by_id(prop_id) else { continue };
        if prop_entity.ifc_type != IfcType::IfcPropertySingleValue {
            continue;
        }
        let Some(prop_name) = prop_entity.get_string(0) else { continue };
        let Some(nominal) = prop_entity.get(2) else { continue };
        let (value_kind, value_string, value_real, value_int, value_bool) = classify_value(nominal);
        for &entity_id in &related_ids {
            rows.push(RawProperty {
                entity_id,
                pset_name: pset_name.clone(),
                pset_global_id: pset_global_id.clone(),
                prop_name: prop_name.to_string(),
                value_kind,
                value_string: value_string.clone(),
                value_real,
                value_int,
                value_bool,
            });
        }
    }
    Some(rows)
}

fn classify_value(v: &AttributeValue) -> (ValueKind, Option<String>, f64, i32, u8) {
    if let Some(e) = v.as_enum() {
        return match e {
            "T" => (ValueKind::Bool, None, f64::NAN, 0, 1),
            "F" => (ValueKind::Bool, None, f64::NAN, 0, 0),
            other => (ValueKind::String, Some(other.to_string()), f64::NAN, 0, 255),
        };
    }
    if let Some(s) = v.as_string() {
        return (ValueKind::String, Some(s.to_string()), f64::NAN, 0, 255);
    }
    if let AttributeValue::Integer(i) = v {
        return (ValueKind::Int, None, f64::NAN, *i as i32, 255);
    }
    if let Some(f) = v.as_float() {
        return (ValueKind::Real, None, f, 0, 255);
    }
    (ValueKind::Null, None, f64::NAN, 0, 255)
}

fn intern_properties(raw: Vec<RawProperty>, strings: &mut StringTable) -> PropertyTable {
    let mut builder = PropertyTableBuilder::with_capacity(raw.len());
    for r in raw {
        builder.add(PropertyRow {
            entity_id: r.entity_id,
            pset_name: strings.intern(&r.pset_name),
            pset_global_id: strings.intern(&r.pset_global_id),
            prop_name: strings.intern(&r.prop_name),
            value_kind: r.value_kind,
            value_string: r.value_string.map(|s| strings.intern(&s)),
            value_real: r.value_real,
            value_int: r.value_int,
            unit_id: -1,
            value_bool: r.value_bool,
        });
    }
    builder.build()
}

struct RawQuantity {
    entity_id: u32,
    pset_name: String,
    quantity_name: String,
    quantity_type: QuantityType,
    value: f64,
}

fn extract_quantities_raw(scanned: &[Scanned], content: &str, entity_index: &Arc<EntityIndex>) -> Vec<RawQuantity> {
    scanned
        .iter()
        .filter(|s| s.ifc_type == IfcType::IfcRelDefinesByProperties)
        .collect::<Vec<_>>()
        .par_iter()
        .flat_map(|s| {
            let mut decoder = EntityDecoder::with_arc_index(content, entity_index.clone());
            extract_one_quantity_rel(&mut decoder, s.start, s.end).unwrap_or_default()
        })
        .collect()
}

fn extract_one_quantity_rel(decoder: &mut EntityDecoder, start: usize, end: usize) -> Option<Vec<RawQuantity>> {
    let rel = decoder.decode_at(start, end).ok()?;
    let qset_id = rel.get_ref(5)?;
    let related_ids: Vec<u32> = rel.get_list(4)?.iter().filter_map(|v| v.as_entity_ref()).collect();
    if related_ids.is_empty() {
        return None;
    }

    let qset = decoder.decode_by_id(qset_id).ok()?;
    if qset.ifc_type != IfcType::IfcElementQuantity {
        return None;
    }
    let qset_name = qset.get_string(2)?.to_string();
    let has_quantities = qset.get_list(5)?;

    let mut rows = Vec::new();
    for quant_ref in has_quantities {
        let Some(quant_id) = quant_ref.as_entity_ref() else { continue };
        let Ok(quant_entity) = decoder.decode_by_id(quant_id) else { continue };
        let Some(quantity_type) = quantity_type_of(quant_entity.ifc_type) else { continue };
        let Some(quantity_name) = quant_entity.get_string(0) else { continue };
        let Some(value) = quant_entity.get_float(3) else { continue };
        for &entity_id in &related_ids {
            rows.push(RawQuantity {
                entity_id,
                pset_name: qset_name.clone(),
                quantity_name: quantity_name.to_string(),
                quantity_type,
                value,
            });
        }
    }
    Some(rows)
}

fn quantity_type_of(ifc_type: IfcType) -> Option<QuantityType> {
    Some(match ifc_type {
        IfcType::IfcQuantityLength => QuantityType::Length,
        IfcType::IfcQuantityArea => QuantityType::Area,
        IfcType::IfcQuantityVolume => QuantityType::Volume,
        IfcType::IfcQuantityCount => QuantityType::Count,
        IfcType::IfcQuantityWeight => QuantityType::Weight,
        IfcType::IfcQuantityTime => QuantityType::Time,
        _ => return None,
    })
}

fn intern_quantities(raw: Vec<RawQuantity>, strings: &mut StringTable) -> QuantityTable {
    let mut builder = QuantityTableBuilder::with_capacity(raw.len());
    for r in raw {
        builder.add(QuantityRow {
            entity_id: r.entity_id,
            pset_name: strings.intern(&r.pset_name),
            quantity_name: strings.intern(&r.quantity_name),
            quantity_type: r.quantity_type,
            value: r.value,
            formula: None,
        });
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"DATA;
#1=IFCPROJECT('proj',$,'My Project',$,$,$,$,$,$);
#2=IFCWALL('wall1',$,'Wall 1',$,$,#10,$,$);
#10=IFCLOCALPLACEMENT($,#11);
#11=IFCAXIS2PLACEMENT3D(#12,$,$);
#12=IFCCARTESIANPOINT((1.0,2.0,3.0));
#20=IFCPROPERTYSET('pset1',$,'Pset_WallCommon',$,(#21));
#21=IFCPROPERTYSINGLEVALUE('IsExternal',$,.T.,$);
#22=IFCRELDEFINESBYPROPERTIES('rel1',$,$,$,(#2),#20);
#30=IFCELEMENTQUANTITY('qset1',$,'Qto_WallBaseQuantities',$,$,(#31));
#31=IFCQUANTITYAREA('NetSideArea',$,$,12.5);
#32=IFCRELDEFINESBYPROPERTIES('rel2',$,$,$,(#2),#30);
ENDSEC;"#;

    #[test]
    fn build_model_collects_wall_as_a_geometry_job() {
        let model = build_model(SAMPLE).unwrap();
        assert_eq!(model.jobs.len(), 1);
        assert_eq!(model.jobs[0].express_id, 2);
    }

    #[test]
    fn build_model_attaches_the_property_to_the_wall() {
        let model = build_model(SAMPLE).unwrap();
        let row = model.properties.by_entity(2).next().expect("property row");
        assert_eq!(model.strings.get(row.prop_name), "IsExternal");
        assert_eq!(row.value_bool, 1);
    }

    #[test]
    fn build_model_attaches_the_quantity_to_the_wall() {
        let model = build_model(SAMPLE).unwrap();
        let row = model.quantities.by_entity(2).next().expect("quantity row");
        assert_eq!(model.strings.get(row.quantity_name), "NetSideArea");
        assert!((row.value - 12.5).abs() < 1e-9);
    }
}
