// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parquet input contract (C15). Row-major views over [`crate::column::ColumnIter`],
//! one struct per table, ready for a RecordBatch builder the way the
//! teacher's Arrow-backed serializer built one column array per field.
//! Building the actual `RecordBatch`/writing Parquet bytes is out of
//! scope here: no Arrow/Parquet dependency is added by this crate.

use ifc_lite_store::{EntityTable, PropertyTable, QuantityTable, StringTable};

use crate::column::{self, ColumnValue};

pub struct EntityRecord {
    pub express_id: u32,
    pub type_name: String,
    pub global_id: String,
    pub name: String,
    pub has_geometry: bool,
}

pub fn entity_records(table: &EntityTable, strings: &StringTable) -> Vec<EntityRecord> {
    column::entities(table, strings).map(entity_record_from_row).collect()
}

fn entity_record_from_row(row: Vec<ColumnValue>) -> EntityRecord {
    EntityRecord {
        express_id: expect_u32(&row[0]),
        type_name: expect_str(&row[1]),
        global_id: expect_str(&row[2]),
        name: expect_str(&row[3]),
        has_geometry: matches!(row[4], ColumnValue::Bool(true)),
    }
}

pub struct PropertyRecord {
    pub entity_id: u32,
    pub pset_name: String,
    pub property_name: String,
    pub property_value: String,
    pub property_kind: String,
}

pub fn property_records(table: &PropertyTable, strings: &StringTable) -> Vec<PropertyRecord> {
    column::properties(table, strings)
        .map(|row| PropertyRecord {
            entity_id: expect_u32(&row[0]),
            pset_name: expect_str(&row[1]),
            property_name: expect_str(&row[2]),
            property_value: row[3].to_csv_field(),
            property_kind: expect_str(&row[4]),
        })
        .collect()
}

pub struct QuantityRecord {
    pub entity_id: u32,
    pub qset_name: String,
    pub quantity_name: String,
    pub quantity_value: f64,
    pub quantity_type: String,
}

pub fn quantity_records(table: &QuantityTable, strings: &StringTable) -> Vec<QuantityRecord> {
    column::quantities(table, strings)
        .map(|row| QuantityRecord {
            entity_id: expect_u32(&row[0]),
            qset_name: expect_str(&row[1]),
            quantity_name: expect_str(&row[2]),
            quantity_value: expect_f64(&row[3]),
            quantity_type: expect_str(&row[4]),
        })
        .collect()
}

fn expect_u32(v: &ColumnValue) -> u32 {
    match v {
        ColumnValue::U32(n) => *n,
        _ => 0,
    }
}

fn expect_str(v: &ColumnValue) -> String {
    match v {
        ColumnValue::Str(s) => s.clone(),
        _ => String::new(),
    }
}

fn expect_f64(v: &ColumnValue) -> f64 {
    match v {
        ColumnValue::F64(n) => *n,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_lite_core::IfcType;
    use ifc_lite_store::entities::{EntityTableBuilder, NewEntityRow};
    use ifc_lite_store::StringId;

    #[test]
    fn entity_records_mirror_the_column_iterator() {
        let mut strings = StringTable::new();
        let mut builder = EntityTableBuilder::default();
        builder.add(NewEntityRow {
            express_id: 4,
            ifc_type: IfcType::IfcDoor,
            global_id: StringId::EMPTY,
            name: StringId::EMPTY,
            description: StringId::EMPTY,
            object_type: StringId::EMPTY,
            has_geometry: false,
        });
        let table = builder.build();

        let records = entity_records(&table, &strings);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].express_id, 4);
        assert!(!records[0].has_geometry);
    }
}
