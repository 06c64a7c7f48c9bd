// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Columnar table readers (C15). Mirrors the column selection the
//! teacher's Parquet serializer used for entities/properties/quantities,
//! but stops at a plain row iterator: no Arrow array, no encoder. A
//! concrete sink (see [`crate::csv`]) or an external encoder consumes
//! the rows from here.

use ifc_lite_store::{EntityTable, PropertyTable, QuantityTable, StringId, StringTable};

/// One cell's worth of a row. `Null` only ever appears for optional
/// string columns (e.g. a property with no string value).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    U32(u32),
    I32(i32),
    F64(f64),
    Bool(bool),
    Str(String),
    Null,
}

impl ColumnValue {
    pub fn to_csv_field(&self) -> String {
        match self {
            ColumnValue::U32(v) => v.to_string(),
            ColumnValue::I32(v) => v.to_string(),
            ColumnValue::F64(v) => v.to_string(),
            ColumnValue::Bool(v) => v.to_string(),
            ColumnValue::Str(v) => v.clone(),
            ColumnValue::Null => String::new(),
        }
    }
}

/// A named-column row iterator over one store table. `column_names()` is
/// fixed for the lifetime of the iterator; every yielded row has exactly
/// that many cells, in that order.
pub struct ColumnIter<'a> {
    names: &'static [&'static str],
    rows: Box<dyn Iterator<Item = Vec<ColumnValue>> + 'a>,
}

impl<'a> ColumnIter<'a> {
    pub fn column_names(&self) -> &'static [&'static str] {
        self.names
    }
}

impl<'a> Iterator for ColumnIter<'a> {
    type Item = Vec<ColumnValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

const ENTITY_COLUMNS: &[&str] = &["express_id", "type_name", "global_id", "name", "has_geometry"];

/// One row per entity (C5), same column set as the teacher's entities table.
pub fn entities<'a>(table: &'a EntityTable, strings: &'a StringTable) -> ColumnIter<'a> {
    let rows = table.rows().iter().map(move |row| {
        vec![
            ColumnValue::U32(row.express_id),
            ColumnValue::Str(ifc_type_name(row.type_enum)),
            ColumnValue::Str(strings.get(row.global_id).to_string()),
            ColumnValue::Str(strings.get(row.name).to_string()),
            ColumnValue::Bool(row.has_flag(ifc_lite_store::entities::HAS_GEOMETRY)),
        ]
    });
    ColumnIter {
        names: ENTITY_COLUMNS,
        rows: Box::new(rows),
    }
}

/// `typeEnum` only carries the registry's numeric id; round-tripping it
/// back to a name isn't exposed by `ifc-lite-core` today, so the export
/// surface reports the numeric id as a decimal string rather than
/// guessing a name-to-id table of its own.
fn ifc_type_name(type_enum: u16) -> String {
    type_enum.to_string()
}

const PROPERTY_COLUMNS: &[&str] = &["entity_id", "pset_name", "property_name", "property_value", "property_kind"];

/// One row per property (C5), matching the teacher's
/// `(pset_id, pset_name, property_name, property_value, property_type)` shape
/// minus the separate pset id column, which this store keys by interned
/// name rather than express id.
pub fn properties<'a>(table: &'a PropertyTable, strings: &'a StringTable) -> ColumnIter<'a> {
    let rows = table.rows().iter().map(move |row| {
        vec![
            ColumnValue::U32(row.entity_id),
            ColumnValue::Str(strings.get(row.pset_name).to_string()),
            ColumnValue::Str(strings.get(row.prop_name).to_string()),
            property_value_cell(row, strings),
            ColumnValue::Str(format!("{:?}", row.value_kind)),
        ]
    });
    ColumnIter {
        names: PROPERTY_COLUMNS,
        rows: Box::new(rows),
    }
}

fn property_value_cell(row: &ifc_lite_store::PropertyRow, strings: &StringTable) -> ColumnValue {
    use ifc_lite_store::ValueKind;
    match row.value_kind {
        ValueKind::String => row
            .value_string
            .map(|id| ColumnValue::Str(strings.get(id).to_string()))
            .unwrap_or(ColumnValue::Null),
        ValueKind::Real => ColumnValue::F64(row.value_real),
        ValueKind::Int => ColumnValue::I32(row.value_int),
        ValueKind::Bool => ColumnValue::Bool(row.value_bool == 1),
        ValueKind::Null => ColumnValue::Null,
    }
}

const QUANTITY_COLUMNS: &[&str] = &["entity_id", "qset_name", "quantity_name", "quantity_value", "quantity_type"];

/// One row per quantity (C5), matching the teacher's quantities table shape.
pub fn quantities<'a>(table: &'a QuantityTable, strings: &'a StringTable) -> ColumnIter<'a> {
    let rows = table.rows().iter().map(move |row| {
        vec![
            ColumnValue::U32(row.entity_id),
            ColumnValue::Str(strings.get(row.pset_name).to_string()),
            ColumnValue::Str(strings.get(row.quantity_name).to_string()),
            ColumnValue::F64(row.value),
            ColumnValue::Str(format!("{:?}", row.quantity_type)),
        ]
    });
    ColumnIter {
        names: QUANTITY_COLUMNS,
        rows: Box::new(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_lite_core::IfcType;
    use ifc_lite_store::entities::{EntityTableBuilder, NewEntityRow};

    #[test]
    fn entity_columns_report_fixed_names_and_one_row_per_entity() {
        let mut strings = StringTable::new();
        let guid = strings.intern("g1");
        let mut builder = EntityTableBuilder::default();
        builder.add(NewEntityRow {
            express_id: 7,
            ifc_type: IfcType::IfcWall,
            global_id: guid,
            name: StringId::EMPTY,
            description: StringId::EMPTY,
            object_type: StringId::EMPTY,
            has_geometry: true,
        });
        let table = builder.build();

        let iter = entities(&table, &strings);
        assert_eq!(iter.column_names(), ENTITY_COLUMNS);
        let rows: Vec<_> = iter.collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], ColumnValue::U32(7));
        assert_eq!(rows[0][2], ColumnValue::Str("g1".to_string()));
        assert_eq!(rows[0][4], ColumnValue::Bool(true));
    }
}
