// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Columnar property table (C5). Exactly one value field is live per row,
//! selected by `value_kind`.

use crate::strings::StringId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    Null,
    String,
    Real,
    Int,
    Bool,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyRow {
    pub entity_id: u32,
    pub pset_name: StringId,
    pub pset_global_id: StringId,
    pub prop_name: StringId,
    pub value_kind: ValueKind,
    /// Live iff `value_kind == String`; `None` otherwise.
    pub value_string: Option<StringId>,
    /// Live iff `value_kind == Real`; `NaN` otherwise.
    pub value_real: f64,
    /// Live iff `value_kind == Int`.
    pub value_int: i32,
    /// `0 = false, 1 = true, 255 = null`; live iff `value_kind == Bool`.
    pub value_bool: u8,
    /// -1 when no unit is attached.
    pub unit_id: i32,
}

#[derive(Default)]
pub struct PropertyTableBuilder {
    rows: Vec<PropertyRow>,
}

impl PropertyTableBuilder {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            rows: Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, row: PropertyRow) {
        self.rows.push(row);
    }

    pub fn build(self) -> PropertyTable {
        let mut entity_index: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        let mut pset_index: FxHashMap<StringId, Vec<u32>> = FxHashMap::default();
        let mut prop_index: FxHashMap<StringId, Vec<u32>> = FxHashMap::default();

        for (i, row) in self.rows.iter().enumerate() {
            let i = i as u32;
            entity_index.entry(row.entity_id).or_default().push(i);
            pset_index.entry(row.pset_name).or_default().push(i);
            prop_index.entry(row.prop_name).or_default().push(i);
        }

        PropertyTable {
            rows: self.rows,
            entity_index,
            pset_index,
            prop_index,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyTable {
    rows: Vec<PropertyRow>,
    entity_index: FxHashMap<u32, Vec<u32>>,
    pset_index: FxHashMap<StringId, Vec<u32>>,
    prop_index: FxHashMap<StringId, Vec<u32>>,
}

impl PropertyTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[PropertyRow] {
        &self.rows
    }

    pub fn by_entity(&self, entity_id: u32) -> impl Iterator<Item = &PropertyRow> {
        self.entity_index
            .get(&entity_id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rows[i as usize])
    }

    pub fn by_pset(&self, pset_name: StringId) -> impl Iterator<Item = &PropertyRow> {
        self.pset_index
            .get(&pset_name)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rows[i as usize])
    }

    pub fn by_prop_name(&self, prop_name: StringId) -> impl Iterator<Item = &PropertyRow> {
        self.prop_index
            .get(&prop_name)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rows[i as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strings::StringTable;

    #[test]
    fn indices_group_rows_by_key() {
        let mut strings = StringTable::new();
        let pset = strings.intern("Pset_WallCommon");
        let prop_a = strings.intern("IsExternal");
        let prop_b = strings.intern("FireRating");

        let mut builder = PropertyTableBuilder::default();
        builder.add(PropertyRow {
            entity_id: 1,
            pset_name: pset,
            pset_global_id: StringId::EMPTY,
            prop_name: prop_a,
            value_kind: ValueKind::Bool,
            value_string: None,
            value_real: f64::NAN,
            value_int: 0,
            value_bool: 1,
            unit_id: -1,
        });
        builder.add(PropertyRow {
            entity_id: 1,
            pset_name: pset,
            pset_global_id: StringId::EMPTY,
            prop_name: prop_b,
            value_kind: ValueKind::String,
            value_string: Some(strings.intern("REI60")),
            value_real: f64::NAN,
            value_int: 0,
            value_bool: 255,
            unit_id: -1,
        });
        let table = builder.build();

        assert_eq!(table.by_entity(1).count(), 2);
        assert_eq!(table.by_pset(pset).count(), 2);
        assert_eq!(table.by_prop_name(prop_a).count(), 1);
        assert_eq!(table.by_entity(999).count(), 0);
    }
}
