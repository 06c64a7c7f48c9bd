// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Columnar quantity table (C5). Analogous to [`crate::properties`], one
//! `f64` value per row plus an optional formula string.

use crate::strings::StringId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuantityType {
    Length,
    Area,
    Volume,
    Count,
    Weight,
    Time,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityRow {
    pub entity_id: u32,
    pub pset_name: StringId,
    pub quantity_name: StringId,
    pub quantity_type: QuantityType,
    pub value: f64,
    pub formula: Option<StringId>,
}

#[derive(Default)]
pub struct QuantityTableBuilder {
    rows: Vec<QuantityRow>,
}

impl QuantityTableBuilder {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            rows: Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, row: QuantityRow) {
        self.rows.push(row);
    }

    pub fn build(self) -> QuantityTable {
        let mut entity_index: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        for (i, row) in self.rows.iter().enumerate() {
            entity_index.entry(row.entity_id).or_default().push(i as u32);
        }
        QuantityTable {
            rows: self.rows,
            entity_index,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityTable {
    rows: Vec<QuantityRow>,
    entity_index: FxHashMap<u32, Vec<u32>>,
}

impl QuantityTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[QuantityRow] {
        &self.rows
    }

    pub fn by_entity(&self, entity_id: u32) -> impl Iterator<Item = &QuantityRow> {
        self.entity_index
            .get(&entity_id)
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
    fn by_entity_groups_quantities() {
        let mut strings = StringTable::new();
        let pset = strings.intern("Qto_WallBaseQuantities");
        let name = strings.intern("NetVolume");

        let mut builder = QuantityTableBuilder::default();
        builder.add(QuantityRow {
            entity_id: 7,
            pset_name: pset,
            quantity_name: name,
            quantity_type: QuantityType::Volume,
            value: 1.23,
            formula: None,
        });
        let table = builder.build();

        let found: Vec<_> = table.by_entity(7).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, 1.23);
        assert_eq!(table.by_entity(8).count(), 0);
    }
}
