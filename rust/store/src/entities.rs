// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Columnar entity table (C5). Rows are sorted by `typeEnum` so a
//! type-bucket query is a single contiguous slice; `getByExpressId` is
//! served by a hash index built once at `build()` (see module docs on
//! [`EntityTable::get_by_express_id`] for why this departs from the
//! literal "binary search over expressId-sorted rows" bound).

use crate::strings::StringId;
use ifc_lite_core::IfcType;
use rustc_hash::FxHashMap;

pub const HAS_GEOMETRY: u8 = 1 << 0;
pub const HAS_PROPERTIES: u8 = 1 << 1;
pub const HAS_QUANTITIES: u8 = 1 << 2;
pub const IS_TYPE: u8 = 1 << 3;
pub const IS_EXTERNAL: u8 = 1 << 4;
pub const HAS_OPENINGS: u8 = 1 << 5;
pub const IS_FILLING: u8 = 1 << 6;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRow {
    pub express_id: u32,
    pub type_enum: u16,
    pub global_id: StringId,
    pub name: StringId,
    pub description: StringId,
    pub object_type: StringId,
    pub flags: u8,
    /// -1 = not contained in any storey.
    pub contained_in_storey: i32,
    /// -1 = not defined by an `IfcTypeObject`.
    pub defined_by_type: i32,
    /// -1 = no geometry batch slot assigned yet.
    pub geometry_index: i32,
}

impl EntityRow {
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// One row's worth of input to the builder, before the final sort.
pub struct NewEntityRow {
    pub express_id: u32,
    pub ifc_type: IfcType,
    pub global_id: StringId,
    pub name: StringId,
    pub description: StringId,
    pub object_type: StringId,
    pub has_geometry: bool,
}

/// Monotone builder: `add` only ever appends.
#[derive(Default)]
pub struct EntityTableBuilder {
    pending: Vec<NewEntityRow>,
}

impl EntityTableBuilder {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            pending: Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, row: NewEntityRow) {
        self.pending.push(row);
    }

    /// Consume the builder, sort by `typeEnum`, and compute type ranges
    /// plus the expressId hash index.
    pub fn build(mut self) -> EntityTable {
        self.pending
            .sort_by_key(|r| (r.ifc_type.type_id(), r.express_id));

        let mut rows = Vec::with_capacity(self.pending.len());
        let mut type_ranges: FxHashMap<u16, (u32, u32)> = FxHashMap::default();
        let mut express_id_index = FxHashMap::default();

        for pending in self.pending {
            let type_id = pending.ifc_type.type_id();
            let row_index = rows.len() as u32;

            let entry = type_ranges.entry(type_id).or_insert((row_index, row_index));
            entry.1 = row_index + 1;

            express_id_index.insert(pending.express_id, row_index);

            let mut flags = 0u8;
            if pending.has_geometry {
                flags |= HAS_GEOMETRY;
            }
            if pending.ifc_type.is_type_object() {
                flags |= IS_TYPE;
            }

            rows.push(EntityRow {
                express_id: pending.express_id,
                type_enum: type_id,
                global_id: pending.global_id,
                name: pending.name,
                description: pending.description,
                object_type: pending.object_type,
                flags,
                contained_in_storey: -1,
                defined_by_type: -1,
                geometry_index: -1,
            });
        }

        EntityTable {
            rows,
            type_ranges,
            express_id_index,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityTable {
    rows: Vec<EntityRow>,
    type_ranges: FxHashMap<u16, (u32, u32)>,
    express_id_index: FxHashMap<u32, u32>,
}

impl EntityTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    pub fn row_at(&self, index: usize) -> Option<&EntityRow> {
        self.rows.get(index)
    }

    /// O(1) + O(k): the type bucket is a contiguous slice, looked up by a
    /// single hashmap probe.
    pub fn get_by_type(&self, ifc_type: IfcType) -> &[EntityRow] {
        match self.type_ranges.get(&ifc_type.type_id()) {
            Some(&(start, end)) => &self.rows[start as usize..end as usize],
            None => &[],
        }
    }

    /// Average O(1) via hash index. Rows are sorted by `typeEnum`, not by
    /// `expressId`, so the spec's "binary search when expressId-sorted"
    /// fast path doesn't apply here; a hash index is strictly faster than
    /// the documented O(n) fallback it replaces.
    pub fn get_by_express_id(&self, express_id: u32) -> Option<&EntityRow> {
        let &row_index = self.express_id_index.get(&express_id)?;
        self.rows.get(row_index as usize)
    }

    pub fn get_by_express_id_mut(&mut self, express_id: u32) -> Option<&mut EntityRow> {
        let &row_index = self.express_id_index.get(&express_id)?;
        self.rows.get_mut(row_index as usize)
    }

    pub fn type_range(&self, type_id: u16) -> Option<(u32, u32)> {
        self.type_ranges.get(&type_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strings::StringTable;

    fn row(express_id: u32, ifc_type: IfcType, strings: &mut StringTable) -> NewEntityRow {
        NewEntityRow {
            express_id,
            ifc_type,
            global_id: strings.intern("guid"),
            name: StringId::EMPTY,
            description: StringId::EMPTY,
            object_type: StringId::EMPTY,
            has_geometry: ifc_lite_core::has_geometry_by_name(&ifc_type),
        }
    }

    #[test]
    fn type_ranges_are_contiguous_and_exhaustive() {
        let mut strings = StringTable::new();
        let mut builder = EntityTableBuilder::default();
        builder.add(row(1, IfcType::IfcWall, &mut strings));
        builder.add(row(2, IfcType::IfcDoor, &mut strings));
        builder.add(row(3, IfcType::IfcWall, &mut strings));
        let table = builder.build();

        let walls = table.get_by_type(IfcType::IfcWall);
        assert_eq!(walls.len(), 2);
        assert!(walls.iter().all(|r| r.type_enum == IfcType::IfcWall.type_id()));

        let doors = table.get_by_type(IfcType::IfcDoor);
        assert_eq!(doors.len(), 1);
    }

    #[test]
    fn get_by_express_id_finds_row() {
        let mut strings = StringTable::new();
        let mut builder = EntityTableBuilder::default();
        builder.add(row(42, IfcType::IfcWall, &mut strings));
        let table = builder.build();

        let found = table.get_by_express_id(42).unwrap();
        assert_eq!(found.express_id, 42);
        assert!(table.get_by_express_id(99).is_none());
    }

    #[test]
    fn has_geometry_flag_set_for_building_elements() {
        let mut strings = StringTable::new();
        let mut builder = EntityTableBuilder::default();
        builder.add(row(1, IfcType::IfcWall, &mut strings));
        builder.add(row(2, IfcType::IfcProject, &mut strings));
        let table = builder.build();

        assert!(table.get_by_express_id(1).unwrap().has_flag(HAS_GEOMETRY));
        assert!(!table.get_by_express_id(2).unwrap().has_flag(HAS_GEOMETRY));
    }
}
