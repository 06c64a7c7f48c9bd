// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append-only string interner. Lives for the whole session: the table is
//! built once during load and shared read-only by every downstream table.

use rustc_hash::FxHashMap;

/// Stable 32-bit handle into a [`StringTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StringId(pub u32);

impl StringId {
    /// `intern("")` always lands here.
    pub const EMPTY: StringId = StringId(0);
}

#[derive(Debug, Default)]
pub struct StringTable {
    values: Vec<String>,
    index: FxHashMap<String, u32>,
}

impl StringTable {
    /// Rebuild a table from an ordered dump of its interned values (cache
    /// load path). Ids are simply the position in `values`, matching the
    /// append-only order `intern` produced when the table was written.
    pub fn from_values(values: Vec<String>) -> Self {
        let mut index = FxHashMap::default();
        for (i, s) in values.iter().enumerate() {
            index.insert(s.clone(), i as u32);
        }
        Self { values, index }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl StringTable {
    pub fn new() -> Self {
        let mut table = Self {
            values: Vec::new(),
            index: FxHashMap::default(),
        };
        let empty_id = table.intern_new("");
        debug_assert_eq!(empty_id, StringId::EMPTY);
        table
    }

    /// Intern `s`, returning its existing id if already present. Zero
    /// allocation on repeat lookup (the hashmap probe borrows `s`).
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.index.get(s) {
            return StringId(id);
        }
        self.intern_new(s)
    }

    fn intern_new(&mut self, s: &str) -> StringId {
        let id = self.values.len() as u32;
        self.values.push(s.to_string());
        self.index.insert(s.to_string(), id);
        StringId(id)
    }

    pub fn get(&self, id: StringId) -> &str {
        &self.values[id.0 as usize]
    }

    pub fn try_get(&self, id: StringId) -> Option<&str> {
        self.values.get(id.0 as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        let table = StringTable::new();
        assert_eq!(table.get(StringId::EMPTY), "");
    }

    #[test]
    fn intern_round_trips() {
        let mut table = StringTable::new();
        let id = table.intern("IFCWALL");
        assert_eq!(table.get(id), "IFCWALL");
    }

    #[test]
    fn repeat_intern_returns_same_id() {
        let mut table = StringTable::new();
        let a = table.intern("hello");
        let b = table.intern("hello");
        assert_eq!(a, b);
        assert_eq!(table.len(), 2); // "" + "hello"
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("bar");
        assert_ne!(a, b);
    }
}
