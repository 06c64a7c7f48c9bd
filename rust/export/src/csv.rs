// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The one concrete sink this crate writes bytes for: plain CSV over the
//! entity table. A pure reader has no network surface to serve, so there
//! is no reason to pull in an Arrow/Parquet dependency here just to prove
//! the column contract out; quoting/escaping is hand-rolled rather than
//! pulling in a `csv` crate for a single straightforward table.

use std::io::{self, Write};

use ifc_lite_store::{EntityTable, StringTable};

use crate::column;

pub fn write_entities(table: &EntityTable, strings: &StringTable, w: &mut impl Write) -> io::Result<()> {
    let iter = column::entities(table, strings);
    writeln!(w, "{}", iter.column_names().join(","))?;
    for row in iter {
        let line = row.iter().map(|cell| escape(&cell.to_csv_field())).collect::<Vec<_>>().join(",");
        writeln!(w, "{line}")?;
    }
    Ok(())
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_lite_core::IfcType;
    use ifc_lite_store::entities::{EntityTableBuilder, NewEntityRow};
    use ifc_lite_store::StringId;

    #[test]
    fn writes_header_and_one_row_per_entity() {
        let mut strings = StringTable::new();
        let name = strings.intern("Wall, Exterior");
        let mut builder = EntityTableBuilder::default();
        builder.add(NewEntityRow {
            express_id: 3,
            ifc_type: IfcType::IfcWall,
            global_id: StringId::EMPTY,
            name,
            description: StringId::EMPTY,
            object_type: StringId::EMPTY,
            has_geometry: true,
        });
        let table = builder.build();

        let mut out = Vec::new();
        write_entities(&table, &strings, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "express_id,type_name,global_id,name,has_geometry");
        assert!(lines.next().unwrap().contains("\"Wall, Exterior\""));
    }
}
