// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Atomic cache write: assembled in a temp file next to the destination,
//! then renamed into place so a reader never observes a half-written file.

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::format::{self, SectionTag, MAGIC, VERSION};
use crate::model::CachedModel;

pub fn write_cache(path: &Path, source_bytes: &[u8], model: &CachedModel) -> Result<()> {
    let hash = *blake3::hash(source_bytes).as_bytes();

    let tmp_path = path.with_extension("tmp");
    {
        let file = std::fs::File::create(&tmp_path)?;
        let mut w = BufWriter::new(file);

        w.write_all(MAGIC)?;
        w.write_all(&VERSION.to_le_bytes())?;
        w.write_all(&hash)?;

        write_section(&mut w, SectionTag::Entities, &model.entities)?;
        write_section(&mut w, SectionTag::Properties, &model.properties)?;
        write_section(&mut w, SectionTag::Quantities, &model.quantities)?;
        write_section(&mut w, SectionTag::Relationships, &model.relationships)?;
        write_section(&mut w, SectionTag::Strings, &model.strings.values().to_vec())?;
        write_section(&mut w, SectionTag::Spatial, &model.spatial)?;
        write_section(&mut w, SectionTag::Meshes, &model.meshes)?;
        write_section(&mut w, SectionTag::Instances, &model.instances)?;

        w.flush()?;
    }

    std::fs::rename(&tmp_path, path)?;
    tracing::debug!(path = %path.display(), "wrote cache entry");
    Ok(())
}

fn write_section(
    w: &mut impl Write,
    tag: SectionTag,
    value: &impl serde::Serialize,
) -> Result<()> {
    let payload = bincode::serialize(value).map_err(|source| crate::error::Error::Encode { section: tag, source })?;
    format::write_section(w, tag, &payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_lite_store::{EntityTableBuilder, PropertyTableBuilder, QuantityTableBuilder, RelationshipGraphBuilder, SpatialHierarchy, StringTable};

    fn empty_model() -> CachedModel {
        CachedModel {
            entities: EntityTableBuilder::default().build(),
            properties: PropertyTableBuilder::default().build(),
            quantities: QuantityTableBuilder::default().build(),
            relationships: RelationshipGraphBuilder::default().build(),
            strings: StringTable::new(),
            spatial: SpatialHierarchy::default(),
            meshes: Vec::new(),
            instances: Vec::new(),
        }
    }

    #[test]
    fn writes_without_error_and_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ifccache");
        write_cache(&path, b"dummy step content", &empty_model()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
