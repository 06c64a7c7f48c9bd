// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cache read path. A magic/version/hash mismatch is a cache miss, not an
//! error: the caller just re-parses the source and writes a fresh entry.
//! Only I/O failures and malformed section framing are reported as errors.

use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::path::Path;

use ifc_lite_store::{
    EntityTable, PropertyTable, QuantityTable, RelationshipGraph, SpatialHierarchy, StringTable,
};

use crate::error::{Error, Result};
use crate::format::{self, SectionTag, HASH_LEN, MAGIC, VERSION};
use crate::mesh_pool::{Instance, PooledMesh};
use crate::model::CachedModel;

pub enum CacheHit {
    Miss,
    Hit(CachedModel),
}

pub fn read_cache(path: &Path, source_bytes: &[u8]) -> Result<CacheHit> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CacheHit::Miss),
        Err(e) => return Err(e.into()),
    };
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 8];
    if r.read(&mut magic).unwrap_or(0) < 8 {
        tracing::debug!("cache file shorter than header, treating as miss");
        return Ok(CacheHit::Miss);
    }
    if &magic != MAGIC {
        tracing::debug!("cache magic mismatch, treating as miss");
        return Ok(CacheHit::Miss);
    }

    let mut version_buf = [0u8; 4];
    r.read_exact(&mut version_buf)?;
    if u32::from_le_bytes(version_buf) != VERSION {
        tracing::debug!("cache version mismatch, treating as miss");
        return Ok(CacheHit::Miss);
    }

    let mut stored_hash = [0u8; HASH_LEN];
    r.read_exact(&mut stored_hash)?;
    let actual_hash = *blake3::hash(source_bytes).as_bytes();
    if stored_hash != actual_hash {
        tracing::debug!("cache content hash mismatch, treating as miss");
        return Ok(CacheHit::Miss);
    }

    let mut sections: HashMap<u32, Vec<u8>> = HashMap::new();
    while let Some((tag, payload)) = format::read_section(&mut r)? {
        if SectionTag::from_u32(tag).is_none() {
            return Err(Error::UnknownSectionTag(tag));
        }
        sections.insert(tag, payload);
    }

    let model = decode_model(sections)?;
    Ok(CacheHit::Hit(model))
}

fn decode_model(mut sections: HashMap<u32, Vec<u8>>) -> Result<CachedModel> {
    let entities: EntityTable = decode_section(&mut sections, SectionTag::Entities)?;
    let properties: PropertyTable = decode_section(&mut sections, SectionTag::Properties)?;
    let quantities: QuantityTable = decode_section(&mut sections, SectionTag::Quantities)?;
    let relationships: RelationshipGraph = decode_section(&mut sections, SectionTag::Relationships)?;
    let string_values: Vec<String> = decode_section(&mut sections, SectionTag::Strings)?;
    let spatial: SpatialHierarchy = decode_section(&mut sections, SectionTag::Spatial)?;
    let meshes: Vec<PooledMesh> = decode_section(&mut sections, SectionTag::Meshes)?;
    let instances: Vec<Instance> = decode_section(&mut sections, SectionTag::Instances)?;

    Ok(CachedModel {
        entities,
        properties,
        quantities,
        relationships,
        strings: StringTable::from_values(string_values),
        spatial,
        meshes,
        instances,
    })
}

fn decode_section<T: serde::de::DeserializeOwned>(
    sections: &mut HashMap<u32, Vec<u8>>,
    tag: SectionTag,
) -> Result<T> {
    let payload = sections
        .remove(&(tag as u32))
        .ok_or(Error::MissingSection(tag))?;
    bincode::deserialize(&payload).map_err(|source| Error::Decode { section: tag, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_cache;
    use ifc_lite_store::{
        EntityTableBuilder, PropertyTableBuilder, QuantityTableBuilder, RelationshipGraphBuilder,
    };

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
    fn round_trips_an_empty_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ifccache");
        let source = b"ISO-10303-21;".as_slice();

        write_cache(&path, source, &empty_model()).unwrap();
        match read_cache(&path, source).unwrap() {
            CacheHit::Hit(model) => {
                assert_eq!(model.entities.len(), 0);
                assert_eq!(model.strings.len(), 1); // StringId::EMPTY
            }
            CacheHit::Miss => panic!("expected a hit"),
        }
    }

    #[test]
    fn changed_source_bytes_invalidate_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ifccache");

        write_cache(&path, b"version one", &empty_model()).unwrap();
        match read_cache(&path, b"version two").unwrap() {
            CacheHit::Miss => {}
            CacheHit::Hit(_) => panic!("hash mismatch should miss"),
        }
    }

    #[test]
    fn missing_file_is_a_miss_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.ifccache");
        match read_cache(&path, b"anything").unwrap() {
            CacheHit::Miss => {}
            CacheHit::Hit(_) => panic!("no file should never hit"),
        }
    }

    #[test]
    fn corrupted_header_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ifccache");
        std::fs::write(&path, b"not a cache file").unwrap();
        match read_cache(&path, b"anything").unwrap() {
            CacheHit::Miss => {}
            CacheHit::Hit(_) => panic!("garbage header should never hit"),
        }
    }
}
