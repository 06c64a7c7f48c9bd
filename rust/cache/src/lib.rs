// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Content-addressed binary cache (C12) for a parsed IFC model: the store's
//! columnar tables, spatial hierarchy and the geometry batch emitter's
//! mesh pool, serialized behind a small hand-framed header so a cache hit
//! never requires re-parsing or re-triangulating a model.
//!
//! A cache entry is keyed by the blake3 hash of the source STEP bytes, not
//! by file path or mtime: identical input always round-trips to the same
//! entry, and any byte difference (including a re-export from a different
//! authoring tool) is a clean miss.

pub mod error;
pub mod format;
pub mod mesh_pool;
pub mod model;
pub mod reader;
pub mod writer;

pub use error::{Error, Result};
pub use format::SectionTag;
pub use mesh_pool::{Instance, MeshPoolBuilder, PooledMesh};
pub use model::CachedModel;
pub use reader::{read_cache, CacheHit};
pub use writer::write_cache;
