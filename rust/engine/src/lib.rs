// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stable backend-neutral facade over the IFC load pipeline, cache and
//! export readers. Renderer embeddings, the CLI and any future FFI
//! bindings depend on this crate rather than reaching into
//! `ifc-lite-processing`/`ifc-lite-cache`/`ifc-lite-export` directly, so
//! those crates stay free to change shape without breaking consumers.

pub mod error;
pub mod export;
pub mod mapped;
pub mod model;
pub mod stream;

pub use error::{Error, Result};
pub use ifc_lite_cache::{CachedModel, Instance, PooledMesh};
pub use ifc_lite_processing::{CoordinateInfoSummary, GeometryQuality, LoadConfig, LoadEvent, MeshData};
pub use mapped::MappedFile;
pub use model::{load_model, LoadResult};
pub use stream::stream_model;
