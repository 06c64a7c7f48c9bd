// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export adapters (C15): pure readers over a loaded model's columnar
//! tables, relationship graph and mesh buffers. These produce the input
//! contract a glTF/Parquet/CSV encoder would consume, not encoded bytes
//! themselves, with one exception: [`csv::write_entities`] is simple
//! enough to write directly without an external crate.

pub mod column;
pub mod csv;
pub mod edge;
pub mod error;
pub mod gltf;
pub mod mesh;
pub mod parquet;

pub use column::{ColumnIter, ColumnValue};
pub use edge::{EdgeIter, EdgeRecord};
pub use error::{Error, Result};
pub use mesh::{MeshEntry, MeshIter};
