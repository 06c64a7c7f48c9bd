// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared IFC load pipeline: parses and tables a STEP file once, then
//! streams batches of triangulated geometry out through [`stream::BatchEmitter`]
//! for any consumer (server, CLI, FFI) to forward.

pub mod config;
pub mod error;
pub mod events;
pub mod lod;
pub mod pipeline;
pub mod priority;
pub mod stream;

pub use config::{GeometryQuality, LoadConfig};
pub use error::{Error, Result};
pub use events::{CoordinateInfoSummary, LoadEvent, MeshData};
pub use pipeline::{build_model, LoadedModel};
pub use stream::{order_jobs, BatchEmitter, Job};
