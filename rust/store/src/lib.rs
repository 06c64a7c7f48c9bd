// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Columnar entity store, relationship graph, spatial hierarchy and query
//! surface for parsed IFC models.
//!
//! This crate sits directly above `ifc-lite-core`: it consumes decoded
//! entities and turns them into structure-of-arrays tables (component C5),
//! a bidirectional CSR relationship graph (C6), a resolved world-transform
//! cache (C7), the project/site/building/storey/space tree (C8) and a
//! read-side query surface over all of the above (C13). It does not depend
//! on `ifc-lite-geometry`; the placement resolver here is self-contained.

pub mod entities;
pub mod error;
pub mod graph;
pub mod ids;
pub mod placement;
pub mod properties;
pub mod quantities;
pub mod query;
pub mod spatial;
pub mod strings;

pub use entities::{EntityRow, EntityTable, EntityTableBuilder, NewEntityRow};
pub use error::{Error, Result};
pub use graph::{extract_relationships, Direction, Edge, RelType, RelationshipGraph, RelationshipGraphBuilder};
pub use ids::{IdAllocator, ModelId};
pub use placement::PlacementResolver;
pub use properties::{PropertyRow, PropertyTable, PropertyTableBuilder, ValueKind};
pub use quantities::{QuantityRow, QuantityTable, QuantityTableBuilder, QuantityType};
pub use spatial::{build_spatial_hierarchy, SpatialHierarchy, SpatialNode};
pub use strings::{StringId, StringTable};

/// Length unit scale resolution, re-exported from `ifc-lite-core` so
/// callers composing placements don't need a direct dependency on it.
pub use ifc_lite_core::{extract_length_unit_scale, get_si_prefix_multiplier};
