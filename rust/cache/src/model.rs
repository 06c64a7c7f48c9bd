// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The in-memory shape a cache entry round-trips: every table the store
//! crate builds during a STEP parse, plus the geometry batch emitter's
//! deduplicated mesh pool and placed instances.

use ifc_lite_store::{EntityTable, PropertyTable, QuantityTable, RelationshipGraph, SpatialHierarchy, StringTable};

use crate::mesh_pool::{Instance, PooledMesh};

pub struct CachedModel {
    pub entities: EntityTable,
    pub properties: PropertyTable,
    pub quantities: QuantityTable,
    pub relationships: RelationshipGraph,
    pub strings: StringTable,
    pub spatial: SpatialHierarchy,
    pub meshes: Vec<PooledMesh>,
    pub instances: Vec<Instance>,
}
