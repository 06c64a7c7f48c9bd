// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generated IFC schema types and type-id constants.
//!
//! Generated from EXPRESS schema: IFC4X3_DEV_923b0514

mod schema;
mod type_ids;

pub use type_ids::*;

pub use schema::{
    has_geometry_by_name, Aggregation, AttributeSpec, EntitySchema, IfcType, ALL_TYPE_NAMES,
};
