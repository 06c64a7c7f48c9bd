// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric `typeEnum` constants for entity types the store and geometry
//! crates dispatch on by value rather than by matching `IfcType` directly
//! (hot loops over the columnar entity table, where branching on a `u16`
//! is cheaper than re-deriving it from the enum each time).
//!
//! These mirror [`super::schema::IfcType::type_id`] exactly; the unit test
//! below is what keeps them from drifting if the type table is reordered.

use super::schema::IfcType;

pub const TYPE_ID_IFCPROJECT: u16 = IfcType::IfcProject.type_id();
pub const TYPE_ID_IFCSITE: u16 = IfcType::IfcSite.type_id();
pub const TYPE_ID_IFCBUILDING: u16 = IfcType::IfcBuilding.type_id();
pub const TYPE_ID_IFCBUILDINGSTOREY: u16 = IfcType::IfcBuildingStorey.type_id();
pub const TYPE_ID_IFCSPACE: u16 = IfcType::IfcSpace.type_id();
pub const TYPE_ID_IFCWALL: u16 = IfcType::IfcWall.type_id();
pub const TYPE_ID_IFCSLAB: u16 = IfcType::IfcSlab.type_id();
pub const TYPE_ID_IFCDOOR: u16 = IfcType::IfcDoor.type_id();
pub const TYPE_ID_IFCWINDOW: u16 = IfcType::IfcWindow.type_id();
pub const TYPE_ID_IFCOPENINGELEMENT: u16 = IfcType::IfcOpeningElement.type_id();
pub const TYPE_ID_IFCMAPPEDITEM: u16 = IfcType::IfcMappedItem.type_id();
pub const TYPE_ID_IFCEXTRUDEDAREASOLID: u16 = IfcType::IfcExtrudedAreaSolid.type_id();
pub const TYPE_ID_IFCTRIANGULATEDFACESET: u16 = IfcType::IfcTriangulatedFaceSet.type_id();
pub const TYPE_ID_IFCBOOLEANRESULT: u16 = IfcType::IfcBooleanResult.type_id();

/// Total number of distinct concrete types in the generated table, i.e.
/// the exclusive upper bound for dense `typeEnum` values (`Unknown`
/// entities use [`u16::MAX`] and sit outside this range).
pub const TYPE_COUNT: usize = super::schema::ALL_TYPE_NAMES.len();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_computed_ids() {
        assert_eq!(TYPE_ID_IFCWALL, IfcType::IfcWall.type_id());
        assert_eq!(TYPE_ID_IFCPROJECT, IfcType::IfcProject.type_id());
        assert!((TYPE_ID_IFCWALL as usize) < TYPE_COUNT);
    }
}
