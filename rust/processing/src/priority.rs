// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static priority table (§4.10): simple geometry is emitted first so a
//! viewer gets a useful first frame before the expensive items (boolean
//! clipping, mapped-family instancing) finish.

use ifc_lite_core::IfcType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PriorityClass {
    /// Walls, slabs, beams, columns: single extrusion, no clipping.
    Simple = 0,
    /// Doors, windows, openings: require boolean clipping against a host.
    Clipped = 1,
    /// Furniture, proxies, distribution elements: commonly mapped-item
    /// instanced geometry, needing a mapping-source resolution pass.
    Mapped = 2,
    Other = 3,
}

pub fn priority_class(ifc_type: IfcType) -> PriorityClass {
    match ifc_type {
        IfcType::IfcWall
        | IfcType::IfcWallStandardCase
        | IfcType::IfcSlab
        | IfcType::IfcBeam
        | IfcType::IfcColumn
        | IfcType::IfcFooting
        | IfcType::IfcRoof
        | IfcType::IfcStair
        | IfcType::IfcRamp
        | IfcType::IfcPlate
        | IfcType::IfcRailing => PriorityClass::Simple,

        IfcType::IfcDoor | IfcType::IfcWindow | IfcType::IfcOpeningElement => {
            PriorityClass::Clipped
        }

        IfcType::IfcFurnishingElement
        | IfcType::IfcBuildingElementProxy
        | IfcType::IfcDistributionElement
        | IfcType::IfcFlowTerminal
        | IfcType::IfcFlowSegment
        | IfcType::IfcFlowFitting => PriorityClass::Mapped,

        _ => PriorityClass::Other,
    }
}

/// Stable sort key: priority first, then source order (ties resolved by
/// source order per §4.10).
pub fn sort_key(ifc_type: IfcType, source_order: usize) -> (PriorityClass, usize) {
    (priority_class(ifc_type), source_order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_types_rank_before_clipped_and_mapped() {
        assert!(priority_class(IfcType::IfcWall) < priority_class(IfcType::IfcDoor));
        assert!(priority_class(IfcType::IfcDoor) < priority_class(IfcType::IfcFurnishingElement));
    }

    #[test]
    fn ties_within_a_class_resolve_by_source_order() {
        let a = sort_key(IfcType::IfcWall, 5);
        let b = sort_key(IfcType::IfcWall, 2);
        assert!(b < a);
    }
}
