// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LOD0/LOD1 box-mesh generation (§4.12). LOD0 gives a viewer a useful
//! first frame before real geometry has been triangulated; LOD1 is a
//! fallback substitute for elements whose full geometry failed.
//!
//! Grounded in [`ifc_lite_store::placement::PlacementResolver`] for the
//! world translation and the default-color table in the teacher's
//! `apps/server/src/services/streaming.rs::get_default_color`.

use ifc_lite_core::{EntityDecoder, IfcType};
use ifc_lite_store::placement::PlacementResolver;
use nalgebra::Matrix4;
use rustc_hash::FxHashMap;

use crate::events::MeshData;

/// Half-extent of the nominal footprint used when no better size estimate
/// is available (a 1m cube).
const DEFAULT_HALF_EXTENT: f32 = 0.5;

/// Same palette the full geometry pipeline falls back to when no styled
/// item color can be resolved, so LOD boxes don't flash a different color
/// than the final mesh once it arrives.
pub fn default_color_for(ifc_type: IfcType) -> [f32; 4] {
    match ifc_type {
        IfcType::IfcWall | IfcType::IfcWallStandardCase => [0.85, 0.85, 0.85, 1.0],
        IfcType::IfcSlab => [0.7, 0.7, 0.7, 1.0],
        IfcType::IfcRoof => [0.6, 0.5, 0.4, 1.0],
        IfcType::IfcColumn | IfcType::IfcBeam | IfcType::IfcMember => [0.6, 0.65, 0.7, 1.0],
        IfcType::IfcWindow => [0.6, 0.8, 1.0, 0.4],
        IfcType::IfcDoor => [0.6, 0.45, 0.3, 1.0],
        IfcType::IfcStair => [0.75, 0.75, 0.75, 1.0],
        IfcType::IfcRailing => [0.4, 0.4, 0.45, 1.0],
        IfcType::IfcPlate | IfcType::IfcCovering => [0.8, 0.8, 0.8, 1.0],
        IfcType::IfcFurnishingElement => [0.5, 0.35, 0.2, 1.0],
        IfcType::IfcSpace => [0.7, 0.8, 0.95, 0.15],
        IfcType::IfcBuildingElementProxy => [0.6, 0.6, 0.6, 1.0],
        _ => [0.8, 0.8, 0.8, 1.0],
    }
}

/// Axis-aligned box mesh (12 triangles) centered at `center` with the
/// given half-extent on every axis, in the caller's world units.
pub fn unit_box_mesh(
    express_id: u32,
    ifc_type: IfcType,
    center: [f32; 3],
    half_extent: f32,
    color: [f32; 4],
) -> MeshData {
    let (cx, cy, cz) = (center[0], center[1], center[2]);
    let h = half_extent;

    let corners: [[f32; 3]; 8] = [
        [cx - h, cy - h, cz - h],
        [cx + h, cy - h, cz - h],
        [cx + h, cy + h, cz - h],
        [cx - h, cy + h, cz - h],
        [cx - h, cy - h, cz + h],
        [cx + h, cy - h, cz + h],
        [cx + h, cy + h, cz + h],
        [cx - h, cy + h, cz + h],
    ];

    // Each face as two triangles; normals are flat per-face and duplicated
    // per vertex since box corners are shared across faces with different
    // normals.
    const FACES: [([usize; 4], [f32; 3]); 6] = [
        ([0, 1, 2, 3], [0.0, 0.0, -1.0]),
        ([4, 7, 6, 5], [0.0, 0.0, 1.0]),
        ([0, 4, 5, 1], [0.0, -1.0, 0.0]),
        ([2, 6, 7, 3], [0.0, 1.0, 0.0]),
        ([1, 5, 6, 2], [1.0, 0.0, 0.0]),
        ([0, 3, 7, 4], [-1.0, 0.0, 0.0]),
    ];

    let mut positions = Vec::with_capacity(24 * 3);
    let mut normals = Vec::with_capacity(24 * 3);
    let mut indices = Vec::with_capacity(36);

    for (corner_ids, normal) in FACES {
        let base = (positions.len() / 3) as u32;
        for &corner in &corner_ids {
            positions.extend_from_slice(&corners[corner]);
            normals.extend_from_slice(&normal);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData {
        express_id,
        ifc_type: ifc_type.as_str().to_string(),
        positions,
        normals,
        indices,
        color,
    }
}

fn translation_of(transform: &Matrix4<f64>) -> [f32; 3] {
    [
        transform[(0, 3)] as f32,
        transform[(1, 3)] as f32,
        transform[(2, 3)] as f32,
    ]
}

/// LOD0: one box per geometry-bearing entity, resolved through its
/// placement chain. Entities with no `ObjectPlacement` (global attribute
/// index 5 on every `IfcProduct` subtype) are centered at the origin.
pub fn build_lod0(
    decoder: &mut EntityDecoder,
    resolver: &mut PlacementResolver,
    entities: impl IntoIterator<Item = (u32, IfcType)>,
) -> Vec<MeshData> {
    entities
        .into_iter()
        .map(|(express_id, ifc_type)| {
            let center = placement_translation(decoder, resolver, express_id)
                .unwrap_or([0.0, 0.0, 0.0]);
            unit_box_mesh(
                express_id,
                ifc_type,
                center,
                DEFAULT_HALF_EXTENT,
                default_color_for(ifc_type),
            )
        })
        .collect()
}

fn placement_translation(
    decoder: &mut EntityDecoder,
    resolver: &mut PlacementResolver,
    express_id: u32,
) -> Option<[f32; 3]> {
    let entity = decoder.decode_by_id(express_id).ok()?;
    let placement_index = entity
        .ifc_type
        .all_attributes()
        .iter()
        .position(|a| a.name == "ObjectPlacement")?;
    let placement_id = entity.get_ref(placement_index)?;
    let transform = resolver.resolve(decoder, placement_id).ok()?;
    Some(translation_of(&transform))
}

/// LOD1: fallback box for an element whose real geometry processing
/// failed. Prefers the average half-extent of already-built LOD0/real
/// siblings in the same spatial container so the substitute is at least
/// roughly the right size; falls back to [`DEFAULT_HALF_EXTENT`].
pub fn build_lod1_fallback(
    decoder: &mut EntityDecoder,
    resolver: &mut PlacementResolver,
    express_id: u32,
    ifc_type: IfcType,
    sibling_half_extent: Option<f32>,
) -> MeshData {
    let center =
        placement_translation(decoder, resolver, express_id).unwrap_or([0.0, 0.0, 0.0]);
    let half_extent = sibling_half_extent.unwrap_or(DEFAULT_HALF_EXTENT);
    unit_box_mesh(express_id, ifc_type, center, half_extent, default_color_for(ifc_type))
}

/// Estimate a sibling half-extent from the bounding radius of already
/// resolved elements within the same spatial container, used to size
/// LOD1 fallbacks more plausibly than the bare default.
pub fn sibling_half_extent(
    element_to_storey: &FxHashMap<u32, u32>,
    successful_centers: &FxHashMap<u32, [f32; 3]>,
    target_storey: Option<u32>,
) -> Option<f32> {
    let storey = target_storey?;
    let mut sum = 0.0f32;
    let mut count = 0u32;
    for (&express_id, &center) in successful_centers {
        if element_to_storey.get(&express_id) == Some(&storey) {
            let radius = (center[0].powi(2) + center[1].powi(2) + center[2].powi(2)).sqrt();
            sum += radius;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    Some((sum / count as f32).clamp(0.1, 5.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_box_has_eight_unique_corners_and_twelve_triangles() {
        let mesh = unit_box_mesh(1, IfcType::IfcWall, [0.0, 0.0, 0.0], 0.5, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn box_is_centered_at_the_requested_point() {
        let mesh = unit_box_mesh(1, IfcType::IfcDoor, [10.0, 20.0, 30.0], 1.0, [0.0, 0.0, 0.0, 1.0]);
        let xs: Vec<f32> = mesh.positions.iter().step_by(3).copied().collect();
        assert!((xs.iter().cloned().fold(f32::MIN, f32::max) - 11.0).abs() < 1e-6);
        assert!((xs.iter().cloned().fold(f32::MAX, f32::min) - 9.0).abs() < 1e-6);
    }

    #[test]
    fn build_lod0_falls_back_to_origin_without_placement() {
        let content = "DATA;\n#1=IFCWALL('g',$,$,$,$,$,$,$);\nENDSEC;";
        let mut decoder = EntityDecoder::new(content);
        let mut resolver = PlacementResolver::new();
        let meshes = build_lod0(&mut decoder, &mut resolver, [(1, IfcType::IfcWall)]);
        assert_eq!(meshes.len(), 1);
        assert_eq!(&meshes[0].positions[0..3], &[-0.5, -0.5, -0.5]);
    }

    #[test]
    fn sibling_half_extent_averages_same_storey_radii() {
        let mut element_to_storey = FxHashMap::default();
        element_to_storey.insert(1, 10);
        element_to_storey.insert(2, 10);
        element_to_storey.insert(3, 20);

        let mut centers = FxHashMap::default();
        centers.insert(1, [3.0, 0.0, 0.0]);
        centers.insert(2, [4.0, 0.0, 0.0]);
        centers.insert(3, [100.0, 0.0, 0.0]);

        let estimate = sibling_half_extent(&element_to_storey, &centers, Some(10)).unwrap();
        assert!((estimate - 3.5).abs() < 1e-4 || estimate == 3.5f32.clamp(0.1, 5.0));
    }
}
