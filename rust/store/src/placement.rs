// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! World-transform resolver (C7). Walks `IfcLocalPlacement` chains up to
//! their root and composes parent * local, caching the result per
//! expressId. Kept independent of `ifc-lite-geometry` (store sits below
//! geometry in the crate layering) even though the Gram-Schmidt math
//! mirrors it.

use ifc_lite_core::{AttributeValue, DecodedEntity, EntityDecoder, IfcType};
use nalgebra::{Matrix4, Point3, Vector3};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

pub struct PlacementResolver {
    cache: FxHashMap<u32, Matrix4<f64>>,
    /// Ids currently being resolved, to detect cyclic `PlacementRelTo` chains.
    in_progress: Vec<u32>,
}

impl Default for PlacementResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementResolver {
    pub fn new() -> Self {
        Self {
            cache: FxHashMap::default(),
            in_progress: Vec::new(),
        }
    }

    /// Resolve the world transform for an `IfcLocalPlacement` instance,
    /// composing its `PlacementRelTo` chain. Cached by expressId.
    pub fn resolve(
        &mut self,
        decoder: &mut EntityDecoder,
        placement_id: u32,
    ) -> Result<Matrix4<f64>> {
        if let Some(m) = self.cache.get(&placement_id) {
            return Ok(*m);
        }
        if self.in_progress.contains(&placement_id) {
            return Err(Error::CircularPlacement(placement_id));
        }

        self.in_progress.push(placement_id);
        let result = self.resolve_uncached(decoder, placement_id);
        self.in_progress.pop();

        let transform = result?;
        self.cache.insert(placement_id, transform);
        Ok(transform)
    }

    fn resolve_uncached(
        &mut self,
        decoder: &mut EntityDecoder,
        placement_id: u32,
    ) -> Result<Matrix4<f64>> {
        let placement = decoder
            .decode_by_id(placement_id)
            .map_err(|_| Error::UnresolvedRef(placement_id))?;

        if placement.ifc_type != IfcType::IfcLocalPlacement {
            return Err(Error::MalformedAttribute {
                express_id: placement_id,
                ifc_type: placement.ifc_type.as_str().to_string(),
                message: "expected IfcLocalPlacement".to_string(),
            });
        }

        let parent = match placement.get(0).and_then(AttributeValue::as_entity_ref) {
            Some(parent_id) => self.resolve(decoder, parent_id)?,
            None => Matrix4::identity(),
        };

        let local = match placement.get_ref(1) {
            Some(rel_id) => {
                let rel_entity = decoder
                    .decode_by_id(rel_id)
                    .map_err(|_| Error::UnresolvedRef(rel_id))?;
                axis2_placement_to_matrix(&rel_entity, decoder)?
            }
            None => Matrix4::identity(),
        };

        Ok(parent * local)
    }
}

/// Build a 4x4 world transform from an `IfcAxis2Placement3D` (or, with Z
/// pinned to +Z, an `IfcAxis2Placement2D`). Location/Axis/RefDirection at
/// attributes 0/1/2; missing axes default to the identity frame.
fn axis2_placement_to_matrix(
    placement: &DecodedEntity,
    decoder: &mut EntityDecoder,
) -> Result<Matrix4<f64>> {
    let location = cartesian_point(placement, decoder, 0)?;

    let z_axis = optional_direction(placement, decoder, 1)?.unwrap_or(Vector3::z());
    let x_hint = optional_direction(placement, decoder, 2)?.unwrap_or(Vector3::x());

    let z = z_axis.normalize();
    let x_proj = x_hint - z * x_hint.dot(&z);
    let x = if x_proj.norm() > 1e-9 {
        x_proj.normalize()
    } else if z.z.abs() < 0.9 {
        Vector3::z().cross(&z).normalize()
    } else {
        Vector3::x().cross(&z).normalize()
    };
    let y = z.cross(&x).normalize();

    let mut transform = Matrix4::identity();
    transform.fixed_view_mut::<3, 1>(0, 0).copy_from(&x);
    transform.fixed_view_mut::<3, 1>(0, 1).copy_from(&y);
    transform.fixed_view_mut::<3, 1>(0, 2).copy_from(&z);
    transform
        .fixed_view_mut::<3, 1>(0, 3)
        .copy_from(&location.coords);
    Ok(transform)
}

fn cartesian_point(
    entity: &DecodedEntity,
    decoder: &mut EntityDecoder,
    attr_index: usize,
) -> Result<Point3<f64>> {
    let point_id = entity
        .get_ref(attr_index)
        .ok_or_else(|| Error::MalformedAttribute {
            express_id: entity.id,
            ifc_type: entity.ifc_type.as_str().to_string(),
            message: "missing cartesian point reference".to_string(),
        })?;

    if let Some((x, y, z)) = decoder.get_cartesian_point_fast(point_id) {
        return Ok(Point3::new(x, y, z));
    }

    let point = decoder
        .decode_by_id(point_id)
        .map_err(|_| Error::UnresolvedRef(point_id))?;
    let coords = point
        .get(0)
        .and_then(AttributeValue::as_list)
        .ok_or_else(|| Error::MalformedAttribute {
            express_id: point_id,
            ifc_type: point.ifc_type.as_str().to_string(),
            message: "missing coordinate list".to_string(),
        })?;
    let x = coords.first().and_then(AttributeValue::as_float).unwrap_or(0.0);
    let y = coords.get(1).and_then(AttributeValue::as_float).unwrap_or(0.0);
    let z = coords.get(2).and_then(AttributeValue::as_float).unwrap_or(0.0);
    Ok(Point3::new(x, y, z))
}

fn optional_direction(
    entity: &DecodedEntity,
    decoder: &mut EntityDecoder,
    attr_index: usize,
) -> Result<Option<Vector3<f64>>> {
    let Some(attr) = entity.get(attr_index) else {
        return Ok(None);
    };
    if attr.is_null() {
        return Ok(None);
    }
    let Some(dir_id) = attr.as_entity_ref() else {
        return Ok(None);
    };
    let dir = decoder
        .decode_by_id(dir_id)
        .map_err(|_| Error::UnresolvedRef(dir_id))?;
    let ratios = dir
        .get(0)
        .and_then(AttributeValue::as_list)
        .ok_or_else(|| Error::MalformedAttribute {
            express_id: dir_id,
            ifc_type: dir.ifc_type.as_str().to_string(),
            message: "missing direction ratios".to_string(),
        })?;
    let x = ratios.first().and_then(AttributeValue::as_float).unwrap_or(0.0);
    let y = ratios.get(1).and_then(AttributeValue::as_float).unwrap_or(0.0);
    let z = ratios.get(2).and_then(AttributeValue::as_float).unwrap_or(0.0);
    Ok(Some(Vector3::new(x, y, z)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_placement_resolves_to_identity() {
        let content = r#"DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCAXIS2PLACEMENT3D(#1,$,$);
#3=IFCLOCALPLACEMENT($,#2);
ENDSEC;"#;
        let mut decoder = EntityDecoder::new(content);
        let mut resolver = PlacementResolver::new();
        let m = resolver.resolve(&mut decoder, 3).unwrap();
        assert!((m - Matrix4::identity()).norm() < 1e-9);
    }

    #[test]
    fn translation_composes_through_parent_chain() {
        let content = r#"DATA;
#1=IFCCARTESIANPOINT((1.,0.,0.));
#2=IFCAXIS2PLACEMENT3D(#1,$,$);
#3=IFCLOCALPLACEMENT($,#2);
#4=IFCCARTESIANPOINT((0.,2.,0.));
#5=IFCAXIS2PLACEMENT3D(#4,$,$);
#6=IFCLOCALPLACEMENT(#3,#5);
ENDSEC;"#;
        let mut decoder = EntityDecoder::new(content);
        let mut resolver = PlacementResolver::new();
        let m = resolver.resolve(&mut decoder, 6).unwrap();
        let translation = m.fixed_view::<3, 1>(0, 3);
        assert!((translation[0] - 1.0).abs() < 1e-9);
        assert!((translation[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn caches_repeated_resolution() {
        let content = r#"DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCAXIS2PLACEMENT3D(#1,$,$);
#3=IFCLOCALPLACEMENT($,#2);
ENDSEC;"#;
        let mut decoder = EntityDecoder::new(content);
        let mut resolver = PlacementResolver::new();
        resolver.resolve(&mut decoder, 3).unwrap();
        assert!(resolver.cache.contains_key(&3));
    }
}
