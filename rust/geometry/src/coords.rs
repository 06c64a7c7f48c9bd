// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Large-coordinate detection and origin shift (C10). Accumulates mesh
//! bounds batch by batch, freezes an origin shift the first time the
//! running bounds cross the large-coordinate threshold, and rewrites
//! vertex positions in place from then on. Grounded in
//! [`crate::mesh::CoordinateShift`] (the shift value itself) and
//! `ifc_lite_core::model_bounds` (the same 10km threshold, here made
//! incremental and mesh-driven instead of a single upfront text scan).

use nalgebra::Point3;

use crate::mesh::{CoordinateShift, Mesh};

/// Meters; axis extent or centroid magnitude beyond this triggers a shift.
const T_LARGE: f64 = 10_000.0;
/// Meters; a vertex component beyond this is treated as corrupt, not
/// merely "large", and is replaced with the origin instead of shifted.
const T_MAX: f64 = 10_000_000.0;

#[inline]
fn is_reasonable(v: f64) -> bool {
    v.is_finite() && v.abs() < T_MAX
}

#[derive(Debug, Clone, Copy, Default)]
struct RunningBounds {
    min: Option<Point3<f64>>,
    max: Option<Point3<f64>>,
}

impl RunningBounds {
    fn expand(&mut self, x: f64, y: f64, z: f64) {
        let p = Point3::new(x, y, z);
        self.min = Some(match self.min {
            Some(m) => Point3::new(m.x.min(x), m.y.min(y), m.z.min(z)),
            None => p,
        });
        self.max = Some(match self.max {
            Some(m) => Point3::new(m.x.max(x), m.y.max(y), m.z.max(z)),
            None => p,
        });
    }

    fn is_valid(&self) -> bool {
        self.min.is_some()
    }

    fn centroid(&self) -> Point3<f64> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => nalgebra::center(&min, &max),
            _ => Point3::origin(),
        }
    }

    fn extent(&self) -> Point3<f64> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Point3::new(max.x - min.x, max.y - min.y, max.z - min.z),
            _ => Point3::origin(),
        }
    }
}

/// Snapshot of the handler's accumulated state, returned to callers that
/// need to report georeferencing status alongside a geometry batch.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateInfo {
    pub origin_shift: CoordinateShift,
    pub original_bounds_min: Point3<f64>,
    pub original_bounds_max: Point3<f64>,
    pub shifted_bounds_min: Point3<f64>,
    pub shifted_bounds_max: Point3<f64>,
    pub is_geo_referenced: bool,
}

pub struct CoordinateHandler {
    accumulated: RunningBounds,
    origin_shift: Option<CoordinateShift>,
    dropped_vertices: u64,
}

impl Default for CoordinateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateHandler {
    pub fn new() -> Self {
        Self {
            accumulated: RunningBounds::default(),
            origin_shift: None,
            dropped_vertices: 0,
        }
    }

    pub fn dropped_vertex_count(&self) -> u64 {
        self.dropped_vertices
    }

    pub fn origin_shift(&self) -> Option<CoordinateShift> {
        self.origin_shift
    }

    /// Feed one batch of meshes: extends the running bounds with every
    /// reasonable vertex, freezes the origin shift the first time the
    /// bounds qualify as large, and shifts (or zeroes) every position in
    /// the batch in place.
    pub fn accept(&mut self, batch: &mut [Mesh]) {
        for mesh in batch.iter() {
            for chunk in mesh.positions.chunks_exact(3) {
                let (x, y, z) = (chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
                if is_reasonable(x) && is_reasonable(y) && is_reasonable(z) {
                    self.accumulated.expand(x, y, z);
                } else {
                    self.dropped_vertices += 1;
                }
            }
        }

        if self.origin_shift.is_none() && self.accumulated.is_valid() {
            let extent = self.accumulated.extent();
            let centroid = self.accumulated.centroid();
            let is_large = extent.x > T_LARGE
                || extent.y > T_LARGE
                || extent.z > T_LARGE
                || centroid.coords.norm() > T_LARGE;
            if is_large {
                self.origin_shift = Some(CoordinateShift::from_point(centroid));
            }
        }

        let Some(shift) = self.origin_shift else {
            return;
        };

        for mesh in batch.iter_mut() {
            for chunk in mesh.positions.chunks_exact_mut(3) {
                let (x, y, z) = (chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
                if is_reasonable(x) && is_reasonable(y) && is_reasonable(z) {
                    chunk[0] = (x - shift.x) as f32;
                    chunk[1] = (y - shift.y) as f32;
                    chunk[2] = (z - shift.z) as f32;
                } else {
                    chunk[0] = 0.0;
                    chunk[1] = 0.0;
                    chunk[2] = 0.0;
                }
            }
        }
    }

    pub fn info(&self) -> CoordinateInfo {
        let shift = self.origin_shift.unwrap_or_default();
        let (min, max) = (
            self.accumulated.min.unwrap_or_else(Point3::origin),
            self.accumulated.max.unwrap_or_else(Point3::origin),
        );
        let shift_point = Point3::new(shift.x, shift.y, shift.z);
        CoordinateInfo {
            origin_shift: shift,
            original_bounds_min: min,
            original_bounds_max: max,
            shifted_bounds_min: min - shift_point.coords,
            shifted_bounds_max: max - shift_point.coords,
            is_geo_referenced: self.origin_shift.is_some(),
        }
    }

    pub fn to_world(&self, v: Point3<f64>) -> Point3<f64> {
        match self.origin_shift {
            Some(shift) => Point3::new(v.x + shift.x, v.y + shift.y, v.z + shift.z),
            None => v,
        }
    }

    pub fn to_local(&self, w: Point3<f64>) -> Point3<f64> {
        match self.origin_shift {
            Some(shift) => Point3::new(w.x - shift.x, w.y - shift.y, w.z - shift.z),
            None => w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_from(positions: Vec<f32>) -> Mesh {
        Mesh {
            positions,
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    #[test]
    fn small_coordinates_never_trigger_a_shift() {
        let mut handler = CoordinateHandler::new();
        let mut batch = vec![mesh_from(vec![0.0, 0.0, 0.0, 10.0, 5.0, 2.0])];
        handler.accept(&mut batch);
        assert!(handler.origin_shift().is_none());
        assert_eq!(batch[0].positions, vec![0.0, 0.0, 0.0, 10.0, 5.0, 2.0]);
    }

    #[test]
    fn large_coordinates_freeze_a_shift_and_rewrite_positions() {
        let mut handler = CoordinateHandler::new();
        let mut batch = vec![mesh_from(vec![
            2_679_012.0,
            1_247_892.0,
            432.0,
            2_679_112.0,
            1_247_992.0,
            442.0,
        ])];
        handler.accept(&mut batch);

        assert!(handler.origin_shift().is_some());
        let shift = handler.origin_shift().unwrap();
        assert!((shift.x - 2_679_062.0).abs() < 1e-6);

        for chunk in batch[0].positions.chunks_exact(3) {
            assert!(chunk[0].abs() < 100.0);
        }
    }

    #[test]
    fn corrupt_vertices_are_dropped_and_zeroed() {
        let mut handler = CoordinateHandler::new();
        let mut batch = vec![mesh_from(vec![
            0.0,
            0.0,
            0.0,
            f64::NAN as f32,
            20_000_000.0,
            0.0,
        ])];
        handler.accept(&mut batch);
        assert_eq!(handler.dropped_vertex_count(), 1);
        assert_eq!(&batch[0].positions[3..6], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn to_world_and_to_local_round_trip() {
        let mut handler = CoordinateHandler::new();
        let mut batch = vec![mesh_from(vec![2_679_012.0, 1_247_892.0, 432.0])];
        handler.accept(&mut batch);

        let v = Point3::new(12.5, -3.0, 0.2);
        let w = handler.to_world(v);
        let back = handler.to_local(w);
        assert!((back.x - v.x).abs() < 1e-9);
        assert!((back.y - v.y).abs() < 1e-9);
        assert!((back.z - v.z).abs() < 1e-9);
    }

    #[test]
    fn shift_freezes_after_first_large_batch() {
        let mut handler = CoordinateHandler::new();
        let mut first = vec![mesh_from(vec![2_679_012.0, 1_247_892.0, 432.0])];
        handler.accept(&mut first);
        let frozen = handler.origin_shift().unwrap();

        let mut second = vec![mesh_from(vec![0.0, 0.0, 0.0])];
        handler.accept(&mut second);
        assert_eq!(handler.origin_shift().unwrap().x, frozen.x);
    }
}
