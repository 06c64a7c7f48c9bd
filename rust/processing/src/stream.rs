// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch emitter (C11, §4.10). A synchronous iterator/state-machine: each
//! call to `next()` produces one `LoadEvent`, pulling just enough entities
//! off the priority-sorted job list to fill the batch size for its index.
//! Grounded in the `process_batch`/`process_streaming` loop of the
//! teacher's `apps/server/src/services/streaming.rs`, stripped of its
//! `tokio`/`async_stream` wrapper since this crate is the synchronous core
//! engine, not the outer network-serving layer.

use ifc_lite_core::{EntityDecoder, IfcType};
use ifc_lite_geometry::coords::CoordinateHandler;
use ifc_lite_geometry::router::GeometryRouter;
use ifc_lite_geometry::Mesh;
use ifc_lite_store::placement::PlacementResolver;
use rustc_hash::FxHashMap;

use crate::config::LoadConfig;
use crate::error::Error;
use crate::events::{CoordinateInfoSummary, LoadEvent, MeshData};
use crate::lod::{build_lod1_fallback, default_color_for, sibling_half_extent};
use crate::priority::sort_key;

/// One geometry-bearing entity queued for processing.
#[derive(Debug, Clone, Copy)]
pub struct Job {
    pub express_id: u32,
    pub ifc_type: IfcType,
}

/// Sort jobs into emission order: priority class first, source order
/// breaks ties within a class (§4.10).
pub fn order_jobs(mut jobs: Vec<Job>) -> Vec<Job> {
    let mut indexed: Vec<(usize, Job)> = jobs.drain(..).enumerate().collect();
    indexed.sort_by_key(|(source_order, job)| sort_key(job.ifc_type, *source_order));
    indexed.into_iter().map(|(_, job)| job).collect()
}

pub struct BatchEmitter<'a> {
    decoder: EntityDecoder<'a>,
    router: GeometryRouter,
    resolver: PlacementResolver,
    void_index: FxHashMap<u32, Vec<u32>>,
    jobs: Vec<Job>,
    next_job: usize,
    batch_index: usize,
    config: LoadConfig,
    coords: CoordinateHandler,
    total_emitted: usize,
    failed_elements: Vec<u32>,
    successful_centers: FxHashMap<u32, [f32; 3]>,
    element_to_storey: FxHashMap<u32, u32>,
    done: bool,
}

impl<'a> BatchEmitter<'a> {
    pub fn new(
        decoder: EntityDecoder<'a>,
        router: GeometryRouter,
        void_index: FxHashMap<u32, Vec<u32>>,
        element_to_storey: FxHashMap<u32, u32>,
        jobs: Vec<Job>,
        config: LoadConfig,
    ) -> Self {
        Self {
            decoder,
            router,
            resolver: PlacementResolver::new(),
            void_index,
            jobs: order_jobs(jobs),
            next_job: 0,
            batch_index: 0,
            config,
            coords: CoordinateHandler::new(),
            total_emitted: 0,
            failed_elements: Vec::new(),
            successful_centers: FxHashMap::default(),
            element_to_storey,
            done: false,
        }
    }

    fn next_batch_slice(&mut self) -> Option<&[Job]> {
        if self.next_job >= self.jobs.len() {
            return None;
        }
        let size = self.config.batch_size_for(self.batch_index);
        let end = (self.next_job + size).min(self.jobs.len());
        let slice = &self.jobs[self.next_job..end];
        self.next_job = end;
        self.batch_index += 1;
        Some(slice)
    }

    fn process_one(&mut self, job: Job) -> MeshData {
        let Ok(entity) = self.decoder.decode_by_id(job.express_id) else {
            self.failed_elements.push(job.express_id);
            return self.fallback_for(job);
        };

        let result = self
            .router
            .process_element_with_voids(&entity, &mut self.decoder, &self.void_index);

        match result {
            Ok(mesh) if !mesh.is_empty() => {
                let (min, max) = mesh.bounds();
                let center = [
                    (min.x + max.x) / 2.0,
                    (min.y + max.y) / 2.0,
                    (min.z + max.z) / 2.0,
                ];
                self.successful_centers.insert(job.express_id, center);
                mesh_to_mesh_data(job, mesh)
            }
            Ok(_) => {
                // Empty mesh is not a failure (e.g. a representation-less
                // element); skip the LOD1 substitute and emit nothing sized.
                mesh_to_mesh_data(job, Mesh::new())
            }
            Err(err) => {
                let processing_err = Error::GeometryItem {
                    express_id: job.express_id,
                    message: err.to_string(),
                };
                tracing::warn!(
                    express_id = job.express_id,
                    error = %processing_err,
                    "geometry processing failed, substituting LOD1 box"
                );
                self.failed_elements.push(job.express_id);
                self.fallback_for(job)
            }
        }
    }

    fn fallback_for(&mut self, job: Job) -> MeshData {
        let storey = self.element_to_storey.get(&job.express_id).copied();
        let half_extent = sibling_half_extent(&self.element_to_storey, &self.successful_centers, storey);
        build_lod1_fallback(
            &mut self.decoder,
            &mut self.resolver,
            job.express_id,
            job.ifc_type,
            half_extent,
        )
    }

    fn coordinate_info(&self) -> CoordinateInfoSummary {
        let info = self.coords.info();
        CoordinateInfoSummary {
            origin_shift: [info.origin_shift.x, info.origin_shift.y, info.origin_shift.z],
            is_geo_referenced: info.is_geo_referenced,
        }
    }
}

fn mesh_to_mesh_data(job: Job, mesh: Mesh) -> MeshData {
    MeshData {
        express_id: job.express_id,
        ifc_type: job.ifc_type.as_str().to_string(),
        positions: mesh.positions,
        normals: mesh.normals,
        indices: mesh.indices,
        color: default_color_for(job.ifc_type),
    }
}

impl Iterator for BatchEmitter<'_> {
    type Item = LoadEvent;

    fn next(&mut self) -> Option<LoadEvent> {
        if self.done {
            return None;
        }
        if self.config.is_cancelled() {
            self.done = true;
            return None;
        }

        let Some(slice) = self.next_batch_slice() else {
            self.done = true;
            return Some(LoadEvent::Complete {
                total_meshes: self.total_emitted,
                coordinate_info: self.coordinate_info(),
                failed_elements: std::mem::take(&mut self.failed_elements),
            });
        };

        let jobs: Vec<Job> = slice.to_vec();
        let mut mesh_datas: Vec<MeshData> = Vec::with_capacity(jobs.len());
        let mut raw_meshes: Vec<Mesh> = Vec::with_capacity(jobs.len());

        for job in jobs {
            if self.config.is_cancelled() {
                break;
            }
            let data = self.process_one(job);
            raw_meshes.push(Mesh {
                positions: data.positions.clone(),
                normals: data.normals.clone(),
                indices: data.indices.clone(),
            });
            mesh_datas.push(data);
        }

        self.coords.accept(&mut raw_meshes);
        for (data, shifted) in mesh_datas.iter_mut().zip(raw_meshes.into_iter()) {
            data.positions = shifted.positions;
        }

        self.total_emitted += mesh_datas.len();

        Some(LoadEvent::Batch {
            meshes: mesh_datas,
            total_so_far: self.total_emitted,
            coordinate_info: self.coordinate_info(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: u32, t: IfcType) -> Job {
        Job { express_id: id, ifc_type: t }
    }

    #[test]
    fn order_jobs_puts_simple_before_clipped_and_preserves_source_order_within_class() {
        let jobs = vec![
            job(1, IfcType::IfcDoor),
            job(2, IfcType::IfcWall),
            job(3, IfcType::IfcWall),
        ];
        let ordered = order_jobs(jobs);
        assert_eq!(ordered[0].express_id, 2);
        assert_eq!(ordered[1].express_id, 3);
        assert_eq!(ordered[2].express_id, 1);
    }

    #[test]
    fn emitter_over_no_jobs_yields_only_complete() {
        let content = "DATA;\nENDSEC;";
        let decoder = EntityDecoder::new(content);
        let router = GeometryRouter::new();
        let mut emitter = BatchEmitter::new(
            decoder,
            router,
            FxHashMap::default(),
            FxHashMap::default(),
            Vec::new(),
            LoadConfig::new(),
        );

        let first = emitter.next().unwrap();
        match first {
            LoadEvent::Complete { total_meshes, .. } => assert_eq!(total_meshes, 0),
            _ => panic!("expected Complete"),
        }
        assert!(emitter.next().is_none());
    }

    #[test]
    fn cancellation_stops_emission_before_complete() {
        let content = "DATA;\n#1=IFCWALL('g',$,$,$,$,$,$,$);\nENDSEC;";
        let decoder = EntityDecoder::new(content);
        let router = GeometryRouter::new();
        let config = LoadConfig::new();
        config.cancel();
        let mut emitter = BatchEmitter::new(
            decoder,
            router,
            FxHashMap::default(),
            FxHashMap::default(),
            vec![job(1, IfcType::IfcWall)],
            config,
        );
        assert!(emitter.next().is_none());
    }
}
