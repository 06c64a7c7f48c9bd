// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load configuration threaded through the pipeline and, ultimately,
//! `ifc-lite-engine`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Geometry fidelity: `Draft` skips the CSG opening-cut cleanup pass for
/// faster first loads of very large files (§9 Open Question: the cleanup
/// pass is configurable rather than always-on or always-off).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryQuality {
    Draft,
    Full,
}

#[derive(Clone)]
pub struct LoadConfig {
    pub initial_batch_size: usize,
    pub mid_batch_size: usize,
    pub max_batch_size: usize,
    pub cache_dir: Option<PathBuf>,
    pub geometry_quality: GeometryQuality,
    cancelled: Arc<AtomicBool>,
}

impl LoadConfig {
    pub fn new() -> Self {
        Self {
            initial_batch_size: 50,
            mid_batch_size: 275,
            max_batch_size: 500,
            cache_dir: None,
            geometry_quality: GeometryQuality::Full,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Dynamic batch size for 0-indexed `batch_index`, per §4.10: small
    /// batches first for fast first-frame latency, larger once the pipeline
    /// is warmed up.
    pub fn batch_size_for(&self, batch_index: usize) -> usize {
        match batch_index {
            0..=2 => self.initial_batch_size,
            3..=5 => self.mid_batch_size,
            _ => self.max_batch_size,
        }
    }

    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_grows_with_index() {
        let config = LoadConfig::new();
        assert_eq!(config.batch_size_for(0), 50);
        assert_eq!(config.batch_size_for(2), 50);
        assert_eq!(config.batch_size_for(3), 275);
        assert_eq!(config.batch_size_for(5), 275);
        assert_eq!(config.batch_size_for(6), 500);
        assert_eq!(config.batch_size_for(1000), 500);
    }

    #[test]
    fn cancellation_flag_is_shared_through_the_handle() {
        let config = LoadConfig::new();
        let handle = config.cancellation_handle();
        assert!(!config.is_cancelled());
        handle.store(true, Ordering::Relaxed);
        assert!(config.is_cancelled());
    }
}
