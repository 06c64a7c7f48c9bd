// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incremental load path: hands back the batch emitter directly so a
//! consumer (renderer, CLI progress bar) can act on each
//! [`ifc_lite_processing::LoadEvent`] as it is produced instead of waiting
//! for the whole model. No caching here; that is [`crate::model::load_model`]'s
//! job, since a streaming consumer wants first pixels, not a cache round-trip.

use ifc_lite_processing::pipeline::build_model;
use ifc_lite_processing::stream::BatchEmitter;
use ifc_lite_processing::{LoadConfig, LoadEvent};

use crate::error::Result;

/// Build the model and return its batch emitter in one step, borrowing
/// `content` for as long as the caller keeps iterating.
pub fn stream_model(content: &str, config: LoadConfig) -> Result<impl Iterator<Item = LoadEvent> + '_> {
    let loaded = build_model(content)?;
    Ok(BatchEmitter::new(
        loaded.decoder,
        loaded.router,
        loaded.void_index,
        loaded.spatial.element_to_storey.clone(),
        loaded.jobs,
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_a_complete_event_for_an_empty_model() {
        let content = "DATA;\nENDSEC;";
        let mut events = stream_model(content, LoadConfig::new()).unwrap();
        match events.next() {
            Some(LoadEvent::Complete { total_meshes, .. }) => assert_eq!(total_meshes, 0),
            other => panic!("expected Complete, got {other:?}"),
        }
        assert!(events.next().is_none());
    }

    #[test]
    fn streams_a_batch_then_complete_for_one_wall() {
        let content = "DATA;\n#1=IFCWALL('g',$,$,$,$,$,$,$);\nENDSEC;";
        let events: Vec<_> = stream_model(content, LoadConfig::new()).unwrap().collect();
        assert!(events.iter().any(|e| matches!(e, LoadEvent::Batch { .. })));
        assert!(matches!(events.last(), Some(LoadEvent::Complete { .. })));
    }
}
