// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::events::LoadEvent;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] ifc_lite_core::Error),

    #[error(transparent)]
    Geometry(#[from] ifc_lite_geometry::Error),

    #[error(transparent)]
    Cache(#[from] ifc_lite_cache::Error),

    #[error("entity {express_id} failed geometry processing: {message}")]
    GeometryItem { express_id: u32, message: String },
}

impl Error {
    /// Recoverable per-item failures surface on the event stream instead of
    /// aborting the whole load (§7 propagation policy).
    pub fn into_event(self) -> LoadEvent {
        match self {
            Error::GeometryItem { express_id, message } => LoadEvent::Error {
                kind: "geometry".into(),
                express_id: Some(express_id),
                message,
            },
            other => LoadEvent::Error {
                kind: "pipeline".into(),
                express_id: None,
                message: other.to_string(),
            },
        }
    }
}
