// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for store construction: relationship extraction and
//! placement resolution.

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] ifc_lite_core::Error),

    /// `#n` reference inside a relationship or placement chain did not
    /// resolve to a decodable entity.
    #[error("unresolved reference #{0}")]
    UnresolvedRef(u32),

    /// A placement chain referenced itself, directly or transitively.
    #[error("circular placement chain at #{0}")]
    CircularPlacement(u32),

    /// Attribute present but not of the shape the placement/relationship
    /// code expected (e.g. a `RelatingObject` that isn't an entity ref).
    #[error("malformed attribute on #{express_id} ({ifc_type}): {message}")]
    MalformedAttribute {
        express_id: u32,
        ifc_type: String,
        message: String,
    },
}
