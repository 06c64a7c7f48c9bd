// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for STEP tokenization, schema lookup and entity decoding.
//!
//! Mirrors the taxonomy the rest of the engine surfaces as stream events:
//! most variants here are recoverable per-entity failures the caller can
//! record and continue past; [`Error::Truncated`] and [`Error::InvalidStep`]
//! raised before any entity has been read are the only fatal cases.

use thiserror::Error as ThisError;

/// Result alias used throughout `ifc-lite-core`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Source ended mid-form (unbalanced parens, missing `;`).
    #[error("truncated STEP form at byte {offset}")]
    Truncated { offset: usize },

    /// A form could not be tokenized (bad escape, unbalanced parens before `DATA;`).
    #[error("invalid STEP syntax at line {line}: {message}")]
    InvalidStep { line: usize, message: String },

    /// Decoded attribute count didn't match the schema's local attribute count.
    #[error("entity #{express_id} ({ifc_type}): expected {expected} attributes, got {actual}")]
    SchemaArity {
        express_id: u32,
        ifc_type: String,
        expected: usize,
        actual: usize,
    },

    /// Type name absent from the schema registry.
    #[error("unknown IFC type: {0}")]
    InvalidIfcType(String),

    /// Generic parse failure with line context, used by the `nom` grammar.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// `#n` entity reference does not resolve to a known offset.
    #[error("unresolved reference #{0}")]
    UnresolvedRef(u32),
}

impl Error {
    pub fn parse(line: usize, message: String) -> Self {
        Error::Parse { line, message }
    }

    /// Whether this error must abort the load entirely (vs. being recorded
    /// per-entity and skipped), per the propagation policy in the engine spec.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Truncated { .. } | Error::InvalidStep { .. })
    }
}
