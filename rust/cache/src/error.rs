// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("section {section:?} failed to encode")]
    Encode {
        section: crate::format::SectionTag,
        #[source]
        source: bincode::Error,
    },

    #[error("section {section:?} failed to decode")]
    Decode {
        section: crate::format::SectionTag,
        #[source]
        source: bincode::Error,
    },

    #[error("truncated cache file: expected at least {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("unknown section tag {0}")]
    UnknownSectionTag(u32),

    #[error("cache file is missing required section {0:?}")]
    MissingSection(crate::format::SectionTag),
}
