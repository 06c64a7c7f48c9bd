// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open or map {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8 STEP text")]
    NotUtf8 { path: std::path::PathBuf },

    #[error(transparent)]
    Processing(#[from] ifc_lite_processing::Error),

    #[error(transparent)]
    Cache(#[from] ifc_lite_cache::Error),
}
