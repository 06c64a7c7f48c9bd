// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Memory-mapped source file, validated as UTF-8 once at open time so the
//! rest of the pipeline can work with a plain `&str` regardless of whether
//! the file is a few kilobytes or several gigabytes.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct MappedFile {
    mmap: memmap2::Mmap,
    path: PathBuf,
}

impl MappedFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        // SAFETY: the mapping is read-only and held for the lifetime of this
        // value; concurrent external truncation of the file is the same risk
        // any memory-mapped reader accepts.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        if std::str::from_utf8(&mmap).is_err() {
            return Err(Error::NotUtf8 { path: path.to_path_buf() });
        }
        Ok(Self { mmap, path: path.to_path_buf() })
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: validated once in `open`.
        unsafe { std::str::from_utf8_unchecked(&self.mmap) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn opens_and_reads_a_small_step_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "ISO-10303-21;\nDATA;\nENDSEC;\nEND-ISO-10303-21;").unwrap();
        let mapped = MappedFile::open(file.path()).unwrap();
        assert!(mapped.as_str().starts_with("ISO-10303-21"));
    }

    #[test]
    fn rejects_non_utf8_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x01]).unwrap();
        assert!(matches!(MappedFile::open(file.path()), Err(Error::NotUtf8 { .. })));
    }
}
