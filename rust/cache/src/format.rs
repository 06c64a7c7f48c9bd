// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary framing (C12): `magic(8) | version(u32) | hash(32) |
//! {tag(u32), length(u64), payload}*`. Every section payload is the
//! `bincode` encoding of one in-memory table; the outer framing is plain
//! hand-rolled byte layout so the format stays stable independent of
//! `bincode`'s own versioning.

use std::io::{self, Read, Write};

pub const MAGIC: &[u8; 8] = b"IFCLITE\0";
pub const VERSION: u32 = 1;
pub const HASH_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SectionTag {
    Entities = 0,
    Properties = 1,
    Quantities = 2,
    /// Forward and inverse relationship CSRs are stored together: the graph
    /// is already one bidirectional structure, so splitting it into two
    /// tags would mean serializing the same edges twice for no benefit.
    Relationships = 3,
    Strings = 4,
    Spatial = 5,
    Meshes = 6,
    Instances = 7,
}

impl SectionTag {
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::Entities,
            1 => Self::Properties,
            2 => Self::Quantities,
            3 => Self::Relationships,
            4 => Self::Strings,
            5 => Self::Spatial,
            6 => Self::Meshes,
            7 => Self::Instances,
            _ => return None,
        })
    }
}

pub fn write_section(w: &mut impl Write, tag: SectionTag, payload: &[u8]) -> io::Result<()> {
    w.write_all(&(tag as u32).to_le_bytes())?;
    w.write_all(&(payload.len() as u64).to_le_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// Read one `(tag, payload)` frame. Returns `Ok(None)` at clean end of
/// stream (no partial header), `Err` on a truncated or malformed frame.
pub fn read_section(r: &mut impl Read) -> io::Result<Option<(u32, Vec<u8>)>> {
    let mut tag_buf = [0u8; 4];
    match r.read(&mut tag_buf)? {
        0 => return Ok(None),
        4 => {}
        n => {
            // Partial tag: fill the rest or fail clearly.
            r.read_exact(&mut tag_buf[n..])?;
        }
    }
    let tag = u32::from_le_bytes(tag_buf);

    let mut len_buf = [0u8; 8];
    r.read_exact(&mut len_buf)?;
    let len = u64::from_le_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    Ok(Some((tag, payload)))
}
