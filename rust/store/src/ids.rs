// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-model id bookkeeping. The federated multi-layer composition
//! engine itself is out of scope here; this module only provides the hook
//! such a system would reuse the store through: a stable per-model
//! identity and an allocator that hands out non-overlapping expressId
//! offset ranges so several loaded models can share one entity table
//! without colliding ids.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(Uuid);

impl ModelId {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

/// Hands out non-overlapping `[offset, offset + span)` expressId ranges,
/// one per loaded model. `offset` is always a multiple of the allocator's
/// block size, so express ids from different models never collide even
/// before the span of either is known.
pub struct IdAllocator {
    block_size: u32,
    next_block: u32,
    allocated: Vec<(ModelId, u32, u32)>,
}

impl IdAllocator {
    pub fn new(block_size: u32) -> Self {
        assert!(block_size > 0, "block_size must be positive");
        Self {
            block_size,
            next_block: 0,
            allocated: Vec::new(),
        }
    }

    /// Reserve the next offset block for `model`. `span` is the number of
    /// express ids the model actually uses; panics in debug builds if it
    /// would overrun the allocator's fixed block size.
    pub fn allocate(&mut self, model: ModelId, span: u32) -> u32 {
        debug_assert!(
            span <= self.block_size,
            "model span {span} exceeds allocator block size {}",
            self.block_size
        );
        let offset = self.next_block * self.block_size;
        self.allocated.push((model, offset, span));
        self.next_block += 1;
        offset
    }

    /// Debug-only sanity check: no two allocated ranges overlap.
    pub fn assert_no_overlap(&self) {
        for (i, &(_, a_start, a_span)) in self.allocated.iter().enumerate() {
            for &(_, b_start, b_span) in &self.allocated[i + 1..] {
                let a_end = a_start + a_span;
                let b_end = b_start + b_span;
                assert!(
                    a_end <= b_start || b_end <= a_start,
                    "overlapping id ranges: [{a_start}, {a_end}) vs [{b_start}, {b_end})"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_non_overlapping_blocks() {
        let mut allocator = IdAllocator::new(1_000_000);
        let m1 = ModelId::new(Uuid::from_u128(1));
        let m2 = ModelId::new(Uuid::from_u128(2));

        let o1 = allocator.allocate(m1, 500);
        let o2 = allocator.allocate(m2, 900);

        assert_eq!(o1, 0);
        assert_eq!(o2, 1_000_000);
        allocator.assert_no_overlap();
    }

    #[test]
    #[should_panic]
    fn overlong_span_panics_in_debug() {
        let mut allocator = IdAllocator::new(10);
        allocator.allocate(ModelId::new(Uuid::from_u128(1)), 11);
    }
}
