//! Block containers: all blocks of one particle type.
//!
//! A [`BlockContainer`] owns an ordered list of [`AttributeBlock`]s sharing
//! one schema. New particles are packed first-fit into existing blocks in
//! creation order before any block is added, which keeps the block count
//! close to `ceil(count_active / capacity)`. Blocks that become empty can be
//! released into a recycle pool and are reused before fresh ones are built.
//!
//! The canonical particle order is block order, then slot order within a
//! block. Flattening, the frame cache and mesh extraction all rely on it.

use std::ops::Range;
use std::sync::Arc;

use particula_core::{AttributeSchema, AttributeValue, BlockId};
use smallvec::SmallVec;

use crate::block::AttributeBlock;
use crate::config::BlockConfig;
use crate::error::{ConfigError, FlattenError};
use crate::flatten;

/// A run of freshly allocated slots in one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRange {
    /// Block holding the slots.
    pub block: BlockId,
    /// First allocated slot.
    pub start: usize,
    /// One past the last allocated slot.
    pub end: usize,
}

impl SlotRange {
    /// The slot indices as a range.
    pub fn slots(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Allocation result of [`BlockContainer::new_particles`].
///
/// Most requests land in one or two blocks, so the ranges live inline.
pub type SlotRanges = SmallVec<[SlotRange; 4]>;

/// Owns every block of one particle type.
pub struct BlockContainer {
    schema: Arc<AttributeSchema>,
    block_capacity: usize,
    blocks: Vec<AttributeBlock>,
    recycled: Vec<AttributeBlock>,
}

impl BlockContainer {
    /// Create an empty container.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] if `config` is invalid.
    pub fn new(schema: Arc<AttributeSchema>, config: &BlockConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            schema,
            block_capacity: config.block_capacity,
            blocks: Vec::new(),
            recycled: Vec::new(),
        })
    }

    /// The schema fixed at construction.
    pub fn schema(&self) -> &Arc<AttributeSchema> {
        &self.schema
    }

    /// Slots per block.
    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Total live particles across all blocks.
    pub fn count_active(&self) -> usize {
        self.blocks.iter().map(AttributeBlock::active_count).sum()
    }

    /// Whether the container holds no live particle.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(AttributeBlock::is_empty)
    }

    /// Number of owned blocks, empty ones included.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of empty blocks waiting in the recycle pool.
    pub fn recycled_count(&self) -> usize {
        self.recycled.len()
    }

    /// Blocks holding at least one live particle, in creation order.
    ///
    /// The iterator is lazy and can be cloned to restart it.
    pub fn active_blocks(&self) -> impl Iterator<Item = &AttributeBlock> + Clone {
        self.blocks.iter().filter(|b| !b.is_empty())
    }

    /// Mutable access to blocks holding at least one live particle.
    pub fn active_blocks_mut(&mut self) -> impl Iterator<Item = &mut AttributeBlock> {
        self.blocks.iter_mut().filter(|b| !b.is_empty())
    }

    /// Every owned block, in creation order.
    pub fn blocks(&self) -> &[AttributeBlock] {
        &self.blocks
    }

    /// One block by id.
    pub fn block(&self, id: BlockId) -> Option<&AttributeBlock> {
        self.blocks.get(id.0 as usize)
    }

    /// One block by id, mutably.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut AttributeBlock> {
        self.blocks.get_mut(id.0 as usize)
    }

    /// Make sure at least `count` blocks exist.
    pub fn reserve_blocks(&mut self, count: usize) {
        while self.blocks.len() < count {
            let block = self.fresh_block();
            self.blocks.push(block);
        }
    }

    /// Allocate `n` particle slots, reset to attribute defaults.
    ///
    /// Existing blocks are filled first-fit in creation order; the rest goes
    /// into new blocks, recycled ones first. The returned ranges are valid
    /// until the next call that removes particles or restructures blocks.
    pub fn new_particles(&mut self, n: usize) -> SlotRanges {
        let mut ranges = SlotRanges::new();
        let mut remaining = n;

        for (index, block) in self.blocks.iter_mut().enumerate() {
            if remaining == 0 {
                break;
            }
            let slots = block.try_allocate_slots(remaining);
            if !slots.is_empty() {
                remaining -= slots.len();
                ranges.push(SlotRange {
                    block: BlockId(index as u32),
                    start: slots.start,
                    end: slots.end,
                });
            }
        }

        while remaining > 0 {
            let mut block = self.fresh_block();
            let slots = block.try_allocate_slots(remaining);
            remaining -= slots.len();
            ranges.push(SlotRange {
                block: BlockId(self.blocks.len() as u32),
                start: slots.start,
                end: slots.end,
            });
            self.blocks.push(block);
        }

        ranges
    }

    /// Allocate `n` particles and let `init` populate each new slot range.
    ///
    /// Returns the ranges that were handed to `init`.
    pub fn new_particles_with<F>(&mut self, n: usize, mut init: F) -> SlotRanges
    where
        F: FnMut(&mut AttributeBlock, Range<usize>),
    {
        let ranges = self.new_particles(n);
        for range in &ranges {
            init(&mut self.blocks[range.block.0 as usize], range.slots());
        }
        ranges
    }

    /// Remove one particle by swap-remove within its block.
    ///
    /// Returns the slot index of the particle that was moved into the hole,
    /// if any.
    ///
    /// # Panics
    ///
    /// Panics if the block does not exist or the slot is not live.
    #[track_caller]
    pub fn remove_particle(&mut self, block: BlockId, slot: usize) -> Option<usize> {
        self.expect_block_mut(block).deallocate_slot(slot)
    }

    /// Remove several particles of one block.
    ///
    /// # Panics
    ///
    /// Panics if the block does not exist, or on a duplicate or non-live slot.
    #[track_caller]
    pub fn remove_particles(&mut self, block: BlockId, slots: &mut [usize]) {
        self.expect_block_mut(block).deallocate_slots(slots);
    }

    /// Keep only particles whose `name` attribute satisfies `keep`.
    ///
    /// Returns the number of removed particles.
    ///
    /// # Panics
    ///
    /// Panics if `name` is unknown or not of type `T`.
    #[track_caller]
    pub fn retain<T, F>(&mut self, name: &str, mut keep: F) -> usize
    where
        T: AttributeValue,
        F: FnMut(&T) -> bool,
    {
        self.schema.expect_index(name);
        let mut removed = 0;
        let mut doomed = Vec::new();
        for block in self.blocks.iter_mut().filter(|b| !b.is_empty()) {
            doomed.clear();
            doomed.extend(
                block
                    .attribute::<T>(name)
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !keep(*v))
                    .map(|(i, _)| i),
            );
            removed += doomed.len();
            block.deallocate_slots(&mut doomed);
        }
        removed
    }

    /// Pack particles into as few blocks as possible.
    ///
    /// Particles are moved from the tail of trailing blocks into free slots
    /// of earlier blocks until at most one block is partially filled; empty
    /// blocks are then released to the recycle pool. This changes the
    /// canonical order. Returns the number of particles moved.
    pub fn compact(&mut self) -> usize {
        let mut moved = 0;
        if self.blocks.len() > 1 {
            let mut front = 0;
            let mut back = self.blocks.len() - 1;
            loop {
                while front < back && self.blocks[front].is_full() {
                    front += 1;
                }
                while front < back && self.blocks[back].is_empty() {
                    back -= 1;
                }
                if front >= back {
                    break;
                }
                let (head, tail) = self.blocks.split_at_mut(back);
                moved += head[front].move_particles_from(&mut tail[0], usize::MAX);
            }
        }
        let released = self.release_empty_blocks();
        tracing::trace!(moved, released, "compacted container");
        moved
    }

    /// Move every empty block to the recycle pool.
    ///
    /// Returns the number of released blocks. Block ids of the remaining
    /// blocks may change.
    pub fn release_empty_blocks(&mut self) -> usize {
        let before = self.blocks.len();
        let mut kept = Vec::with_capacity(before);
        for block in self.blocks.drain(..) {
            if block.is_empty() {
                self.recycled.push(block);
            } else {
                kept.push(block);
            }
        }
        self.blocks = kept;
        before - self.blocks.len()
    }

    /// Drop the recycle pool, returning its memory.
    pub fn shrink_to_fit(&mut self) {
        self.recycled = Vec::new();
        self.blocks.shrink_to_fit();
    }

    /// Remove every particle; all blocks go to the recycle pool.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
        self.release_empty_blocks();
    }

    /// Flatten attribute `name` into a new vector in canonical order.
    ///
    /// # Panics
    ///
    /// Panics if `name` is unknown or not of type `T`.
    #[track_caller]
    pub fn flatten_attribute<T: AttributeValue>(&self, name: &str) -> Vec<T> {
        flatten::flatten(self, name)
    }

    /// Overwrite attribute `name` of every live particle from `values`, in
    /// canonical order.
    ///
    /// # Errors
    ///
    /// [`FlattenError::SizeMismatch`] if `values.len() != count_active()`.
    #[track_caller]
    pub fn unflatten_attribute<T: AttributeValue>(
        &mut self,
        name: &str,
        values: &[T],
    ) -> Result<(), FlattenError> {
        flatten::unflatten(self, name, values)
    }

    /// Bytes of column storage held by owned and recycled blocks.
    pub fn memory_bytes(&self) -> usize {
        self.blocks
            .iter()
            .chain(self.recycled.iter())
            .map(AttributeBlock::memory_bytes)
            .sum()
    }

    fn fresh_block(&mut self) -> AttributeBlock {
        match self.recycled.pop() {
            Some(mut block) => {
                block.clear();
                tracing::trace!(capacity = self.block_capacity, "reusing recycled block");
                block
            }
            None => {
                tracing::trace!(capacity = self.block_capacity, "allocating block");
                AttributeBlock::new(self.schema.clone(), self.block_capacity)
            }
        }
    }

    #[track_caller]
    fn expect_block_mut(&mut self, id: BlockId) -> &mut AttributeBlock {
        let count = self.blocks.len();
        match self.blocks.get_mut(id.0 as usize) {
            Some(block) => block,
            None => panic!("block {id} does not exist (container has {count} blocks)"),
        }
    }
}
