//! Fixed-capacity attribute blocks.
//!
//! An [`AttributeBlock`] holds one column per schema attribute, each
//! `capacity` elements long, and a high-water mark `active_count`. Slots
//! `[0, active_count)` are live; everything above is free. Freeing a slot
//! in the middle swap-removes: the last live particle is moved into the
//! hole so live data stays contiguous. A particle's slot index is therefore
//! only stable until the next removal in its block.

use std::ops::Range;
use std::sync::Arc;

use particula_core::{
    AttributeId, AttributeSchema, AttributeType, AttributeValue, ColumnData, TypedColumn,
};

/// A batch of particles of one type, stored column-wise.
pub struct AttributeBlock {
    schema: Arc<AttributeSchema>,
    columns: Vec<Box<dyn ColumnData>>,
    capacity: usize,
    active: usize,
}

// Compile-time assertion: blocks are shared across flatten worker threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<AttributeBlock>();
};

impl AttributeBlock {
    /// Create an empty block with `capacity` default-initialised slots.
    pub fn new(schema: Arc<AttributeSchema>, capacity: usize) -> Self {
        let columns = schema
            .iter()
            .map(|(_, ty)| ty.new_column(capacity))
            .collect();
        Self {
            schema,
            columns,
            capacity,
            active: 0,
        }
    }

    /// The schema shared with the owning container.
    pub fn schema(&self) -> &Arc<AttributeSchema> {
        &self.schema
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live slots.
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Number of free slots.
    pub fn remaining(&self) -> usize {
        self.capacity - self.active
    }

    /// Whether every slot is live.
    pub fn is_full(&self) -> bool {
        self.active == self.capacity
    }

    /// Whether no slot is live.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Range of live slot indices.
    pub fn active_range(&self) -> Range<usize> {
        0..self.active
    }

    /// Claim one free slot, reset to attribute defaults.
    ///
    /// Returns `None` when the block is full.
    pub fn try_allocate_slot(&mut self) -> Option<usize> {
        let slots = self.try_allocate_slots(1);
        if slots.is_empty() {
            None
        } else {
            Some(slots.start)
        }
    }

    /// Claim up to `n` contiguous free slots, reset to attribute defaults.
    ///
    /// The returned range is shorter than `n` (possibly empty) when the
    /// block does not have enough room.
    pub fn try_allocate_slots(&mut self, n: usize) -> Range<usize> {
        let count = n.min(self.remaining());
        let slots = self.active..self.active + count;
        self.reset_slots(slots.clone());
        self.active += count;
        slots
    }

    fn reset_slots(&mut self, slots: Range<usize>) {
        if slots.is_empty() {
            return;
        }
        for (column, (_, ty)) in self.columns.iter_mut().zip(self.schema.iter()) {
            let bytes = slots.start * ty.size()..slots.end * ty.size();
            ty.fill_default(&mut column.bytes_mut()[bytes]);
        }
    }

    /// Free a live slot by swap-remove.
    ///
    /// If `index` is not the last live slot, the last live particle is moved
    /// into it and its old index is returned.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a live slot.
    #[track_caller]
    pub fn deallocate_slot(&mut self, index: usize) -> Option<usize> {
        assert!(
            index < self.active,
            "slot {index} is not live (active_count = {})",
            self.active,
        );
        let last = self.active - 1;
        let moved = if index != last {
            for (column, (_, ty)) in self.columns.iter_mut().zip(self.schema.iter()) {
                ty.copy_within(column.bytes_mut(), last, index);
            }
            Some(last)
        } else {
            None
        };
        self.active = last;
        moved
    }

    /// Free several live slots.
    ///
    /// Indices are processed in descending order so each swap-remove only
    /// pulls in particles that are not themselves scheduled for removal.
    /// `indices` is sorted in place.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate or non-live index.
    #[track_caller]
    pub fn deallocate_slots(&mut self, indices: &mut [usize]) {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for pair in indices.windows(2) {
            assert!(pair[0] != pair[1], "slot {} freed twice", pair[0]);
        }
        for &index in indices.iter() {
            self.deallocate_slot(index);
        }
    }

    /// Free every slot.
    pub fn clear(&mut self) {
        self.active = 0;
    }

    /// Move up to `n` particles from the end of `other` into free slots of
    /// this block. Returns how many were moved.
    ///
    /// # Panics
    ///
    /// Panics if the two blocks have different schemas.
    pub fn move_particles_from(&mut self, other: &mut AttributeBlock, n: usize) -> usize {
        assert!(
            Arc::ptr_eq(&self.schema, &other.schema) || self.schema == other.schema,
            "cannot move particles between blocks of different schemas"
        );
        let count = n.min(self.remaining()).min(other.active);
        if count == 0 {
            return 0;
        }
        let src = other.active - count..other.active;
        let dst = self.active..self.active + count;
        for ((dst_col, src_col), (_, ty)) in self
            .columns
            .iter_mut()
            .zip(other.columns.iter())
            .zip(self.schema.iter())
        {
            let size = ty.size();
            dst_col.bytes_mut()[dst.start * size..dst.end * size]
                .copy_from_slice(&src_col.bytes()[src.start * size..src.end * size]);
        }
        other.active -= count;
        self.active += count;
        count
    }

    /// Type-erased view of one attribute's live values.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not in the schema.
    #[track_caller]
    pub fn attribute_span(&self, name: &str) -> AttributeSpan<'_> {
        self.span(self.schema.expect_index(name))
    }

    /// Type-erased mutable view of one attribute's live values.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not in the schema.
    #[track_caller]
    pub fn attribute_span_mut(&mut self, name: &str) -> AttributeSpanMut<'_> {
        let id = self.schema.expect_index(name);
        self.span_mut(id)
    }

    /// Type-erased view of the attribute at `id`.
    pub fn span(&self, id: AttributeId) -> AttributeSpan<'_> {
        let (name, ty) = schema_entry(&self.schema, id);
        let bytes = &self.columns[id.0 as usize].bytes()[..self.active * ty.size()];
        AttributeSpan {
            name,
            ty,
            bytes,
            len: self.active,
        }
    }

    /// Type-erased mutable view of the attribute at `id`.
    pub fn span_mut(&mut self, id: AttributeId) -> AttributeSpanMut<'_> {
        let (name, ty) = schema_entry(&self.schema, id);
        let len = self.active;
        let bytes = &mut self.columns[id.0 as usize].bytes_mut()[..len * ty.size()];
        AttributeSpanMut {
            name,
            ty,
            bytes,
            len,
        }
    }

    /// Live values of attribute `name` as `T`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is unknown or its type is not `T`.
    #[track_caller]
    pub fn attribute<T: AttributeValue>(&self, name: &str) -> &[T] {
        let id = self.schema.expect_index(name);
        &self.column::<T>(id, name).as_slice()[..self.active]
    }

    /// Live values of attribute `name` as mutable `T`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is unknown or its type is not `T`.
    #[track_caller]
    pub fn attribute_mut<T: AttributeValue>(&mut self, name: &str) -> &mut [T] {
        let id = self.schema.expect_index(name);
        let active = self.active;
        &mut self.column_mut::<T>(id, name).as_mut_slice()[..active]
    }

    /// Like [`attribute`](Self::attribute), but `None` for an unknown name.
    ///
    /// # Panics
    ///
    /// Still panics if the attribute exists with a type other than `T`.
    #[track_caller]
    pub fn try_attribute<T: AttributeValue>(&self, name: &str) -> Option<&[T]> {
        let id = self.schema.index_of(name)?;
        Some(&self.column::<T>(id, name).as_slice()[..self.active])
    }

    /// Values of attribute `name` in the given slots, mutably.
    ///
    /// Used to populate slots returned by an allocation.
    ///
    /// # Panics
    ///
    /// Panics if `slots` reaches past the live range, or on an unknown
    /// name or type mismatch.
    #[track_caller]
    pub fn slots_mut<T: AttributeValue>(&mut self, name: &str, slots: Range<usize>) -> &mut [T] {
        &mut self.attribute_mut::<T>(name)[slots]
    }

    /// Bytes of heap storage held by this block's columns.
    pub fn memory_bytes(&self) -> usize {
        self.schema.bytes_per_particle() * self.capacity
    }

    #[track_caller]
    fn column<T: AttributeValue>(&self, id: AttributeId, name: &str) -> &TypedColumn<T> {
        match self.columns[id.0 as usize]
            .as_any()
            .downcast_ref::<TypedColumn<T>>()
        {
            Some(column) => column,
            None => type_mismatch::<T>(schema_entry(&self.schema, id).1, name),
        }
    }

    #[track_caller]
    fn column_mut<T: AttributeValue>(
        &mut self,
        id: AttributeId,
        name: &str,
    ) -> &mut TypedColumn<T> {
        let Self { schema, columns, .. } = self;
        match columns[id.0 as usize]
            .as_any_mut()
            .downcast_mut::<TypedColumn<T>>()
        {
            Some(column) => column,
            None => type_mismatch::<T>(schema_entry(schema, id).1, name),
        }
    }
}

fn schema_entry(schema: &AttributeSchema, id: AttributeId) -> (&str, &AttributeType) {
    match schema.get(id) {
        Some(entry) => entry,
        None => panic!("attribute id {id} out of range"),
    }
}

#[track_caller]
fn type_mismatch<T: AttributeValue>(ty: &AttributeType, name: &str) -> ! {
    ty.assert_is::<T>(name);
    unreachable!("column type disagrees with its descriptor for '{name}'")
}

/// Read-only, type-erased view over one attribute's live values in a block.
#[derive(Clone, Copy, Debug)]
pub struct AttributeSpan<'a> {
    name: &'a str,
    ty: &'a AttributeType,
    bytes: &'a [u8],
    len: usize,
}

impl<'a> AttributeSpan<'a> {
    /// The attribute's name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The attribute's type descriptor.
    pub fn attribute_type(&self) -> &'a AttributeType {
        self.ty
    }

    /// Number of elements (equals the block's active count).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw bytes, `len() * attribute_type().size()` long.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Typed view.
    ///
    /// # Panics
    ///
    /// Panics if the attribute is not of type `T`.
    #[track_caller]
    pub fn typed<T: AttributeValue>(&self) -> &'a [T] {
        self.ty.assert_is::<T>(self.name);
        bytemuck::cast_slice(self.bytes)
    }
}

/// Mutable, type-erased view over one attribute's live values in a block.
#[derive(Debug)]
pub struct AttributeSpanMut<'a> {
    name: &'a str,
    ty: &'a AttributeType,
    bytes: &'a mut [u8],
    len: usize,
}

impl AttributeSpanMut<'_> {
    /// The attribute's name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The attribute's type descriptor.
    pub fn attribute_type(&self) -> &AttributeType {
        self.ty
    }

    /// Number of elements (equals the block's active count).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw bytes.
    pub fn bytes(&self) -> &[u8] {
        self.bytes
    }

    /// Raw bytes, mutably.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particula_core::names::{COLOR, POSITION, SIZE};
    use particula_core::{Float3, Rgba};

    fn block(capacity: usize) -> AttributeBlock {
        AttributeBlock::new(Arc::new(AttributeSchema::renderable()), capacity)
    }

    fn fill_positions(block: &mut AttributeBlock) {
        for (i, p) in block.attribute_mut::<Float3>(POSITION).iter_mut().enumerate() {
            *p = Float3::new(i as f32, 0.0, 0.0);
        }
    }

    fn xs(block: &AttributeBlock) -> Vec<f32> {
        block
            .attribute::<Float3>(POSITION)
            .iter()
            .map(|p| p.x)
            .collect()
    }

    #[test]
    fn new_block_is_empty() {
        let b = block(8);
        assert_eq!(b.capacity(), 8);
        assert_eq!(b.active_count(), 0);
        assert!(b.is_empty());
        assert!(b.attribute::<f32>(SIZE).is_empty());
    }

    #[test]
    fn allocate_until_full() {
        let mut b = block(2);
        assert_eq!(b.try_allocate_slot(), Some(0));
        assert_eq!(b.try_allocate_slot(), Some(1));
        assert!(b.is_full());
        assert_eq!(b.try_allocate_slot(), None);
    }

    #[test]
    fn bulk_allocation_is_clamped_to_room() {
        let mut b = block(4);
        assert_eq!(b.try_allocate_slots(3), 0..3);
        assert_eq!(b.try_allocate_slots(3), 3..4);
        assert_eq!(b.try_allocate_slots(3), 4..4);
    }

    #[test]
    fn new_slots_hold_defaults() {
        let mut b = block(4);
        b.try_allocate_slots(2);
        b.attribute_mut::<Rgba>(COLOR)[1] = Rgba::new(1.0, 0.0, 0.0, 1.0);
        b.deallocate_slot(1);
        let slot = b.try_allocate_slot().unwrap();
        assert_eq!(slot, 1);
        assert_eq!(b.attribute::<Rgba>(COLOR)[1], Rgba::WHITE);
    }

    #[test]
    fn deallocate_swap_removes_last_into_hole() {
        let mut b = block(4);
        b.try_allocate_slots(4);
        fill_positions(&mut b);
        b.attribute_mut::<f32>(SIZE).copy_from_slice(&[10.0, 11.0, 12.0, 13.0]);

        assert_eq!(b.deallocate_slot(1), Some(3));
        assert_eq!(xs(&b), vec![0.0, 3.0, 2.0]);
        assert_eq!(b.attribute::<f32>(SIZE), &[10.0, 13.0, 12.0]);

        assert_eq!(b.deallocate_slot(2), None);
        assert_eq!(xs(&b), vec![0.0, 3.0]);
    }

    #[test]
    fn deallocate_many_in_any_order() {
        let mut b = block(8);
        b.try_allocate_slots(8);
        fill_positions(&mut b);
        b.deallocate_slots(&mut [1, 6, 3]);
        let mut remaining = xs(&b);
        remaining.sort_by(f32::total_cmp);
        assert_eq!(remaining, vec![0.0, 2.0, 4.0, 5.0, 7.0]);
    }

    #[test]
    #[should_panic(expected = "freed twice")]
    fn duplicate_free_panics() {
        let mut b = block(4);
        b.try_allocate_slots(4);
        b.deallocate_slots(&mut [2, 2]);
    }

    #[test]
    #[should_panic(expected = "is not live")]
    fn freeing_dead_slot_panics() {
        let mut b = block(4);
        b.try_allocate_slots(2);
        b.deallocate_slot(2);
    }

    #[test]
    #[should_panic(expected = "accessed as float")]
    fn wrong_type_access_panics() {
        let mut b = block(4);
        b.try_allocate_slot();
        let _ = b.attribute::<f32>(POSITION);
    }

    #[test]
    #[should_panic(expected = "unknown attribute")]
    fn unknown_attribute_panics() {
        let b = block(4);
        let _ = b.attribute::<f32>("Mass");
    }

    #[test]
    fn try_attribute_tolerates_unknown_name() {
        let mut b = block(4);
        b.try_allocate_slots(3);
        assert!(b.try_attribute::<f32>("Mass").is_none());
        assert_eq!(b.try_attribute::<f32>(SIZE).map(<[f32]>::len), Some(3));
    }

    #[test]
    fn span_is_length_matched() {
        let mut b = block(16);
        b.try_allocate_slots(5);
        let span = b.attribute_span(POSITION);
        assert_eq!(span.name(), POSITION);
        assert_eq!(span.len(), 5);
        assert_eq!(span.bytes().len(), 5 * 12);
        assert!(span.attribute_type().is::<Float3>());
        assert_eq!(span.typed::<Float3>().len(), 5);
    }

    #[test]
    fn span_mut_writes_through() {
        let mut b = block(4);
        b.try_allocate_slots(2);
        {
            let mut span = b.attribute_span_mut(SIZE);
            span.bytes_mut().copy_from_slice(bytemuck::cast_slice(&[1.5f32, 2.5]));
        }
        assert_eq!(b.attribute::<f32>(SIZE), &[1.5, 2.5]);
    }

    #[test]
    fn move_particles_takes_from_the_end() {
        let schema = Arc::new(AttributeSchema::renderable());
        let mut dst = AttributeBlock::new(schema.clone(), 4);
        let mut src = AttributeBlock::new(schema, 4);
        dst.try_allocate_slots(3);
        src.try_allocate_slots(4);
        fill_positions(&mut src);

        assert_eq!(dst.move_particles_from(&mut src, 10), 1);
        assert_eq!(dst.active_count(), 4);
        assert_eq!(src.active_count(), 3);
        assert_eq!(dst.attribute::<Float3>(POSITION)[3].x, 3.0);
    }

    #[test]
    fn memory_accounts_every_column() {
        let b = block(8);
        assert_eq!(b.memory_bytes(), 8 * (12 + 4 + 16));
        let column_bytes: usize = b.columns.iter().map(|c| c.bytes().len()).sum();
        assert_eq!(b.memory_bytes(), column_bytes);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Alloc,
            Free(usize),
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![Just(Op::Alloc), (0usize..64).prop_map(Op::Free)]
        }

        proptest! {
            #[test]
            fn active_count_tracks_allocs_minus_frees(
                ops in proptest::collection::vec(arb_op(), 0..200),
            ) {
                let mut b = block(32);
                let mut next_tag = 0.0f32;
                let mut expected = Vec::<f32>::new();
                let (mut allocs, mut frees) = (0usize, 0usize);

                for op in ops {
                    match op {
                        Op::Alloc => {
                            if let Some(slot) = b.try_allocate_slot() {
                                b.attribute_mut::<f32>(SIZE)[slot] = next_tag;
                                expected.push(next_tag);
                                next_tag += 1.0;
                                allocs += 1;
                            }
                        }
                        Op::Free(raw) => {
                            if b.active_count() > 0 {
                                let slot = raw % b.active_count();
                                b.deallocate_slot(slot);
                                expected.swap_remove(slot);
                                frees += 1;
                            }
                        }
                    }
                    prop_assert_eq!(b.active_count(), allocs - frees);
                    // Live data is exactly the swap-remove image, with no holes.
                    prop_assert_eq!(b.attribute::<f32>(SIZE), expected.as_slice());
                }
            }
        }
    }
}
