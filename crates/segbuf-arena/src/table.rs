//! Fixed-capacity, generation-checked buffer table.
//!
//! Slots are addressed by a `u16` index. A parallel [`SlotState`] field
//! records which slots own a live [`Buffer`], and a parallel generation
//! array is bumped every time a slot is released, so a [`BufferHandle`]
//! only resolves while the exact binding it was issued for is alive.

use segbuf_core::{BufferError, BufferHandle, HandleKind, Result};

use crate::buffer::Buffer;

/// Occupancy state of a table slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// The slot owns nothing.
    Free,
    /// The slot owns a live buffer.
    Taken,
}

/// Handle-indexed table of live buffers.
#[derive(Debug)]
pub struct BufferTable {
    slots: Vec<Option<Buffer>>,
    field: Vec<SlotState>,
    generations: Vec<u32>,
    live: usize,
}

impl BufferTable {
    /// Create a table with `capacity` free slots.
    pub fn new(capacity: u16) -> Self {
        let capacity = capacity as usize;
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            field: vec![SlotState::Free; capacity],
            generations: vec![0; capacity],
            live: 0,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.field.len()
    }

    /// Number of taken slots.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// State of slot `index`, or `None` if out of range.
    pub fn slot_state(&self, index: u16) -> Option<SlotState> {
        self.field.get(index as usize).copied()
    }

    /// Find a free slot index.
    ///
    /// The scan starts at `live_count / 2` and wraps around the table once,
    /// which keeps new bindings away from the densely packed low slots as
    /// the table fills. Fails with [`BufferError::TableFull`] when every
    /// slot is taken.
    pub fn find_free_handle(&self) -> Result<u16> {
        let capacity = self.capacity();
        let full = BufferError::TableFull { capacity };
        if capacity == 0 {
            return Err(full);
        }
        let start = self.live / 2;
        (0..capacity)
            .map(|step| (start + step) % capacity)
            .find(|&index| self.field[index] == SlotState::Free)
            .map(|index| index as u16)
            .ok_or(full)
    }

    /// Store `buffer` in free slot `index` and return its handle.
    ///
    /// `index` must come from [`find_free_handle`](Self::find_free_handle)
    /// with no binding in between.
    pub fn bind(&mut self, index: u16, buffer: Buffer) -> BufferHandle {
        let at = index as usize;
        debug_assert_eq!(self.field[at], SlotState::Free, "bind into taken slot {index}");
        self.slots[at] = Some(buffer);
        self.field[at] = SlotState::Taken;
        self.live += 1;
        BufferHandle::new(index, self.generations[at])
    }

    /// Shared access to the buffer behind `handle`.
    pub fn resolve(&self, handle: BufferHandle) -> Result<&Buffer> {
        let at = self.check(handle)?;
        self.slots[at].as_ref().ok_or(invalid(handle))
    }

    /// Mutable access to the buffer behind `handle`.
    pub fn resolve_mut(&mut self, handle: BufferHandle) -> Result<&mut Buffer> {
        let at = self.check(handle)?;
        self.slots[at].as_mut().ok_or(invalid(handle))
    }

    /// Unbind `handle`, mark its slot free, and hand the buffer back.
    ///
    /// The slot's generation is bumped, so `handle` and any copies of it
    /// stop resolving immediately.
    pub fn release(&mut self, handle: BufferHandle) -> Result<Buffer> {
        let at = self.check(handle)?;
        let buffer = self.slots[at].take().ok_or(invalid(handle))?;
        self.field[at] = SlotState::Free;
        self.generations[at] = self.generations[at].wrapping_add(1);
        self.live -= 1;
        Ok(buffer)
    }

    /// Handles of every live buffer, in slot order.
    pub fn handles(&self) -> impl Iterator<Item = BufferHandle> + '_ {
        self.field
            .iter()
            .enumerate()
            .filter(|&(_, &state)| state == SlotState::Taken)
            .map(|(at, _)| BufferHandle::new(at as u16, self.generations[at]))
    }

    fn check(&self, handle: BufferHandle) -> Result<usize> {
        let at = handle.index() as usize;
        match self.field.get(at) {
            Some(SlotState::Taken) if self.generations[at] == handle.generation() => Ok(at),
            _ => Err(invalid(handle)),
        }
    }
}

fn invalid(handle: BufferHandle) -> BufferError {
    BufferError::InvalidHandle {
        kind: HandleKind::Buffer,
        index: u32::from(handle.index()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeAllocator;
    use segbuf_core::{BehaviorHandle, BufferBehavior, HeapProvider};

    fn buffer() -> Buffer {
        let behavior = BufferBehavior::new("t", 1, 1, 1, 1).unwrap();
        let mut alloc = NodeAllocator::new(HeapProvider::new());
        Buffer::new(BehaviorHandle(0), alloc.allocate_node(&behavior, 0).unwrap())
    }

    fn bind_next(table: &mut BufferTable) -> BufferHandle {
        let index = table.find_free_handle().unwrap();
        table.bind(index, buffer())
    }

    #[test]
    fn empty_table_starts_at_zero() {
        let table = BufferTable::new(8);
        assert_eq!(table.find_free_handle().unwrap(), 0);
        assert_eq!(table.live_count(), 0);
        assert_eq!(table.capacity(), 8);
    }

    #[test]
    fn scan_starts_at_half_live_count() {
        let mut table = BufferTable::new(8);
        for _ in 0..4 {
            let _ = bind_next(&mut table);
        }
        // Slots 0..4 taken; scan from 2 finds 4.
        assert_eq!(table.find_free_handle().unwrap(), 4);
        let h0 = BufferHandle::new(0, 0);
        table.release(h0).unwrap();
        // live = 3, scan from 1: slots 1..4 taken, 4 is free.
        assert_eq!(table.find_free_handle().unwrap(), 4);
    }

    #[test]
    fn scan_wraps_to_low_slots() {
        let mut table = BufferTable::new(4);
        let handles: Vec<_> = (0..4).map(|_| bind_next(&mut table)).collect();
        table.release(handles[0]).unwrap();
        // live = 3, scan from 1 wraps around to 0.
        assert_eq!(table.find_free_handle().unwrap(), 0);
    }

    #[test]
    fn full_table_reports_table_full() {
        let mut table = BufferTable::new(2);
        let _ = bind_next(&mut table);
        let _ = bind_next(&mut table);
        assert_eq!(
            table.find_free_handle().unwrap_err(),
            BufferError::TableFull { capacity: 2 }
        );
    }

    #[test]
    fn zero_capacity_table_is_full() {
        assert!(BufferTable::new(0).find_free_handle().is_err());
    }

    #[test]
    fn released_handle_is_stale_after_reuse() {
        let mut table = BufferTable::new(1);
        let first = bind_next(&mut table);
        table.release(first).unwrap();
        let second = bind_next(&mut table);
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(matches!(
            table.resolve(first),
            Err(BufferError::InvalidHandle { kind: HandleKind::Buffer, .. })
        ));
        assert!(table.resolve(second).is_ok());
    }

    #[test]
    fn out_of_range_and_free_slots_do_not_resolve() {
        let table = BufferTable::new(2);
        assert!(table.resolve(BufferHandle::new(0, 0)).is_err());
        assert!(table.resolve(BufferHandle::new(9, 0)).is_err());
    }

    #[test]
    fn double_release_fails() {
        let mut table = BufferTable::new(2);
        let h = bind_next(&mut table);
        table.release(h).unwrap();
        assert!(table.release(h).is_err());
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn handles_lists_live_bindings() {
        let mut table = BufferTable::new(4);
        let a = bind_next(&mut table);
        let b = bind_next(&mut table);
        table.release(a).unwrap();
        assert_eq!(table.handles().collect::<Vec<_>>(), vec![b]);
        assert_eq!(table.slot_state(a.index()), Some(SlotState::Free));
        assert_eq!(table.slot_state(b.index()), Some(SlotState::Taken));
    }
}
