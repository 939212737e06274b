//! Bit-packed slot occupancy for a single node.
//!
//! One bit per element slot, least-significant bit first within each byte
//! (slot `i` lives at byte `i / 8`, bit `i % 8`). The backing bytes come
//! from the memory provider like any other node storage. Free-slot search
//! reads the bytes 64 bits at a time and starts from a hint word, so a node
//! that fills front to back never rescans its full prefix.

use segbuf_core::RawBlock;

/// Occupancy field for one node's element slots.
#[derive(Debug)]
pub struct OccupancyBitmap {
    bits: RawBlock,
    capacity: u32,
    occupied: u32,
    /// Lowest 64-bit word that may contain a clear bit.
    hint: usize,
}

impl OccupancyBitmap {
    /// Bytes of backing storage needed for `capacity` slots.
    pub fn bytes_for(capacity: u32) -> usize {
        (capacity as usize).div_ceil(8)
    }

    /// Wrap a zero-filled block as an all-free bitmap of `capacity` slots.
    ///
    /// The block must be exactly [`bytes_for(capacity)`](Self::bytes_for)
    /// bytes long.
    pub fn new(bits: RawBlock, capacity: u32) -> Self {
        debug_assert_eq!(bits.len(), Self::bytes_for(capacity));
        Self {
            bits,
            capacity,
            occupied: 0,
            hint: 0,
        }
    }

    /// Number of slots tracked.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> u32 {
        self.occupied
    }

    /// Whether every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.occupied == self.capacity
    }

    /// Whether slot `slot` is occupied. Out-of-range slots read as free.
    pub fn get(&self, slot: u32) -> bool {
        if slot >= self.capacity {
            return false;
        }
        let byte = self.bits.as_slice()[(slot / 8) as usize];
        byte & (1 << (slot % 8)) != 0
    }

    /// Mark `slot` occupied. Returns `false` if it already was.
    pub fn set(&mut self, slot: u32) -> bool {
        if slot >= self.capacity || self.get(slot) {
            return false;
        }
        self.bits.as_mut_slice()[(slot / 8) as usize] |= 1 << (slot % 8);
        self.occupied += 1;
        true
    }

    /// Mark `slot` free. Returns `false` if it already was.
    pub fn clear(&mut self, slot: u32) -> bool {
        if !self.get(slot) {
            return false;
        }
        self.bits.as_mut_slice()[(slot / 8) as usize] &= !(1 << (slot % 8));
        self.occupied -= 1;
        self.hint = self.hint.min(slot as usize / 64);
        true
    }

    /// Lowest free slot, if any.
    pub fn first_free(&self) -> Option<u32> {
        self.scan().map(|(_, slot)| slot)
    }

    /// Find the lowest free slot and mark it occupied.
    pub fn claim_first_free(&mut self) -> Option<u32> {
        let (word, slot) = self.scan()?;
        self.hint = word;
        self.set(slot);
        Some(slot)
    }

    /// Iterate over occupied slot numbers in ascending order.
    pub fn iter_occupied(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.capacity).filter(move |&slot| self.get(slot))
    }

    /// Give the backing block back, for return to the provider.
    pub fn into_block(self) -> RawBlock {
        self.bits
    }

    fn scan(&self) -> Option<(usize, u32)> {
        if self.is_full() {
            return None;
        }
        let bytes = self.bits.as_slice();
        for (word_index, chunk) in bytes.chunks(8).enumerate().skip(self.hint) {
            let mut raw = [0u8; 8];
            raw[..chunk.len()].copy_from_slice(chunk);
            let word = u64::from_le_bytes(raw);
            if word != u64::MAX {
                let slot = word_index as u64 * 64 + u64::from((!word).trailing_zeros());
                // Padding bits past capacity are never set, so a clear bit
                // beyond it means the tail is full.
                return (slot < u64::from(self.capacity)).then_some((word_index, slot as u32));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(capacity: u32) -> OccupancyBitmap {
        let block = RawBlock::zeroed(OccupancyBitmap::bytes_for(capacity)).unwrap();
        OccupancyBitmap::new(block, capacity)
    }

    #[test]
    fn bytes_for_rounds_up() {
        assert_eq!(OccupancyBitmap::bytes_for(1), 1);
        assert_eq!(OccupancyBitmap::bytes_for(8), 1);
        assert_eq!(OccupancyBitmap::bytes_for(9), 2);
        assert_eq!(OccupancyBitmap::bytes_for(64), 8);
    }

    #[test]
    fn fresh_bitmap_is_empty() {
        let bm = bitmap(10);
        assert_eq!(bm.occupied(), 0);
        assert_eq!(bm.first_free(), Some(0));
        assert!(!bm.is_full());
    }

    #[test]
    fn claim_fills_in_order_then_stops() {
        let mut bm = bitmap(5);
        for expected in 0..5 {
            assert_eq!(bm.claim_first_free(), Some(expected));
        }
        assert!(bm.is_full());
        assert_eq!(bm.claim_first_free(), None);
    }

    #[test]
    fn clear_makes_slot_reclaimable() {
        let mut bm = bitmap(100);
        for _ in 0..100 {
            bm.claim_first_free().unwrap();
        }
        assert!(bm.clear(70));
        assert!(bm.clear(3));
        assert_eq!(bm.claim_first_free(), Some(3));
        assert_eq!(bm.claim_first_free(), Some(70));
        assert_eq!(bm.claim_first_free(), None);
    }

    #[test]
    fn set_and_clear_report_transitions() {
        let mut bm = bitmap(8);
        assert!(bm.set(2));
        assert!(!bm.set(2));
        assert!(bm.clear(2));
        assert!(!bm.clear(2));
        assert!(!bm.set(8));
    }

    #[test]
    fn padding_bits_never_reported_free() {
        let mut bm = bitmap(65);
        for _ in 0..65 {
            bm.claim_first_free().unwrap();
        }
        assert_eq!(bm.first_free(), None);
    }

    #[test]
    fn iter_occupied_lists_set_bits() {
        let mut bm = bitmap(20);
        bm.set(1);
        bm.set(9);
        bm.set(19);
        assert_eq!(bm.iter_occupied().collect::<Vec<_>>(), vec![1, 9, 19]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn first_free_matches_linear_scan(
                capacity in 1u32..300,
                ops in proptest::collection::vec((any::<bool>(), 0u32..300), 0..400),
            ) {
                let mut bm = bitmap(capacity);
                let mut model = vec![false; capacity as usize];
                for (claim, slot) in ops {
                    if claim {
                        let got = bm.claim_first_free();
                        let want = model.iter().position(|&b| !b).map(|i| i as u32);
                        prop_assert_eq!(got, want);
                        if let Some(s) = want {
                            model[s as usize] = true;
                        }
                    } else if slot < capacity {
                        bm.clear(slot);
                        model[slot as usize] = false;
                    }
                }
                let occupied = model.iter().filter(|&&b| b).count() as u32;
                prop_assert_eq!(bm.occupied(), occupied);
            }
        }
    }
}
