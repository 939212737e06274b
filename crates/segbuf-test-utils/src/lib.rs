//! Test utilities and mock memory providers for segbuf development.
//!
//! Provides [`MemoryProvider`] implementations that fail on demand, so
//! out-of-memory paths can be driven deterministically, plus a handful of
//! standard behaviors used across the test suites.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use segbuf_core::{MemoryProvider, RawBlock};

/// Provider that succeeds for a fixed number of allocations, then refuses
/// every request until [`reset`](FailAfterProvider::reset) is called.
///
/// Tracks outstanding blocks and bytes so tests can assert that error
/// paths returned everything they took.
#[derive(Debug, Default)]
pub struct FailAfterProvider {
    remaining: usize,
    outstanding_bytes: usize,
    outstanding_blocks: usize,
    refused: usize,
}

impl FailAfterProvider {
    pub fn new(successes: usize) -> Self {
        Self {
            remaining: successes,
            ..Self::default()
        }
    }

    /// Allow `successes` more allocations.
    pub fn reset(&mut self, successes: usize) {
        self.remaining = successes;
    }

    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding_bytes
    }

    pub fn outstanding_blocks(&self) -> usize {
        self.outstanding_blocks
    }

    /// Number of allocations refused so far.
    pub fn refused(&self) -> usize {
        self.refused
    }
}

impl MemoryProvider for FailAfterProvider {
    fn allocate(&mut self, bytes: usize) -> Option<RawBlock> {
        if self.remaining == 0 {
            self.refused += 1;
            return None;
        }
        let block = RawBlock::zeroed(bytes)?;
        self.remaining -= 1;
        self.outstanding_bytes += bytes;
        self.outstanding_blocks += 1;
        Some(block)
    }

    fn free(&mut self, block: RawBlock) {
        self.outstanding_bytes -= block.len();
        self.outstanding_blocks -= 1;
    }
}

/// Provider that hands out dirty (0xA5-filled) blocks.
///
/// Used to check that occupancy fields are always requested zeroed and
/// that no code path relies on `allocate` returning clean memory.
#[derive(Debug, Default)]
pub struct DirtyProvider {
    outstanding_blocks: usize,
}

impl DirtyProvider {
    /// Fill byte for every block handed out.
    pub const FILL: u8 = 0xA5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn outstanding_blocks(&self) -> usize {
        self.outstanding_blocks
    }
}

impl MemoryProvider for DirtyProvider {
    fn allocate(&mut self, bytes: usize) -> Option<RawBlock> {
        let mut block = RawBlock::zeroed(bytes)?;
        block.as_mut_slice().fill(Self::FILL);
        self.outstanding_blocks += 1;
        Some(block)
    }

    fn free(&mut self, _block: RawBlock) {
        self.outstanding_blocks -= 1;
    }
}
