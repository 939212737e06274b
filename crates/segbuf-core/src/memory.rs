//! Raw memory provider seam.
//!
//! The buffer engine never touches the global allocator directly. Every
//! node block and occupancy field is obtained from a [`MemoryProvider`]
//! and handed back to it when the owning buffer is destroyed. A provider
//! reports failure by returning `None`; the engine turns that into
//! [`BufferError::OutOfMemory`](crate::BufferError::OutOfMemory).

/// An owned, contiguous block of bytes obtained from a [`MemoryProvider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBlock {
    bytes: Box<[u8]>,
}

impl RawBlock {
    /// Fallibly allocate a zero-filled block of `len` bytes from the
    /// global heap.
    ///
    /// Returns `None` instead of aborting when the heap cannot satisfy the
    /// request.
    pub fn zeroed(len: usize) -> Option<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).ok()?;
        bytes.resize(len, 0);
        Some(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Size of the block in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this block holds zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Shared view of the block's bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable view of the block's bytes.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl From<Vec<u8>> for RawBlock {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }
}

/// Source of raw storage for buffer nodes.
///
/// Implementations must return blocks of exactly the requested length.
/// Blocks passed to [`free`](MemoryProvider::free) always originate from
/// the same provider.
pub trait MemoryProvider {
    /// Allocate `bytes` bytes. Contents are unspecified.
    fn allocate(&mut self, bytes: usize) -> Option<RawBlock>;

    /// Allocate `bytes` zero-filled bytes.
    fn allocate_zeroed(&mut self, bytes: usize) -> Option<RawBlock> {
        let mut block = self.allocate(bytes)?;
        block.as_mut_slice().fill(0);
        Some(block)
    }

    /// Return a block to the provider.
    fn free(&mut self, block: RawBlock);
}

/// Default provider backed by the global heap.
///
/// Uses fallible reservation so exhaustion surfaces as `None`. An optional
/// byte limit caps the total outstanding allocation, which makes
/// out-of-memory paths reachable without exhausting the real heap.
#[derive(Clone, Debug, Default)]
pub struct HeapProvider {
    limit: Option<usize>,
    outstanding_bytes: usize,
    outstanding_blocks: usize,
    peak_bytes: usize,
}

impl HeapProvider {
    /// Unlimited heap provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Heap provider that refuses allocations once `limit` bytes are
    /// outstanding.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Configured byte limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes currently handed out and not yet freed.
    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding_bytes
    }

    /// Blocks currently handed out and not yet freed.
    pub fn outstanding_blocks(&self) -> usize {
        self.outstanding_blocks
    }

    /// High-water mark of outstanding bytes.
    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes
    }
}

impl MemoryProvider for HeapProvider {
    fn allocate(&mut self, bytes: usize) -> Option<RawBlock> {
        let total = self.outstanding_bytes.checked_add(bytes)?;
        if self.limit.is_some_and(|limit| total > limit) {
            return None;
        }
        let block = RawBlock::zeroed(bytes)?;
        self.outstanding_bytes = total;
        self.outstanding_blocks += 1;
        self.peak_bytes = self.peak_bytes.max(total);
        Some(block)
    }

    // Heap blocks come back zeroed already.
    fn allocate_zeroed(&mut self, bytes: usize) -> Option<RawBlock> {
        self.allocate(bytes)
    }

    fn free(&mut self, block: RawBlock) {
        self.outstanding_bytes = self.outstanding_bytes.saturating_sub(block.len());
        self.outstanding_blocks = self.outstanding_blocks.saturating_sub(1);
    }
}
