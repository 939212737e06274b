//! Buffer nodes and the allocator that materialises them.
//!
//! A [`BufferNode`] is one fixed-size segment of a buffer: a contiguous
//! element block plus its occupancy bitmap, covering an inclusive range of
//! global element indices. Nodes are never resized or moved between
//! buffers. The [`NodeAllocator`] owns the [`MemoryProvider`] and is the
//! only place raw storage is requested or returned.

use segbuf_core::{BufferBehavior, BufferError, MemoryProvider, RawBlock, Result};
use tracing::warn;

use crate::bitmap::OccupancyBitmap;

/// Position of a node within its buffer's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u16);

/// One contiguous segment of a buffer's storage.
#[derive(Debug)]
pub struct BufferNode {
    order: u16,
    index_start: u64,
    index_end: u64,
    block: RawBlock,
    occupancy: OccupancyBitmap,
    bytes_allocated: usize,
    elements_allocated: u32,
    pub(crate) next: Option<NodeIndex>,
}

impl BufferNode {
    /// 0-based position in the chain.
    pub fn order(&self) -> u16 {
        self.order
    }

    /// First global element index covered by this node.
    pub fn index_start(&self) -> u64 {
        self.index_start
    }

    /// Last global element index covered by this node (inclusive).
    pub fn index_end(&self) -> u64 {
        self.index_end
    }

    /// Size of the element block in bytes.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    /// Element capacity of this node.
    pub fn elements_allocated(&self) -> u32 {
        self.elements_allocated
    }

    /// Next node in the chain.
    pub fn next(&self) -> Option<NodeIndex> {
        self.next
    }

    /// Occupancy state of this node's slots.
    pub fn occupancy(&self) -> &OccupancyBitmap {
        &self.occupancy
    }

    /// Whether `index` falls in `[index_start, index_end]`.
    pub fn contains(&self, index: u64) -> bool {
        (self.index_start..=self.index_end).contains(&index)
    }

    /// Bytes of the element at in-node `offset`.
    pub fn slot(&self, offset: u32, element_size: usize) -> &[u8] {
        let start = offset as usize * element_size;
        &self.block.as_slice()[start..start + element_size]
    }

    /// Mutable bytes of the element at in-node `offset`.
    pub fn slot_mut(&mut self, offset: u32, element_size: usize) -> &mut [u8] {
        let start = offset as usize * element_size;
        &mut self.block.as_mut_slice()[start..start + element_size]
    }

    /// Claim the first free slot, copy `data` into it, and return its
    /// global index. `None` if the node is full.
    pub(crate) fn claim_slot(&mut self, data: &[u8]) -> Option<u64> {
        let offset = self.occupancy.claim_first_free()?;
        self.slot_mut(offset, data.len()).copy_from_slice(data);
        Some(self.index_start + u64::from(offset))
    }

    /// Clear the occupancy bit at in-node `offset`.
    pub(crate) fn release_slot(&mut self, offset: u32) -> bool {
        self.occupancy.clear(offset)
    }

    /// Global indices of occupied slots in this node.
    pub fn occupied_indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.occupancy
            .iter_occupied()
            .map(move |offset| self.index_start + u64::from(offset))
    }
}

/// Allocates and frees node storage through a [`MemoryProvider`].
#[derive(Debug)]
pub struct NodeAllocator<P> {
    provider: P,
    live_nodes: usize,
}

impl<P: MemoryProvider> NodeAllocator<P> {
    /// Wrap a provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            live_nodes: 0,
        }
    }

    /// Allocate the node at `order` for a buffer of `behavior`.
    ///
    /// The element block is filled with the behavior's element default, or
    /// zeroed when it has none. The occupancy field is always zeroed, so
    /// every slot starts free. If the occupancy allocation fails, the block
    /// already obtained is returned to the provider before the error is
    /// propagated.
    pub fn allocate_node(&mut self, behavior: &BufferBehavior, order: u16) -> Result<BufferNode> {
        let capacity = behavior.node_capacity(order);
        let (index_start, index_end) = behavior.node_range(order);

        let bytes = (capacity as usize)
            .checked_mul(behavior.element_size())
            .ok_or(BufferError::OutOfMemory {
                requested: usize::MAX,
            })?;

        let block = match behavior.element_default() {
            Some(pattern) => self.provider.allocate(bytes).map(|mut block| {
                for slot in block.as_mut_slice().chunks_exact_mut(pattern.len()) {
                    slot.copy_from_slice(pattern);
                }
                block
            }),
            None => self.provider.allocate_zeroed(bytes),
        };
        let Some(block) = block else {
            warn!(behavior = behavior.name(), order, bytes, "node block allocation refused");
            return Err(BufferError::OutOfMemory { requested: bytes });
        };

        let field_bytes = OccupancyBitmap::bytes_for(capacity);
        let Some(field) = self.provider.allocate_zeroed(field_bytes) else {
            self.provider.free(block);
            warn!(
                behavior = behavior.name(),
                order,
                bytes = field_bytes,
                "node occupancy allocation refused"
            );
            return Err(BufferError::OutOfMemory {
                requested: field_bytes,
            });
        };

        self.live_nodes += 1;
        Ok(BufferNode {
            order,
            index_start,
            index_end,
            block,
            occupancy: OccupancyBitmap::new(field, capacity),
            bytes_allocated: bytes,
            elements_allocated: capacity,
            next: None,
        })
    }

    /// Return a node's block and occupancy field to the provider.
    pub fn free_node(&mut self, node: BufferNode) {
        let BufferNode {
            block, occupancy, ..
        } = node;
        self.provider.free(block);
        self.provider.free(occupancy.into_block());
        self.live_nodes -= 1;
    }

    /// Nodes allocated and not yet freed.
    pub fn live_nodes(&self) -> usize {
        self.live_nodes
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub(crate) fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Give the provider back.
    pub fn into_provider(self) -> P {
        self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segbuf_core::{BehaviorBuilder, HeapProvider};

    fn behavior() -> BufferBehavior {
        BufferBehavior::new("node-test", 4, 4, 2, 4).unwrap()
    }

    #[test]
    fn first_node_uses_initial_capacity() {
        let mut alloc = NodeAllocator::new(HeapProvider::new());
        let node = alloc.allocate_node(&behavior(), 0).unwrap();
        assert_eq!(node.order(), 0);
        assert_eq!(node.elements_allocated(), 4);
        assert_eq!(node.bytes_allocated(), 16);
        assert_eq!((node.index_start(), node.index_end()), (0, 3));
        assert_eq!(node.occupancy().occupied(), 0);
        assert!(node.next().is_none());
    }

    #[test]
    fn later_nodes_use_step_capacity() {
        let mut alloc = NodeAllocator::new(HeapProvider::new());
        let node = alloc.allocate_node(&behavior(), 2).unwrap();
        assert_eq!(node.elements_allocated(), 2);
        assert_eq!((node.index_start(), node.index_end()), (6, 7));
        assert_eq!(
            node.index_end() - node.index_start() + 1,
            u64::from(node.elements_allocated())
        );
    }

    #[test]
    fn free_returns_all_bytes() {
        let mut alloc = NodeAllocator::new(HeapProvider::new());
        let node = alloc.allocate_node(&behavior(), 0).unwrap();
        // 16 block bytes + 1 occupancy byte.
        assert_eq!(alloc.provider().outstanding_bytes(), 17);
        assert_eq!(alloc.live_nodes(), 1);
        alloc.free_node(node);
        assert_eq!(alloc.provider().outstanding_bytes(), 0);
        assert_eq!(alloc.live_nodes(), 0);
    }

    #[test]
    fn block_failure_is_out_of_memory() {
        let mut alloc = NodeAllocator::new(HeapProvider::with_limit(8));
        let result = alloc.allocate_node(&behavior(), 0);
        assert_eq!(result.unwrap_err(), BufferError::OutOfMemory { requested: 16 });
        assert_eq!(alloc.live_nodes(), 0);
    }

    #[test]
    fn field_failure_returns_block_to_provider() {
        // Room for the 16-byte block but not the occupancy byte.
        let mut alloc = NodeAllocator::new(HeapProvider::with_limit(16));
        let result = alloc.allocate_node(&behavior(), 0);
        assert_eq!(result.unwrap_err(), BufferError::OutOfMemory { requested: 1 });
        assert_eq!(alloc.provider().outstanding_bytes(), 0);
        assert_eq!(alloc.provider().outstanding_blocks(), 0);
    }

    #[test]
    fn element_default_fills_block() {
        let b = BehaviorBuilder::new("filled", 2)
            .initial(3)
            .element_default(vec![0xBEu8, 0xEF])
            .build()
            .unwrap();
        let mut alloc = NodeAllocator::new(HeapProvider::new());
        let node = alloc.allocate_node(&b, 0).unwrap();
        for offset in 0..3 {
            assert_eq!(node.slot(offset, 2), &[0xBE, 0xEF]);
        }
    }

    #[test]
    fn claim_and_release_slot() {
        let mut alloc = NodeAllocator::new(HeapProvider::new());
        let mut node = alloc.allocate_node(&behavior(), 1).unwrap();
        assert_eq!(node.claim_slot(&[1, 2, 3, 4]), Some(4));
        assert_eq!(node.claim_slot(&[5, 6, 7, 8]), Some(5));
        assert_eq!(node.claim_slot(&[0, 0, 0, 0]), None);
        assert_eq!(node.slot(1, 4), &[5, 6, 7, 8]);
        assert!(node.release_slot(0));
        assert_eq!(node.occupied_indices().collect::<Vec<_>>(), vec![5]);
    }
}
