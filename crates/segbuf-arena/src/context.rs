//! The buffer engine: one owned context holding every table.
//!
//! [`BufferContext`] is the single entry point for behavior registration
//! and buffer operations. It owns the [`BehaviorRegistry`], the
//! [`BufferTable`], and the [`NodeAllocator`] (and through it the memory
//! provider). Creating the context brings the subsystem up; consuming it
//! with [`BufferContext::shutdown`] tears it down and returns every
//! outstanding node to the provider.
//!
//! Structural operations take `&mut self`. Element references returned by
//! [`get_element`](BufferContext::get_element) and
//! [`get_element_mut`](BufferContext::get_element_mut) borrow the context,
//! so they cannot outlive the next add, remove, or destroy.

use segbuf_core::{
    BehaviorHandle, BufferBehavior, BufferError, BufferHandle, HeapProvider, LimitKind,
    MemoryProvider, Result,
};
use tracing::{debug, trace, warn};

use crate::buffer::Buffer;
use crate::config::EngineConfig;
use crate::node::NodeAllocator;
use crate::registry::BehaviorRegistry;
use crate::table::BufferTable;

/// Point-in-time accounting for one buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferStats {
    /// Behavior the buffer was created from.
    pub behavior: BehaviorHandle,
    /// Nodes in the chain.
    pub num_nodes: u16,
    /// Addressable element slots.
    pub num_elements: u64,
    /// Bytes of element storage.
    pub num_bytes: usize,
    /// Slots currently holding a live element.
    pub occupied: u64,
}

/// What [`BufferContext::shutdown`] released.
#[derive(Debug)]
pub struct ShutdownReport<P> {
    /// Buffers that were still alive at shutdown.
    pub buffers_freed: usize,
    /// Nodes returned to the provider.
    pub nodes_freed: usize,
    /// Element-storage bytes returned to the provider.
    pub bytes_freed: usize,
    /// The provider, with every node block returned to it.
    pub provider: P,
}

/// Owned state of the segmented buffer subsystem.
///
/// Dropping a context without calling [`shutdown`](Self::shutdown) still
/// releases its memory, but bypasses the provider's `free`.
#[derive(Debug)]
pub struct BufferContext<P = HeapProvider> {
    config: EngineConfig,
    registry: BehaviorRegistry,
    table: BufferTable,
    nodes: NodeAllocator<P>,
}

impl BufferContext<HeapProvider> {
    /// Bring up a context backed by the global heap.
    ///
    /// Honors [`EngineConfig::memory_limit`].
    pub fn init(config: EngineConfig) -> Result<Self> {
        let provider = match config.memory_limit {
            Some(limit) => HeapProvider::with_limit(limit),
            None => HeapProvider::new(),
        };
        Self::init_with_provider(config, provider)
    }
}

impl<P: MemoryProvider> BufferContext<P> {
    /// Bring up a context that draws node storage from `provider`.
    pub fn init_with_provider(config: EngineConfig, provider: P) -> Result<Self> {
        config.validate()?;
        debug!(
            behaviors_max = config.behaviors_max,
            buffers_max = config.buffers_max,
            "buffer context initialised"
        );
        Ok(Self {
            registry: BehaviorRegistry::new(config.behaviors_max),
            table: BufferTable::new(config.buffers_max),
            nodes: NodeAllocator::new(provider),
            config,
        })
    }

    /// Destroy every live buffer and hand the provider back.
    pub fn shutdown(mut self) -> ShutdownReport<P> {
        let handles: Vec<BufferHandle> = self.table.handles().collect();
        let mut nodes_freed = 0;
        let mut bytes_freed = 0;
        for handle in &handles {
            if let Ok(buffer) = self.table.release(*handle) {
                nodes_freed += usize::from(buffer.num_nodes());
                bytes_freed += buffer.num_bytes();
                self.free_buffer(buffer);
            }
        }
        debug!(
            buffers = handles.len(),
            nodes = nodes_freed,
            bytes = bytes_freed,
            "buffer context shut down"
        );
        ShutdownReport {
            buffers_freed: handles.len(),
            nodes_freed,
            bytes_freed,
            provider: self.nodes.into_provider(),
        }
    }

    /// Register a behavior from its parameters.
    pub fn register_behavior(
        &mut self,
        name: &str,
        element_size: usize,
        initial_capacity: u32,
        step_capacity: u32,
        max_nodes: u16,
    ) -> Result<BehaviorHandle> {
        let handle = self.registry.register(
            name,
            element_size,
            initial_capacity,
            step_capacity,
            max_nodes,
        )?;
        debug!(behavior = %handle, name, element_size, "behavior registered");
        Ok(handle)
    }

    /// Register a copy of a fully formed behavior template.
    pub fn register_behavior_from_template(
        &mut self,
        template: BufferBehavior,
    ) -> Result<BehaviorHandle> {
        let handle = self.registry.register_template(template)?;
        debug!(behavior = %handle, "behavior registered from template");
        Ok(handle)
    }

    /// Read-only view of a registered behavior.
    pub fn behavior(&self, handle: BehaviorHandle) -> Result<&BufferBehavior> {
        self.registry.lookup(handle)
    }

    /// First behavior registered under `name`.
    pub fn find_behavior(&self, name: &str) -> Option<BehaviorHandle> {
        self.registry.find(name)
    }

    /// Create an empty buffer of `behavior` with its first node allocated.
    ///
    /// Nothing is bound unless every step succeeds: a refused node
    /// allocation leaves the table untouched.
    pub fn create_buffer(&mut self, behavior: BehaviorHandle) -> Result<BufferHandle> {
        let template = self.registry.lookup(behavior)?;
        let slot = self.table.find_free_handle().inspect_err(|_| {
            warn!(behavior = %behavior, capacity = self.table.capacity(), "buffer table full");
        })?;
        let first = self.nodes.allocate_node(template, 0)?;
        let handle = self.table.bind(slot, Buffer::new(behavior, first));
        debug!(buffer = %handle, behavior = %behavior, "buffer created");
        Ok(handle)
    }

    /// Free every node of `handle`'s buffer and release its slot.
    pub fn destroy_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        let buffer = self.table.release(handle)?;
        debug!(buffer = %handle, nodes = buffer.num_nodes(), "buffer destroyed");
        self.free_buffer(buffer);
        Ok(())
    }

    /// Storage of element `index`.
    ///
    /// Occupancy is not checked: an unoccupied slot yields whatever bytes
    /// it currently holds.
    pub fn get_element(&self, handle: BufferHandle, index: u64) -> Result<&[u8]> {
        let buffer = self.table.resolve(handle)?;
        let element_size = self.registry.lookup(buffer.behavior())?.element_size();
        let (at, offset) = buffer.locate(index)?;
        let node = buffer.node(at).ok_or(BufferError::IndexOutOfRange {
            index,
            len: buffer.num_elements(),
        })?;
        Ok(node.slot(offset, element_size))
    }

    /// Mutable storage of element `index`. Same rules as
    /// [`get_element`](Self::get_element).
    pub fn get_element_mut(&mut self, handle: BufferHandle, index: u64) -> Result<&mut [u8]> {
        let buffer = self.table.resolve_mut(handle)?;
        let element_size = self.registry.lookup(buffer.behavior())?.element_size();
        let (at, offset) = buffer.locate(index)?;
        Ok(buffer.node_mut(at).slot_mut(offset, element_size))
    }

    /// Copy `data` into the first free slot of the current node and return
    /// its global index, growing the chain by one node when the current
    /// node is full.
    ///
    /// Fails with [`BufferError::InvalidArgument`] if `data` is not exactly
    /// one element long, and with [`BufferError::CapacityExceeded`] if the
    /// chain is already at `nodes_max`; neither failure changes the buffer.
    pub fn add_element(&mut self, handle: BufferHandle, data: &[u8]) -> Result<u64> {
        let buffer = self.table.resolve_mut(handle)?;
        let behavior = self.registry.lookup(buffer.behavior())?;
        if data.len() != behavior.element_size() {
            return Err(BufferError::InvalidArgument {
                reason: format!(
                    "element is {} bytes, behavior '{}' expects {}",
                    data.len(),
                    behavior.name(),
                    behavior.element_size()
                ),
            });
        }

        loop {
            if let Some(index) = buffer.current_mut().claim_slot(data) {
                trace!(buffer = %handle, index, "element added");
                return Ok(index);
            }

            let order = buffer.num_nodes();
            if order >= behavior.nodes_max() {
                warn!(buffer = %handle, nodes_max = behavior.nodes_max(), "node chain at limit");
                return Err(BufferError::CapacityExceeded {
                    limit: LimitKind::Nodes,
                    max: usize::from(behavior.nodes_max()),
                });
            }
            let node = self.nodes.allocate_node(behavior, order)?;
            debug!(
                buffer = %handle,
                order,
                capacity = node.elements_allocated(),
                "node chain grown"
            );
            buffer.push_node(node);
        }
    }

    /// Mark element `index` free. Storage is neither zeroed nor moved, so
    /// every other index stays valid.
    pub fn remove_element(&mut self, handle: BufferHandle, index: u64) -> Result<()> {
        let buffer = self.table.resolve_mut(handle)?;
        let (at, offset) = buffer.locate(index)?;
        let was_occupied = buffer.node_mut(at).release_slot(offset);
        trace!(buffer = %handle, index, was_occupied, "element removed");
        Ok(())
    }

    /// Whether element `index` currently holds a live element.
    pub fn is_occupied(&self, handle: BufferHandle, index: u64) -> Result<bool> {
        let buffer = self.table.resolve(handle)?;
        let (at, offset) = buffer.locate(index)?;
        Ok(buffer
            .node(at)
            .is_some_and(|node| node.occupancy().get(offset)))
    }

    /// Global indices of every live element, in chain order.
    pub fn occupied_indices(
        &self,
        handle: BufferHandle,
    ) -> Result<impl Iterator<Item = u64> + '_> {
        let buffer = self.table.resolve(handle)?;
        Ok(buffer.chain().flat_map(|node| node.occupied_indices()))
    }

    /// Accounting snapshot for one buffer.
    pub fn stats(&self, handle: BufferHandle) -> Result<BufferStats> {
        let buffer = self.table.resolve(handle)?;
        Ok(BufferStats {
            behavior: buffer.behavior(),
            num_nodes: buffer.num_nodes(),
            num_elements: buffer.num_elements(),
            num_bytes: buffer.num_bytes(),
            occupied: buffer.occupied(),
        })
    }

    /// Direct read access to a buffer's node chain.
    pub fn buffer(&self, handle: BufferHandle) -> Result<&Buffer> {
        self.table.resolve(handle)
    }

    /// Number of live buffers.
    pub fn live_buffers(&self) -> usize {
        self.table.live_count()
    }

    /// Number of registered behaviors.
    pub fn behavior_count(&self) -> usize {
        self.registry.len()
    }

    /// Buffer table capacity.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Configuration this context was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The memory provider.
    pub fn provider(&self) -> &P {
        self.nodes.provider()
    }

    /// Mutable access to the memory provider.
    pub fn provider_mut(&mut self) -> &mut P {
        self.nodes.provider_mut()
    }

    /// Nodes currently allocated across all buffers.
    pub fn live_nodes(&self) -> usize {
        self.nodes.live_nodes()
    }

    fn free_buffer(&mut self, buffer: Buffer) {
        for node in buffer.into_nodes() {
            self.nodes.free_node(node);
        }
    }
}
