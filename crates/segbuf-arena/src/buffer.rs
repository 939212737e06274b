//! A single buffer: its behavior binding and its node chain.
//!
//! Nodes live in a per-buffer arena indexed by [`NodeIndex`]. The chain is
//! threaded through each node's `next` link starting at `head`; `tail`
//! gives O(1) append and `current` is the node new elements go into.
//! Nodes are only ever appended, so a node's arena position equals its
//! order.

use segbuf_core::{BehaviorHandle, BufferError, Result};
use smallvec::SmallVec;

use crate::node::{BufferNode, NodeIndex};

/// Node arena with inline room for the common short chain.
type NodeArena = SmallVec<[BufferNode; 2]>;

/// A growable, segmented array of fixed-size elements.
#[derive(Debug)]
pub struct Buffer {
    behavior: BehaviorHandle,
    nodes: NodeArena,
    head: NodeIndex,
    tail: NodeIndex,
    current: NodeIndex,
    num_elements: u64,
    num_bytes: usize,
}

impl Buffer {
    /// Create a buffer whose chain consists of `first` alone.
    pub(crate) fn new(behavior: BehaviorHandle, first: BufferNode) -> Self {
        let num_elements = u64::from(first.elements_allocated());
        let num_bytes = first.bytes_allocated();
        let mut nodes = NodeArena::new();
        nodes.push(first);
        Self {
            behavior,
            nodes,
            head: NodeIndex(0),
            tail: NodeIndex(0),
            current: NodeIndex(0),
            num_elements,
            num_bytes,
        }
    }

    /// Handle of the behavior this buffer was created from.
    pub fn behavior(&self) -> BehaviorHandle {
        self.behavior
    }

    /// Number of nodes in the chain.
    pub fn num_nodes(&self) -> u16 {
        self.nodes.len() as u16
    }

    /// Addressable element slots (sum of node capacities).
    pub fn num_elements(&self) -> u64 {
        self.num_elements
    }

    /// Bytes of element storage across all nodes.
    pub fn num_bytes(&self) -> usize {
        self.num_bytes
    }

    /// Occupied slots across all nodes.
    pub fn occupied(&self) -> u64 {
        self.nodes
            .iter()
            .map(|node| u64::from(node.occupancy().occupied()))
            .sum()
    }

    /// First node of the chain.
    pub fn head(&self) -> NodeIndex {
        self.head
    }

    /// Last node of the chain.
    pub fn tail(&self) -> NodeIndex {
        self.tail
    }

    /// Node that receives new elements.
    pub fn current(&self) -> NodeIndex {
        self.current
    }

    /// Node at `index` in this buffer's arena.
    pub fn node(&self, index: NodeIndex) -> Option<&BufferNode> {
        self.nodes.get(index.0 as usize)
    }

    /// Walk the chain from head to tail.
    pub fn chain(&self) -> impl Iterator<Item = &BufferNode> + '_ {
        let mut cursor = Some(self.head);
        std::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.next;
            Some(node)
        })
    }

    /// Resolve a global element index to its owning node and in-node
    /// offset.
    ///
    /// Walks from the head and picks the first node whose range contains
    /// `index`. Fails with [`BufferError::IndexOutOfRange`] when `index`
    /// is not below [`num_elements`](Self::num_elements).
    pub fn locate(&self, index: u64) -> Result<(NodeIndex, u32)> {
        let out_of_range = BufferError::IndexOutOfRange {
            index,
            len: self.num_elements,
        };
        if index >= self.num_elements {
            return Err(out_of_range);
        }
        let mut cursor = Some(self.head);
        while let Some(at) = cursor {
            let node = &self.nodes[at.0 as usize];
            if node.contains(index) {
                return Ok((at, (index - node.index_start()) as u32));
            }
            cursor = node.next;
        }
        Err(out_of_range)
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut BufferNode {
        &mut self.nodes[index.0 as usize]
    }

    pub(crate) fn current_mut(&mut self) -> &mut BufferNode {
        let current = self.current;
        self.node_mut(current)
    }

    /// Link `node` after the tail and make it the current node.
    pub(crate) fn push_node(&mut self, node: BufferNode) -> NodeIndex {
        let at = NodeIndex(self.nodes.len() as u16);
        self.num_elements += u64::from(node.elements_allocated());
        self.num_bytes += node.bytes_allocated();
        self.nodes.push(node);
        let tail = self.tail;
        self.node_mut(tail).next = Some(at);
        self.tail = at;
        self.current = at;
        at
    }

    /// Take every node out of the buffer, for freeing.
    pub(crate) fn into_nodes(self) -> impl Iterator<Item = BufferNode> {
        self.nodes.into_iter()
    }
}
