//! Buffer behaviors: the immutable sizing templates buffers are built from.
//!
//! A [`BufferBehavior`] fixes the element size and growth policy of every
//! buffer created from it. Node 0 of a buffer holds `size_initial`
//! elements; every later node holds `size_step`. The global element index
//! range of node `k` follows directly from those two numbers:
//!
//! ```text
//! order 0:  [0, size_initial - 1]
//! order k:  [size_initial + size_step*(k-1), size_initial + size_step*k - 1]
//! ```
//!
//! Behaviors are validated on construction and expose read-only accessors,
//! so a registered behavior cannot be mutated by the buffers bound to it.

use crate::error::{BufferError, Result};

/// Maximum length of a behavior name in bytes.
pub const NAME_MAX_LEN: usize = 0xFF;

/// Immutable growth template shared by every buffer created from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferBehavior {
    name: String,
    element_size: usize,
    size_initial: u32,
    size_step: u32,
    change_threshold: u16,
    nodes_max: u16,
    element_default: Option<Box<[u8]>>,
}

impl BufferBehavior {
    /// Default element capacity of node 0.
    pub const DEFAULT_SIZE_INITIAL: u32 = 0x800;

    /// Default element capacity of nodes after the first.
    pub const DEFAULT_SIZE_STEP: u32 = 0x800;

    /// Default change threshold. Stored but not consulted by growth.
    pub const DEFAULT_CHANGE_THRESHOLD: u16 = 0x20;

    /// Default maximum node-chain length.
    pub const DEFAULT_NODES_MAX: u16 = 0x40;

    /// Create and validate a behavior with the default change threshold
    /// and no element default.
    ///
    /// Fails with [`BufferError::InvalidArgument`] if `element_size`,
    /// `size_initial`, `size_step` or `nodes_max` is zero, or if the name
    /// is longer than [`NAME_MAX_LEN`].
    pub fn new(
        name: impl Into<String>,
        element_size: usize,
        size_initial: u32,
        size_step: u32,
        nodes_max: u16,
    ) -> Result<Self> {
        let behavior = Self {
            name: name.into(),
            element_size,
            size_initial,
            size_step,
            change_threshold: Self::DEFAULT_CHANGE_THRESHOLD,
            nodes_max,
            element_default: None,
        };
        behavior.validate()?;
        Ok(behavior)
    }

    /// Check every structural invariant of this behavior.
    pub fn validate(&self) -> Result<()> {
        if self.name.len() > NAME_MAX_LEN {
            return Err(BufferError::invalid(format!(
                "behavior name is {} bytes, maximum is {NAME_MAX_LEN}",
                self.name.len()
            )));
        }
        if self.element_size == 0 {
            return Err(BufferError::invalid("element_size must be > 0"));
        }
        if self.size_initial == 0 {
            return Err(BufferError::invalid("size_initial must be > 0"));
        }
        if self.size_step == 0 {
            return Err(BufferError::invalid("size_step must be > 0"));
        }
        if self.nodes_max == 0 {
            return Err(BufferError::invalid("nodes_max must be > 0"));
        }
        if let Some(pattern) = &self.element_default {
            if pattern.len() != self.element_size {
                return Err(BufferError::invalid(format!(
                    "element_default is {} bytes, element_size is {}",
                    pattern.len(),
                    self.element_size
                )));
            }
        }
        Ok(())
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes per element.
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Element capacity of node 0.
    pub fn size_initial(&self) -> u32 {
        self.size_initial
    }

    /// Element capacity of every node after the first.
    pub fn size_step(&self) -> u32 {
        self.size_step
    }

    /// Reserved growth-tuning input. Currently inert.
    pub fn change_threshold(&self) -> u16 {
        self.change_threshold
    }

    /// Upper bound on node-chain length.
    pub fn nodes_max(&self) -> u16 {
        self.nodes_max
    }

    /// Byte pattern used to fill fresh node storage, if any.
    pub fn element_default(&self) -> Option<&[u8]> {
        self.element_default.as_deref()
    }

    /// Element capacity of the node at `order`.
    pub fn node_capacity(&self, order: u16) -> u32 {
        if order == 0 {
            self.size_initial
        } else {
            self.size_step
        }
    }

    /// Inclusive global index range `(start, end)` covered by the node at
    /// `order`.
    pub fn node_range(&self, order: u16) -> (u64, u64) {
        let initial = u64::from(self.size_initial);
        let step = u64::from(self.size_step);
        if order == 0 {
            (0, initial - 1)
        } else {
            let k = u64::from(order);
            (initial + step * (k - 1), initial + step * k - 1)
        }
    }

    /// Total addressable elements of a buffer with `num_nodes` nodes.
    pub fn elements_for_nodes(&self, num_nodes: u16) -> u64 {
        if num_nodes == 0 {
            return 0;
        }
        u64::from(self.size_initial) + u64::from(self.size_step) * u64::from(num_nodes - 1)
    }
}

/// Builder for [`BufferBehavior`] starting from the default growth policy.
///
/// ```
/// use segbuf_core::BehaviorBuilder;
///
/// let behavior = BehaviorBuilder::new("particles", 16)
///     .initial(256)
///     .step(64)
///     .nodes_max(8)
///     .build()
///     .unwrap();
/// assert_eq!(behavior.node_capacity(1), 64);
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct BehaviorBuilder {
    behavior: BufferBehavior,
}

impl BehaviorBuilder {
    /// Start a builder for `name` with `element_size` bytes per element.
    pub fn new(name: impl Into<String>, element_size: usize) -> Self {
        Self {
            behavior: BufferBehavior {
                name: name.into(),
                element_size,
                size_initial: BufferBehavior::DEFAULT_SIZE_INITIAL,
                size_step: BufferBehavior::DEFAULT_SIZE_STEP,
                change_threshold: BufferBehavior::DEFAULT_CHANGE_THRESHOLD,
                nodes_max: BufferBehavior::DEFAULT_NODES_MAX,
                element_default: None,
            },
        }
    }

    /// Element capacity of node 0.
    pub fn initial(mut self, size_initial: u32) -> Self {
        self.behavior.size_initial = size_initial;
        self
    }

    /// Element capacity of nodes after the first.
    pub fn step(mut self, size_step: u32) -> Self {
        self.behavior.size_step = size_step;
        self
    }

    /// Reserved growth-tuning input.
    pub fn change_threshold(mut self, change_threshold: u16) -> Self {
        self.behavior.change_threshold = change_threshold;
        self
    }

    /// Maximum node-chain length.
    pub fn nodes_max(mut self, nodes_max: u16) -> Self {
        self.behavior.nodes_max = nodes_max;
        self
    }

    /// Fill pattern for fresh node storage. Must be `element_size` bytes.
    pub fn element_default(mut self, pattern: impl Into<Box<[u8]>>) -> Self {
        self.behavior.element_default = Some(pattern.into());
        self
    }

    /// Validate and produce the behavior.
    pub fn build(self) -> Result<BufferBehavior> {
        self.behavior.validate()?;
        Ok(self.behavior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_change_threshold() {
        let b = BufferBehavior::new("ints", 4, 8, 4, 3).unwrap();
        assert_eq!(b.change_threshold(), BufferBehavior::DEFAULT_CHANGE_THRESHOLD);
        assert!(b.element_default().is_none());
    }

    #[test]
    fn zero_sizes_rejected() {
        for (es, init, step, max) in [(0, 1, 1, 1), (1, 0, 1, 1), (1, 1, 0, 1), (1, 1, 1, 0)] {
            let result = BufferBehavior::new("bad", es, init, step, max);
            assert!(
                matches!(result, Err(BufferError::InvalidArgument { .. })),
                "({es}, {init}, {step}, {max}) should be rejected"
            );
        }
    }

    #[test]
    fn long_name_rejected() {
        let name = "x".repeat(NAME_MAX_LEN + 1);
        assert!(BufferBehavior::new(name, 1, 1, 1, 1).is_err());
        let name = "x".repeat(NAME_MAX_LEN);
        assert!(BufferBehavior::new(name, 1, 1, 1, 1).is_ok());
    }

    #[test]
    fn node_ranges_follow_initial_then_step() {
        let b = BufferBehavior::new("r", 4, 4, 2, 4).unwrap();
        assert_eq!(b.node_range(0), (0, 3));
        assert_eq!(b.node_range(1), (4, 5));
        assert_eq!(b.node_range(2), (6, 7));
        assert_eq!(b.node_capacity(0), 4);
        assert_eq!(b.node_capacity(3), 2);
        assert_eq!(b.elements_for_nodes(0), 0);
        assert_eq!(b.elements_for_nodes(1), 4);
        assert_eq!(b.elements_for_nodes(3), 8);
    }

    #[test]
    fn builder_defaults_match_constants() {
        let b = BehaviorBuilder::new("d", 8).build().unwrap();
        assert_eq!(b.size_initial(), 0x800);
        assert_eq!(b.size_step(), 0x800);
        assert_eq!(b.change_threshold(), 0x20);
        assert_eq!(b.nodes_max(), 0x40);
    }

    #[test]
    fn builder_rejects_mis_sized_default() {
        let result = BehaviorBuilder::new("d", 4)
            .element_default(vec![1u8, 2, 3])
            .build();
        assert!(matches!(result, Err(BufferError::InvalidArgument { .. })));
    }

    #[test]
    fn builder_keeps_element_default() {
        let b = BehaviorBuilder::new("d", 2)
            .element_default(vec![0xABu8, 0xCD])
            .build()
            .unwrap();
        assert_eq!(b.element_default(), Some(&[0xAB, 0xCD][..]));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn node_ranges_tile_without_gaps(
                initial in 1u32..500,
                step in 1u32..500,
                nodes in 1u16..32,
            ) {
                let b = BufferBehavior::new("p", 1, initial, step, nodes).unwrap();
                let mut expected_start = 0u64;
                for order in 0..nodes {
                    let (start, end) = b.node_range(order);
                    prop_assert_eq!(start, expected_start);
                    prop_assert_eq!(end - start + 1, u64::from(b.node_capacity(order)));
                    expected_start = end + 1;
                }
                prop_assert_eq!(expected_start, b.elements_for_nodes(nodes));
            }
        }
    }
}
