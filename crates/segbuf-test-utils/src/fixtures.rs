//! Reusable behavior fixtures.
//!
//! - [`scenario_behavior`] — 4-byte elements, 4 initial, step 2, 4 nodes.
//! - [`single_node_behavior`] — a chain that can never grow.
//! - [`byte_behavior`] — 1-byte elements with caller-chosen sizing.

use segbuf_core::BufferBehavior;

/// The reference growth scenario: node 0 holds indices `0..4`, every later
/// node holds two more, at most four nodes (10 elements).
pub fn scenario_behavior() -> BufferBehavior {
    BufferBehavior::new("scenario", 4, 4, 2, 4).expect("scenario behavior is valid")
}

/// A behavior whose buffers are capped at one node of `initial` elements.
pub fn single_node_behavior(initial: u32) -> BufferBehavior {
    BufferBehavior::new("single-node", 4, initial, 1, 1).expect("single-node behavior is valid")
}

/// One-byte elements with the given sizing.
pub fn byte_behavior(initial: u32, step: u32, nodes_max: u16) -> BufferBehavior {
    BufferBehavior::new("bytes", 1, initial, step, nodes_max).expect("byte behavior is valid")
}

/// Encode `value` as a scenario element.
pub fn element(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}
