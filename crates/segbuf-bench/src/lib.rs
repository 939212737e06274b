//! Benchmark profiles for the segbuf allocator.
//!
//! - [`reference_behavior`]: 16-byte elements, 1K initial, 256-element steps
//! - [`stress_behavior`]: 4-byte elements, small nodes, long chains
//! - [`filled_context`]: a context holding one buffer with `n` live elements

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use segbuf_arena::{BufferContext, EngineConfig};
use segbuf_core::{BehaviorHandle, BufferBehavior, BufferHandle, Result};

/// Element size of [`reference_behavior`].
pub const REFERENCE_ELEMENT: usize = 16;

/// Medium-sized records in large first nodes.
pub fn reference_behavior() -> BufferBehavior {
    BufferBehavior::new("reference", REFERENCE_ELEMENT, 1024, 256, 64)
        .expect("reference behavior is valid")
}

/// Small records in small nodes, so growth dominates.
pub fn stress_behavior() -> BufferBehavior {
    BufferBehavior::new("stress", 4, 16, 16, u16::MAX).expect("stress behavior is valid")
}

/// Build a heap-backed context with one buffer of `behavior` holding `n`
/// elements, each filled with its index.
pub fn filled_context(
    behavior: BufferBehavior,
    n: u64,
) -> Result<(BufferContext, BehaviorHandle, BufferHandle)> {
    let mut ctx = BufferContext::init(EngineConfig::new())?;
    let element_size = behavior.element_size();
    let behavior = ctx.register_behavior_from_template(behavior)?;
    let buffer = ctx.create_buffer(behavior)?;
    let mut element = vec![0u8; element_size];
    for i in 0..n {
        element[0] = i as u8;
        ctx.add_element(buffer, &element)?;
    }
    Ok((ctx, behavior, buffer))
}
