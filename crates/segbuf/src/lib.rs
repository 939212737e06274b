//! Segbuf: a handle-based segmented dynamic-array allocator.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the segbuf sub-crates. For most users, adding `segbuf` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use segbuf::prelude::*;
//!
//! let mut ctx = BufferContext::init(EngineConfig::default()).unwrap();
//!
//! // 4-byte elements, 4 in the first node, 2 per later node, 4 nodes max.
//! let behavior = ctx.register_behavior("u32", 4, 4, 2, 4).unwrap();
//! let buffer = ctx.create_buffer(behavior).unwrap();
//!
//! for value in 0u32..5 {
//!     ctx.add_element(buffer, &value.to_le_bytes()).unwrap();
//! }
//! // The fifth element grew the chain by one node.
//! let stats = ctx.stats(buffer).unwrap();
//! assert_eq!(stats.num_nodes, 2);
//! assert_eq!(stats.num_elements, 6);
//!
//! // Removal only frees the slot; every index stays where it is.
//! ctx.remove_element(buffer, 1).unwrap();
//! assert_eq!(ctx.get_element(buffer, 4).unwrap(), &4u32.to_le_bytes());
//!
//! ctx.destroy_buffer(buffer).unwrap();
//! let report = ctx.shutdown();
//! assert_eq!(report.provider.outstanding_bytes(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `segbuf-core` | Handles, behaviors, errors, memory providers |
//! | [`arena`] | `segbuf-arena` | Registry, node allocator, buffer table, engine |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Handles, behaviors, errors, and the memory provider seam (`segbuf-core`).
///
/// Implement [`types::MemoryProvider`] to draw node storage from somewhere
/// other than the global heap.
pub use segbuf_core as types;

/// The buffer engine and its tables (`segbuf-arena`).
///
/// [`arena::BufferContext`] is the entry point; the other types are exposed
/// for inspection of node chains and occupancy.
pub use segbuf_arena as arena;

/// Common imports for typical segbuf usage.
///
/// ```rust
/// use segbuf::prelude::*;
/// ```
pub mod prelude {
    // Engine
    pub use segbuf_arena::{BufferContext, BufferStats, EngineConfig, ShutdownReport};

    // Handles and behaviors
    pub use segbuf_core::{BehaviorBuilder, BehaviorHandle, BufferBehavior, BufferHandle};

    // Errors
    pub use segbuf_core::{BufferError, HandleKind, LimitKind};

    // Memory
    pub use segbuf_core::{HeapProvider, MemoryProvider, RawBlock};
}
