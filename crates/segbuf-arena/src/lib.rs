//! Handle-based segmented buffer engine.
//!
//! Buffers grow by appending fixed-size nodes instead of reallocating, and
//! callers address elements by `(BufferHandle, index)` rather than by
//! pointer, so storage can be grown or recycled without invalidating
//! anything a caller holds.
//!
//! # Architecture
//!
//! ```text
//! BufferContext (owned engine state)
//! ├── BehaviorRegistry   append-only Vec<BufferBehavior>, bounded
//! ├── BufferTable        fixed slots + Free/Taken field + generations
//! │   └── Buffer         head/tail/current over its own node arena
//! │       └── BufferNode × n   element block + OccupancyBitmap
//! └── NodeAllocator<P>   sole owner of the MemoryProvider
//! ```
//!
//! # Growth policy
//!
//! New elements always go into the buffer's *current* node (the most
//! recently grown one). When it is full, one node of `size_step` elements
//! is appended, up to the behavior's `nodes_max`. Slots freed in earlier
//! nodes are not revisited by `add_element`; removal only clears an
//! occupancy bit, so indices never move.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bitmap;
pub mod buffer;
pub mod config;
pub mod context;
pub mod node;
pub mod registry;
pub mod table;

// Public re-exports for the primary API surface.
pub use bitmap::OccupancyBitmap;
pub use buffer::Buffer;
pub use config::EngineConfig;
pub use context::{BufferContext, BufferStats, ShutdownReport};
pub use node::{BufferNode, NodeAllocator, NodeIndex};
pub use registry::BehaviorRegistry;
pub use table::{BufferTable, SlotState};
