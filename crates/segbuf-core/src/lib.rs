//! Core types for the segbuf segmented buffer allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: handle types,
//! buffer behaviors, the error model, and the raw memory provider seam.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod behavior;
pub mod error;
pub mod id;
pub mod memory;

pub use behavior::{BehaviorBuilder, BufferBehavior};
pub use error::{BufferError, HandleKind, LimitKind, Result};
pub use id::{BehaviorHandle, BufferHandle};
pub use memory::{HeapProvider, MemoryProvider, RawBlock};
