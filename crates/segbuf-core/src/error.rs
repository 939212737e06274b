//! Error types for segbuf operations.
//!
//! Every failure is recoverable and returned as a value. Exhausting a
//! bounded table or the memory provider is an expected condition, not a
//! reason to abort the process.

use std::error::Error;
use std::fmt;

/// Which kind of handle failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
    /// A [`BehaviorHandle`](crate::BehaviorHandle).
    Behavior,
    /// A [`BufferHandle`](crate::BufferHandle).
    Buffer,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Behavior => write!(f, "behavior"),
            Self::Buffer => write!(f, "buffer"),
        }
    }
}

/// Which bounded limit was hit by a [`BufferError::CapacityExceeded`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitKind {
    /// The behavior registry is full.
    Behaviors,
    /// A buffer's node chain reached its behavior's `nodes_max`.
    Nodes,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Behaviors => write!(f, "behavior registry"),
            Self::Nodes => write!(f, "node chain"),
        }
    }
}

/// Errors returned by registry, allocator, and engine operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// Malformed behavior parameters or element data.
    InvalidArgument {
        /// Human-readable description of the rejected argument.
        reason: String,
    },
    /// A bounded structure is full.
    CapacityExceeded {
        /// The limit that was reached.
        limit: LimitKind,
        /// The configured maximum for that limit.
        max: usize,
    },
    /// The memory provider refused an allocation.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
    },
    /// A stale, out-of-range, or never-bound handle.
    InvalidHandle {
        /// Which table the handle was resolved against.
        kind: HandleKind,
        /// The raw slot index carried by the handle.
        index: u32,
    },
    /// Element index beyond the buffer's current logical size.
    IndexOutOfRange {
        /// The requested element index.
        index: u64,
        /// Number of addressable elements in the buffer.
        len: u64,
    },
    /// No free slot remains in the buffer table.
    TableFull {
        /// Total number of slots in the table.
        capacity: usize,
    },
}

impl BufferError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::CapacityExceeded { limit, max } => {
                write!(f, "{limit} capacity exceeded: limit is {max}")
            }
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: failed to allocate {requested} bytes")
            }
            Self::InvalidHandle { kind, index } => {
                write!(f, "invalid {kind} handle: {index}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "element index {index} out of range for buffer of {len} elements")
            }
            Self::TableFull { capacity } => {
                write!(f, "buffer table full: all {capacity} slots taken")
            }
        }
    }
}

impl Error for BufferError {}

/// Result alias used throughout segbuf.
pub type Result<T> = std::result::Result<T, BufferError>;
