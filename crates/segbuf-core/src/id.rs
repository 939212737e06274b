//! Strongly-typed handles for behaviors and buffers.

use std::fmt;

/// Identifies a registered buffer behavior.
///
/// Behaviors are registered once and never removed, so a behavior handle
/// is a plain dense index: `BehaviorHandle(n)` is the n-th registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorHandle(pub u16);

impl fmt::Display for BehaviorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for BehaviorHandle {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Identifies a live buffer in a buffer table.
///
/// A buffer handle is a slot index plus the generation of that slot at the
/// time the buffer was bound. Slots are recycled after destruction; the
/// generation is bumped on every release, so a handle kept past
/// `destroy_buffer` no longer resolves even after the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct BufferHandle {
    index: u16,
    generation: u32,
}

impl BufferHandle {
    /// Create a handle for `index` stamped with `generation`.
    pub fn new(index: u16, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the buffer table.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Slot generation this handle was issued under.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.index, self.generation)
    }
}
