//! Append-only registry of buffer behaviors.
//!
//! Behaviors are dense, permanent, and bounded: handle `n` is the n-th
//! successful registration and stays valid until the owning context shuts
//! down. There is no removal.

use indexmap::IndexMap;
use segbuf_core::{
    BehaviorHandle, BufferBehavior, BufferError, HandleKind, LimitKind, Result,
};
use tracing::warn;

/// Bounded table of registered [`BufferBehavior`]s.
#[derive(Debug)]
pub struct BehaviorRegistry {
    behaviors: Vec<BufferBehavior>,
    /// First handle registered under each name.
    names: IndexMap<String, BehaviorHandle>,
    max: u16,
}

impl BehaviorRegistry {
    /// Create an empty registry holding at most `max` behaviors.
    pub fn new(max: u16) -> Self {
        Self {
            behaviors: Vec::with_capacity(max as usize),
            names: IndexMap::new(),
            max,
        }
    }

    /// Build, validate, and register a behavior from its parameters.
    pub fn register(
        &mut self,
        name: &str,
        element_size: usize,
        initial: u32,
        step: u32,
        nodes_max: u16,
    ) -> Result<BehaviorHandle> {
        let behavior = BufferBehavior::new(name, element_size, initial, step, nodes_max)?;
        self.register_template(behavior)
    }

    /// Register a copy of a fully formed template.
    ///
    /// Fails with [`BufferError::InvalidArgument`] if the template does not
    /// validate, or [`BufferError::CapacityExceeded`] if the registry is
    /// full.
    pub fn register_template(&mut self, behavior: BufferBehavior) -> Result<BehaviorHandle> {
        behavior.validate()?;
        if self.behaviors.len() >= self.max as usize {
            warn!(name = behavior.name(), max = self.max, "behavior registry full");
            return Err(BufferError::CapacityExceeded {
                limit: LimitKind::Behaviors,
                max: self.max as usize,
            });
        }
        let handle = BehaviorHandle(self.behaviors.len() as u16);
        self.names
            .entry(behavior.name().to_owned())
            .or_insert(handle);
        self.behaviors.push(behavior);
        Ok(handle)
    }

    /// Read-only view of a registered behavior.
    pub fn lookup(&self, handle: BehaviorHandle) -> Result<&BufferBehavior> {
        self.behaviors
            .get(handle.0 as usize)
            .ok_or(BufferError::InvalidHandle {
                kind: HandleKind::Behavior,
                index: u32::from(handle.0),
            })
    }

    /// First behavior registered under `name`.
    pub fn find(&self, name: &str) -> Option<BehaviorHandle> {
        self.names.get(name).copied()
    }

    /// Number of registered behaviors.
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Maximum number of behaviors.
    pub fn capacity(&self) -> usize {
        self.max as usize
    }

    /// Iterate over `(handle, behavior)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (BehaviorHandle, &BufferBehavior)> + '_ {
        self.behaviors
            .iter()
            .enumerate()
            .map(|(i, b)| (BehaviorHandle(i as u16), b))
    }
}
