//! Engine configuration parameters.

use segbuf_core::{BufferError, Result};

/// Sizing of a [`BufferContext`](crate::BufferContext)'s fixed tables.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of registered behaviors.
    ///
    /// Default: 256.
    pub behaviors_max: u16,

    /// Number of buffer table slots, i.e. the maximum number of buffers
    /// alive at once.
    ///
    /// Default: 512.
    pub buffers_max: u16,

    /// Cap on bytes outstanding from the default heap provider.
    ///
    /// Only consulted by [`BufferContext::init`](crate::BufferContext::init);
    /// a caller-supplied provider enforces its own limits. Default: none.
    pub memory_limit: Option<usize>,
}

impl EngineConfig {
    /// Default behavior registry capacity.
    pub const DEFAULT_BEHAVIORS_MAX: u16 = 0x100;

    /// Default buffer table capacity.
    pub const DEFAULT_BUFFERS_MAX: u16 = 0x200;

    /// Create a config with default table sizes and no memory limit.
    pub fn new() -> Self {
        Self {
            behaviors_max: Self::DEFAULT_BEHAVIORS_MAX,
            buffers_max: Self::DEFAULT_BUFFERS_MAX,
            memory_limit: None,
        }
    }

    /// Reject table sizes that could never hold anything.
    pub fn validate(&self) -> Result<()> {
        if self.behaviors_max == 0 {
            return Err(BufferError::InvalidArgument {
                reason: "behaviors_max must be > 0".into(),
            });
        }
        if self.buffers_max == 0 {
            return Err(BufferError::InvalidArgument {
                reason: "buffers_max must be > 0".into(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.behaviors_max, 256);
        assert_eq!(config.buffers_max, 512);
        assert!(config.memory_limit.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_tables_rejected() {
        let config = EngineConfig {
            buffers_max: 0,
            ..EngineConfig::new()
        };
        assert!(matches!(
            config.validate(),
            Err(BufferError::InvalidArgument { .. })
        ));
        let config = EngineConfig {
            behaviors_max: 0,
            ..EngineConfig::new()
        };
        assert!(config.validate().is_err());
    }
}
