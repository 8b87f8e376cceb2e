use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Slots pre-allocated by each component pool when it is created.
    pub pool_capacity: usize,
    /// Commands pre-allocated by the deferred command buffer.
    pub command_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 64,
            command_capacity: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.pool_capacity, 64);
        assert_eq!(config.command_capacity, 32);
    }
}
