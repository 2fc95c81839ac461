//! Agent dispatcher configuration.

// =============================================================================
// Configuration Constants
// =============================================================================

/// Default maximum number of tasks executing at once.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 16;

/// Default submission channel capacity.
pub const DEFAULT_TASK_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Agent Configuration
// =============================================================================

/// Configuration for the agent dispatcher.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Maximum tasks running concurrently across all sources. Admitted tasks
    /// beyond this bound wait for a free worker slot; this queue level is
    /// orthogonal to the per-source serialization queues.
    pub max_concurrent_tasks: usize,

    /// Capacity of the submission channel.
    pub task_channel_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            task_channel_capacity: DEFAULT_TASK_CHANNEL_CAPACITY,
        }
    }
}

impl From<&crate::config::AgentSettings> for AgentConfig {
    fn from(settings: &crate::config::AgentSettings) -> Self {
        Self {
            max_concurrent_tasks: settings.max_concurrent_tasks,
            task_channel_capacity: settings.task_channel_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);
        assert_eq!(config.task_channel_capacity, DEFAULT_TASK_CHANNEL_CAPACITY);
    }
}
