//! Controller configuration

use std::time::Duration;

/// Tuning knobs for a controller's queues and retry policy.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Capacity of the shared dispatch channel fed by the watchers.
    pub dispatch_depth: usize,
    /// Capacity of each partition's work queue. Coalescing keeps at most one
    /// queued occurrence per ID, so this only bounds distinct IDs.
    pub partition_depth: usize,
    /// First retry delay; doubles on every further retry.
    pub backoff_base: Duration,
    /// Retries after the initial attempt before an item is dropped.
    pub max_retries: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            dispatch_depth: 1024,
            partition_depth: 64,
            backoff_base: Duration::from_millis(20),
            max_retries: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_policy_caps_after_five_doublings() {
        let config = ControllerConfig::default();
        let total: Duration = (0..config.max_retries)
            .map(|attempt| config.backoff_base * 2u32.pow(attempt))
            .sum();
        // 20 + 40 + 80 + 160 + 320
        assert_eq!(total, Duration::from_millis(620));
    }
}
