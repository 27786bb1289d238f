//! Registry configuration.

/// Default number of identifiers drawn before Create gives up on a collision streak.
pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 16;

/// Tunables of an endpoint registry.
///
/// The defaults reproduce the historical behavior of the service: no capacity bound and
/// inspections that do not count as accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Whether `Inspect` increments the access counter like a dispatched request does.
    pub count_inspections: bool,
    /// Maximum number of live endpoints, `None` for unbounded.
    pub max_endpoints: Option<usize>,
    /// Identifier draws attempted by `Create` before failing with an internal error.
    pub max_id_attempts: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { count_inspections: false, max_endpoints: None, max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS }
    }
}

impl RegistryConfig {
    pub fn with_count_inspections(mut self, count_inspections: bool) -> Self {
        self.count_inspections = count_inspections;
        self
    }

    pub fn with_max_endpoints(mut self, max_endpoints: Option<usize>) -> Self {
        self.max_endpoints = max_endpoints;
        self
    }

    /// Zero is clamped to a single attempt.
    pub fn with_max_id_attempts(mut self, max_id_attempts: u32) -> Self {
        self.max_id_attempts = max_id_attempts.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_config_builders() {
        let config = RegistryConfig::default()
            .with_count_inspections(true)
            .with_max_endpoints(Some(10))
            .with_max_id_attempts(0);
        assert!(config.count_inspections);
        assert_eq!(config.max_endpoints, Some(10));
        assert_eq!(config.max_id_attempts, 1);
    }
}
