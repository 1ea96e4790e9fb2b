/// Daemon configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// Number of automatic-response workers (default: `4`).
    pub response_workers: usize,
    /// Bound on the automatic-response queue (default: `256`).
    pub response_queue_capacity: usize,
    /// Whether the periodic maintenance loops run (default: `true`).
    pub maintenance_enabled: bool,
}

impl SentinelConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `RESPONSE_WORKERS`        | `4`     |
    /// | `RESPONSE_QUEUE_CAPACITY` | `256`   |
    /// | `MAINTENANCE_ENABLED`     | `true`  |
    pub fn from_env() -> Self {
        let response_workers: usize = std::env::var("RESPONSE_WORKERS")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("RESPONSE_WORKERS must be a valid usize");

        let response_queue_capacity: usize = std::env::var("RESPONSE_QUEUE_CAPACITY")
            .unwrap_or_else(|_| "256".into())
            .parse()
            .expect("RESPONSE_QUEUE_CAPACITY must be a valid usize");

        let maintenance_enabled: bool = std::env::var("MAINTENANCE_ENABLED")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("MAINTENANCE_ENABLED must be true or false");

        Self {
            response_workers,
            response_queue_capacity,
            maintenance_enabled,
        }
    }
}
