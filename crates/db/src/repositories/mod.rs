//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument. Methods that must run
//! inside a larger atomic unit take an open transaction instead.

pub mod alert_config_repo;
pub mod installation_repo;
pub mod monitoring_status_repo;
pub mod security_log_repo;
pub mod tamper_event_repo;
pub mod tamper_response_repo;

pub use alert_config_repo::AlertConfigRepo;
pub use installation_repo::InstallationRepo;
pub use monitoring_status_repo::MonitoringStatusRepo;
pub use security_log_repo::SecurityLogRepo;
pub use tamper_event_repo::TamperEventRepo;
pub use tamper_response_repo::TamperResponseRepo;
