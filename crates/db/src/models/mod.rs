//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create/update DTO where the entity is mutated
//!
//! Enumerated domain values (event type, severity, status, ...) are stored
//! as snake_case TEXT and parsed into `helioguard_core` enums at the
//! service boundary.

pub mod alert_config;
pub mod installation;
pub mod monitoring_status;
pub mod security_log;
pub mod tamper_event;
pub mod tamper_response;
