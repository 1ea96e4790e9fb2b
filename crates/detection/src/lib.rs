//! Tamper detection and automated response services.
//!
//! This crate wires the pure decision logic from `helioguard-core` and the
//! persistence layer from `helioguard-db` into the running pipeline:
//!
//! - [`TamperDetection`] — the ingestion facade: monitoring toggles,
//!   sensor reading evaluation, sensitivity adjustment.
//! - [`TamperEventService`] — event lifecycle (create/acknowledge/resolve)
//!   with the aggregate tamper flag kept transactionally consistent.
//! - [`AlertConfigService`] — lazily-synthesized per-installation
//!   configuration.
//! - [`TamperResponseService`] + [`ResponseQueue`] — severity-driven
//!   automatic responses executed off the detection path by a bounded
//!   worker pool.
//! - [`notify`] — the notification delivery boundary (SMTP or log-only).
//! - [`scheduler`] — periodic escalation, reconciliation, and diagnostics
//!   loops.

pub mod alert_config;
pub mod baseline;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod notify;
pub mod pipeline;
pub mod responses;
pub mod scheduler;
pub mod security_log;

pub use alert_config::AlertConfigService;
pub use dispatch::ResponseQueue;
pub use error::{DetectionError, DetectionResult};
pub use events::TamperEventService;
pub use pipeline::TamperDetection;
pub use responses::TamperResponseService;
pub use security_log::SecurityLogService;
