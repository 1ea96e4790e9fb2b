//! Pure domain logic for the tamper detection pipeline.
//!
//! Everything in this crate is side-effect free: enums and constants shared
//! across the workspace, the threshold evaluator, severity classification,
//! the false-positive filter, response planning, and security-log helpers.
//! No database or runtime dependencies; the `db` and `detection` crates
//! build on top of this.

pub mod alerting;
pub mod audit;
pub mod channels;
pub mod error;
pub mod evaluate;
pub mod response_plan;
pub mod severity;
pub mod tamper;
pub mod types;
