use helioguard_core::error::CoreError;

/// Service-level error type for the detection pipeline.
///
/// Wraps [`CoreError`] for domain errors and sqlx for persistence errors.
/// Downstream delivery failures are deliberately NOT represented here:
/// they are recorded as data on the response rows.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// A domain-level error from `helioguard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for service return values.
pub type DetectionResult<T> = Result<T, DetectionError>;
