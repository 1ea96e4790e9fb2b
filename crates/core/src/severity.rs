//! Confidence scoring policy: severity banding and false-positive filtering.

use crate::error::CoreError;
use crate::tamper::TamperSeverity;

/// Readings with confidence below this are treated as false positives and
/// dropped before any event is created. Tunable here, not per installation.
pub const FALSE_POSITIVE_CONFIDENCE: f64 = 0.3;

/// Severity bands in descending order of confidence floor.
///
/// A confidence belongs to the first band whose floor it meets, so boundary
/// values land in the higher tier. Kept as a table so adding a tier does
/// not touch any call site.
const SEVERITY_BANDS: &[(f64, TamperSeverity)] = &[
    (0.9, TamperSeverity::Critical),
    (0.7, TamperSeverity::High),
    (0.5, TamperSeverity::Medium),
];

/// Validate that a confidence score falls within `[0.0, 1.0]`.
pub fn validate_confidence(value: f64) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoreError::Validation(format!(
            "Confidence score must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

/// Whether a detection with this confidence should be discarded.
pub fn is_likely_false_positive(confidence: f64) -> bool {
    confidence < FALSE_POSITIVE_CONFIDENCE
}

/// Map a confidence score onto its severity tier.
pub fn classify(confidence: f64) -> TamperSeverity {
    for (floor, severity) in SEVERITY_BANDS {
        if confidence >= *floor {
            return *severity;
        }
    }
    TamperSeverity::Low
}
