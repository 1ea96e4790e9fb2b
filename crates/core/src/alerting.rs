//! Alert configuration vocabulary and defaults.
//!
//! A configuration row is synthesized lazily for every installation the
//! first time it is needed; these constants define that default shape.

use serde::{Deserialize, Serialize};

use crate::channels::{CHANNEL_EMAIL, CHANNEL_IN_APP};
use crate::error::CoreError;
use crate::tamper::TamperEventType;

// ---------------------------------------------------------------------------
// Alert level
// ---------------------------------------------------------------------------

/// Operator-facing alerting aggressiveness for an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(CoreError::Validation(format!(
                "Unknown alert level: \"{other}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default movement threshold (normalized sensor magnitude).
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 0.75;

/// Default voltage fluctuation threshold (volts of absolute change).
pub const DEFAULT_VOLTAGE_THRESHOLD: f64 = 0.5;

/// Default connection interruption threshold.
pub const DEFAULT_CONNECTION_THRESHOLD: f64 = 0.8;

/// Threshold used for event types without a dedicated config field.
pub const FALLBACK_THRESHOLD: f64 = 0.5;

/// Default sensor sampling interval.
pub const DEFAULT_SAMPLING_RATE_SECS: i32 = 60;

/// Channels enabled on a freshly synthesized config.
pub fn default_channels() -> Vec<&'static str> {
    vec![CHANNEL_EMAIL, CHANNEL_IN_APP]
}

/// Resolve the default threshold for an event type.
///
/// Mirrors the per-type fields of a stored config; used both to seed new
/// rows and as the lookup table behind `threshold_for`.
pub fn default_threshold_for(event_type: TamperEventType) -> f64 {
    match event_type {
        TamperEventType::PhysicalMovement => DEFAULT_MOVEMENT_THRESHOLD,
        TamperEventType::VoltageFluctuation => DEFAULT_VOLTAGE_THRESHOLD,
        TamperEventType::ConnectionTampering => DEFAULT_CONNECTION_THRESHOLD,
        TamperEventType::LocationChange | TamperEventType::Generic => FALLBACK_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_channels_are_email_and_in_app() {
        assert_eq!(default_channels(), vec!["email", "in_app"]);
    }

    #[test]
    fn unmapped_types_fall_back() {
        assert_eq!(
            default_threshold_for(TamperEventType::Generic),
            FALLBACK_THRESHOLD
        );
        assert_eq!(
            default_threshold_for(TamperEventType::LocationChange),
            FALLBACK_THRESHOLD
        );
    }

    #[test]
    fn alert_level_round_trips() {
        assert_eq!(AlertLevel::parse("medium").unwrap(), AlertLevel::Medium);
        assert!(AlertLevel::parse("extreme").is_err());
    }
}
