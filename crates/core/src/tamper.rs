//! Tamper domain vocabulary: event types, severities, statuses, responses.
//!
//! These values are stored as snake_case TEXT in the database and parsed
//! back through the `parse` constructors at the service boundary. Unknown
//! stored values surface as [`CoreError::Validation`] rather than panicking.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Event type
// ---------------------------------------------------------------------------

/// Category of tamper signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperEventType {
    /// Accelerometer/tilt sensor reported movement of the panel mount.
    PhysicalMovement,
    /// Abrupt change in measured line voltage.
    VoltageFluctuation,
    /// Device connectivity dropped (connected -> disconnected edge).
    ConnectionTampering,
    /// Reported GPS/location string differs from the last known one.
    LocationChange,
    /// Catch-all for externally reported tamper signals.
    Generic,
}

impl TamperEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhysicalMovement => "physical_movement",
            Self::VoltageFluctuation => "voltage_fluctuation",
            Self::ConnectionTampering => "connection_tampering",
            Self::LocationChange => "location_change",
            Self::Generic => "generic",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "physical_movement" => Ok(Self::PhysicalMovement),
            "voltage_fluctuation" => Ok(Self::VoltageFluctuation),
            "connection_tampering" => Ok(Self::ConnectionTampering),
            "location_change" => Ok(Self::LocationChange),
            "generic" => Ok(Self::Generic),
            other => Err(CoreError::Validation(format!(
                "Unknown tamper event type: \"{other}\""
            ))),
        }
    }
}

impl std::fmt::Display for TamperEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordered severity tier driving response escalation.
///
/// Ordering is derived so `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TamperSeverity {
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
                "Unknown tamper severity: \"{other}\""
            ))),
        }
    }
}

impl std::fmt::Display for TamperSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Event status
// ---------------------------------------------------------------------------

/// Lifecycle status of a tamper event.
///
/// Legal transitions: `new -> acknowledged`, `new -> resolved`,
/// `acknowledged -> resolved`. `resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperEventStatus {
    New,
    Acknowledged,
    Resolved,
}

impl TamperEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "new" => Ok(Self::New),
            "acknowledged" => Ok(Self::Acknowledged),
            "resolved" => Ok(Self::Resolved),
            other => Err(CoreError::Validation(format!(
                "Unknown tamper event status: \"{other}\""
            ))),
        }
    }

    /// Whether moving from `self` to `to` is a legal lifecycle transition.
    pub fn can_transition_to(&self, to: TamperEventStatus) -> bool {
        matches!(
            (self, to),
            (Self::New, Self::Acknowledged)
                | (Self::New, Self::Resolved)
                | (Self::Acknowledged, Self::Resolved)
        )
    }
}

impl std::fmt::Display for TamperEventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Response type
// ---------------------------------------------------------------------------

/// Action taken in response to a tamper event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    NotificationSent,
    AdminAlert,
    ServiceSuspended,
    EvidenceCollection,
    ManualIntervention,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotificationSent => "notification_sent",
            Self::AdminAlert => "admin_alert",
            Self::ServiceSuspended => "service_suspended",
            Self::EvidenceCollection => "evidence_collection",
            Self::ManualIntervention => "manual_intervention",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "notification_sent" => Ok(Self::NotificationSent),
            "admin_alert" => Ok(Self::AdminAlert),
            "service_suspended" => Ok(Self::ServiceSuspended),
            "evidence_collection" => Ok(Self::EvidenceCollection),
            "manual_intervention" => Ok(Self::ManualIntervention),
            other => Err(CoreError::Validation(format!(
                "Unknown response type: \"{other}\""
            ))),
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips_through_str() {
        for ty in [
            TamperEventType::PhysicalMovement,
            TamperEventType::VoltageFluctuation,
            TamperEventType::ConnectionTampering,
            TamperEventType::LocationChange,
            TamperEventType::Generic,
        ] {
            assert_eq!(TamperEventType::parse(ty.as_str()).unwrap(), ty);
        }
    }

    #[test]
    fn unknown_event_type_rejected() {
        assert!(TamperEventType::parse("panel_access").is_err());
    }

    #[test]
    fn severity_ordering_escalates() {
        assert!(TamperSeverity::Low < TamperSeverity::Medium);
        assert!(TamperSeverity::Medium < TamperSeverity::High);
        assert!(TamperSeverity::High < TamperSeverity::Critical);
    }

    #[test]
    fn new_can_be_acknowledged_or_resolved() {
        assert!(TamperEventStatus::New.can_transition_to(TamperEventStatus::Acknowledged));
        assert!(TamperEventStatus::New.can_transition_to(TamperEventStatus::Resolved));
    }

    #[test]
    fn acknowledged_can_only_resolve() {
        assert!(TamperEventStatus::Acknowledged.can_transition_to(TamperEventStatus::Resolved));
        assert!(!TamperEventStatus::Acknowledged.can_transition_to(TamperEventStatus::New));
    }

    #[test]
    fn resolved_is_terminal() {
        for to in [
            TamperEventStatus::New,
            TamperEventStatus::Acknowledged,
            TamperEventStatus::Resolved,
        ] {
            assert!(!TamperEventStatus::Resolved.can_transition_to(to));
        }
    }

    #[test]
    fn severity_serializes_snake_case() {
        let json = serde_json::to_string(&TamperSeverity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
