//! Severity-to-response escalation table.
//!
//! Single mapping point between an event's severity and the automatic
//! action the orchestrator takes; call sites never branch on severity
//! themselves.

use crate::tamper::{ResponseType, TamperSeverity};

/// The automatic action planned for a severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePlan {
    pub response_type: ResponseType,
    pub details: &'static str,
}

/// Resolve the automatic response for an event severity.
pub fn automatic_response(severity: TamperSeverity) -> ResponsePlan {
    match severity {
        TamperSeverity::Critical => ResponsePlan {
            response_type: ResponseType::ServiceSuspended,
            details: "Critical security event detected. Service automatically suspended \
                      pending investigation.",
        },
        TamperSeverity::High => ResponsePlan {
            response_type: ResponseType::AdminAlert,
            details: "High severity security event detected. Administrators have been notified.",
        },
        TamperSeverity::Medium => ResponsePlan {
            response_type: ResponseType::NotificationSent,
            details: "Medium severity security event detected. Notifications sent to \
                      relevant parties.",
        },
        TamperSeverity::Low => ResponsePlan {
            response_type: ResponseType::EvidenceCollection,
            details: "Low severity security event detected. Evidence collected for review.",
        },
    }
}
