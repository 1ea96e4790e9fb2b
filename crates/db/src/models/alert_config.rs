//! Alert configuration entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use helioguard_core::channels::is_known_channel;
use helioguard_core::types::{DbId, Timestamp};

/// A row from the `alert_configs` table. One per installation, synthesized
/// lazily with defaults on first access.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertConfig {
    pub id: DbId,
    pub installation_id: DbId,
    pub alert_level: String,
    /// JSONB array of channel name strings (see `helioguard_core::channels`).
    pub notification_channels: serde_json::Value,
    pub auto_response_enabled: bool,
    pub movement_threshold: f64,
    pub voltage_threshold: f64,
    pub connection_threshold: f64,
    pub sampling_rate_secs: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AlertConfig {
    /// Decode the JSONB channel array into plain strings.
    ///
    /// Malformed stored values decode to an empty list rather than erroring;
    /// the update path validates channels so this only happens for rows
    /// written outside the service.
    pub fn channels(&self) -> Vec<String> {
        serde_json::from_value(self.notification_channels.clone()).unwrap_or_default()
    }
}

/// DTO for overwriting an installation's alert configuration.
///
/// All mutable fields are required; the update is a full overwrite, not a
/// patch.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAlertConfig {
    pub alert_level: String,
    #[validate(custom(function = validate_channels))]
    pub notification_channels: Vec<String>,
    pub auto_response_enabled: bool,
    #[validate(range(min = 0.0))]
    pub movement_threshold: f64,
    #[validate(range(min = 0.0))]
    pub voltage_threshold: f64,
    #[validate(range(min = 0.0))]
    pub connection_threshold: f64,
    #[validate(range(min = 1))]
    pub sampling_rate_secs: i32,
}

/// Every channel name must be one the dispatcher understands.
fn validate_channels(channels: &Vec<String>) -> Result<(), ValidationError> {
    for channel in channels {
        if !is_known_channel(channel) {
            return Err(ValidationError::new("unknown_notification_channel"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_known_channels_validates() {
        let dto = UpdateAlertConfig {
            alert_level: "medium".to_string(),
            notification_channels: vec!["email".to_string(), "sms".to_string()],
            auto_response_enabled: true,
            movement_threshold: 0.75,
            voltage_threshold: 0.5,
            connection_threshold: 0.8,
            sampling_rate_secs: 60,
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn unknown_channel_fails_validation() {
        let dto = UpdateAlertConfig {
            alert_level: "medium".to_string(),
            notification_channels: vec!["fax".to_string()],
            auto_response_enabled: true,
            movement_threshold: 0.75,
            voltage_threshold: 0.5,
            connection_threshold: 0.8,
            sampling_rate_secs: 60,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn negative_threshold_fails_validation() {
        let dto = UpdateAlertConfig {
            alert_level: "medium".to_string(),
            notification_channels: vec![],
            auto_response_enabled: true,
            movement_threshold: -0.1,
            voltage_threshold: 0.5,
            connection_threshold: 0.8,
            sampling_rate_secs: 60,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn zero_sampling_rate_fails_validation() {
        let dto = UpdateAlertConfig {
            alert_level: "medium".to_string(),
            notification_channels: vec![],
            auto_response_enabled: false,
            movement_threshold: 0.75,
            voltage_threshold: 0.5,
            connection_threshold: 0.8,
            sampling_rate_secs: 0,
        };
        assert!(dto.validate().is_err());
    }
}
