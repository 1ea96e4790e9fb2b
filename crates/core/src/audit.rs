//! Security log constants and integrity hashing.
//!
//! The security log is append-only; each entry carries a SHA-256 hash
//! chained from its predecessor so after-the-fact tampering with the trail
//! itself is detectable.

use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Activity type constants
// ---------------------------------------------------------------------------

/// Known activity types for security log entries.
pub mod activity_types {
    pub const ALERT_GENERATED: &str = "alert_generated";
    pub const ALERT_ACKNOWLEDGED: &str = "alert_acknowledged";
    pub const CONFIGURATION_CHANGE: &str = "configuration_change";
    pub const SENSITIVITY_CHANGE: &str = "sensitivity_change";
    pub const SYSTEM_DIAGNOSTIC: &str = "system_diagnostic";
}

/// Actor recorded for entries the pipeline writes on its own behalf.
pub const SYSTEM_ACTOR: &str = "SYSTEM";

// ---------------------------------------------------------------------------
// Integrity hash computation
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "SECURITY_LOG_CHAIN_SEED_V1";

/// Compute the SHA-256 integrity hash for a security log entry.
///
/// `prev_hash` is the hash of the previous entry, or `None` for the first
/// entry in the chain. `entry_data` is the canonical string representation
/// of the entry produced by [`entry_data`].
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    let hash = Sha256::digest(combined.as_bytes());
    format!("{hash:x}")
}

/// Canonical string representation of an entry for hashing.
pub fn entry_data(installation_id: i64, activity_type: &str, details: &str, actor: &str) -> String {
    format!("{installation_id}|{activity_type}|{details}|{actor}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_uses_seed() {
        let hash = compute_integrity_hash(None, "entry");
        // SHA-256 hex digest is always 64 characters.
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn chained_entry_differs_from_first() {
        let first = compute_integrity_hash(None, "entry_1");
        let second = compute_integrity_hash(Some(&first), "entry_2");
        assert_ne!(first, second);
        assert_eq!(second.len(), 64);
    }

    #[test]
    fn same_input_same_hash() {
        assert_eq!(
            compute_integrity_hash(None, "same"),
            compute_integrity_hash(None, "same")
        );
    }

    #[test]
    fn different_prev_hash_different_result() {
        let a = compute_integrity_hash(Some("hash_a"), "same");
        let b = compute_integrity_hash(Some("hash_b"), "same");
        assert_ne!(a, b);
    }

    #[test]
    fn entry_data_is_stable() {
        assert_eq!(
            entry_data(7, activity_types::ALERT_GENERATED, "details", SYSTEM_ACTOR),
            "7|alert_generated|details|SYSTEM"
        );
    }
}
