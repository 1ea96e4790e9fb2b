//! Per-installation sensor baseline cache.
//!
//! Holds the last known sensor values for every monitored installation,
//! sharded so concurrency control is per installation: the outer map is
//! only locked long enough to fetch or create an entry, while the entry's
//! own mutex serializes the read-evaluate-update sequence for that
//! installation. Readings for different installations proceed in parallel.
//!
//! The cache is process-local and not durable. After a restart each
//! installation gets one comparison against defaults, which cannot fire
//! spuriously.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use helioguard_core::evaluate::SensorBaseline;
use helioguard_core::types::DbId;

/// Sharded map of installation id to its baseline.
#[derive(Default)]
pub struct BaselineCache {
    entries: RwLock<HashMap<DbId, Arc<Mutex<SensorBaseline>>>>,
}

impl BaselineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the baseline entry for an installation, creating it with
    /// default values if absent.
    ///
    /// The returned handle is the per-installation lock: callers hold it
    /// across evaluation and event creation to serialize readings for the
    /// same installation.
    pub async fn entry(&self, installation_id: DbId) -> Arc<Mutex<SensorBaseline>> {
        if let Some(entry) = self.entries.read().await.get(&installation_id) {
            return Arc::clone(entry);
        }

        let mut entries = self.entries.write().await;
        Arc::clone(
            entries
                .entry(installation_id)
                .or_insert_with(|| Arc::new(Mutex::new(SensorBaseline::default()))),
        )
    }

    /// Initialize an installation's entry if absent. Idempotent; an
    /// existing baseline is left untouched.
    pub async fn ensure(&self, installation_id: DbId) {
        let _ = self.entry(installation_id).await;
    }

    /// Copy of the current baseline, or `None` if never initialized.
    pub async fn snapshot(&self, installation_id: DbId) -> Option<SensorBaseline> {
        let entries = self.entries.read().await;
        match entries.get(&installation_id) {
            Some(entry) => Some(entry.lock().await.clone()),
            None => None,
        }
    }
}
