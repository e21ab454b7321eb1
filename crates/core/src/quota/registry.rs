//! Realm quota registry
//!
//! Owns one [`RealmQuotaTracker`] per realm, created on first use. Lookup
//! and insertion happen under a single lock, so concurrent first calls for
//! the same realm observe the same tracker. The lock is never held across
//! an await.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tallyline_common::resilience::{Clock, SystemClock};
use tallyline_domain::{QuotaConfig, RealmId, Result};
use tracing::info;

use super::RealmQuotaTracker;

pub struct QuotaRegistry<C: Clock + Clone = SystemClock> {
    config: QuotaConfig,
    clock: C,
    trackers: Mutex<HashMap<RealmId, Arc<RealmQuotaTracker<C>>>>,
}

impl QuotaRegistry<SystemClock> {
    /// # Errors
    /// Returns `TallyError::Config` when the realm or batch limits are invalid.
    pub fn new(config: QuotaConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock + Clone> QuotaRegistry<C> {
    /// # Errors
    /// Returns `TallyError::Config` when the realm or batch limits are invalid.
    pub fn with_clock(config: QuotaConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, clock, trackers: Mutex::new(HashMap::new()) })
    }

    /// The tracker for `realm`, creating it on first use.
    ///
    /// # Errors
    /// Returns `TallyError::Config` if the tracker cannot be built; the
    /// configuration is validated up front, so this does not happen in
    /// practice.
    pub fn get_or_create(&self, realm: &RealmId) -> Result<Arc<RealmQuotaTracker<C>>> {
        let mut trackers = self.trackers.lock();
        if let Some(tracker) = trackers.get(realm) {
            return Ok(Arc::clone(tracker));
        }

        let tracker = Arc::new(RealmQuotaTracker::new(
            realm.clone(),
            &self.config.realm,
            &self.config.batch,
            self.clock.clone(),
        )?);
        trackers.insert(realm.clone(), Arc::clone(&tracker));
        info!(realm = %realm, realms = trackers.len(), "created realm quota tracker");
        Ok(tracker)
    }

    /// The tracker for `realm` if one exists.
    pub fn get(&self, realm: &RealmId) -> Option<Arc<RealmQuotaTracker<C>>> {
        self.trackers.lock().get(realm).cloned()
    }

    /// Number of realms seen so far.
    pub fn len(&self) -> usize {
        self.trackers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.lock().is_empty()
    }
}

impl<C: Clock + Clone> std::fmt::Debug for QuotaRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaRegistry")
            .field("config", &self.config)
            .field("realms", &self.len())
            .finish_non_exhaustive()
    }
}
