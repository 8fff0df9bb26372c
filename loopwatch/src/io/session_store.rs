//! Session store: the single persisted session slot plus its TTL policy.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::core::session::{SessionRecord, should_resume};
use crate::io::state::StateSlot;

pub struct SessionStore<S> {
    slot: S,
    ttl_secs: u64,
}

impl<S: StateSlot<SessionRecord>> SessionStore<S> {
    pub fn new(slot: S, ttl_secs: u64) -> Self {
        Self { slot, ttl_secs }
    }

    /// Overwrite the slot with `session_id` stamped at `now`.
    pub fn store(&self, session_id: &str, now: DateTime<Utc>) -> Result<()> {
        let record = SessionRecord::new(session_id, now);
        self.slot.save(&record)?;
        info!(session_id, "session stored");
        Ok(())
    }

    /// Stored session id, or empty when nothing usable is stored.
    pub fn get(&self) -> String {
        self.slot
            .load()
            .map(|record| record.session_id)
            .unwrap_or_default()
    }

    pub fn should_resume(&self, now: DateTime<Utc>) -> bool {
        let record = self.slot.load();
        let resume = should_resume(record.as_ref(), now, self.ttl_secs);
        debug!(resume, ttl_secs = self.ttl_secs, "session resume check");
        resume
    }

    pub fn clear(&self) -> Result<()> {
        self.slot.clear()
    }
}
