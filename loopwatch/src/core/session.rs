//! Session continuity record and TTL check.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Single live session slot (`session.json`), last write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    /// RFC 3339 timestamp of the last write. Kept as text so a corrupt value
    /// fails the TTL check instead of the whole load.
    #[serde(alias = "timestamp")]
    pub created_at: String,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Resume iff a record exists, names a session, its timestamp parses, and its
/// age is within `[0, ttl_secs)`. Anything else fails closed.
pub fn should_resume(record: Option<&SessionRecord>, now: DateTime<Utc>, ttl_secs: u64) -> bool {
    let Some(record) = record else {
        return false;
    };
    if record.session_id.trim().is_empty() {
        return false;
    }
    let Ok(created) = DateTime::parse_from_rfc3339(record.created_at.trim()) else {
        return false;
    };
    let age = now.signed_duration_since(created.with_timezone(&Utc));
    if age.num_milliseconds() < 0 {
        return false;
    }
    (age.num_seconds() as u64) < ttl_secs
}
