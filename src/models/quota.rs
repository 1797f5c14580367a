//! Guest upload quota record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-session upload quota for guests.
///
/// Stored as JSON in the guest session row. The serialized shape is part of
/// the session storage contract: `{"count": <n>, "start": "<rfc3339>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestQuota {
    /// Uploads consumed in the current window
    pub count: u32,

    /// When the current window opened
    #[serde(rename = "start")]
    pub window_start: DateTime<Utc>,
}

impl GuestQuota {
    /// New quota with nothing consumed, window opening now
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }
}
