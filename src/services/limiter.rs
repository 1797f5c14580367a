//! Guest upload rate limiting
//!
//! Guests (requests without a valid bearer token) may upload a fixed number
//! of files per fixed window, tracked per session. The window does not
//! slide: it opens on the first counted upload and resets only once it has
//! fully elapsed. Authenticated uploads never consult this limiter.

use chrono::{DateTime, Duration, Utc};

use crate::models::GuestQuota;

/// Uploads a guest session may make per window
pub const GUEST_UPLOAD_LIMIT: u32 = 5;

/// Window length in hours
pub const GUEST_WINDOW_HOURS: i64 = 24;

/// Fixed-window counter over a per-session quota record.
///
/// The limiter owns no storage. Callers load the session's quota, hand it in
/// as `&mut Option<GuestQuota>`, and persist whatever is left in the option
/// afterwards, admit or deny. A check that admits has already consumed one
/// unit; failures later in the request do not refund it.
#[derive(Debug, Clone)]
pub struct UploadLimiter {
    limit: u32,
    window: Duration,
}

impl UploadLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    /// Decide whether one more guest upload is admitted at `now`.
    ///
    /// Missing or expired quota records are replaced with a fresh window
    /// before counting. On admit the count has been incremented; on deny the
    /// record is left unchanged (but is still written back, so its
    /// persistence lifetime refreshes).
    pub fn can_admit(&self, entry: &mut Option<GuestQuota>, now: DateTime<Utc>) -> bool {
        let mut quota = match entry.take() {
            Some(quota) if now - quota.window_start < self.window => quota,
            _ => GuestQuota::fresh(now),
        };

        if quota.count >= self.limit {
            *entry = Some(quota);
            return false;
        }

        quota.count += 1;
        *entry = Some(quota);
        true
    }

    /// Drop the session's quota record entirely. The next check starts a
    /// fresh window.
    pub fn reset(&self, entry: &mut Option<GuestQuota>) {
        *entry = None;
    }
}

impl Default for UploadLimiter {
    fn default() -> Self {
        Self::new(GUEST_UPLOAD_LIMIT, Duration::hours(GUEST_WINDOW_HOURS))
    }
}
