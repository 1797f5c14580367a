//! Track records (one per accepted upload)

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A stored, classified upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    /// Track identifier
    pub id: Uuid,

    /// Generated on-disk file name (unique)
    pub stored_name: String,

    /// Sanitized name the client supplied, kept for display
    pub original_name: String,

    /// Genre label from the classifier, or "unknown"
    pub genre: String,

    /// When the upload was accepted
    pub uploaded_at: DateTime<Utc>,

    /// Owning user, None for guest uploads
    pub owner_id: Option<Uuid>,
}

/// Fields needed to insert a track; id and timestamp are assigned on insert
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub stored_name: String,
    pub original_name: String,
    pub genre: String,
    pub owner_id: Option<Uuid>,
}
