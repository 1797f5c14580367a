//! Upload-and-classify workflow
//!
//! One entry point, [`IngestService::ingest`], runs every accepted upload
//! through the same pipeline: guest admission, file validation, blob
//! storage, classification, and persistence. Steps are ordered so that a
//! guest's quota unit is consumed before any validation happens, and so
//! that a stored file is never silently re-labelled: classification sits
//! between storage and the database insert.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{GuestQuota, NewTrack, Track};
use crate::services::classifier::{Classifier, UNKNOWN_GENRE};
use crate::services::limiter::UploadLimiter;
use crate::services::storage::{BlobStore, GUEST_SCOPE};

/// File extensions accepted for upload (lowercase, without dot)
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "flac"];

/// An incoming file as pulled off the request
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name, unsanitized
    pub original_name: String,

    /// File contents
    pub bytes: Bytes,
}

/// Why an upload was rejected or lost
#[derive(Debug, Error)]
pub enum IngestError {
    /// Guest session has used up its upload window
    #[error("guest upload limit reached")]
    QuotaExceeded,

    /// Request carried no file, or the file had no name
    #[error("no file provided")]
    MissingFile,

    /// Extension missing or not in [`ALLOWED_EXTENSIONS`]
    #[error("unsupported file type: {0:?}")]
    UnsupportedType(String),

    /// Writing the blob failed; nothing was stored
    #[error("failed to store upload: {0}")]
    Storage(#[from] std::io::Error),

    /// Database insert failed after the blob was written. The stored file
    /// is left behind; there is no record pointing at it.
    #[error("failed to persist track: {0}")]
    Persistence(String),
}

/// Track persistence as seen by the workflow
#[async_trait]
pub trait TrackStore: Send + Sync {
    /// Insert a record for an accepted upload, assigning id and timestamp
    async fn insert(&self, new: NewTrack) -> crate::error::Result<Track>;
}

/// The upload pipeline with its injected capabilities
pub struct IngestService {
    limiter: UploadLimiter,
    blobs: Arc<dyn BlobStore>,
    tracks: Arc<dyn TrackStore>,
    classifier: Arc<dyn Classifier>,
}

impl IngestService {
    pub fn new(
        limiter: UploadLimiter,
        blobs: Arc<dyn BlobStore>,
        tracks: Arc<dyn TrackStore>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            limiter,
            blobs,
            tracks,
            classifier,
        }
    }

    /// The guest limiter, for callers that manage session quota directly
    /// (the admin reset endpoint).
    pub fn limiter(&self) -> &UploadLimiter {
        &self.limiter
    }

    /// Run one upload through the pipeline.
    ///
    /// `owner` is the authenticated user, if any; authenticated uploads
    /// skip the limiter entirely and `quota` is left untouched. For guests,
    /// `quota` is the session's current record and holds the state the
    /// caller must persist afterwards, whether ingest succeeded or not. An
    /// admitted upload that later fails validation has still consumed a
    /// quota unit.
    pub async fn ingest(
        &self,
        file: Option<Upload>,
        owner: Option<Uuid>,
        quota: &mut Option<GuestQuota>,
    ) -> Result<Track, IngestError> {
        if owner.is_none() && !self.limiter.can_admit(quota, Utc::now()) {
            return Err(IngestError::QuotaExceeded);
        }

        let upload = file.ok_or(IngestError::MissingFile)?;
        if upload.original_name.trim().is_empty() {
            return Err(IngestError::MissingFile);
        }

        let safe_name = sanitize_filename(&upload.original_name);
        let ext = match extension_of(&safe_name) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return Err(IngestError::UnsupportedType(String::new())),
        };
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(IngestError::UnsupportedType(ext));
        }

        let stored_name = format!("{}.{}", Uuid::new_v4().simple(), ext);
        let scope = owner
            .map(|id| id.to_string())
            .unwrap_or_else(|| GUEST_SCOPE.to_string());

        let path: PathBuf = self.blobs.put(&scope, &stored_name, &upload.bytes).await?;

        let genre = match self.classifier.classify(&path).await {
            Ok(label) if !label.trim().is_empty() => label,
            Ok(_) => {
                warn!(path = %path.display(), "classifier returned empty label");
                UNKNOWN_GENRE.to_string()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "classification failed");
                UNKNOWN_GENRE.to_string()
            }
        };

        let track = self
            .tracks
            .insert(NewTrack {
                stored_name,
                original_name: safe_name,
                genre,
                owner_id: owner,
            })
            .await
            .map_err(|err| {
                warn!(path = %path.display(), error = %err, "track insert failed, stored file orphaned");
                IngestError::Persistence(err.to_string())
            })?;

        info!(
            track_id = %track.id,
            stored_name = %track.stored_name,
            genre = %track.genre,
            guest = owner.is_none(),
            "upload ingested"
        );

        Ok(track)
    }
}

/// Strip an untrusted file name down to a safe basename.
///
/// Drops any directory components, replaces whitespace with underscores,
/// removes everything outside `[A-Za-z0-9._-]`, and trims leading/trailing
/// dots and underscores. May return an empty string, which then fails the
/// extension check.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let mut out = String::with_capacity(base.len());
    for ch in base.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push('_');
        }
    }

    out.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Extension of a file name, requiring a non-empty stem. `"song.wav"` gives
/// `Some("wav")`; `"wav"` and `".wav"` give `None`.
pub fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}
