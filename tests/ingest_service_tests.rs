//! Pipeline tests for [`IngestService`] with in-memory capabilities.
//!
//! These pin down the ordering guarantees of the workflow: quota consumption
//! before validation, no refunds, and what is (and is not) on disk after
//! each failure mode.

mod helpers;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{Duration, Utc};
use uuid::Uuid;

use genrebox::error::Error;
use genrebox::models::{GuestQuota, NewTrack, Track};
use genrebox::services::{
    BlobStore, IngestError, IngestService, TrackStore, Upload, UploadLimiter, GUEST_SCOPE,
    GUEST_UPLOAD_LIMIT,
};

use helpers::{FailingClassifier, StubClassifier};

/// Blob store that keeps writes in memory and never touches disk
#[derive(Default)]
struct MemBlobStore {
    writes: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl MemBlobStore {
    fn writes(&self) -> Vec<(String, String, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MemBlobStore {
    async fn put(&self, scope: &str, name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        self.writes
            .lock()
            .unwrap()
            .push((scope.to_string(), name.to_string(), data.to_vec()));
        Ok(PathBuf::from(format!("/mem/{scope}/{name}")))
    }
}

/// Track store that records inserts and assigns ids
#[derive(Default)]
struct RecordingTrackStore {
    inserted: Mutex<Vec<NewTrack>>,
}

impl RecordingTrackStore {
    fn inserted(&self) -> Vec<NewTrack> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackStore for RecordingTrackStore {
    async fn insert(&self, new: NewTrack) -> genrebox::error::Result<Track> {
        self.inserted.lock().unwrap().push(new.clone());
        Ok(Track {
            id: Uuid::new_v4(),
            stored_name: new.stored_name,
            original_name: new.original_name,
            genre: new.genre,
            uploaded_at: Utc::now(),
            owner_id: new.owner_id,
        })
    }
}

/// Track store whose inserts always fail
struct FailingTrackStore;

#[async_trait]
impl TrackStore for FailingTrackStore {
    async fn insert(&self, _new: NewTrack) -> genrebox::error::Result<Track> {
        Err(Error::Internal("disk full".to_string()))
    }
}

struct Pipeline {
    service: IngestService,
    blobs: Arc<MemBlobStore>,
    tracks: Arc<RecordingTrackStore>,
}

fn pipeline() -> Pipeline {
    let blobs = Arc::new(MemBlobStore::default());
    let tracks = Arc::new(RecordingTrackStore::default());
    let service = IngestService::new(
        UploadLimiter::default(),
        blobs.clone(),
        tracks.clone(),
        Arc::new(StubClassifier::new("jazz")),
    );
    Pipeline {
        service,
        blobs,
        tracks,
    }
}

fn upload(name: &str) -> Option<Upload> {
    Some(Upload {
        original_name: name.to_string(),
        bytes: Bytes::from_static(b"RIFFdata"),
    })
}

#[tokio::test]
async fn guest_upload_runs_full_pipeline() {
    let p = pipeline();
    let mut quota = None;

    let track = p.service.ingest(upload("song.wav"), None, &mut quota).await.unwrap();
    assert_eq!(track.genre, "jazz");
    assert_eq!(track.original_name, "song.wav");
    assert_eq!(track.owner_id, None);

    let writes = p.blobs.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, GUEST_SCOPE);
    assert_eq!(writes[0].1, track.stored_name);
    assert_eq!(writes[0].2, b"RIFFdata");

    assert_eq!(quota.unwrap().count, 1);
}

#[tokio::test]
async fn persistence_failure_leaves_stored_file_behind() {
    let blobs = Arc::new(MemBlobStore::default());
    let service = IngestService::new(
        UploadLimiter::default(),
        blobs.clone(),
        Arc::new(FailingTrackStore),
        Arc::new(StubClassifier::new("rock")),
    );
    let mut quota = None;

    let err = service
        .ingest(upload("song.wav"), None, &mut quota)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Persistence(_)));

    // the blob was already written and is not cleaned up
    assert_eq!(blobs.writes().len(), 1);

    // and the guest still spent a quota unit on it
    assert_eq!(quota.unwrap().count, 1);
}

#[tokio::test]
async fn unsupported_extension_stores_nothing_but_counts() {
    let p = pipeline();
    let mut quota = None;

    let err = p
        .service
        .ingest(upload("notes.txt"), None, &mut quota)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedType(ext) if ext == "txt"));

    assert!(p.blobs.writes().is_empty());
    assert!(p.tracks.inserted().is_empty());
    assert_eq!(quota.unwrap().count, 1);
}

#[tokio::test]
async fn missing_file_still_consumes_quota() {
    let p = pipeline();
    let mut quota = None;

    let err = p.service.ingest(None, None, &mut quota).await.unwrap_err();
    assert!(matches!(err, IngestError::MissingFile));
    assert_eq!(quota.unwrap().count, 1);
}

#[tokio::test]
async fn whitespace_name_is_missing_file() {
    let p = pipeline();
    let mut quota = None;

    let err = p
        .service
        .ingest(upload("   "), None, &mut quota)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::MissingFile));
    assert!(p.blobs.writes().is_empty());
}

#[tokio::test]
async fn exhausted_quota_denies_before_touching_anything() {
    let p = pipeline();
    let start = Utc::now() - Duration::hours(1);
    let mut quota = Some(GuestQuota {
        count: GUEST_UPLOAD_LIMIT,
        window_start: start,
    });

    let err = p
        .service
        .ingest(upload("song.wav"), None, &mut quota)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::QuotaExceeded));

    assert!(p.blobs.writes().is_empty());
    assert!(p.tracks.inserted().is_empty());

    // denial leaves the record as it was
    let quota = quota.unwrap();
    assert_eq!(quota.count, GUEST_UPLOAD_LIMIT);
    assert_eq!(quota.window_start, start);
}

#[tokio::test]
async fn owner_uploads_skip_the_limiter() {
    let p = pipeline();
    let owner = Uuid::new_v4();
    let mut quota = None;

    for i in 0..GUEST_UPLOAD_LIMIT + 2 {
        let track = p
            .service
            .ingest(upload(&format!("track{i}.mp3")), Some(owner), &mut quota)
            .await
            .unwrap();
        assert_eq!(track.owner_id, Some(owner));
    }

    // no guest record was created or consulted
    assert!(quota.is_none());

    // owner uploads land under the owner's scope, not the guest one
    for (scope, _, _) in p.blobs.writes() {
        assert_eq!(scope, owner.to_string());
    }
}

#[tokio::test]
async fn classifier_failure_records_unknown() {
    let blobs = Arc::new(MemBlobStore::default());
    let tracks = Arc::new(RecordingTrackStore::default());
    let service = IngestService::new(
        UploadLimiter::default(),
        blobs,
        tracks.clone(),
        Arc::new(FailingClassifier),
    );
    let mut quota = None;

    let track = service
        .ingest(upload("song.flac"), None, &mut quota)
        .await
        .unwrap();
    assert_eq!(track.genre, "unknown");
    assert_eq!(tracks.inserted()[0].genre, "unknown");
}

#[tokio::test]
async fn blank_classifier_label_records_unknown() {
    let blobs = Arc::new(MemBlobStore::default());
    let tracks = Arc::new(RecordingTrackStore::default());
    let service = IngestService::new(
        UploadLimiter::default(),
        blobs,
        tracks,
        Arc::new(StubClassifier::new("   ")),
    );
    let mut quota = None;

    let track = service
        .ingest(upload("song.wav"), None, &mut quota)
        .await
        .unwrap();
    assert_eq!(track.genre, "unknown");
}

#[tokio::test]
async fn stored_names_are_fresh_per_upload() {
    let p = pipeline();
    let mut quota = None;

    let first = p
        .service
        .ingest(upload("my song.WAV"), None, &mut quota)
        .await
        .unwrap();
    let second = p
        .service
        .ingest(upload("my song.WAV"), None, &mut quota)
        .await
        .unwrap();

    assert_ne!(first.stored_name, second.stored_name);
    for track in [&first, &second] {
        // 32 hex chars, a dot, and the lowercased extension
        assert_eq!(track.stored_name.len(), 36);
        assert!(track.stored_name.ends_with(".wav"));
        assert_eq!(track.original_name, "my_song.WAV");
    }
}
