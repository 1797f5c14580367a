//! Business logic: rate limiting, storage, classification, ingestion

pub mod classifier;
pub mod ingest;
pub mod limiter;
pub mod storage;

pub use classifier::{Classifier, ClassifyError, HttpClassifier, SUPPORTED_GENRES, UNKNOWN_GENRE};
pub use ingest::{IngestError, IngestService, TrackStore, Upload, ALLOWED_EXTENSIONS};
pub use limiter::{UploadLimiter, GUEST_UPLOAD_LIMIT, GUEST_WINDOW_HOURS};
pub use storage::{BlobStore, FsBlobStore, GUEST_SCOPE};
