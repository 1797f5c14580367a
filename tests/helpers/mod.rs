//! Test helper utilities
//!
//! Shared builders for spinning up the service against a temp directory,
//! stub classifiers, and multipart request construction.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;

use genrebox::config::Config;
use genrebox::db;
use genrebox::db::tracks::SqliteTrackStore;
use genrebox::services::{
    Classifier, ClassifyError, FsBlobStore, IngestService, UploadLimiter, UNKNOWN_GENRE,
};
use genrebox::{build_router, AppState};

pub const MULTIPART_BOUNDARY: &str = "genrebox-test-boundary";

/// Classifier stub answering a fixed label
pub struct StubClassifier {
    label: String,
}

impl StubClassifier {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, _path: &Path) -> Result<String, ClassifyError> {
        Ok(self.label.clone())
    }
}

/// Classifier stub that always fails
pub struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _path: &Path) -> Result<String, ClassifyError> {
        Err(ClassifyError::Network("connection refused".to_string()))
    }
}

/// Classifier stub answering a scripted label sequence, then "unknown"
pub struct ScriptedClassifier {
    labels: Mutex<VecDeque<String>>,
}

impl ScriptedClassifier {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: Mutex::new(labels.iter().map(|label| label.to_string()).collect()),
        }
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, _path: &Path) -> Result<String, ClassifyError> {
        let label = self.labels.lock().unwrap().pop_front();
        Ok(label.unwrap_or_else(|| UNKNOWN_GENRE.to_string()))
    }
}

/// A running test instance: state, pool, and the temp root keeping
/// the database and uploads alive for the test's duration.
pub struct TestApp {
    pub state: AppState,
    pub pool: SqlitePool,
    pub root: TempDir,
}

impl TestApp {
    /// Fresh router over the shared state; oneshot consumes one per request
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub fn upload_dir(&self) -> std::path::PathBuf {
        self.state.config.upload_dir()
    }
}

fn test_config(root: &Path) -> Config {
    Config {
        port: 0,
        root_folder: root.to_path_buf(),
        jwt_secret: "test-jwt-secret".to_string(),
        jwt_expiration_secs: 3600,
        admin_email: "admin@mail.com".to_string(),
        // nothing listens on port 1; upload tests use stub classifiers
        classifier_url: "http://127.0.0.1:1".to_string(),
        classifier_model: "test-model".to_string(),
        max_upload_bytes: 16 * 1024 * 1024,
    }
}

/// Test app with a classifier that always answers "testgenre"
pub async fn create_test_app() -> TestApp {
    create_test_app_with_classifier(Arc::new(StubClassifier::new("testgenre"))).await
}

/// Test app with a caller-supplied classifier
pub async fn create_test_app_with_classifier(classifier: Arc<dyn Classifier>) -> TestApp {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(root.path());
    build_test_app(root, config, classifier).await
}

/// Test app whose configured admin email differs from the default
pub async fn create_test_app_with_admin_email(admin_email: &str) -> TestApp {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = test_config(root.path());
    config.admin_email = admin_email.to_string();
    build_test_app(root, config, Arc::new(StubClassifier::new("testgenre"))).await
}

async fn build_test_app(root: TempDir, config: Config, classifier: Arc<dyn Classifier>) -> TestApp {
    let pool = db::init_database_pool(&config.db_path())
        .await
        .expect("Failed to initialize test database");

    let ingest = IngestService::new(
        UploadLimiter::default(),
        Arc::new(FsBlobStore::new(config.upload_dir())),
        Arc::new(SqliteTrackStore::new(pool.clone())),
        classifier,
    );

    let state = AppState::new(pool.clone(), config, ingest);
    TestApp { state, pool, root }
}

/// Minimal valid WAV: mono, 16 kHz, 10 ms of silence
pub fn wav_stub() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).expect("Failed to create WAV writer");
        for _ in 0..160 {
            writer.write_sample(0i16).expect("Failed to write sample");
        }
        writer.finalize().expect("Failed to finalize WAV");
    }
    cursor.into_inner()
}

/// Multipart body with a single `file` field
pub fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// Multipart body with no `file` field at all
pub fn multipart_body_without_file() -> Vec<u8> {
    format!(
        "--{MULTIPART_BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"note\"\r\n\r\n\
         hello\r\n\
         --{MULTIPART_BOUNDARY}--\r\n"
    )
    .into_bytes()
}

/// Build a POST /api/v1/upload request
pub fn upload_request(
    filename: &str,
    content: &[u8],
    token: Option<&str>,
    cookie: Option<&str>,
) -> Request<Body> {
    upload_request_raw(multipart_body(filename, content), token, cookie)
}

/// Build a POST /api/v1/upload request from a prebuilt multipart body
pub fn upload_request_raw(
    body: Vec<u8>,
    token: Option<&str>,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        );

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder.body(Body::from(body)).unwrap()
}

/// Build a JSON POST request
pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request with an optional bearer token
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON
pub async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// `name=value` part of the Set-Cookie header, if the response set one
pub fn session_cookie(response: &Response) -> Option<String> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    Some(raw.split(';').next().unwrap_or(raw).to_string())
}

/// Register a user, asserting success
pub async fn register_user(app: &TestApp, email: &str, password: &str) {
    let response = app
        .router()
        .oneshot(json_request(
            "/api/v1/auth/register",
            serde_json::json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        axum::http::StatusCode::CREATED,
        "registration failed for {email}"
    );
}

/// Login and return the access token
pub async fn login_token(app: &TestApp, email: &str, password: &str) -> String {
    let response = app
        .router()
        .oneshot(json_request(
            "/api/v1/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let json = body_json(response).await;
    json["access_token"].as_str().unwrap().to_string()
}

/// Register then login, returning the access token
pub async fn register_and_login(app: &TestApp, email: &str, password: &str) -> String {
    register_user(app, email, password).await;
    login_token(app, email, password).await
}
