//! Genre classification client
//!
//! Classification runs in a separate model-serving process; this client
//! sends it the stored file path and gets a label back. Classifier failures
//! are never fatal to an upload: callers fall back to [`UNKNOWN_GENRE`].

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Label recorded when classification fails or returns nothing usable
pub const UNKNOWN_GENRE: &str = "unknown";

/// Labels the GTZAN-trained model can produce
pub const SUPPORTED_GENRES: [&str; 10] = [
    "blues",
    "classical",
    "country",
    "disco",
    "hiphop",
    "jazz",
    "metal",
    "pop",
    "reggae",
    "rock",
];

/// Classification failure
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Could not reach the classifier service
    #[error("Classifier request failed: {0}")]
    Network(String),

    /// Classifier answered with a non-success status
    #[error("Classifier returned status {0}: {1}")]
    Service(u16, String),

    /// Classifier answered with a body we could not parse
    #[error("Failed to parse classifier response: {0}")]
    Parse(String),
}

/// Anything that can label an audio file
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Label the audio file at `path`
    async fn classify(&self, path: &Path) -> Result<String, ClassifyError>;
}

/// Request body for POST /classify
#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: String,
}

/// HTTP client for the model-serving sidecar
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client (system error)"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, path: &Path) -> Result<String, ClassifyError> {
        let url = format!("{}/classify", self.base_url);
        let file_path = path.to_string_lossy();
        debug!(%url, path = %file_path, "requesting genre classification");

        let response = self
            .client
            .post(&url)
            .json(&ClassifyRequest { path: &file_path })
            .send()
            .await
            .map_err(|e| ClassifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Service(status.as_u16(), body));
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;

        debug!(label = %parsed.label, "classifier answered");
        Ok(parsed.label)
    }
}
