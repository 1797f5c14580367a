//! Upload endpoint
//!
//! Accepts a multipart `file` field, optionally authenticated. Guests are
//! identified by a `session` cookie minted here on first contact; their
//! quota record is loaded before ingest and written back afterwards whether
//! or not ingest succeeded, since an admitted upload that fails validation
//! has still spent a quota unit.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::auth::MaybeIdentity;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services::Upload;
use crate::AppState;

/// Cookie carrying the guest session id
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize)]
struct UploadResponse {
    id: Uuid,
    filename: String,
    genre: String,
}

/// POST /api/v1/upload
async fn upload(
    State(state): State<AppState>,
    identity: MaybeIdentity,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let owner = identity.0;

    let (session_id, fresh_session) = match session_from_headers(&headers) {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    };

    let file = read_file_field(&mut multipart).await?;

    let mut quota = if owner.is_none() {
        db::sessions::load_quota(&state.db, session_id).await?
    } else {
        None
    };

    let outcome = state.ingest.ingest(file, owner, &mut quota).await;

    if owner.is_none() {
        db::sessions::store_quota(&state.db, session_id, quota.as_ref()).await?;
    }

    let mut response = match outcome {
        Ok(track) => (
            StatusCode::CREATED,
            Json(UploadResponse {
                id: track.id,
                filename: track.stored_name,
                genre: track.genre,
            }),
        )
            .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    };

    // the cookie must reach the client even on a rejected upload, or the
    // next request would start a fresh session and a fresh quota
    if owner.is_none() && fresh_session {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, session_id
        );
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::Internal(format!("Failed to build session cookie: {}", e)))?;
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    Ok(response)
}

/// Pull the `file` field off the multipart body, if present
async fn read_file_field(multipart: &mut Multipart) -> ApiResult<Option<Upload>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(Upload {
            original_name,
            bytes,
        }));
    }

    Ok(None)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the size limit".to_string())
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Parse the guest session id out of the Cookie header
pub(crate) fn session_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name.trim() != SESSION_COOKIE {
            return None;
        }
        Uuid::parse_str(value.trim()).ok()
    })
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/api/v1/upload", post(upload))
}
