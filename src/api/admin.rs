//! Admin endpoints
//!
//! Gated on the configured admin email rather than a role column; the
//! account whose email matches `admin_email` (compared case-insensitively)
//! is the admin.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::api::auth::Identity;
use crate::api::upload::session_from_headers;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
struct ResetResponse {
    status: String,
}

/// POST /api/v1/admin/reset-guest-limit
///
/// Clears the quota record for the guest session cookie on this request.
/// Without a session cookie there is nothing to clear and the call still
/// succeeds.
async fn reset_guest_limit(
    State(state): State<AppState>,
    Identity { user_id }: Identity,
    headers: HeaderMap,
) -> ApiResult<Json<ResetResponse>> {
    let user = db::users::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if user.email.to_lowercase() != state.config.admin_email.to_lowercase() {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    if let Some(session_id) = session_from_headers(&headers) {
        let mut quota = db::sessions::load_quota(&state.db, session_id).await?;
        state.ingest.limiter().reset(&mut quota);
        db::sessions::store_quota(&state.db, session_id, quota.as_ref()).await?;
        info!(%session_id, admin = %user.email, "guest upload quota reset");
    }

    Ok(Json(ResetResponse {
        status: "ok".to_string(),
    }))
}

/// Build admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/api/v1/admin/reset-guest-limit", post(reset_guest_limit))
}
