//! Track listing and detail endpoints (authenticated)

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::db;
use crate::db::tracks::{SortOrder, TrackSort};
use crate::error::{ApiError, ApiResult};
use crate::models::Track;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// "date" (default) or "name"
    pub sort: Option<String>,

    /// "desc" (default) or "asc"
    pub order: Option<String>,

    /// "1" groups the listing by genre
    pub group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub genre: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Track> for TrackResponse {
    fn from(track: Track) -> Self {
        Self {
            id: track.id,
            filename: track.stored_name,
            original_name: track.original_name,
            genre: track.genre,
            uploaded_at: track.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrackListResponse {
    pub tracks: Vec<TrackResponse>,
}

#[derive(Debug, Serialize)]
pub struct TrackGroupsResponse {
    pub groups: BTreeMap<String, Vec<TrackResponse>>,
}

/// GET /api/v1/tracks
///
/// `group=1` buckets the sorted listing by genre; the sort order is kept
/// within each bucket.
async fn list_tracks(
    State(state): State<AppState>,
    Identity { user_id }: Identity,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    let sort = TrackSort::parse(query.sort.as_deref().unwrap_or("date"));
    let order = SortOrder::parse(query.order.as_deref().unwrap_or("desc"));

    let tracks = db::tracks::list_for_owner(&state.db, user_id, sort, order).await?;

    if query.group.as_deref() == Some("1") {
        let mut groups: BTreeMap<String, Vec<TrackResponse>> = BTreeMap::new();
        for track in tracks {
            groups
                .entry(track.genre.clone())
                .or_default()
                .push(track.into());
        }
        return Ok(Json(TrackGroupsResponse { groups }).into_response());
    }

    Ok(Json(TrackListResponse {
        tracks: tracks.into_iter().map(TrackResponse::from).collect(),
    })
    .into_response())
}

/// GET /api/v1/tracks/:id
///
/// Scoped to the caller: someone else's track id answers 404, not 403, so
/// the endpoint does not confirm the id exists.
async fn track_detail(
    State(state): State<AppState>,
    Identity { user_id }: Identity,
    Path(track_id): Path<Uuid>,
) -> ApiResult<Json<TrackResponse>> {
    let track = db::tracks::find_for_owner(&state.db, track_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Track not found: {}", track_id)))?;

    Ok(Json(TrackResponse::from(track)))
}

/// Build track routes
pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/tracks", get(list_tracks))
        .route("/api/v1/tracks/:id", get(track_detail))
}
