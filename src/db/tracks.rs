//! Track database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{NewTrack, Track};
use crate::services::ingest::TrackStore;

/// Sort key for track listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSort {
    Date,
    Name,
}

impl TrackSort {
    /// Parse a query parameter; unknown values fall back to the default
    pub fn parse(value: &str) -> Self {
        match value {
            "name" => TrackSort::Name,
            _ => TrackSort::Date,
        }
    }
}

/// Sort direction for track listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a query parameter; unknown values fall back to the default
    pub fn parse(value: &str) -> Self {
        match value {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

/// Insert a track row, assigning id and timestamp
pub async fn insert_track(pool: &SqlitePool, new: &NewTrack) -> Result<Track> {
    let track = Track {
        id: Uuid::new_v4(),
        stored_name: new.stored_name.clone(),
        original_name: new.original_name.clone(),
        genre: new.genre.clone(),
        uploaded_at: Utc::now(),
        owner_id: new.owner_id,
    };

    sqlx::query(
        r#"
        INSERT INTO tracks (guid, stored_name, original_name, genre, uploaded_at, owner_guid)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(track.id.to_string())
    .bind(&track.stored_name)
    .bind(&track.original_name)
    .bind(&track.genre)
    .bind(track.uploaded_at.to_rfc3339())
    .bind(track.owner_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(track)
}

/// Load one track, scoped to its owner. Tracks owned by other users (or by
/// nobody) are invisible here.
pub async fn find_for_owner(
    pool: &SqlitePool,
    track_id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Track>> {
    let row = sqlx::query(
        r#"
        SELECT guid, stored_name, original_name, genre, uploaded_at, owner_guid
        FROM tracks
        WHERE guid = ? AND owner_guid = ?
        "#,
    )
    .bind(track_id.to_string())
    .bind(owner_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|row| row_to_track(&row)).transpose()
}

/// List a user's tracks in the requested order
pub async fn list_for_owner(
    pool: &SqlitePool,
    owner_id: Uuid,
    sort: TrackSort,
    order: SortOrder,
) -> Result<Vec<Track>> {
    // Static ORDER BY fragments; user input never reaches the SQL text
    let order_by = match (sort, order) {
        (TrackSort::Date, SortOrder::Desc) => "uploaded_at DESC",
        (TrackSort::Date, SortOrder::Asc) => "uploaded_at ASC",
        (TrackSort::Name, SortOrder::Desc) => "original_name DESC",
        (TrackSort::Name, SortOrder::Asc) => "original_name ASC",
    };

    let sql = format!(
        r#"
        SELECT guid, stored_name, original_name, genre, uploaded_at, owner_guid
        FROM tracks
        WHERE owner_guid = ?
        ORDER BY {}
        "#,
        order_by
    );

    let rows = sqlx::query(&sql)
        .bind(owner_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_track).collect()
}

/// Total stored tracks (test support)
pub async fn count_tracks(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

fn row_to_track(row: &sqlx::sqlite::SqliteRow) -> Result<Track> {
    let guid: String = row.get("guid");
    let id = Uuid::parse_str(&guid)
        .map_err(|e| Error::Internal(format!("Failed to parse track guid: {}", e)))?;

    let uploaded_at: String = row.get("uploaded_at");
    let uploaded_at = chrono::DateTime::parse_from_rfc3339(&uploaded_at)
        .map_err(|e| Error::Internal(format!("Failed to parse uploaded_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    let owner_guid: Option<String> = row.get("owner_guid");
    let owner_id = owner_guid
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to parse owner guid: {}", e)))?;

    Ok(Track {
        id,
        stored_name: row.get("stored_name"),
        original_name: row.get("original_name"),
        genre: row.get("genre"),
        uploaded_at,
        owner_id,
    })
}

/// [`TrackStore`] backed by the tracks table
pub struct SqliteTrackStore {
    pool: SqlitePool,
}

impl SqliteTrackStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackStore for SqliteTrackStore {
    async fn insert(&self, new: NewTrack) -> Result<Track> {
        insert_track(&self.pool, &new).await
    }
}
