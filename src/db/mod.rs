//! Database access for genrebox
//!
//! Single SQLite database holding users, tracks, and guest session quotas.

pub mod sessions;
pub mod tracks;
pub mod users;

use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// Initialize database connection pool
///
/// Connects to the SQLite database at `db_path`, creating the file and its
/// parent directory if needed, and creates any missing tables.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    // Enable foreign keys (tracks reference their owning user)
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers while uploads write
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create tables if they don't exist (idempotent, safe on every startup)
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_tracks_table(pool).await?;
    create_guest_sessions_table(pool).await?;

    info!("Database tables initialized (users, tracks, guest_sessions)");

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            guid TEXT PRIMARY KEY,
            stored_name TEXT NOT NULL UNIQUE,
            original_name TEXT NOT NULL,
            genre TEXT NOT NULL,
            uploaded_at TEXT NOT NULL,
            owner_guid TEXT REFERENCES users(guid) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_owner ON tracks(owner_guid)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_uploaded_at ON tracks(uploaded_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_guest_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guest_sessions (
            session_id TEXT PRIMARY KEY,
            quota TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
