//! User database operations

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::{generate_salt, hash_password};
use crate::models::User;

/// Insert a new user with a freshly salted password hash
pub async fn create_user(pool: &SqlitePool, email: &str, password: &str) -> Result<User> {
    let salt = generate_salt();
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: hash_password(password, &salt),
        password_salt: salt,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (guid, email, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.password_salt)
    .bind(user.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(user)
}

/// Look up a user by login email
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT guid, email, password_hash, password_salt, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(|row| row_to_user(&row)).transpose()
}

/// Look up a user by id
pub async fn find_by_id(pool: &SqlitePool, user_id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT guid, email, password_hash, password_salt, created_at
        FROM users
        WHERE guid = ?
        "#,
    )
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|row| row_to_user(&row)).transpose()
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let guid: String = row.get("guid");
    let id = Uuid::parse_str(&guid)
        .map_err(|e| Error::Internal(format!("Failed to parse user guid: {}", e)))?;

    let created_at: String = row.get("created_at");
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    Ok(User {
        id,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        password_salt: row.get("password_salt"),
        created_at,
    })
}
