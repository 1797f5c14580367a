//! User accounts

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Maximum allowed email length
pub const MAX_EMAIL_LENGTH: usize = 120;

/// Minimum allowed password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A registered user
#[derive(Debug, Clone)]
pub struct User {
    /// User identifier
    pub id: Uuid,

    /// Login email (unique, max 120 chars)
    pub email: String,

    /// Salted SHA-256 password hash (64 hex chars)
    pub password_hash: String,

    /// Per-user random salt (32 hex chars)
    pub password_salt: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check a candidate password against the stored salted hash
    pub fn verify_password(&self, password: &str) -> bool {
        hash_password(password, &self.password_salt) == self.password_hash
    }
}

/// Generate a random 128-bit salt as hex
pub fn generate_salt() -> String {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    format!("{:032x}", rng.gen::<u128>())
}

/// Salted SHA-256 password hash, returned as 64 hex characters
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Minimal email shape check: non-empty local part, domain with a dot,
/// no whitespace, within the length cap.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return false;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
