//! Registration, login, and bearer-token identity
//!
//! Tokens are HS256 JWTs carrying the user id as subject. Upload accepts
//! them optionally ([`MaybeIdentity`]); the track endpoints require them
//! ([`Identity`]).

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::user::{is_valid_email, MIN_PASSWORD_LENGTH};
use crate::AppState;

/// JWT claims: subject is the user id
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Sign an access token for `user_id`
pub fn issue_token(user_id: Uuid, secret: &[u8], ttl_secs: u64) -> ApiResult<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::seconds(ttl_secs as i64)).timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))
}

/// Validate a token and extract the user id it was issued for
pub fn decode_token(token: &str, secret: &[u8]) -> ApiResult<Uuid> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

    Uuid::parse_str(&data.claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))
}

/// Required authentication: rejects with 401 when the bearer token is
/// missing or invalid.
pub struct Identity {
    pub user_id: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let user_id = decode_token(bearer.token(), state.config.jwt_secret.as_bytes())?;
        Ok(Identity { user_id })
    }
}

/// Optional authentication: absent Authorization header means guest, but a
/// header that is present and invalid is still a 401. A malformed token
/// must not silently demote a user to guest.
pub struct MaybeIdentity(pub Option<Uuid>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(MaybeIdentity(None));
        }

        let Identity { user_id } = Identity::from_request_parts(parts, state).await?;
        Ok(MaybeIdentity(Some(user_id)))
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    // emails are stored lowercased; case variants are the same account
    let email = req.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if db::users::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let user = db::users::create_user(&state.db, &email, &req.password).await?;
    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = req.email.trim().to_lowercase();

    // same response for unknown email and wrong password
    let user = db::users::find_by_email(&state.db, &email)
        .await?
        .filter(|user| user.verify_password(&req.password))
        .ok_or_else(|| ApiError::Unauthorized("Bad credentials".to_string()))?;

    let access_token = issue_token(
        user.id,
        state.config.jwt_secret.as_bytes(),
        state.config.jwt_expiration_secs,
    )?;

    Ok(Json(LoginResponse { access_token }))
}

/// Build auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
}
