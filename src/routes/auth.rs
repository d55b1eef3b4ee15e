//! Authentication routes
//!
//! Email/password accounts with locally issued bearer tokens.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{ApiJson, DataResponse};
use crate::app::AppState;
use crate::auth::{password, RequireAuth};
use crate::domain::auth::{AuthResponse, SignInRequest, SignUpRequest, UserResponse};
use crate::error::{ApiError, ApiResult};

/// Database row for user
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Argon2 is CPU bound; keep it off the async workers
async fn hash_off_thread(plain: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ApiError::internal(format!("Hashing task failed: {}", e)))?
        .map_err(ApiError::Internal)
}

async fn verify_off_thread(plain: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("Verification task failed: {}", e)))?
        .map_err(ApiError::Internal)
}

fn token_response(state: &AppState, user: UserRow) -> ApiResult<AuthResponse> {
    let issued = state.tokens.issue(user.id, &user.email)?;
    Ok(AuthResponse::bearer(
        issued.access_token,
        issued.expires_in,
        user.into(),
    ))
}

/// POST /auth/signup
///
/// Register a new user and return an access token.
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.validate()?;
    let password_hash = hash_off_thread(req.password).await?;

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (email, password_hash)
        VALUES ($1, $2)
        RETURNING id, email, password_hash, created_at
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::conflict("An account with this email already exists")
        }
        other => ApiError::from(other),
    })?;

    tracing::info!(user_id = %user.id, "User signed up");

    let response = token_response(&state, user)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// POST /auth/signin
///
/// Sign in with email and password.
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?;

    let Some(user) = user else {
        // Equal cost to the known-email path
        verify_off_thread(req.password, password::UNMATCHABLE_HASH.to_string()).await?;
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_off_thread(req.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = %user.id, "Sign-in with wrong password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    tracing::info!(user_id = %user.id, "User signed in");

    let response = token_response(&state, user)?;
    Ok(Json(DataResponse::new(response)))
}

/// GET /auth/me
///
/// Current user behind the bearer token.
pub async fn me(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
    )
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(DataResponse::new(UserResponse::from(user))))
}
