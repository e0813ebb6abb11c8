// src/handlers/auth.rs

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse},
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{ChangePasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest, User},
    utils::{
        cookies,
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_access_token, sign_refresh_token, verify_refresh_token},
        response::ApiResponse,
    },
};

const USER_COLUMNS: &str =
    "id, username, email, full_name, avatar_url, cover_image_url, password, created_at, updated_at";

/// Registers a new user.
///
/// Uniqueness of username and email is checked by query before the insert;
/// the unique constraints still backstop a concurrent duplicate, which maps
/// to 409 as well.
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let username = payload.username.trim().to_lowercase();
    let email = payload.email.trim().to_lowercase();

    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM users WHERE username = $1 OR email = $2",
    )
    .bind(&username)
    .bind(&email)
    .fetch_optional(&pool)
    .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with this username or email already exists".to_string(),
        ));
    }

    let hashed_password = hash_password(&payload.password)?;

    let sql = format!(
        "INSERT INTO users (username, email, full_name, avatar_url, cover_image_url, password) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
    );

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&username)
        .bind(&email)
        .bind(payload.full_name.trim())
        .bind(&payload.avatar_url)
        .bind(&payload.cover_image_url)
        .bind(&hashed_password)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("User with this username or email already exists".to_string())
            } else {
                tracing::error!("Failed to register user: {:?}", e);
                AppError::from(e)
            }
        })?;

    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// Authenticates by username or email, issues the access/refresh token
/// pair, and records the refresh token in the user's session row.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identifier = payload
        .username
        .as_deref()
        .or(payload.email.as_deref())
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("Username or email is required".to_string()))?;

    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&identifier)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid user credentials".to_string()));
    }

    let access_token = sign_access_token(
        user.id,
        &user.username,
        &config.access_token_secret,
        config.access_token_expiry,
    )?;
    let refresh_token =
        sign_refresh_token(user.id, &config.refresh_token_secret, config.refresh_token_expiry)?;

    sqlx::query(
        "INSERT INTO sessions (user_id, refresh_token) VALUES ($1, $2) \
         ON CONFLICT (user_id) \
         DO UPDATE SET refresh_token = EXCLUDED.refresh_token, updated_at = NOW()",
    )
    .bind(user.id)
    .bind(&refresh_token)
    .execute(&pool)
    .await?;

    let headers = AppendHeaders([
        (
            header::SET_COOKIE,
            cookies::auth_cookie(cookies::ACCESS_COOKIE, &access_token, config.access_token_expiry),
        ),
        (
            header::SET_COOKIE,
            cookies::auth_cookie(
                cookies::REFRESH_COOKIE,
                &refresh_token,
                config.refresh_token_expiry,
            ),
        ),
    ]);

    let body = json!({
        "user": user,
        "accessToken": access_token,
        "refreshToken": refresh_token,
    });

    Ok((headers, ApiResponse::ok(body, "User logged in successfully")))
}

/// Clears the session record and expires both auth cookies.
pub async fn logout(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(&pool)
        .await?;

    let headers = AppendHeaders([
        (header::SET_COOKIE, cookies::clear_cookie(cookies::ACCESS_COOKIE)),
        (header::SET_COOKIE, cookies::clear_cookie(cookies::REFRESH_COOKIE)),
    ]);

    Ok((
        headers,
        ApiResponse::ok(json!({}), "User logged out successfully"),
    ))
}

/// Rotates the token pair: the incoming refresh token (cookie or body) must
/// match the one stored in the session row, then both tokens are reissued.
pub async fn refresh_token(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    headers: HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let incoming = cookies::cookie_value(&headers, cookies::REFRESH_COOKIE)
        .or_else(|| payload.and_then(|Json(body)| body.refresh_token))
        .ok_or_else(|| AppError::AuthError("Unauthorized request".to_string()))?;

    let refresh_claims = verify_refresh_token(&incoming, &config.refresh_token_secret)?;
    let user_id = Uuid::parse_str(&refresh_claims.sub)
        .map_err(|_| AppError::AuthError("Invalid refresh token".to_string()))?;

    let stored = sqlx::query_scalar::<_, String>(
        "SELECT refresh_token FROM sessions WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    if stored.as_deref() != Some(incoming.as_str()) {
        return Err(AppError::AuthError(
            "Refresh token is expired or used".to_string(),
        ));
    }

    let username = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid refresh token".to_string()))?;

    let access_token = sign_access_token(
        user_id,
        &username,
        &config.access_token_secret,
        config.access_token_expiry,
    )?;
    let new_refresh_token =
        sign_refresh_token(user_id, &config.refresh_token_secret, config.refresh_token_expiry)?;

    sqlx::query("UPDATE sessions SET refresh_token = $2, updated_at = NOW() WHERE user_id = $1")
        .bind(user_id)
        .bind(&new_refresh_token)
        .execute(&pool)
        .await?;

    let headers = AppendHeaders([
        (
            header::SET_COOKIE,
            cookies::auth_cookie(cookies::ACCESS_COOKIE, &access_token, config.access_token_expiry),
        ),
        (
            header::SET_COOKIE,
            cookies::auth_cookie(
                cookies::REFRESH_COOKIE,
                &new_refresh_token,
                config.refresh_token_expiry,
            ),
        ),
    ]);

    let body = json!({
        "accessToken": access_token,
        "refreshToken": new_refresh_token,
    });

    Ok((headers, ApiResponse::ok(body, "Access token refreshed")))
}

/// Changes the password after verifying the current one.
pub async fn change_password(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id = claims.user_id()?;

    let current_hash = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.old_password, &current_hash)? {
        return Err(AppError::BadRequest("Invalid old password".to_string()));
    }

    let new_hash = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(&new_hash)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}
