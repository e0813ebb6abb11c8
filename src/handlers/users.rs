// src/handlers/users.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        user::{
            ChannelProfile, UpdateAccountRequest, UpdateAvatarRequest, UpdateCoverImageRequest,
            User,
        },
        video::{WatchHistoryItem, WatchHistoryRow},
    },
    utils::{ids::parse_id, jwt::Claims, response::ApiResponse},
};

const USER_COLUMNS: &str =
    "id, username, email, full_name, avatar_url, cover_image_url, password, created_at, updated_at";

async fn fetch_user(pool: &PgPool, id: uuid::Uuid) -> Result<User, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Public profile of the authenticated user.
pub async fn get_current_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, claims.user_id()?).await?;

    Ok(ApiResponse::ok(user, "Current user fetched successfully"))
}

/// Updates full name and/or email.
pub async fn update_account(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.full_name.is_none() && payload.email.is_none() {
        return Err(AppError::BadRequest(
            "Provide at least one field to update".to_string(),
        ));
    }

    let email = payload.email.map(|e| e.trim().to_lowercase());

    let sql = format!(
        "UPDATE users SET full_name = COALESCE($2, full_name), email = COALESCE($3, email), \
         updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    );

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(claims.user_id()?)
        .bind(payload.full_name.as_deref().map(str::trim))
        .bind(email)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email already in use".to_string())
            } else {
                AppError::from(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

pub async fn update_avatar(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateAvatarRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sql = format!(
        "UPDATE users SET avatar_url = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    );

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(claims.user_id()?)
        .bind(&payload.avatar_url)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(user, "Avatar updated successfully"))
}

pub async fn update_cover_image(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateCoverImageRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sql = format!(
        "UPDATE users SET cover_image_url = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
    );

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(claims.user_id()?)
        .bind(&payload.cover_image_url)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}

/// Channel profile view: the user matched by username, subscriber and
/// subscribed-to counts, and whether the requester is subscribed.
pub async fn get_channel_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".to_string()));
    }

    let profile = sqlx::query_as::<_, ChannelProfile>(
        r#"
        SELECT
            u.id, u.username, u.email, u.full_name, u.avatar_url, u.cover_image_url,
            (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id) AS subscribers_count,
            (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id) AS channels_subscribed_to_count,
            EXISTS(
                SELECT 1 FROM subscriptions s
                WHERE s.channel_id = u.id AND s.subscriber_id = $2
            ) AS is_subscribed
        FROM users u
        WHERE u.username = $1
        "#,
    )
    .bind(&username)
    .bind(claims.user_id()?)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Channel does not exist".to_string()))?;

    Ok(ApiResponse::ok(profile, "Channel profile fetched successfully"))
}

/// Watch history in the order the videos were watched, each with its owner
/// collapsed to public fields.
pub async fn get_watch_history(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, WatchHistoryRow>(
        r#"
        SELECT
            v.id, v.video_url, v.thumbnail_url, v.title, v.description,
            v.duration, v.views, v.created_at,
            u.username AS owner_username,
            u.full_name AS owner_full_name,
            u.avatar_url AS owner_avatar_url
        FROM watch_history wh
        JOIN videos v ON v.id = wh.video_id
        JOIN users u ON u.id = v.owner_id
        WHERE wh.user_id = $1
        ORDER BY wh.position
        "#,
    )
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await?;

    let history: Vec<WatchHistoryItem> = rows.into_iter().map(Into::into).collect();

    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}

/// Records a watch: bumps the view counter and appends the video to the
/// requester's history. Re-watching keeps the original list position.
pub async fn record_watch(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_id(&video_id, "video")?;
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&mut *tx)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
        .bind(video_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO watch_history (user_id, video_id, position)
        VALUES (
            $1, $2,
            (SELECT COALESCE(MAX(position) + 1, 0) FROM watch_history WHERE user_id = $1)
        )
        ON CONFLICT (user_id, video_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(video_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ApiResponse::ok(json!({}), "Watch recorded successfully"))
}
