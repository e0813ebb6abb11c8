// src/handlers/dashboard.rs

use axum::{Extension, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{user::ChannelStats, video::VideoWithLikes},
    utils::{jwt::Claims, response::ApiResponse},
};

/// Channel stats view: the channel joined against its videos, their likes,
/// and its subscribers, reduced to totals.
///
/// Scalar subqueries stand in for the lookup/addFields stages; the sum over
/// views is cast so it decodes as a plain integer.
pub async fn get_channel_stats(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let stats = sqlx::query_as::<_, ChannelStats>(
        r#"
        SELECT
            u.id, u.username, u.full_name, u.avatar_url, u.cover_image_url,
            (SELECT COUNT(*) FROM videos v WHERE v.owner_id = u.id) AS total_videos,
            (SELECT COALESCE(SUM(v.views), 0)::BIGINT FROM videos v WHERE v.owner_id = u.id) AS total_views,
            (SELECT COUNT(*) FROM likes l JOIN videos v ON v.id = l.video_id WHERE v.owner_id = u.id) AS total_likes,
            (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id) AS total_subscribers
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(claims.user_id()?)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

    Ok(ApiResponse::ok(stats, "Channel stats retrieved successfully"))
}

/// All videos of the authenticated channel with per-video like counts.
/// A channel with zero videos is 404, matching the listing's contract.
pub async fn get_channel_videos(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let videos = sqlx::query_as::<_, VideoWithLikes>(
        r#"
        SELECT
            v.id, v.owner_id, v.video_url, v.thumbnail_url, v.title, v.description,
            v.duration, v.views, v.is_published, v.created_at, v.updated_at,
            (SELECT COUNT(*) FROM likes l WHERE l.video_id = v.id) AS likes_count
        FROM videos v
        WHERE v.owner_id = $1
        ORDER BY v.created_at DESC
        "#,
    )
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await?;

    if videos.is_empty() {
        return Err(AppError::NotFound(
            "No videos found for this channel".to_string(),
        ));
    }

    Ok(ApiResponse::ok(videos, "Videos retrieved successfully"))
}
