// src/handlers/likes.rs

use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, is_unique_violation},
    models::like::LikedVideo,
    utils::{ids::parse_id, jwt::Claims, response::ApiResponse},
};

/// Like targets; each maps to one nullable reference column.
#[derive(Clone, Copy)]
enum LikeTarget {
    Video,
    Comment,
    Tweet,
}

impl LikeTarget {
    fn table(self) -> &'static str {
        match self {
            LikeTarget::Video => "videos",
            LikeTarget::Comment => "comments",
            LikeTarget::Tweet => "tweets",
        }
    }

    fn column(self) -> &'static str {
        match self {
            LikeTarget::Video => "video_id",
            LikeTarget::Comment => "comment_id",
            LikeTarget::Tweet => "tweet_id",
        }
    }

    fn not_found(self) -> &'static str {
        match self {
            LikeTarget::Video => "Video not found",
            LikeTarget::Comment => "Comment not found",
            LikeTarget::Tweet => "Tweet not found",
        }
    }
}

/// Toggle: delete the relation row if it exists, create it otherwise, and
/// report the resulting state. The partial unique index resolves concurrent
/// duplicate toggles; a lost race maps to 409.
async fn toggle_like(
    pool: &PgPool,
    user_id: Uuid,
    target: LikeTarget,
    target_id: Uuid,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    let exists_sql = format!("SELECT 1 FROM {} WHERE id = $1", target.table());
    let target_exists = sqlx::query_scalar::<_, i32>(&exists_sql)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;

    if target_exists.is_none() {
        return Err(AppError::NotFound(target.not_found().to_string()));
    }

    let column = target.column();

    let existing_sql = format!("SELECT id FROM likes WHERE user_id = $1 AND {column} = $2");
    let existing = sqlx::query_scalar::<_, Uuid>(&existing_sql)
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;

    let liked = match existing {
        Some(like_id) => {
            sqlx::query("DELETE FROM likes WHERE id = $1")
                .bind(like_id)
                .execute(&mut *tx)
                .await?;
            false
        }
        None => {
            let insert_sql = format!("INSERT INTO likes (user_id, {column}) VALUES ($1, $2)");
            sqlx::query(&insert_sql)
                .bind(user_id)
                .bind(target_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::Conflict("Already liked".to_string())
                    } else {
                        AppError::from(e)
                    }
                })?;
            true
        }
    };

    tx.commit().await?;
    Ok(liked)
}

pub async fn toggle_video_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_id(&video_id, "video")?;
    let liked = toggle_like(&pool, claims.user_id()?, LikeTarget::Video, video_id).await?;

    let message = if liked {
        "Video liked successfully"
    } else {
        "Video unliked successfully"
    };
    Ok(ApiResponse::ok(json!({ "liked": liked }), message))
}

pub async fn toggle_comment_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let liked = toggle_like(&pool, claims.user_id()?, LikeTarget::Comment, comment_id).await?;

    let message = if liked {
        "Comment liked successfully"
    } else {
        "Comment unliked successfully"
    };
    Ok(ApiResponse::ok(json!({ "liked": liked }), message))
}

pub async fn toggle_tweet_like(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(tweet_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let liked = toggle_like(&pool, claims.user_id()?, LikeTarget::Tweet, tweet_id).await?;

    let message = if liked {
        "Tweet liked successfully"
    } else {
        "Tweet unliked successfully"
    };
    Ok(ApiResponse::ok(json!({ "liked": liked }), message))
}

/// Liked-videos view: the requester's video likes joined to the videos,
/// each row reshaped to the video's own fields.
pub async fn get_liked_videos(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let videos = sqlx::query_as::<_, LikedVideo>(
        r#"
        SELECT v.id, v.owner_id, v.title, v.video_url, v.created_at
        FROM likes l
        JOIN videos v ON v.id = l.video_id
        WHERE l.user_id = $1 AND l.video_id IS NOT NULL
        ORDER BY l.created_at DESC
        "#,
    )
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::ok(videos, "All liked videos fetched successfully"))
}
