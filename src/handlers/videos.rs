// src/handlers/videos.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::video::{
        PublishVideoRequest, UpdateVideoRequest, Video, VideoListItem, VideoListQuery,
        VideoListRow, VideoWithLikes,
    },
    utils::{
        authz::ensure_owner, ids::parse_id, jwt::Claims, pagination::Pagination,
        response::ApiResponse, sanitize::clean_text,
    },
};

const VIDEO_COLUMNS: &str = "id, owner_id, video_url, thumbnail_url, title, description, \
                             duration, views, is_published, created_at, updated_at";

/// Maps the requested sort onto a whitelisted column and direction.
/// Unknown fields fall back to creation time; anything but 'asc' is
/// descending.
fn sort_clause(sort_by: Option<&str>, sort_type: Option<&str>) -> (&'static str, &'static str) {
    let column = match sort_by {
        Some("title") => "v.title",
        Some("duration") => "v.duration",
        Some("views") => "v.views",
        _ => "v.created_at",
    };
    let direction = match sort_type {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    (column, direction)
}

/// Video listing view: optional owner and free-text filters, owner collapsed
/// to public fields, like count derived, sorted before pagination.
pub async fn get_all_videos(
    State(pool): State<PgPool>,
    Query(params): Query<VideoListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let paging = Pagination::from_raw(params.page.as_deref(), params.limit.as_deref());

    let owner_id: Option<Uuid> = match params.user_id.as_deref().filter(|v| !v.is_empty()) {
        Some(raw) => Some(parse_id(raw, "user")?),
        None => None,
    };

    let pattern = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{q}%"));

    let (column, direction) = sort_clause(params.sort_by.as_deref(), params.sort_type.as_deref());

    let sql = format!(
        r#"
        SELECT
            v.id, v.video_url, v.thumbnail_url, v.title, v.description,
            v.duration, v.views, v.is_published, v.created_at, v.updated_at,
            (SELECT COUNT(*) FROM likes l WHERE l.video_id = v.id) AS likes_count,
            u.username AS owner_username,
            u.full_name AS owner_full_name,
            u.avatar_url AS owner_avatar_url
        FROM videos v
        JOIN users u ON u.id = v.owner_id
        WHERE ($1::UUID IS NULL OR v.owner_id = $1)
          AND ($2::TEXT IS NULL OR (v.title ILIKE $2 OR v.description ILIKE $2))
        ORDER BY {column} {direction}
        LIMIT $3 OFFSET $4
        "#
    );

    let rows = sqlx::query_as::<_, VideoListRow>(&sql)
        .bind(owner_id)
        .bind(pattern)
        .bind(paging.limit)
        .bind(paging.offset())
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list videos: {:?}", e);
            AppError::from(e)
        })?;

    let videos: Vec<VideoListItem> = rows.into_iter().map(Into::into).collect();

    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}

/// Publishes a video. Media bytes never pass through here; the media host
/// already minted the URLs.
pub async fn publish_video(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PublishVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let owner_id = claims.user_id()?;

    let owner = sqlx::query_scalar::<_, i32>("SELECT 1 FROM users WHERE id = $1")
        .bind(owner_id)
        .fetch_optional(&pool)
        .await?;

    if owner.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let sql = format!(
        "INSERT INTO videos (owner_id, video_url, thumbnail_url, title, description, duration, is_published) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {VIDEO_COLUMNS}"
    );

    let video = sqlx::query_as::<_, Video>(&sql)
        .bind(owner_id)
        .bind(&payload.video_url)
        .bind(&payload.thumbnail_url)
        .bind(clean_text(&payload.title))
        .bind(clean_text(&payload.description))
        .bind(payload.duration)
        .bind(payload.is_published.unwrap_or(true))
        .fetch_one(&pool)
        .await?;

    Ok(ApiResponse::created(video, "Video uploaded successfully"))
}

/// Video detail view with derived like count; 404 when absent.
pub async fn get_video_by_id(
    State(pool): State<PgPool>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_id(&video_id, "video")?;

    let video = sqlx::query_as::<_, VideoWithLikes>(
        r#"
        SELECT
            v.id, v.owner_id, v.video_url, v.thumbnail_url, v.title, v.description,
            v.duration, v.views, v.is_published, v.created_at, v.updated_at,
            (SELECT COUNT(*) FROM likes l WHERE l.video_id = v.id) AS likes_count
        FROM videos v
        WHERE v.id = $1
        "#,
    )
    .bind(video_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

async fn fetch_owner(pool: &PgPool, video_id: Uuid) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
}

/// Edits title/description/thumbnail. Owner only.
pub async fn update_video(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let video_id = parse_id(&video_id, "video")?;

    if payload.title.is_none() && payload.description.is_none() && payload.thumbnail_url.is_none()
    {
        return Err(AppError::BadRequest(
            "Provide at least one field to update".to_string(),
        ));
    }

    let owner_id = fetch_owner(&pool, video_id).await?;
    ensure_owner(owner_id, claims.user_id()?, "video")?;

    let sql = format!(
        "UPDATE videos SET \
            title = COALESCE($2, title), \
            description = COALESCE($3, description), \
            thumbnail_url = COALESCE($4, thumbnail_url), \
            updated_at = NOW() \
         WHERE id = $1 RETURNING {VIDEO_COLUMNS}"
    );

    let video = sqlx::query_as::<_, Video>(&sql)
        .bind(video_id)
        .bind(payload.title.as_deref().map(clean_text))
        .bind(payload.description.as_deref().map(clean_text))
        .bind(&payload.thumbnail_url)
        .fetch_one(&pool)
        .await?;

    Ok(ApiResponse::ok(video, "Video details updated successfully"))
}

/// Deletes a video. Owner only.
pub async fn delete_video(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_id(&video_id, "video")?;

    let sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");

    let video = sqlx::query_as::<_, Video>(&sql)
        .bind(video_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    ensure_owner(video.owner_id, claims.user_id()?, "video")?;

    sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::ok(video, "Video deleted successfully"))
}

/// Flips the published flag. Owner only.
pub async fn toggle_publish_status(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_id(&video_id, "video")?;

    let owner_id = fetch_owner(&pool, video_id).await?;
    ensure_owner(owner_id, claims.user_id()?, "video")?;

    let sql = format!(
        "UPDATE videos SET is_published = NOT is_published, updated_at = NOW() \
         WHERE id = $1 RETURNING {VIDEO_COLUMNS}"
    );

    let video = sqlx::query_as::<_, Video>(&sql)
        .bind(video_id)
        .fetch_one(&pool)
        .await?;

    Ok(ApiResponse::ok(video, "Publish status toggled successfully"))
}

#[cfg(test)]
mod tests {
    use super::sort_clause;

    #[test]
    fn sort_defaults_to_newest_first() {
        assert_eq!(sort_clause(None, None), ("v.created_at", "DESC"));
    }

    #[test]
    fn sort_whitelist_rejects_unknown_columns() {
        assert_eq!(
            sort_clause(Some("password"), Some("asc")),
            ("v.created_at", "ASC")
        );
        assert_eq!(sort_clause(Some("views"), Some("desc")), ("v.views", "DESC"));
        assert_eq!(sort_clause(Some("title"), Some("asc")), ("v.title", "ASC"));
    }
}
