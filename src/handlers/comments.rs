// src/handlers/comments.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{Comment, CommentContentRequest, CommentOwnerRow, CommentResponse},
    utils::{
        authz::ensure_owner,
        ids::parse_id,
        jwt::Claims,
        pagination::{PageQuery, Pagination},
        response::ApiResponse,
        sanitize::clean_text,
    },
};

const COMMENT_COLUMNS: &str =
    "id, owner_id, content, video_id, tweet_id, created_at, updated_at";

/// Comments-with-owner view, shared by the video- and tweet-scoped lists:
/// match on the parent column, collapse the owner join, newest first,
/// then paginate.
async fn list_comments(
    pool: &PgPool,
    parent_column: &str,
    parent_id: Uuid,
    paging: Pagination,
) -> Result<Vec<CommentResponse>, AppError> {
    let sql = format!(
        r#"
        SELECT
            c.id, c.content, c.created_at, c.updated_at,
            u.username AS owner_username,
            u.full_name AS owner_full_name,
            u.avatar_url AS owner_avatar_url
        FROM comments c
        JOIN users u ON u.id = c.owner_id
        WHERE c.{parent_column} = $1
        ORDER BY c.created_at DESC
        LIMIT $2 OFFSET $3
        "#
    );

    let rows = sqlx::query_as::<_, CommentOwnerRow>(&sql)
        .bind(parent_id)
        .bind(paging.limit)
        .bind(paging.offset())
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_video_comments(
    State(pool): State<PgPool>,
    Path(video_id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let video_id = parse_id(&video_id, "video")?;
    let comments = list_comments(&pool, "video_id", video_id, Pagination::from(&params)).await?;

    Ok(ApiResponse::ok(comments, "Video comments fetched successfully"))
}

pub async fn get_tweet_comments(
    State(pool): State<PgPool>,
    Path(tweet_id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let comments = list_comments(&pool, "tweet_id", tweet_id, Pagination::from(&params)).await?;

    Ok(ApiResponse::ok(comments, "Tweet comments fetched successfully"))
}

/// Inserts a comment under a parent after proving the parent exists.
async fn insert_comment(
    pool: &PgPool,
    parent_table: &str,
    parent_column: &str,
    not_found: &str,
    parent_id: Uuid,
    owner_id: Uuid,
    content: &str,
) -> Result<Comment, AppError> {
    let exists_sql = format!("SELECT 1 FROM {parent_table} WHERE id = $1");

    let parent = sqlx::query_scalar::<_, i32>(&exists_sql)
        .bind(parent_id)
        .fetch_optional(pool)
        .await?;

    if parent.is_none() {
        return Err(AppError::NotFound(not_found.to_string()));
    }

    let insert_sql = format!(
        "INSERT INTO comments (owner_id, content, {parent_column}) \
         VALUES ($1, $2, $3) RETURNING {COMMENT_COLUMNS}"
    );

    let comment = sqlx::query_as::<_, Comment>(&insert_sql)
        .bind(owner_id)
        .bind(content)
        .bind(parent_id)
        .fetch_one(pool)
        .await?;

    Ok(comment)
}

pub async fn add_comment_to_video(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    Json(payload): Json<CommentContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let video_id = parse_id(&video_id, "video")?;
    let content = clean_text(&payload.content);
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Content is required and cannot be empty".to_string(),
        ));
    }

    let comment = insert_comment(
        &pool,
        "videos",
        "video_id",
        "Video not found",
        video_id,
        claims.user_id()?,
        &content,
    )
    .await?;

    Ok(ApiResponse::created(
        comment,
        "Comment added to video successfully",
    ))
}

pub async fn add_comment_to_tweet(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(tweet_id): Path<String>,
    Json(payload): Json<CommentContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let content = clean_text(&payload.content);
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Content is required and cannot be empty".to_string(),
        ));
    }

    let comment = insert_comment(
        &pool,
        "tweets",
        "tweet_id",
        "Tweet not found",
        tweet_id,
        claims.user_id()?,
        &content,
    )
    .await?;

    Ok(ApiResponse::created(
        comment,
        "Comment added to tweet successfully",
    ))
}

async fn fetch_comment_owner(pool: &PgPool, comment_id: Uuid) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

/// Updates comment content. Owner only.
pub async fn update_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<String>,
    Json(payload): Json<CommentContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comment_id = parse_id(&comment_id, "comment")?;
    let content = clean_text(&payload.content);
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Content is required and cannot be empty".to_string(),
        ));
    }

    let owner_id = fetch_comment_owner(&pool, comment_id).await?;
    ensure_owner(owner_id, claims.user_id()?, "comment")?;

    let sql = format!(
        "UPDATE comments SET content = $2, updated_at = NOW() \
         WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
    );

    let comment = sqlx::query_as::<_, Comment>(&sql)
        .bind(comment_id)
        .bind(&content)
        .fetch_one(&pool)
        .await?;

    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

/// Deletes a comment. Owner only.
pub async fn delete_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let comment_id = parse_id(&comment_id, "comment")?;

    let owner_id = fetch_comment_owner(&pool, comment_id).await?;
    ensure_owner(owner_id, claims.user_id()?, "comment")?;

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::ok(json!({}), "Comment deleted successfully"))
}
