// src/handlers/tweets.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::tweet::{Tweet, TweetContentRequest},
    utils::{
        authz::ensure_owner, ids::parse_id, jwt::Claims, response::ApiResponse,
        sanitize::clean_text,
    },
};

const TWEET_COLUMNS: &str = "id, owner_id, content, created_at, updated_at";

pub async fn create_tweet(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<TweetContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let owner_id = claims.user_id()?;
    let content = clean_text(&payload.content);
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Content is required and cannot be empty".to_string(),
        ));
    }

    let user = sqlx::query_scalar::<_, i32>("SELECT 1 FROM users WHERE id = $1")
        .bind(owner_id)
        .fetch_optional(&pool)
        .await?;

    if user.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let sql = format!(
        "INSERT INTO tweets (owner_id, content) VALUES ($1, $2) RETURNING {TWEET_COLUMNS}"
    );

    let tweet = sqlx::query_as::<_, Tweet>(&sql)
        .bind(owner_id)
        .bind(&content)
        .fetch_one(&pool)
        .await?;

    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

/// Tweets of a user, newest first. An unknown user is 404; a user with no
/// tweets is an empty list.
pub async fn get_user_tweets(
    State(pool): State<PgPool>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_id(&user_id, "user")?;

    let user = sqlx::query_scalar::<_, i32>("SELECT 1 FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;

    if user.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let sql = format!(
        "SELECT {TWEET_COLUMNS} FROM tweets WHERE owner_id = $1 ORDER BY created_at DESC"
    );

    let tweets = sqlx::query_as::<_, Tweet>(&sql)
        .bind(user_id)
        .fetch_all(&pool)
        .await?;

    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

async fn fetch_tweet_owner(pool: &PgPool, tweet_id: Uuid) -> Result<Uuid, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM tweets WHERE id = $1")
        .bind(tweet_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Tweet not found".to_string()))
}

/// Updates tweet content. Owner only.
pub async fn update_tweet(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(tweet_id): Path<String>,
    Json(payload): Json<TweetContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let content = clean_text(&payload.content);
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Content is required and cannot be empty".to_string(),
        ));
    }

    let owner_id = fetch_tweet_owner(&pool, tweet_id).await?;
    ensure_owner(owner_id, claims.user_id()?, "tweet")?;

    let sql = format!(
        "UPDATE tweets SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING {TWEET_COLUMNS}"
    );

    let tweet = sqlx::query_as::<_, Tweet>(&sql)
        .bind(tweet_id)
        .bind(&content)
        .fetch_one(&pool)
        .await?;

    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

/// Deletes a tweet. Owner only.
pub async fn delete_tweet(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(tweet_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;

    let owner_id = fetch_tweet_owner(&pool, tweet_id).await?;
    ensure_owner(owner_id, claims.user_id()?, "tweet")?;

    sqlx::query("DELETE FROM tweets WHERE id = $1")
        .bind(tweet_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::ok(json!({}), "Tweet deleted successfully"))
}
