// src/handlers/subscriptions.rs

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
    models::user::UserSummary,
    utils::{ids::parse_id, jwt::Claims, response::ApiResponse},
};

/// Subscription toggle: same check-then-act shape as the like toggle, with
/// the UNIQUE(subscriber, channel) constraint resolving concurrent
/// duplicates.
pub async fn toggle_subscription(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;
    let subscriber_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let channel = sqlx::query_scalar::<_, i32>("SELECT 1 FROM users WHERE id = $1")
        .bind(channel_id)
        .fetch_optional(&mut *tx)
        .await?;

    if channel.is_none() {
        return Err(AppError::NotFound("Channel not found".to_string()));
    }

    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2",
    )
    .bind(subscriber_id)
    .bind(channel_id)
    .fetch_optional(&mut *tx)
    .await?;

    let subscribed = match existing {
        Some(subscription_id) => {
            sqlx::query("DELETE FROM subscriptions WHERE id = $1")
                .bind(subscription_id)
                .execute(&mut *tx)
                .await?;
            false
        }
        None => {
            sqlx::query("INSERT INTO subscriptions (subscriber_id, channel_id) VALUES ($1, $2)")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::Conflict("Already subscribed".to_string())
                    } else {
                        AppError::from(e)
                    }
                })?;
            true
        }
    };

    tx.commit().await?;

    let message = if subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(ApiResponse::ok(json!({ "subscribed": subscribed }), message))
}

/// Subscribers of a channel as a flat list of public profiles.
pub async fn get_channel_subscribers(
    State(pool): State<PgPool>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let channel_id = parse_id(&channel_id, "channel")?;

    let subscribers = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.username, u.full_name, u.avatar_url
        FROM subscriptions s
        JOIN users u ON u.id = s.subscriber_id
        WHERE s.channel_id = $1
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(channel_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers retrieved successfully",
    ))
}

/// Channels a user has subscribed to, as a flat list of public profiles.
pub async fn get_subscribed_channels(
    State(pool): State<PgPool>,
    Path(subscriber_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subscriber_id = parse_id(&subscriber_id, "subscriber")?;

    let channels = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.username, u.full_name, u.avatar_url
        FROM subscriptions s
        JOIN users u ON u.id = s.channel_id
        WHERE s.subscriber_id = $1
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(subscriber_id)
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels retrieved successfully",
    ))
}
