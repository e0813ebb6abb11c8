// src/models/like.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Liked-videos view: the like wrapper is dropped and each row is reshaped
/// to the video's own fields.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub video_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
