// src/models/video.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserSummary;

/// Represents the 'videos' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    /// Duration in seconds, as reported by the media host.
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Video detail view: the row plus its derived like count.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithLikes {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub likes_count: i64,
}

/// Flat row for the listing view; folded into `VideoListItem` so the owner
/// comes out as a single nested object.
#[derive(Debug, FromRow)]
pub struct VideoListRow {
    pub id: Uuid,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub likes_count: i64,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListItem {
    pub id: Uuid,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub likes_count: i64,
    pub owner: UserSummary,
}

impl From<VideoListRow> for VideoListItem {
    fn from(row: VideoListRow) -> Self {
        Self {
            id: row.id,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            title: row.title,
            description: row.description,
            duration: row.duration,
            views: row.views,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
            likes_count: row.likes_count,
            owner: UserSummary {
                username: row.owner_username,
                full_name: row.owner_full_name,
                avatar_url: row.owner_avatar_url,
            },
        }
    }
}

/// Flat row for the watch-history view.
#[derive(Debug, FromRow)]
pub struct WatchHistoryRow {
    pub id: Uuid,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub owner_username: String,
    pub owner_full_name: String,
    pub owner_avatar_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryItem {
    pub id: Uuid,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub owner: UserSummary,
}

impl From<WatchHistoryRow> for WatchHistoryItem {
    fn from(row: WatchHistoryRow) -> Self {
        Self {
            id: row.id,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            title: row.title,
            description: row.description,
            duration: row.duration,
            views: row.views,
            created_at: row.created_at,
            owner: UserSummary {
                username: row.owner_username,
                full_name: row.owner_full_name,
                avatar_url: row.owner_avatar_url,
            },
        }
    }
}

/// DTO for publishing a video. Media already lives on the external host;
/// only its URLs travel here.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishVideoRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    #[validate(custom(function = crate::utils::validate::media_url))]
    pub video_url: String,

    #[validate(custom(function = crate::utils::validate::media_url))]
    pub thumbnail_url: String,

    #[validate(range(min = 0.0, message = "Duration must be non-negative"))]
    pub duration: f64,

    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,

    #[validate(custom(function = crate::utils::validate::media_url))]
    pub thumbnail_url: Option<String>,
}

/// Query parameters for the video listing.
///
/// `page` and `limit` stay raw strings so bad input falls back to defaults
/// instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,

    /// Free-text filter: case-insensitive substring on title or description.
    pub query: Option<String>,

    /// Sort field, restricted to a whitelist; defaults to creation time.
    pub sort_by: Option<String>,

    /// 'asc' ascending; anything else descending.
    pub sort_type: Option<String>,

    /// Restrict to a single owner.
    pub user_id: Option<String>,
}
