// src/handlers/playlists.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::playlist::{CreatePlaylistRequest, Playlist, PlaylistResponse, UpdatePlaylistRequest},
    utils::{authz::ensure_owner, ids::parse_id, jwt::Claims, response::ApiResponse},
};

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";

async fn fetch_playlist(pool: &PgPool, playlist_id: Uuid) -> Result<Playlist, AppError> {
    let sql = format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = $1");

    sqlx::query_as::<_, Playlist>(&sql)
        .bind(playlist_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))
}

/// Ordered video reference list of a playlist.
async fn fetch_playlist_videos(pool: &PgPool, playlist_id: Uuid) -> Result<Vec<Uuid>, AppError> {
    let videos = sqlx::query_scalar::<_, Uuid>(
        "SELECT video_id FROM playlist_videos WHERE playlist_id = $1 ORDER BY position",
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await?;

    Ok(videos)
}

async fn playlist_response(pool: &PgPool, playlist: Playlist) -> Result<PlaylistResponse, AppError> {
    let videos = fetch_playlist_videos(pool, playlist.id).await?;
    Ok(PlaylistResponse { playlist, videos })
}

pub async fn create_playlist(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePlaylistRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sql = format!(
        "INSERT INTO playlists (owner_id, name, description) \
         VALUES ($1, $2, $3) RETURNING {PLAYLIST_COLUMNS}"
    );

    let playlist = sqlx::query_as::<_, Playlist>(&sql)
        .bind(claims.user_id()?)
        .bind(payload.name.trim())
        .bind(payload.description.trim())
        .fetch_one(&pool)
        .await?;

    Ok(ApiResponse::created(
        PlaylistResponse {
            playlist,
            videos: Vec::new(),
        },
        "Playlist created successfully",
    ))
}

/// Playlists of a user, each with its ordered video list. The video lists
/// are fetched in one query and joined in memory.
pub async fn get_user_playlists(
    State(pool): State<PgPool>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_id(&user_id, "user")?;

    let sql = format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE owner_id = $1 ORDER BY created_at DESC"
    );

    let playlists = sqlx::query_as::<_, Playlist>(&sql)
        .bind(user_id)
        .fetch_all(&pool)
        .await?;

    if playlists.is_empty() {
        return Err(AppError::NotFound(
            "No playlists found for this user".to_string(),
        ));
    }

    let ids: Vec<Uuid> = playlists.iter().map(|p| p.id).collect();

    let rows = sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT playlist_id, video_id FROM playlist_videos \
         WHERE playlist_id = ANY($1) ORDER BY position",
    )
    .bind(&ids)
    .fetch_all(&pool)
    .await?;

    let mut by_playlist: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (playlist_id, video_id) in rows {
        by_playlist.entry(playlist_id).or_default().push(video_id);
    }

    let response: Vec<PlaylistResponse> = playlists
        .into_iter()
        .map(|playlist| {
            let videos = by_playlist.remove(&playlist.id).unwrap_or_default();
            PlaylistResponse { playlist, videos }
        })
        .collect();

    Ok(ApiResponse::ok(response, "Playlists retrieved successfully"))
}

pub async fn get_playlist_by_id(
    State(pool): State<PgPool>,
    Path(playlist_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let playlist = fetch_playlist(&pool, playlist_id).await?;
    let response = playlist_response(&pool, playlist).await?;

    Ok(ApiResponse::ok(response, "Playlist retrieved successfully"))
}

/// Appends a video to a playlist. Owner only; duplicates are rejected.
pub async fn add_video_to_playlist(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let video_id = parse_id(&video_id, "video")?;

    let playlist = fetch_playlist(&pool, playlist_id).await?;
    ensure_owner(playlist.owner_id, claims.user_id()?, "playlist")?;

    let video = sqlx::query_scalar::<_, i32>("SELECT 1 FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&pool)
        .await?;

    if video.is_none() {
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    let already = sqlx::query_scalar::<_, i32>(
        "SELECT 1 FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2",
    )
    .bind(playlist_id)
    .bind(video_id)
    .fetch_optional(&pool)
    .await?;

    if already.is_some() {
        return Err(AppError::BadRequest(
            "Video is already in the playlist".to_string(),
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO playlist_videos (playlist_id, video_id, position)
        VALUES (
            $1, $2,
            (SELECT COALESCE(MAX(position) + 1, 0) FROM playlist_videos WHERE playlist_id = $1)
        )
        "#,
    )
    .bind(playlist_id)
    .bind(video_id)
    .execute(&pool)
    .await?;

    let response = playlist_response(&pool, playlist).await?;

    Ok(ApiResponse::ok(response, "Video added to playlist successfully"))
}

/// Removes a video from a playlist. Owner only.
pub async fn remove_video_from_playlist(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let video_id = parse_id(&video_id, "video")?;

    let playlist = fetch_playlist(&pool, playlist_id).await?;
    ensure_owner(playlist.owner_id, claims.user_id()?, "playlist")?;

    let removed = sqlx::query(
        "DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2",
    )
    .bind(playlist_id)
    .bind(video_id)
    .execute(&pool)
    .await?;

    if removed.rows_affected() == 0 {
        return Err(AppError::BadRequest(
            "Video not found in the playlist".to_string(),
        ));
    }

    let response = playlist_response(&pool, playlist).await?;

    Ok(ApiResponse::ok(
        response,
        "Video removed from playlist successfully",
    ))
}

/// Renames or re-describes a playlist. Owner only.
pub async fn update_playlist(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(playlist_id): Path<String>,
    Json(payload): Json<UpdatePlaylistRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let playlist_id = parse_id(&playlist_id, "playlist")?;

    if payload.name.is_none() && payload.description.is_none() {
        return Err(AppError::BadRequest(
            "Please provide at least one field to update".to_string(),
        ));
    }

    let playlist = fetch_playlist(&pool, playlist_id).await?;
    ensure_owner(playlist.owner_id, claims.user_id()?, "playlist")?;

    let sql = format!(
        "UPDATE playlists SET \
            name = COALESCE($2, name), \
            description = COALESCE($3, description), \
            updated_at = NOW() \
         WHERE id = $1 RETURNING {PLAYLIST_COLUMNS}"
    );

    let playlist = sqlx::query_as::<_, Playlist>(&sql)
        .bind(playlist_id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(payload.description.as_deref().map(str::trim))
        .fetch_one(&pool)
        .await?;

    let response = playlist_response(&pool, playlist).await?;

    Ok(ApiResponse::ok(response, "Playlist updated successfully"))
}

/// Deletes a playlist. Owner only.
pub async fn delete_playlist(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(playlist_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let playlist = fetch_playlist(&pool, playlist_id).await?;
    ensure_owner(playlist.owner_id, claims.user_id()?, "playlist")?;

    sqlx::query("DELETE FROM playlists WHERE id = $1")
        .bind(playlist_id)
        .execute(&pool)
        .await?;

    Ok(ApiResponse::ok(playlist, "Playlist deleted successfully"))
}
