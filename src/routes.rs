// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        auth, comments, dashboard, healthcheck, likes, playlists, subscriptions, tweets, users,
        videos,
    },
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (users, videos, comments, likes, subscriptions,
///   tweets, playlists, dashboard).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.parse::<axum::http::HeaderValue>().unwrap())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let user_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh_token))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route("/change-password", post(auth::change_password))
                .route("/current-user", get(users::get_current_user))
                .route("/update-account", patch(users::update_account))
                .route("/avatar", patch(users::update_avatar))
                .route("/cover-image", patch(users::update_cover_image))
                .route("/channel/{username}", get(users::get_channel_profile))
                .route("/history", get(users::get_watch_history))
                .route("/history/{video_id}", post(users::record_watch))
                .route_layer(auth_layer.clone()),
        );

    let video_routes = Router::new()
        .route("/", get(videos::get_all_videos).post(videos::publish_video))
        .route(
            "/{video_id}",
            get(videos::get_video_by_id)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route(
            "/toggle/publish/{video_id}",
            patch(videos::toggle_publish_status),
        )
        .route_layer(auth_layer.clone());

    let comment_routes = Router::new()
        .route(
            "/video/{video_id}",
            get(comments::get_video_comments).post(comments::add_comment_to_video),
        )
        .route(
            "/tweet/{tweet_id}",
            get(comments::get_tweet_comments).post(comments::add_comment_to_tweet),
        )
        .route(
            "/{comment_id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route_layer(auth_layer.clone());

    let like_routes = Router::new()
        .route("/toggle/video/{video_id}", post(likes::toggle_video_like))
        .route(
            "/toggle/comment/{comment_id}",
            post(likes::toggle_comment_like),
        )
        .route("/toggle/tweet/{tweet_id}", post(likes::toggle_tweet_like))
        .route("/videos", get(likes::get_liked_videos))
        .route_layer(auth_layer.clone());

    let subscription_routes = Router::new()
        .route(
            "/channel/{channel_id}",
            post(subscriptions::toggle_subscription),
        )
        .route(
            "/channel/{channel_id}/subscribers",
            get(subscriptions::get_channel_subscribers),
        )
        .route(
            "/user/{subscriber_id}/channels",
            get(subscriptions::get_subscribed_channels),
        )
        .route_layer(auth_layer.clone());

    let tweet_routes = Router::new()
        .route("/", post(tweets::create_tweet))
        .route("/user/{user_id}", get(tweets::get_user_tweets))
        .route(
            "/{tweet_id}",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        .route_layer(auth_layer.clone());

    let playlist_routes = Router::new()
        .route("/", post(playlists::create_playlist))
        .route("/user/{user_id}", get(playlists::get_user_playlists))
        .route(
            "/{playlist_id}",
            get(playlists::get_playlist_by_id)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route(
            "/add/{playlist_id}/{video_id}",
            patch(playlists::add_video_to_playlist),
        )
        .route(
            "/remove/{playlist_id}/{video_id}",
            patch(playlists::remove_video_from_playlist),
        )
        .route_layer(auth_layer.clone());

    let dashboard_routes = Router::new()
        .route("/stats", get(dashboard::get_channel_stats))
        .route("/videos", get(dashboard::get_channel_videos))
        .route_layer(auth_layer);

    Router::new()
        .route("/api/healthcheck", get(healthcheck::healthcheck))
        .nest("/api/users", user_routes)
        .nest("/api/videos", video_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/likes", like_routes)
        .nest("/api/subscriptions", subscription_routes)
        .nest("/api/tweets", tweet_routes)
        .nest("/api/playlists", playlist_routes)
        .nest("/api/dashboard", dashboard_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
