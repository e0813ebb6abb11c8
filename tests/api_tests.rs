// tests/api_tests.rs
//
// End-to-end tests against a live Postgres. Run with a migrated database:
//   DATABASE_URL=postgres://... cargo test -- --ignored

use sqlx::postgres::PgPoolOptions;
use viewtube::{config::Config, routes, state::AppState};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        access_token_secret: "test_access_secret".to_string(),
        access_token_expiry: 600,
        refresh_token_secret: "test_refresh_secret".to_string(),
        refresh_token_expiry: 3600,
        cors_origin: "http://localhost:3000".to_string(),
        port: 0,
        rust_log: "error".to_string(),
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

/// Registers a user and logs in. Returns (access_token, user_id, username).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (String, String, String) {
    let username = unique_name("u");
    let password = "password123";

    let register = client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "fullName": "Test User",
            "password": password,
            "avatarUrl": "https://cdn.example.com/avatar.png"
        }))
        .send()
        .await
        .expect("Register failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse register json");

    let user_id = register["data"]["id"].as_str().expect("user id").to_string();

    let login = client
        .post(format!("{}/api/users/login", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    let token = login["data"]["accessToken"]
        .as_str()
        .expect("access token")
        .to_string();

    (token, user_id, username)
}

async fn publish_video(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    title: &str,
) -> String {
    let response = client
        .post(format!("{}/api/videos", address))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "description": "A test upload",
            "videoUrl": "https://cdn.example.com/v.mp4",
            "thumbnailUrl": "https://cdn.example.com/t.png",
            "duration": 42.5
        }))
        .send()
        .await
        .expect("Publish failed");

    assert_eq!(response.status().as_u16(), 201);

    let body = response.json::<serde_json::Value>().await.unwrap();
    body["data"]["id"].as_str().expect("video id").to_string()
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn health_check_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/healthcheck", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "OK");
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn register_works_and_hides_password() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name("u");

    let response = client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "fullName": "First Creator",
            "password": "password123",
            "avatarUrl": "https://cdn.example.com/avatar.png"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["data"]["username"], username);
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "email": "yo@example.com",
            "fullName": "Yo",
            "password": "password123",
            "avatarUrl": "https://cdn.example.com/avatar.png"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn register_duplicate_username_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, _, username) = register_and_login(&client, &address).await;

    let response = client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": "different@example.com",
            "fullName": "Someone Else",
            "password": "password123",
            "avatarUrl": "https://cdn.example.com/avatar.png"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn login_sets_cookies_and_current_user_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name("u");

    client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "fullName": "Test User",
            "password": "password123",
            "avatarUrl": "https://cdn.example.com/avatar.png"
        }))
        .send()
        .await
        .expect("Register failed");

    let login = client
        .post(format!("{}/api/users/login", address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .expect("Login failed");

    assert_eq!(login.status().as_u16(), 200);
    let cookies: Vec<String> = login
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));

    let body = login.json::<serde_json::Value>().await.unwrap();
    let token = body["data"]["accessToken"].as_str().unwrap();

    let me = client
        .get(format!("{}/api/users/current-user", address))
        .bearer_auth(token)
        .send()
        .await
        .expect("current-user failed");

    assert_eq!(me.status().as_u16(), 200);
    let me_body = me.json::<serde_json::Value>().await.unwrap();
    assert_eq!(me_body["data"]["username"], username);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn refresh_token_rotates() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name("u");

    client
        .post(format!("{}/api/users/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "fullName": "Test User",
            "password": "password123",
            "avatarUrl": "https://cdn.example.com/avatar.png"
        }))
        .send()
        .await
        .expect("Register failed");

    let login = client
        .post(format!("{}/api/users/login", address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    let refresh_token = login["data"]["refreshToken"].as_str().unwrap();

    let refreshed = client
        .post(format!("{}/api/users/refresh-token", address))
        .json(&serde_json::json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .expect("Refresh failed");

    assert_eq!(refreshed.status().as_u16(), 200);
    let refreshed_body = refreshed.json::<serde_json::Value>().await.unwrap();
    assert!(refreshed_body["data"]["accessToken"].as_str().is_some());

    // The old token was rotated out; replaying it must fail.
    let replay = client
        .post(format!("{}/api/users/refresh-token", address))
        .json(&serde_json::json!({ "refreshToken": refresh_token }))
        .send()
        .await
        .expect("Replay request failed");

    assert_eq!(replay.status().as_u16(), 401);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn protected_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/videos", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn malformed_id_is_rejected_before_lookup() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _, _) = register_and_login(&client, &address).await;

    for path in [
        "/api/videos/not-a-uuid",
        "/api/comments/video/not-a-uuid",
        "/api/playlists/not-a-uuid",
        "/api/tweets/user/not-a-uuid",
    ] {
        let response = client
            .get(format!("{}{}", address, path))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 400, "path: {}", path);
    }

    let toggle = client
        .post(format!("{}/api/likes/toggle/video/12345", address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(toggle.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn video_crud_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _, _) = register_and_login(&client, &address).await;

    let video_id = publish_video(&client, &address, &token, "My first upload").await;

    let detail = client
        .get(format!("{}/api/videos/{}", address, video_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Detail failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(detail["data"]["title"], "My first upload");
    assert_eq!(detail["data"]["likesCount"], 0);
    assert_eq!(detail["data"]["views"], 0);

    let updated = client
        .patch(format!("{}/api/videos/{}", address, video_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "Renamed upload" }))
        .send()
        .await
        .expect("Update failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(updated["data"]["title"], "Renamed upload");

    let deleted = client
        .delete(format!("{}/api/videos/{}", address, video_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Delete failed");
    assert_eq!(deleted.status().as_u16(), 200);

    let gone = client
        .get(format!("{}/api/videos/{}", address, video_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Detail failed");
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn only_the_owner_can_delete_a_video() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token_a, _, _) = register_and_login(&client, &address).await;
    let (token_b, _, _) = register_and_login(&client, &address).await;

    let video_id = publish_video(&client, &address, &token_a, "Owned by A").await;

    let forbidden = client
        .delete(format!("{}/api/videos/{}", address, video_id))
        .bearer_auth(&token_b)
        .send()
        .await
        .expect("Delete failed");

    assert_eq!(forbidden.status().as_u16(), 403);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn comment_on_missing_video_is_404_and_writes_nothing() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _, _) = register_and_login(&client, &address).await;

    let database_url = std::env::var("DATABASE_URL").unwrap();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .unwrap();

    let before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(&pool)
        .await
        .unwrap();

    let missing = uuid::Uuid::new_v4();
    let response = client
        .post(format!("{}/api/comments/video/{}", address, missing))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "first!" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);

    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn comment_pagination_defaults_on_bad_input() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _, _) = register_and_login(&client, &address).await;

    let video_id = publish_video(&client, &address, &token, "Commented video").await;

    for i in 0..12 {
        let response = client
            .post(format!("{}/api/comments/video/{}", address, video_id))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "content": format!("comment {}", i) }))
            .send()
            .await
            .expect("Comment failed");
        assert_eq!(response.status().as_u16(), 201);
    }

    // page=0 and limit=-5 behave exactly like omitting the parameters.
    let defaulted = client
        .get(format!(
            "{}/api/comments/video/{}?page=0&limit=-5",
            address, video_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("List failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    let plain = client
        .get(format!("{}/api/comments/video/{}", address, video_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("List failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(defaulted["data"], plain["data"]);
    assert_eq!(plain["data"].as_array().unwrap().len(), 10);

    // Second page holds the remaining two.
    let page2 = client
        .get(format!(
            "{}/api/comments/video/{}?page=2",
            address, video_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("List failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    assert_eq!(page2["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn comment_owner_is_collapsed_into_a_single_object() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _, username) = register_and_login(&client, &address).await;

    let video_id = publish_video(&client, &address, &token, "Video with comment").await;

    client
        .post(format!("{}/api/comments/video/{}", address, video_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "nice one" }))
        .send()
        .await
        .expect("Comment failed");

    let list = client
        .get(format!("{}/api/comments/video/{}", address, video_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("List failed")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    let first = &list["data"][0];
    assert_eq!(first["content"], "nice one");
    assert_eq!(first["owner"]["username"], username);
    assert!(first["owner"].get("password").is_none());
    assert!(first["owner"].get("email").is_none());
}
