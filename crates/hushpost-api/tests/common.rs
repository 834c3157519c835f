#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use serde_json::{Value, json};

use hushpost_api::{AppStateInner, router};
use hushpost_db::Database;
use hushpost_relay::{RelayConfig, SuggestionRelay};

pub const JWT_SECRET: &str = "test-secret";

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn spawn_app(relay: RelayConfig) -> String {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: JWT_SECRET.into(),
        relay: SuggestionRelay::new(relay).unwrap(),
        db_timeout: Duration::from_secs(5),
    });
    serve(router(state)).await
}

pub async fn spawn_default_app() -> String {
    spawn_app(RelayConfig::default()).await
}

/// Register a user and return their bearer token.
pub async fn register(client: &reqwest::Client, base: &str, username: &str) -> String {
    let resp = client
        .post(format!("{base}/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct horse battery",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

pub async fn create_post(client: &reqwest::Client, base: &str, token: &str, content: &str) -> String {
    let resp = client
        .post(format!("{base}/posts"))
        .bearer_auth(token)
        .json(&json!({ "content": content }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["post"]["id"].as_str().unwrap().to_string()
}

pub async fn own_posts(client: &reqwest::Client, base: &str, token: &str) -> Vec<Value> {
    let body: Value = client
        .get(format!("{base}/posts"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["posts"].as_array().unwrap().clone()
}
