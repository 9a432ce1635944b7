//! User service HTTP surface.

#![allow(clippy::unwrap_used)]

use axum_test::TestServer;
use serde_json::json;
use shoply_user::auth::JwtSettings;
use shoply_user::models::UserResponse;
use shoply_user::routes;
use shoply_user::service::UserService;
use shoply_user::store::InMemoryUserStore;
use std::sync::Arc;

fn server() -> TestServer {
    let service = Arc::new(UserService::new(
        Arc::new(InMemoryUserStore::new()),
        JwtSettings {
            secret: "test-secret-at-least-32-bytes-long!".to_string(),
            issuer: "shoply-user".to_string(),
            audience: "shoply".to_string(),
            ttl_minutes: 30,
        },
    ));
    TestServer::new(routes::router(service)).unwrap()
}

#[tokio::test]
async fn register_login_get_roundtrip() {
    let server = server();

    let created = server
        .post("/users/register")
        .json(&json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "hunter2",
        }))
        .await;
    created.assert_status(axum::http::StatusCode::CREATED);
    let user: UserResponse = created.json();

    let login = server
        .post("/users/login")
        .json(&json!({ "username": "ada", "password": "hunter2" }))
        .await;
    login.assert_status_ok();

    let fetched = server.get(&format!("/users/{}", user.id)).await;
    fetched.assert_status_ok();
    let fetched: UserResponse = fetched.json();
    assert_eq!(fetched.username, "ada");
}

#[tokio::test]
async fn login_with_bad_password_is_401() {
    let server = server();

    server
        .post("/users/register")
        .json(&json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "hunter2",
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let login = server
        .post("/users/login")
        .json(&json!({ "username": "ada", "password": "nope" }))
        .await;
    login.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_username_is_409() {
    let server = server();
    let body = json!({
        "username": "ada",
        "email": "ada@example.com",
        "password": "hunter2",
    });

    server
        .post("/users/register")
        .json(&body)
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    server
        .post("/users/register")
        .json(&body)
        .await
        .assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn missing_user_is_404() {
    let server = server();
    let response = server
        .get(&format!("/users/{}", uuid::Uuid::new_v4()))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}
