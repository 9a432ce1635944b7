//! HTTP surface of the user service.

use crate::error::UserError;
use crate::models::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest, UserResponse,
};
use crate::service::UserService;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Build the user router.
pub fn router(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[allow(clippy::unused_async)]
async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn register(
    State(service): State<Arc<UserService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), UserError> {
    let user = service.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(service): State<Arc<UserService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, UserError> {
    let response = service.login(request).await?;
    Ok(Json(response))
}

async fn list_users(
    State(service): State<Arc<UserService>>,
) -> Result<Json<Vec<UserResponse>>, UserError> {
    let users = service.list().await?;
    Ok(Json(users))
}

async fn get_user(
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, UserError> {
    let user = service.get(id).await?;
    Ok(Json(user))
}

async fn update_user(
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<StatusCode, UserError> {
    service.update(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, UserError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
