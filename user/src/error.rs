//! Error taxonomy for the user service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for user operations.
pub type Result<T> = std::result::Result<T, UserError>;

/// Everything that can go wrong inside the user service.
#[derive(Error, Debug)]
pub enum UserError {
    /// No user exists with the requested id.
    #[error("user {0} not found")]
    NotFound(Uuid),

    /// The username is already registered.
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    /// Login failed. Deliberately does not say which part was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Path id and body id disagree on an update.
    #[error("user id mismatch: path {path}, body {body}")]
    IdMismatch {
        /// Id from the URL path.
        path: Uuid,
        /// Id from the request body.
        body: Uuid,
    },

    /// Password hashing or verification failed structurally.
    #[error("credential error: {0}")]
    Credential(String),

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(String),

    /// The relational store failed.
    #[error("database error: {0}")]
    Database(String),
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::UsernameTaken(_) => (StatusCode::CONFLICT, "username_taken"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            Self::IdMismatch { .. } => (StatusCode::BAD_REQUEST, "id_mismatch"),
            Self::Credential(_) | Self::Token(_) | Self::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_taken_maps_to_409() {
        let err = UserError::UsernameTaken("ada".into());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_credentials_maps_to_401() {
        let response = UserError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
