//! Domain types and HTTP DTOs for the user service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account as stored.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    /// Unique account id.
    pub id: Uuid,
    /// Login name, unique across the store.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Argon2 hash of the password; never leaves the service.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The externally visible view of this account.
    #[must_use]
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// User representation returned by the API (no credential material).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// Unique account id.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Body for `POST /users/register`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
}

/// Body for `POST /users/login`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Response for a successful login.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed JWT for the session.
    pub token: String,
}

/// Body for `PUT /users/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    /// Account id; must match the path id.
    pub id: Uuid,
    /// New login name.
    pub username: String,
    /// New contact email.
    pub email: String,
}
