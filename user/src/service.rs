//! User-management operations.

use crate::auth::{self, JwtSettings};
use crate::error::UserError;
use crate::models::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest, User, UserResponse,
};
use crate::store::UserStore;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use uuid::Uuid;

/// The user-management service core.
pub struct UserService {
    store: Arc<dyn UserStore>,
    jwt: JwtSettings,
}

impl UserService {
    /// Create a service over a store with the given token settings.
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtSettings) -> Self {
        Self { store, jwt }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// [`UserError::UsernameTaken`] when the name is in use,
    /// [`UserError::Credential`] when hashing fails,
    /// [`UserError::Database`] on store failure.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, UserError> {
        let user = User {
            id: Uuid::new_v4(),
            username: request.username,
            email: request.email,
            password_hash: auth::hash_password(&request.password)?,
            created_at: Utc::now(),
        };
        self.store.insert(&user).await?;

        counter!("users_registered_total").increment(1);
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user.to_response())
    }

    /// Verify credentials and issue a session token.
    ///
    /// An unknown username and a wrong password fail identically.
    ///
    /// # Errors
    ///
    /// [`UserError::InvalidCredentials`] on failed verification,
    /// [`UserError::Token`] when signing fails,
    /// [`UserError::Database`] on store failure.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, UserError> {
        let user = self.store.get_by_username(&request.username).await?;

        let Some(user) = user else {
            counter!("failed_logins_total").increment(1);
            return Err(UserError::InvalidCredentials);
        };

        if !auth::verify_password(&request.password, &user.password_hash)? {
            counter!("failed_logins_total").increment(1);
            tracing::debug!(username = %request.username, "Password verification failed");
            return Err(UserError::InvalidCredentials);
        }

        let token = auth::issue_token(&self.jwt, user.id, &user.username)?;

        counter!("logins_total").increment(1);
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse { token })
    }

    /// One user by id.
    ///
    /// # Errors
    ///
    /// [`UserError::NotFound`] when absent, [`UserError::Database`] on
    /// store failure.
    pub async fn get(&self, id: Uuid) -> Result<UserResponse, UserError> {
        let user = self.store.get(id).await?.ok_or(UserError::NotFound(id))?;
        Ok(user.to_response())
    }

    /// All users.
    ///
    /// # Errors
    ///
    /// [`UserError::Database`] on store failure.
    pub async fn list(&self) -> Result<Vec<UserResponse>, UserError> {
        let users = self.store.list().await?;
        Ok(users.iter().map(User::to_response).collect())
    }

    /// Update username and email.
    ///
    /// # Errors
    ///
    /// [`UserError::IdMismatch`] when path and body ids disagree,
    /// [`UserError::NotFound`] when absent,
    /// [`UserError::UsernameTaken`] when the new name is in use.
    pub async fn update(&self, id: Uuid, request: UpdateUserRequest) -> Result<(), UserError> {
        if id != request.id {
            return Err(UserError::IdMismatch {
                path: id,
                body: request.id,
            });
        }

        let mut user = self.store.get(id).await?.ok_or(UserError::NotFound(id))?;
        user.username = request.username;
        user.email = request.email;

        let touched = self.store.update(&user).await?;
        if !touched {
            return Err(UserError::NotFound(id));
        }

        tracing::info!(user_id = %id, "User updated");
        Ok(())
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// [`UserError::NotFound`] when absent, [`UserError::Database`] on
    /// store failure.
    pub async fn delete(&self, id: Uuid) -> Result<(), UserError> {
        let deleted = self.store.delete(id).await?;
        if !deleted {
            return Err(UserError::NotFound(id));
        }

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::store::InMemoryUserStore;

    fn service() -> UserService {
        UserService::new(
            Arc::new(InMemoryUserStore::new()),
            JwtSettings {
                secret: "test-secret-at-least-32-bytes-long!".to_string(),
                issuer: "shoply-user".to_string(),
                audience: "shoply".to_string(),
                ttl_minutes: 30,
            },
        )
    }

    fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = service();
        let registered = service.register(register_request("ada")).await.unwrap();

        let response = service
            .login(LoginRequest {
                username: "ada".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .unwrap();

        assert!(!response.token.is_empty());
        assert_eq!(service.get(registered.id).await.unwrap().username, "ada");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_fail_identically() {
        let service = service();
        service.register(register_request("ada")).await.unwrap();

        let wrong_password = service
            .login(LoginRequest {
                username: "ada".to_string(),
                password: "wrong".to_string(),
            })
            .await;
        let unknown_user = service
            .login(LoginRequest {
                username: "grace".to_string(),
                password: "hunter2".to_string(),
            })
            .await;

        assert!(matches!(wrong_password, Err(UserError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let service = service();
        service.register(register_request("ada")).await.unwrap();

        let result = service.register(register_request("ada")).await;
        assert!(matches!(result, Err(UserError::UsernameTaken(_))));
    }

    #[tokio::test]
    async fn update_with_mismatched_ids_fails() {
        let service = service();
        let registered = service.register(register_request("ada")).await.unwrap();

        let result = service
            .update(
                registered.id,
                UpdateUserRequest {
                    id: Uuid::new_v4(),
                    username: "ada2".to_string(),
                    email: "ada2@example.com".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::IdMismatch { .. })));
        assert_eq!(service.get(registered.id).await.unwrap().username, "ada");
    }

    #[tokio::test]
    async fn responses_never_carry_credential_material() {
        let service = service();
        let registered = service.register(register_request("ada")).await.unwrap();

        let json = serde_json::to_value(&registered).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }
}
