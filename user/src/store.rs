//! User persistence.

use crate::error::UserError;
use crate::models::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Storage operations the user service needs.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user.
    ///
    /// Fails with [`UserError::UsernameTaken`] when the username exists.
    async fn insert(&self, user: &User) -> Result<(), UserError>;

    /// Load one user by id.
    async fn get(&self, id: Uuid) -> Result<Option<User>, UserError>;

    /// Load one user by username.
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserError>;

    /// All users.
    async fn list(&self) -> Result<Vec<User>, UserError>;

    /// Overwrite username and email. Returns `false` when absent.
    async fn update(&self, user: &User) -> Result<bool, UserError>;

    /// Delete a user. Returns `false` when absent.
    async fn delete(&self, id: Uuid) -> Result<bool, UserError>;
}

/// PostgreSQL-backed [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the user schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Database`] when migration fails.
    pub async fn migrate(&self) -> Result<(), UserError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| UserError::Database(format!("migration failed: {e}")))?;
        Ok(())
    }
}

type UserRow = (Uuid, String, String, String, DateTime<Utc>);

fn row_to_user((id, username, email, password_hash, created_at): UserRow) -> User {
    User {
        id,
        username,
        email,
        password_hash,
        created_at,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> Result<(), UserError> {
        sqlx::query(
            r"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return UserError::UsernameTaken(user.username.clone());
                }
            }
            UserError::Database(e.to_string())
        })?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, UserError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::Database(e.to_string()))?;

        Ok(row.map(row_to_user))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::Database(e.to_string()))?;

        Ok(row.map(row_to_user))
    }

    async fn list(&self) -> Result<Vec<User>, UserError> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, username, email, password_hash, created_at FROM users")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| UserError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(row_to_user).collect())
    }

    async fn update(&self, user: &User) -> Result<bool, UserError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET username = $2, email = $3
            WHERE id = $1
            ",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return UserError::UsernameTaken(user.username.clone());
                }
            }
            UserError::Database(e.to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| UserError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-memory [`UserStore`] for tests.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), UserError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| UserError::Database(format!("lock poisoned: {e}")))?;
        if users.values().any(|u| u.username == user.username) {
            return Err(UserError::UsernameTaken(user.username.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, UserError> {
        let users = self
            .users
            .read()
            .map_err(|e| UserError::Database(format!("lock poisoned: {e}")))?;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let users = self
            .users
            .read()
            .map_err(|e| UserError::Database(format!("lock poisoned: {e}")))?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserError> {
        let users = self
            .users
            .read()
            .map_err(|e| UserError::Database(format!("lock poisoned: {e}")))?;
        Ok(users.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> Result<bool, UserError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| UserError::Database(format!("lock poisoned: {e}")))?;
        if users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(UserError::UsernameTaken(user.username.clone()));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                existing.username = user.username.clone();
                existing.email = user.email.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, UserError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| UserError::Database(format!("lock poisoned: {e}")))?;
        Ok(users.remove(&id).is_some())
    }
}
