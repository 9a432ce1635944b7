//! Password hashing and JWT issuance.

use crate::error::UserError;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hash a plaintext password with Argon2id and a fresh salt.
///
/// # Errors
///
/// Returns [`UserError::Credential`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::Credential(e.to_string()))
}

/// Check a plaintext password against a stored hash.
///
/// Returns `false` for a wrong password; errors only when the stored hash
/// itself is malformed.
///
/// # Errors
///
/// Returns [`UserError::Credential`] if the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, UserError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| UserError::Credential(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Signing parameters for issued tokens, read from configuration.
#[derive(Clone, Debug)]
pub struct JwtSettings {
    /// HMAC signing secret.
    pub secret: String,
    /// `iss` claim.
    pub issuer: String,
    /// `aud` claim.
    pub audience: String,
    /// Token lifetime in minutes.
    pub ttl_minutes: i64,
}

/// Claims carried by an issued token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Token id, unique per issuance.
    pub jti: String,
    /// The account id.
    pub uid: Uuid,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
}

/// Issue an HS256 token for a user.
///
/// # Errors
///
/// Returns [`UserError::Token`] if signing fails.
pub fn issue_token(
    settings: &JwtSettings,
    user_id: Uuid,
    username: &str,
) -> Result<String, UserError> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        jti: Uuid::new_v4().to_string(),
        uid: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::minutes(settings.ttl_minutes)).timestamp(),
        iss: settings.issuer.clone(),
        aud: settings.audience.clone(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| UserError::Token(e.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-at-least-32-bytes-long!".to_string(),
            issuer: "shoply-user".to_string(),
            audience: "shoply".to_string(),
            ttl_minutes: 30,
        }
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn issued_token_carries_expected_claims() {
        let settings = settings();
        let user_id = Uuid::new_v4();

        let token = issue_token(&settings, user_id, "ada").unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[settings.audience.clone()]);
        validation.set_issuer(&[settings.issuer.clone()]);
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(settings.secret.as_bytes()),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, "ada");
        assert_eq!(decoded.claims.uid, user_id);
        assert!(decoded.claims.exp > decoded.claims.iat);
    }
}
