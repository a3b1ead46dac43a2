// ABOUTME: JWT session tokens: generation and validation with HS256
// ABOUTME: Tokens carry the user id and email and expire after 24 hours
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::User;

/// Token validity window
const TOKEN_EXPIRY_HOURS: i64 = 24;

/// JWT claims for a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// User email
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Parse the subject back into a user id.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` if the subject is not a UUID.
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::auth_invalid("Malformed token subject"))
    }
}

/// Issues and validates session tokens
#[derive(Clone)]
pub struct AuthManager {
    secret: String,
}

impl AuthManager {
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_EXPIRY_HOURS)).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for expired, tampered, or malformed tokens.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::auth_invalid("Invalid or expired token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AuthManager {
        AuthManager::new("test-secret-key".into())
    }

    fn user() -> User {
        User::new("creator@example.com".into(), "hash".into())
    }

    #[test]
    fn test_token_round_trip() {
        let manager = manager();
        let user = user();

        let token = manager.generate_token(&user).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email, user.email);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = manager().generate_token(&user()).unwrap();
        let other = AuthManager::new("different-secret".into());
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(manager().validate_token("not.a.token").is_err());
    }
}
