use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::User;

/// Token claims. `sub` must stay a plain string for the decoder, so the
/// full user row rides along in its own claim and protected handlers get
/// the acting user without a lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user: User,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user: User, expiry_mins: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user.username.clone(),
            user,
            exp: (now + Duration::minutes(expiry_mins)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token generation error: {0}")]
    TokenGeneration(String),

    #[error("token is invalid or expired")]
    InvalidToken,

    #[error("password hashing error: {0}")]
    Hashing(String),
}

pub fn generate_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|_| AuthError::InvalidToken)?;
    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            username: "alice".to_string(),
            password: "hash".to_string(),
            name: "Alice".to_string(),
        }
    }

    #[test]
    fn token_round_trip_carries_the_user() {
        let token = generate_token(&Claims::new(user(), 5), "test-secret").unwrap();
        let claims = decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.user.username, "alice");
    }

    #[test]
    fn subject_claim_is_a_plain_string() {
        // The decoder rejects tokens whose sub is a JSON object
        let value = serde_json::to_value(Claims::new(user(), 5)).unwrap();
        assert!(value["sub"].is_string());
        assert!(value["user"].is_object());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_token(&Claims::new(user(), 5), "test-secret").unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Default validation allows 60s leeway, so go well past it
        let user = user();
        let claims = Claims {
            sub: user.username.clone(),
            user,
            exp: (Utc::now() - Duration::minutes(10)).timestamp(),
            iat: (Utc::now() - Duration::minutes(15)).timestamp(),
        };
        let token = generate_token(&claims, "test-secret").unwrap();
        assert!(decode_token(&token, "test-secret").is_err());
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }
}
