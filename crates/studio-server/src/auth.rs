//! Bearer-token authentication and password hashing.
//!
//! Tokens are HS256 JWTs whose subject is the account id and which carry the
//! account role. Roles never change after registration, so the role in a
//! valid token is trusted without a store lookup.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::{async_trait, http::header};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use studio_shared::{AccountId, Actor, DomainError, Role};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: jsonwebtoken::EncodingKey,
    decoding_key: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
    ttl_secs: i64,
}

impl JwtService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
            validation: jsonwebtoken::Validation::default(),
            ttl_secs,
        }
    }

    pub fn issue(&self, actor: &Actor) -> Result<String, DomainError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: actor.id.to_string(),
            role: actor.role,
            iat: now,
            exp: now + self.ttl_secs,
        };
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &self.encoding_key)
            .map_err(|e| DomainError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify a token and recover the actor it was issued to.
    pub fn verify(&self, token: &str) -> Result<Actor, DomainError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                DomainError::Unauthorized
            })?;
        let id = AccountId::parse(&claims.sub).map_err(|_| DomainError::Unauthorized)?;
        Ok(Actor::new(id, claims.role))
    }
}

/// Hash a plain password with argon2id.
pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| DomainError::Internal(format!("password hash: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// A caller that must present a valid bearer token. Rejects with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for AuthActor
where
    Arc<JwtService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jwt = Arc::<JwtService>::from_ref(state);
        let token = bearer_token(parts).ok_or(DomainError::Unauthorized)?;
        Ok(Self(jwt.verify(token)?))
    }
}

/// A caller that may be anonymous. A missing or invalid token yields `None`.
#[derive(Debug, Clone, Copy)]
pub struct MaybeActor(pub Option<Actor>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeActor
where
    Arc<JwtService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jwt = Arc::<JwtService>::from_ref(state);
        Ok(Self(bearer_token(parts).and_then(|t| jwt.verify(t).ok())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify() {
        let svc = JwtService::new("secret", 3600);
        let actor = Actor::new(AccountId::new(), Role::ListingOwner);
        let token = svc.issue(&actor).unwrap();
        assert_eq!(svc.verify(&token).unwrap(), actor);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = JwtService::new("secret-a", 3600)
            .issue(&Actor::new(AccountId::new(), Role::Client))
            .unwrap();
        assert_eq!(
            JwtService::new("secret-b", 3600).verify(&token),
            Err(DomainError::Unauthorized)
        );
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let svc = JwtService::new("secret", -120);
        let token = svc.issue(&Actor::new(AccountId::new(), Role::Client)).unwrap();
        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-hash"));
    }
}
