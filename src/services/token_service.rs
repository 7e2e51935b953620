//! JWT access tokens and opaque refresh / reset tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::models::User;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to generate token: {0}")]
    Generation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// User ID
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    /// Unique per token, so two tokens issued in the same second differ.
    pub jti: String,
}

impl AccessTokenClaims {
    pub fn user_id(&self) -> Result<i32, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid("Invalid user ID in token".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    forgot_password_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        let secret = config.jwt_signing_key.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            access_ttl: Duration::minutes(config.access_token_minutes),
            refresh_ttl: Duration::days(config.refresh_token_days),
            forgot_password_ttl: Duration::minutes(config.forgot_password_minutes),
        }
    }

    pub fn issue_access_token(&self, user: &User) -> Result<IssuedToken, TokenError> {
        self.issue_access_token_at(user, Utc::now())
    }

    fn issue_access_token_at(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.access_ttl;
        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, expiry, issuer and audience.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    #[must_use]
    pub fn refresh_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.refresh_ttl
    }

    #[must_use]
    pub fn forgot_password_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.forgot_password_ttl
    }

    /// Generate a random opaque token (64 character hex string)
    #[must_use]
    pub fn generate_opaque_token() -> String {
        use rand::Rng;

        let mut rng = rand::rng();
        let bytes: [u8; 32] = rng.random();
        to_hex(&bytes)
    }

    /// SHA-256 digest used to store and look up opaque tokens.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        to_hex(&digest)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn service() -> TokenService {
        TokenService::new(&SecurityConfig {
            jwt_signing_key: "test-signing-key-with-at-least-32-chars".to_string(),
            ..SecurityConfig::default()
        })
    }

    fn user() -> User {
        User {
            id: 7,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = service();
        let issued = service.issue_access_token(&user()).unwrap();
        let claims = service.validate_access_token(&issued.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.role, "Admin");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_tokens_are_unique() {
        let service = service();
        let first = service.issue_access_token(&user()).unwrap();
        let second = service.issue_access_token(&user()).unwrap();
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service();
        let issued = service
            .issue_access_token_at(&user(), Utc::now() - Duration::hours(2))
            .unwrap();

        assert!(matches!(
            service.validate_access_token(&issued.token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_foreign_key_and_audience_are_rejected() {
        let issued = service().issue_access_token(&user()).unwrap();

        let other_key = TokenService::new(&SecurityConfig {
            jwt_signing_key: "a-completely-different-signing-key!!".to_string(),
            ..SecurityConfig::default()
        });
        assert!(other_key.validate_access_token(&issued.token).is_err());

        let other_audience = TokenService::new(&SecurityConfig {
            jwt_signing_key: "test-signing-key-with-at-least-32-chars".to_string(),
            jwt_audience: "someone-else".to_string(),
            ..SecurityConfig::default()
        });
        assert!(other_audience.validate_access_token(&issued.token).is_err());

        assert!(service().validate_access_token("garbage").is_err());
    }

    #[test]
    fn test_opaque_tokens() {
        let token = TokenService::generate_opaque_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, TokenService::generate_opaque_token());

        let hash = TokenService::hash_token(&token);
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, TokenService::hash_token(&token));
        assert_ne!(hash, token);
    }
}
