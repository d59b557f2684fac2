//! JWT service for session token issuance and verification
//!
//! Tokens are HS256-signed bearer credentials carrying the user id. There
//! is no revocation list; expiry is the only invalidation mechanism.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Default token lifetime: 7 days
const DEFAULT_TOKEN_EXPIRY: u64 = 604800;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Token expiration time in seconds (default: 7 days)
    pub token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: signing secret (required)
    /// - `JWT_TOKEN_EXPIRY`: token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let token_expiry = std::env::var("JWT_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);

        Ok(JwtConfig {
            secret,
            token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Token verification failure
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            token_expiry: config.token_expiry,
        }
    }

    /// Issue a signed token for a user
    pub fn issue_token(&self, user_id: Uuid) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.token_expiry,
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?;
        Ok(token)
    }

    /// Verify a token and return the embedded user id
    pub fn verify_token(&self, token: &str) -> Result<Uuid, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })?;

        Ok(token_data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            token_expiry: 3600,
        })
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = test_service("test-secret");
        let user_id = Uuid::new_v4();

        let token = service.issue_token(user_id).unwrap();
        assert_eq!(service.verify_token(&token), Ok(user_id));
    }

    #[test]
    fn test_token_signed_with_different_secret_is_invalid() {
        let issuer = test_service("secret-one");
        let verifier = test_service("secret-two");

        let token = issuer.issue_token(Uuid::new_v4()).unwrap();
        assert_eq!(verifier.verify_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let service = test_service("test-secret");
        assert_eq!(
            service.verify_token("token_1700000000"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_expired_token_fails_with_expired() {
        let service = test_service("test-secret");

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_eq!(service.verify_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_config_defaults_to_seven_days() {
        // Constructed directly so the test does not depend on process env
        let config = JwtConfig {
            secret: "s".to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        };
        assert_eq!(config.token_expiry, 7 * 24 * 60 * 60);
    }
}
