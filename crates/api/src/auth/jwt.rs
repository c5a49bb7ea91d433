//! JWT access-token generation/validation and refresh-token helpers.
//!
//! Access tokens are HS256-signed JWTs containing a [`Claims`] payload.
//! Refresh tokens are opaque random strings; only their SHA-256 hash is stored
//! server-side so a database leak does not compromise active sessions.

use bazaar_core::types::DbId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::{env_or, ConfigError};

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the effective user's database id.
    pub sub: DbId,
    /// The effective user's role name (`"buyer"`, `"seller"`, `"admin"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for revocation / audit.
    pub jti: String,
    /// Admin id when the token was issued by an impersonation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imp: Option<DbId>,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            secret,
            access_token_expiry_mins: env_or("JWT_ACCESS_EXPIRY_MINS", DEFAULT_ACCESS_EXPIRY_MINS)?,
            refresh_token_expiry_days: env_or(
                "JWT_REFRESH_EXPIRY_DAYS",
                DEFAULT_REFRESH_EXPIRY_DAYS,
            )?,
        })
    }
}

/// Generate an HS256 access token for the given user.
///
/// `impersonator` is the admin id when an admin is acting as `user_id`.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    impersonator: Option<DbId>,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_token_expiry_mins * 60;

    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
        imp: impersonator,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature, expiration, and issued-at claims automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

/// Generate a cryptographically random refresh token.
///
/// Returns a tuple of `(plaintext_token, sha256_hex_hash)`. The plaintext is
/// sent to the client; only the hash should be persisted server-side.
pub fn generate_refresh_token() -> (String, String) {
    let plaintext = Uuid::new_v4().to_string();
    let hash = hash_refresh_token(&plaintext);
    (plaintext, hash)
}

/// Compute the SHA-256 hex digest of a refresh token.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = test_config();
        let token = generate_access_token(42, "seller", None, &config)
            .expect("token generation should succeed");

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "seller");
        assert_eq!(claims.imp, None);
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_impersonation_claim_round_trips() {
        let config = test_config();
        let token = generate_access_token(7, "buyer", Some(1), &config).unwrap();
        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.imp, Some(1));
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();

        // Well beyond the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "buyer".to_string(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
            imp: None,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_refresh_token_hash_matches() {
        let (plaintext, hash) = generate_refresh_token();
        assert_eq!(hash, hash_refresh_token(&plaintext));
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_a = test_config();
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            ..test_config()
        };

        let token = generate_access_token(1, "buyer", None, &config_a).unwrap();
        assert!(validate_token(&token, &config_b).is_err());
    }
}
