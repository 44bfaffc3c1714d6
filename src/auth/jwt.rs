//! Bearer-token issue and validation.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a UUID string.
    pub sub: String,
    /// `"user"` or `"admin"`, baked in at issue time.
    pub role: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issue time, seconds since the epoch.
    pub iat: i64,
}

impl Claims {
    fn new(user_id: Uuid, role: &str, ttl_secs: u64) -> Self {
        let issued_at = Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let expires_at = issued_at + ttl_secs as i64;
        Self {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: expires_at,
            iat: issued_at,
        }
    }
}

/// Issue an access token for the given account.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn generate_token(user_id: Uuid, role: &str, config: &Config) -> anyhow::Result<String> {
    let claims = Claims::new(user_id, role, config.jwt_expiration_secs);
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("token encoding failed: {e}"))
}

/// Check a token's signature and expiry, returning its claims.
///
/// # Errors
///
/// Returns an error for a forged, malformed or expired token.
pub fn validate_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| anyhow::anyhow!("token rejected: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_expiration_secs: 900,
            upload_dir: "test_uploads".to_string(),
            placeholder_image: "https://picsum.photos/400/225".to_string(),
            frontend_url: "http://localhost:3001".to_string(),
        }
    }

    #[test]
    fn token_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = generate_token(user_id, "user", &config).unwrap();
        let claims = validate_token(&token, &config.jwt_secret).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "user");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = generate_token(Uuid::new_v4(), "user", &config).unwrap();
        assert!(validate_token(&token, "another-secret").is_err());
    }
}
