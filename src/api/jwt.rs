use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Global cached JwtService instance
static JWT_SERVICE: OnceLock<JwtService> = OnceLock::new();

/// Get the cached JwtService instance
///
/// Uses OnceLock for thread-safe lazy initialization.
pub fn get_jwt_service() -> &'static JwtService {
    JWT_SERVICE.get_or_init(JwtService::from_config)
}

/// Advertiser API token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct AdvertiserClaims {
    /// Advertiser id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

/// One-time auto-login token claims, consumed by the trading platform
#[derive(Debug, Serialize, Deserialize)]
pub struct AutoLoginClaims {
    /// Broker customer id
    pub sub: String,
    pub provider_ref: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

/// JWT Service for generating and validating tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: u64,
    autologin_token_minutes: u64,
}

impl JwtService {
    pub fn new(secret: &str, access_token_minutes: u64, autologin_token_minutes: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
            autologin_token_minutes,
        }
    }

    /// Create JwtService from config
    pub fn from_config() -> Self {
        let config = crate::config::get_config();

        // 获取 JWT secret，如果为空则生成一个安全的随机值
        let jwt_secret = if config.api.jwt_secret.is_empty() {
            use tracing::warn;
            warn!("JWT secret not configured or empty, generating secure random token");
            crate::utils::generate_secure_token(32)
        } else {
            config.api.jwt_secret.clone()
        };

        Self::new(
            &jwt_secret,
            config.api.access_token_minutes,
            config.autologin.token_minutes,
        )
    }

    /// Generate an advertiser API token
    pub fn generate_advertiser_token(
        &self,
        advertiser_id: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = AdvertiserClaims {
            sub: advertiser_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.access_token_minutes as i64)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: "advertiser".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Validate an advertiser token, returning the advertiser id
    pub fn validate_advertiser_token(
        &self,
        token: &str,
    ) -> Result<i64, jsonwebtoken::errors::Error> {
        let data = decode::<AdvertiserClaims>(token, &self.decoding_key, &Validation::default())?;

        if data.claims.token_type != "advertiser" {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| jsonwebtoken::errors::ErrorKind::InvalidSubject.into())
    }

    /// Generate a short-lived one-time auto-login token for a registration
    pub fn generate_auto_login_token(
        &self,
        customer_id: &str,
        provider_ref: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = AutoLoginClaims {
            sub: customer_id.to_string(),
            provider_ref: provider_ref.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.autologin_token_minutes as i64)).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: "autologin".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }
}
