// Token codec: HS256 JSON web tokens with distinct secrets per class.
// Access-token decode additionally consults the deny-list; refresh-token
// decode verifies signature and expiry only, leaving the session-index
// checks to the auth service.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::models::auth::{AccessTokenClaims, RefreshTokenClaims};
use crate::services::token_store::{TokenStore, TokenStoreError};

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Malformed token")]
    TokenMalformed,

    #[error("Bad token signature")]
    BadSignature,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("JWT encoding error: {0}")]
    EncodingError(String),

    #[error("Token store error: {0}")]
    Store(#[from] TokenStoreError),

    #[error("Clock error: {0}")]
    ClockError(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            ErrorKind::InvalidSignature => JwtError::BadSignature,
            _ => JwtError::TokenMalformed,
        }
    }
}

/// JWT configuration with separate keys for access and refresh tokens
#[derive(Clone)]
pub struct JwtConfig {
    /// Access token lifetime in seconds
    pub access_token_expiry: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: u64,
    pub algorithm: Algorithm,

    pub access_encoding_key: EncodingKey,
    pub access_decoding_key: DecodingKey,

    pub refresh_encoding_key: EncodingKey,
    pub refresh_decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("algorithm", &self.algorithm)
            .field("access_encoding_key", &"<redacted>")
            .field("access_decoding_key", &"<redacted>")
            .field("refresh_encoding_key", &"<redacted>")
            .field("refresh_decoding_key", &"<redacted>")
            .finish()
    }
}

impl JwtConfig {
    /// Build JWT config from provided parameters - shared by from_env and for_test
    pub fn build_from_params(
        access_secret: &str,
        refresh_secret: &str,
        access_expiry: u64,
        refresh_expiry: u64,
    ) -> Self {
        JwtConfig {
            access_token_expiry: access_expiry,
            refresh_token_expiry: refresh_expiry,
            algorithm: Algorithm::HS256,
            access_encoding_key: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }

    /// Create JWT config from centralized app configuration
    pub fn from_env() -> Self {
        let jwt = &crate::CONFIG.jwt;
        Self::build_from_params(
            &jwt.access_secret,
            &jwt.refresh_secret,
            jwt.access_expiry_seconds(),
            jwt.refresh_expiry_seconds(),
        )
    }
}

/// A freshly issued token with its identifier and expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: u64,
}

/// Token codec service
pub struct JwtService {
    config: JwtConfig,
    token_store: Option<TokenStore>,
}

impl JwtService {
    /// Create a codec without deny-list integration (tests, offline tools)
    pub fn new(config: JwtConfig) -> Self {
        Self {
            config,
            token_store: None,
        }
    }

    /// Create a codec wired to the deny-list
    pub fn new_with_store(config: JwtConfig, token_store: TokenStore) -> Self {
        Self {
            config,
            token_store: Some(token_store),
        }
    }

    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }

    /// Current Unix time in seconds
    pub fn now(&self) -> Result<u64, JwtError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| JwtError::ClockError(e.to_string()))
    }

    /// Issue an access token for a subject
    pub fn issue_access(
        &self,
        subject: Uuid,
        login: Option<&str>,
        mfa_verified: bool,
    ) -> Result<IssuedToken, JwtError> {
        let now = self.now()?;
        let jti = Uuid::new_v4().to_string();
        let expires_at = now + self.config.access_token_expiry;

        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            jti: jti.clone(),
            exp: expires_at,
            mfa_verified,
            login: login.map(str::to_string),
        };

        let token = encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.config.access_encoding_key,
        )
        .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Issue a refresh token for a subject
    pub fn issue_refresh(&self, subject: Uuid) -> Result<IssuedToken, JwtError> {
        let now = self.now()?;
        let jti = Uuid::new_v4().to_string();
        let expires_at = now + self.config.refresh_token_expiry;

        let claims = RefreshTokenClaims {
            sub: subject.to_string(),
            jti: jti.clone(),
            exp: expires_at,
        };

        let token = encode(
            &Header::new(self.config.algorithm),
            &claims,
            &self.config.refresh_encoding_key,
        )
        .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(self.config.algorithm);
        validation.validate_exp = validate_exp;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        if !validate_exp {
            validation.required_spec_claims.clear();
        }
        validation
    }

    /// Decode and validate an access token, rejecting deny-listed JTIs
    pub async fn decode_access(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        let data = decode::<AccessTokenClaims>(
            token,
            &self.config.access_decoding_key,
            &self.validation(true),
        )?;

        if let Some(store) = &self.token_store {
            if store.is_denied(&data.claims.jti).await? {
                return Err(JwtError::TokenRevoked);
            }
        }

        Ok(data.claims)
    }

    /// Decode and validate a refresh token (signature + expiry only)
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshTokenClaims, JwtError> {
        let data = decode::<RefreshTokenClaims>(
            token,
            &self.config.refresh_decoding_key,
            &self.validation(true),
        )?;

        Ok(data.claims)
    }

    /// Decode a refresh token tolerating expiry, so logout can still reach
    /// the JTI of an already-expired token
    pub fn decode_refresh_allow_expired(&self, token: &str) -> Result<RefreshTokenClaims, JwtError> {
        let data = decode::<RefreshTokenClaims>(
            token,
            &self.config.refresh_decoding_key,
            &self.validation(false),
        )?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig::build_from_params(
            "test-access-secret-hs256",
            "test-refresh-secret-hs256",
            900,
            604800,
        )
    }

    #[tokio::test]
    async fn test_access_token_roundtrip() {
        let service = JwtService::new(test_config());
        let subject = Uuid::new_v4();

        let issued = service
            .issue_access(subject, Some("alice"), false)
            .expect("Failed to issue access token");

        let claims = service
            .decode_access(&issued.token)
            .await
            .expect("Failed to decode access token");

        assert_eq!(claims.sub, subject.to_string());
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.login.as_deref(), Some("alice"));
        assert!(!claims.mfa_verified);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let service = JwtService::new(test_config());
        let subject = Uuid::new_v4();

        let issued = service
            .issue_refresh(subject)
            .expect("Failed to issue refresh token");

        let claims = service
            .decode_refresh(&issued.token)
            .expect("Failed to decode refresh token");

        assert_eq!(claims.sub, subject.to_string());
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[tokio::test]
    async fn test_access_token_rejected_under_refresh_secret() {
        let service = JwtService::new(test_config());

        let issued = service
            .issue_access(Uuid::new_v4(), None, false)
            .expect("Failed to issue access token");

        // Decoding an access token as a refresh token must fail: the two
        // classes use different secrets
        let result = service.decode_refresh(&issued.token);
        assert!(matches!(result, Err(JwtError::BadSignature)));
    }

    #[tokio::test]
    async fn test_malformed_token_rejected() {
        let service = JwtService::new(test_config());
        let result = service.decode_access("not.a.token").await;
        assert!(matches!(result, Err(JwtError::TokenMalformed)));
    }

    #[tokio::test]
    async fn test_expired_access_token_rejected() {
        let config = JwtConfig::build_from_params(
            "test-access-secret-hs256",
            "test-refresh-secret-hs256",
            1,
            604800,
        );
        let service = JwtService::new(config);

        let issued = service
            .issue_access(Uuid::new_v4(), None, false)
            .expect("Failed to issue access token");

        tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;

        let result = service.decode_access(&issued.token).await;
        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_expired_refresh_still_yields_jti_when_tolerated() {
        let service = JwtService::new(test_config());
        let now = service.now().expect("clock");

        let claims = RefreshTokenClaims {
            sub: Uuid::new_v4().to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-refresh-secret-hs256"),
        )
        .expect("encode");

        // Strict decode rejects it, the tolerant path recovers the JTI
        assert!(matches!(
            service.decode_refresh(&token),
            Err(JwtError::TokenExpired)
        ));

        let decoded = service
            .decode_refresh_allow_expired(&token)
            .expect("Tolerant decode should succeed");
        assert_eq!(decoded.jti, claims.jti);
    }

    #[test]
    fn test_distinct_jti_per_issue() {
        let service = JwtService::new(test_config());
        let subject = Uuid::new_v4();

        let first = service.issue_refresh(subject).expect("issue");
        let second = service.issue_refresh(subject).expect("issue");
        assert_ne!(first.jti, second.jti);
    }
}
