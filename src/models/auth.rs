// Token claim structures
// Access and refresh tokens carry distinct claim sets and are signed with
// distinct secrets

use serde::{Deserialize, Serialize};

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// User ID (subject)
    pub sub: String,

    /// Unique token ID, the unit of revocation
    pub jti: String,

    /// Expires at timestamp (Unix epoch seconds)
    pub exp: u64,

    /// Whether a second factor was verified for this session
    pub mfa_verified: bool,

    /// Caller-supplied claim: the user's login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}

/// Refresh token claims: the minimum needed for rotation and revocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshTokenClaims {
    /// User ID (subject)
    pub sub: String,

    /// Unique token ID, the unit of revocation
    pub jti: String,

    /// Expires at timestamp (Unix epoch seconds)
    pub exp: u64,
}

impl RefreshTokenClaims {
    /// Remaining lifetime in seconds, clamped to at least 1 so deny-list
    /// entries for already-expired tokens still land
    pub fn remaining_ttl(&self, now: u64) -> u64 {
        self.exp.saturating_sub(now).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_access_claims_roundtrip() {
        let claims = AccessTokenClaims {
            sub: Uuid::new_v4().to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: 1750000000,
            mfa_verified: false,
            login: Some("alice".to_string()),
        };

        let json = serde_json::to_string(&claims).expect("Should serialize");
        let decoded: AccessTokenClaims = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(claims, decoded);
    }

    #[test]
    fn test_access_claims_login_omitted_when_absent() {
        let claims = AccessTokenClaims {
            sub: "u".to_string(),
            jti: "j".to_string(),
            exp: 0,
            mfa_verified: true,
            login: None,
        };

        let value = serde_json::to_value(&claims).expect("Should serialize");
        let obj = value.as_object().expect("Should be object");
        assert!(!obj.contains_key("login"));
        assert_eq!(obj.len(), 4);
    }

    #[test]
    fn test_refresh_claims_remaining_ttl() {
        let claims = RefreshTokenClaims {
            sub: "u".to_string(),
            jti: "j".to_string(),
            exp: 1000,
        };

        assert_eq!(claims.remaining_ttl(400), 600);
        // An expired token still gets a minimum 1s deny-list TTL
        assert_eq!(claims.remaining_ttl(1000), 1);
        assert_eq!(claims.remaining_ttl(5000), 1);
    }
}
