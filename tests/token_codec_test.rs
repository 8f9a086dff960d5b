// Token codec tests without database or Redis dependencies

use kino_auth_core::{JwtConfig, JwtError, JwtService};
use uuid::Uuid;

/// Helper to create a test JWT config without relying on environment
fn create_test_jwt_config() -> JwtConfig {
    JwtConfig::build_from_params(
        "test-access-secret-minimum-16-bytes",
        "test-refresh-secret-minimum-16-bytes",
        900,    // 15 minutes
        604800, // 7 days
    )
}

#[tokio::test]
async fn test_access_token_roundtrip_carries_claims() {
    let service = JwtService::new(create_test_jwt_config());
    let subject = Uuid::new_v4();

    let issued = service
        .issue_access(subject, Some("alice"), true)
        .expect("Failed to issue access token");

    let claims = service
        .decode_access(&issued.token)
        .await
        .expect("Failed to decode access token");

    assert_eq!(claims.sub, subject.to_string());
    assert_eq!(claims.jti, issued.jti);
    assert_eq!(claims.exp, issued.expires_at);
    assert_eq!(claims.login.as_deref(), Some("alice"));
    assert!(claims.mfa_verified);
}

#[test]
fn test_refresh_token_roundtrip() {
    let service = JwtService::new(create_test_jwt_config());
    let subject = Uuid::new_v4();

    let issued = service
        .issue_refresh(subject)
        .expect("Failed to issue refresh token");

    let claims = service
        .decode_refresh(&issued.token)
        .expect("Failed to decode refresh token");

    assert_eq!(claims.sub, subject.to_string());
    assert_eq!(claims.jti, issued.jti);
}

#[tokio::test]
async fn test_token_classes_use_distinct_secrets() {
    let service = JwtService::new(create_test_jwt_config());
    let subject = Uuid::new_v4();

    let access = service
        .issue_access(subject, None, false)
        .expect("Failed to issue access token");
    let refresh = service
        .issue_refresh(subject)
        .expect("Failed to issue refresh token");

    // Crossing the classes must fail signature validation
    assert!(matches!(
        service.decode_refresh(&access.token),
        Err(JwtError::BadSignature)
    ));
    assert!(matches!(
        service.decode_access(&refresh.token).await,
        Err(JwtError::BadSignature)
    ));
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let service = JwtService::new(create_test_jwt_config());

    let issued = service
        .issue_access(Uuid::new_v4(), None, false)
        .expect("Failed to issue access token");

    // Flip a character in the signature segment
    let mut tampered = issued.token.clone();
    let last = tampered.pop().expect("token is not empty");
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let result = service.decode_access(&tampered).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_garbage_token_is_malformed() {
    let service = JwtService::new(create_test_jwt_config());

    let result = service.decode_access("garbage").await;
    assert!(matches!(result, Err(JwtError::TokenMalformed)));
}

#[tokio::test]
async fn test_expired_access_token_rejected() {
    let config = JwtConfig::build_from_params(
        "test-access-secret-minimum-16-bytes",
        "test-refresh-secret-minimum-16-bytes",
        1, // 1 second expiry
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
fn test_every_issue_gets_a_fresh_jti() {
    let service = JwtService::new(create_test_jwt_config());
    let subject = Uuid::new_v4();

    let first = service.issue_access(subject, None, false).expect("issue");
    let second = service.issue_access(subject, None, false).expect("issue");
    let third = service.issue_refresh(subject).expect("issue");

    assert_ne!(first.jti, second.jti);
    assert_ne!(first.jti, third.jti);
    assert_ne!(second.jti, third.jti);
}
