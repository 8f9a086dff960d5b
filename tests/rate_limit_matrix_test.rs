// Rate limit matrix resolution tests (pure configuration, no Redis)

use kino_auth_core::{BucketConfig, RateLimitMatrix, RoleBasedLimits};

fn roles(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_default_matrix_has_credential_classes() {
    let matrix = RateLimitMatrix::default();
    assert!(matrix.login.is_some());
    assert!(matrix.register.is_some());
    assert!(matrix.validate().is_ok());
}

#[test]
fn test_login_class_matches_strict_profile() {
    let matrix = RateLimitMatrix::default();
    let config = matrix.effective_config("login", &roles(&["guest"]));

    assert_eq!(config.capacity, 5);
    assert_eq!(config.leak_rate, 0.5);
}

#[test]
fn test_tier_priority_order() {
    let matrix = RateLimitMatrix::default();

    // superuser > premium > user > guest, checked highest-first
    let all_tiers = roles(&["guest", "user", "premium", "superuser"]);
    assert_eq!(matrix.effective_config("default", &all_tiers).capacity, 100);

    let no_super = roles(&["guest", "user", "premium"]);
    assert_eq!(matrix.effective_config("default", &no_super).capacity, 30);

    let plain = roles(&["guest", "user"]);
    assert_eq!(matrix.effective_config("default", &plain).capacity, 10);
}

#[test]
fn test_absent_class_falls_back_to_default_class() {
    let matrix = RateLimitMatrix {
        default: RoleBasedLimits {
            default: BucketConfig {
                capacity: 7,
                leak_rate: 0.7,
                ttl_seconds: 70,
            },
            guest: None,
            user: None,
            premium: None,
            superuser: None,
        },
        login: None,
        register: None,
    };

    let config = matrix.effective_config("login", &roles(&["user"]));
    assert_eq!(config.capacity, 7);

    let config = matrix.effective_config("anything-else", &roles(&[]));
    assert_eq!(config.capacity, 7);
}

#[test]
fn test_missing_tier_entry_falls_back_to_class_default() {
    let matrix = RateLimitMatrix::default();

    // The register class has no superuser entry; a superuser still gets the
    // class's flat default
    let register = matrix.effective_config("register", &roles(&["superuser"]));
    assert_eq!(register.capacity, 3);
}

#[test]
fn test_validation_rejects_degenerate_cells() {
    let mut matrix = RateLimitMatrix::default();
    matrix.default.default.leak_rate = 0.0;
    assert!(matrix.validate().is_err());

    let mut matrix = RateLimitMatrix::default();
    matrix.default.default.ttl_seconds = 0;
    assert!(matrix.validate().is_err());
}
