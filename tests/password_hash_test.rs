// Password hashing behavior (bcrypt)

use kino_auth_core::utils::password::{hash_password_with_cost, verify_password};

// Minimum bcrypt cost keeps the suite fast; behavior is cost-independent
const TEST_COST: u32 = 4;

#[test]
fn test_roundtrip_accepts_original_rejects_other() {
    let password = "s3cret1";
    let hash = hash_password_with_cost(password, TEST_COST).expect("hash");

    assert!(verify_password(password, &hash));
    assert!(!verify_password("wrong1", &hash));
    assert!(!verify_password("s3cret1 ", &hash));
}

#[test]
fn test_salted_hashes_differ_but_both_verify() {
    let password = "correct horse battery staple";

    let first = hash_password_with_cost(password, TEST_COST).expect("hash");
    let second = hash_password_with_cost(password, TEST_COST).expect("hash");

    assert_ne!(first, second);
    assert!(verify_password(password, &first));
    assert!(verify_password(password, &second));
}

#[test]
fn test_malformed_stored_hash_reads_as_failed_check() {
    assert!(!verify_password("anything", "corrupted-row-contents"));
    assert!(!verify_password("anything", "$2b$not-actually-bcrypt"));
}

#[test]
fn test_unicode_passwords_roundtrip() {
    let password = "пароль-密码-🔐";
    let hash = hash_password_with_cost(password, TEST_COST).expect("hash");

    assert!(verify_password(password, &hash));
    assert!(!verify_password("пароль-密码", &hash));
}
