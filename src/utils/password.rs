// Password hashing and verification using bcrypt
// Per-hash salt is generated by the library; cost comes from configuration

use thiserror::Error;

/// Default bcrypt cost when configuration is not consulted
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Errors that can occur during password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingError(String),
}

/// Hash a password with the default cost
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_cost(password, DEFAULT_BCRYPT_COST)
}

/// Hash a password with an explicit cost factor
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(password, cost).map_err(|e| PasswordError::HashingError(e.to_string()))
}

/// Verify a password against a stored hash
///
/// Malformed stored hashes verify as false rather than erroring: a corrupt
/// row must read as a failed credential check, not a 500.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cost 4 is the bcrypt minimum; tests don't need the production factor
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify_password() {
        let password = "s3cret-passw0rd";

        let hash = hash_password_with_cost(password, TEST_COST).expect("Failed to hash");

        assert!(hash.starts_with("$2"));
        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "repeat-after-me";

        let hash1 = hash_password_with_cost(password, TEST_COST).expect("Failed to hash");
        let hash2 = hash_password_with_cost(password, TEST_COST).expect("Failed to hash");

        // Per-hash salt makes identical inputs produce distinct outputs
        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1));
        assert!(verify_password(password, &hash2));
    }

    #[test]
    fn test_malformed_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let result = hash_password_with_cost("pw", 99);
        assert!(matches!(result, Err(PasswordError::HashingError(_))));
    }
}
