// Rate limiting configuration
// Two-level matrix: traffic class -> role tier -> bucket parameters

use serde::{Deserialize, Serialize};
use std::env;

/// Leaky bucket parameters for one (class, tier) cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Maximum bucket level before requests are rejected
    pub capacity: u32,

    /// Continuous leak rate in requests per second
    pub leak_rate: f64,

    /// TTL for the bucket key in Redis, equal to the class window
    pub ttl_seconds: u64,
}

/// Per-tier limits for one traffic class
/// Tiers are checked highest-first: superuser, premium, user, guest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleBasedLimits {
    pub default: BucketConfig,
    pub guest: Option<BucketConfig>,
    pub user: Option<BucketConfig>,
    pub premium: Option<BucketConfig>,
    pub superuser: Option<BucketConfig>,
}

impl RoleBasedLimits {
    fn flat(config: BucketConfig) -> Self {
        Self {
            default: config,
            guest: None,
            user: None,
            premium: None,
            superuser: None,
        }
    }

    /// Pick the cell for the caller's highest role tier, falling back to the
    /// class default
    pub fn for_roles(&self, roles: &[String]) -> &BucketConfig {
        let has = |tier: &str| roles.iter().any(|r| r == tier);

        if has("superuser") {
            if let Some(ref config) = self.superuser {
                return config;
            }
        }
        if has("premium") {
            if let Some(ref config) = self.premium {
                return config;
            }
        }
        if has("user") {
            if let Some(ref config) = self.user {
                return config;
            }
        }
        if has("guest") {
            if let Some(ref config) = self.guest {
                return config;
            }
        }

        &self.default
    }
}

/// Global rate limiting matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitMatrix {
    pub default: RoleBasedLimits,
    pub login: Option<RoleBasedLimits>,
    pub register: Option<RoleBasedLimits>,
}

impl Default for RateLimitMatrix {
    fn default() -> Self {
        let default = RoleBasedLimits {
            default: BucketConfig {
                capacity: 10,
                leak_rate: 1.0,
                ttl_seconds: 60,
            },
            guest: Some(BucketConfig {
                capacity: 5,
                leak_rate: 0.5,
                ttl_seconds: 60,
            }),
            user: Some(BucketConfig {
                capacity: 10,
                leak_rate: 1.0,
                ttl_seconds: 60,
            }),
            premium: Some(BucketConfig {
                capacity: 30,
                leak_rate: 3.0,
                ttl_seconds: 60,
            }),
            superuser: Some(BucketConfig {
                capacity: 100,
                leak_rate: 10.0,
                ttl_seconds: 60,
            }),
        };

        // Credential endpoints get strict flat limits regardless of tier
        let login = RoleBasedLimits::flat(BucketConfig {
            capacity: 5,
            leak_rate: 0.5,
            ttl_seconds: 60,
        });

        let register = RoleBasedLimits::flat(BucketConfig {
            capacity: 3,
            leak_rate: 0.1,
            ttl_seconds: 3600,
        });

        Self {
            default,
            login: Some(login),
            register: Some(register),
        }
    }
}

impl RateLimitMatrix {
    /// Load the matrix, applying environment overrides for the credential
    /// classes on top of the compiled-in defaults
    pub fn from_env() -> Self {
        let mut matrix = Self::default();

        if let Some(login) = matrix.login.as_mut() {
            apply_env_overrides("LOGIN", &mut login.default);
        }
        if let Some(register) = matrix.register.as_mut() {
            apply_env_overrides("REGISTER", &mut register.default);
        }
        apply_env_overrides("DEFAULT", &mut matrix.default.default);

        matrix
    }

    /// Resolve the effective bucket for (traffic class, caller roles)
    /// Unknown classes fall back to the top-level default class
    pub fn effective_config(&self, traffic_class: &str, roles: &[String]) -> &BucketConfig {
        let class_limits = match traffic_class {
            "login" => self.login.as_ref().unwrap_or(&self.default),
            "register" => self.register.as_ref().unwrap_or(&self.default),
            _ => &self.default,
        };

        class_limits.for_roles(roles)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let mut cells: Vec<(&str, &BucketConfig)> = vec![("default", &self.default.default)];
        for (name, limits) in [("login", &self.login), ("register", &self.register)] {
            if let Some(limits) = limits {
                cells.push((name, &limits.default));
            }
        }
        for limits in [&self.default.guest, &self.default.user, &self.default.premium, &self.default.superuser] {
            if let Some(config) = limits {
                cells.push(("default tier", config));
            }
        }

        for (name, config) in cells {
            if config.capacity == 0 {
                return Err(format!("{} capacity cannot be zero", name));
            }
            if config.leak_rate <= 0.0 {
                return Err(format!("{} leak_rate must be positive", name));
            }
            if config.ttl_seconds == 0 {
                return Err(format!("{} ttl_seconds cannot be zero", name));
            }
        }

        Ok(())
    }
}

fn apply_env_overrides(class: &str, config: &mut BucketConfig) {
    if let Ok(capacity) = env::var(format!("RATE_LIMIT_{}_CAPACITY", class)) {
        if let Ok(capacity) = capacity.parse() {
            config.capacity = capacity;
        }
    }
    if let Ok(rate) = env::var(format!("RATE_LIMIT_{}_LEAK_RATE", class)) {
        if let Ok(rate) = rate.parse() {
            config.leak_rate = rate;
        }
    }
    if let Ok(ttl) = env::var(format!("RATE_LIMIT_{}_TTL", class)) {
        if let Ok(ttl) = ttl.parse() {
            config.ttl_seconds = ttl;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_matrix_validates() {
        let matrix = RateLimitMatrix::default();
        assert!(matrix.validate().is_ok());
    }

    #[test]
    fn test_tier_priority_highest_first() {
        let matrix = RateLimitMatrix::default();

        // superuser outranks every other role the caller carries
        let config = matrix.effective_config("default", &roles(&["user", "superuser"]));
        assert_eq!(config.capacity, 100);

        let config = matrix.effective_config("default", &roles(&["user", "premium"]));
        assert_eq!(config.capacity, 30);

        let config = matrix.effective_config("default", &roles(&["user"]));
        assert_eq!(config.capacity, 10);

        let config = matrix.effective_config("default", &roles(&["guest"]));
        assert_eq!(config.capacity, 5);
    }

    #[test]
    fn test_class_without_tier_entry_falls_back_to_class_default() {
        let matrix = RateLimitMatrix::default();

        // login class has no per-tier entries, so even a superuser gets the
        // flat credential-endpoint limit
        let config = matrix.effective_config("login", &roles(&["superuser"]));
        assert_eq!(config.capacity, 5);
        assert_eq!(config.leak_rate, 0.5);
    }

    #[test]
    fn test_unknown_class_falls_back_to_default_class() {
        let matrix = RateLimitMatrix::default();

        let config = matrix.effective_config("export", &roles(&["user"]));
        assert_eq!(config.capacity, 10);
    }

    #[test]
    fn test_unknown_roles_use_class_default() {
        let matrix = RateLimitMatrix::default();

        let config = matrix.effective_config("default", &roles(&["editor"]));
        assert_eq!(config, &matrix.default.default);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut matrix = RateLimitMatrix::default();
        matrix.default.default.capacity = 0;
        assert!(matrix.validate().is_err());
    }
}
