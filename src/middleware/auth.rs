// Caller principal materialized from a validated bearer token

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::auth_errors::ApiError;

/// Authenticated principal injected into request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub login: String,
    pub mfa_verified: bool,
    pub is_superuser: bool,
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
}

impl CurrentUser {
    /// Permission guard: superusers and wildcard holders pass, everyone
    /// else needs the named permission. Composed explicitly per route.
    pub fn require_permission(&self, permission: &str) -> Result<(), ApiError> {
        if self.is_superuser || self.permissions.iter().any(|p| p == "*") {
            return Ok(());
        }

        if !self.permissions.iter().any(|p| p == permission) {
            tracing::warn!(
                user_id = %self.id,
                required_permission = %permission,
                "Permission denied"
            );
            return Err(ApiError::Forbidden(format!(
                "Not enough permissions. Required: {}",
                permission
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(is_superuser: bool, permissions: &[&str]) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            login: "alice".to_string(),
            mfa_verified: false,
            is_superuser,
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
            roles: vec!["user".to_string()],
        }
    }

    #[test]
    fn test_superuser_passes_any_permission() {
        let user = principal(true, &[]);
        assert!(user.require_permission("manage_roles").is_ok());
        assert!(user.require_permission("anything_at_all").is_ok());
    }

    #[test]
    fn test_wildcard_passes_any_permission() {
        let user = principal(false, &["*"]);
        assert!(user.require_permission("manage_roles").is_ok());
    }

    #[test]
    fn test_named_permission_required() {
        let user = principal(false, &["edit_content"]);
        assert!(user.require_permission("edit_content").is_ok());
        assert!(matches!(
            user.require_permission("manage_roles"),
            Err(ApiError::Forbidden(_))
        ));
    }
}
