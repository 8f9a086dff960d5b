// Role and permission service: role CRUD, user-role bindings, and effective
// permission resolution with a short-TTL Redis cache.
//
// Every binding mutation invalidates the affected user's cache entry before
// the call returns; a failed invalidation fails the operation.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::{NewRole, Role, RoleChangeset, RoleError, User, UserError, UserRole};
use crate::services::token_store::{TokenStore, TokenStoreError};

#[derive(thiserror::Error, Debug)]
pub enum RoleServiceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Token store error: {0}")]
    Store(#[from] TokenStoreError),

    #[error("Role with name '{0}' already exists.")]
    NameTaken(String),

    #[error("Role not found")]
    RoleNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("User or Role not found, or role already assigned")]
    AssignmentRejected,

    #[error("User-Role assignment not found")]
    BindingNotFound,
}

impl From<RoleError> for RoleServiceError {
    fn from(e: RoleError) -> Self {
        match e {
            RoleError::NotFound => RoleServiceError::RoleNotFound,
            RoleError::Database(e) => RoleServiceError::Database(e.to_string()),
        }
    }
}

impl From<UserError> for RoleServiceError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound => RoleServiceError::UserNotFound,
            UserError::Database(e) => RoleServiceError::Database(e.to_string()),
        }
    }
}

pub struct RoleService {
    db_pool: DieselPool,
    token_store: TokenStore,
    cache_ttl: u64,
}

impl RoleService {
    pub fn new(db_pool: DieselPool, token_store: TokenStore, cache_ttl: u64) -> Self {
        Self {
            db_pool,
            token_store,
            cache_ttl,
        }
    }

    async fn conn(
        &self,
    ) -> Result<
        bb8::PooledConnection<
            '_,
            diesel_async::pooled_connection::AsyncDieselConnectionManager<
                diesel_async::AsyncPgConnection,
            >,
        >,
        RoleServiceError,
    > {
        self.db_pool
            .get()
            .await
            .map_err(|e| RoleServiceError::Pool(e.to_string()))
    }

    /// Create a role; the unique name is checked first so the caller gets a
    /// clean conflict instead of a constraint violation
    pub async fn create_role(&self, new_role: NewRole) -> Result<Role, RoleServiceError> {
        let mut conn = self.conn().await?;

        if Role::find_by_name(&mut conn, &new_role.name).await?.is_some() {
            warn!(role_name = %new_role.name, "Role name already exists");
            return Err(RoleServiceError::NameTaken(new_role.name));
        }

        let role = Role::create(&mut conn, new_role).await?;
        info!(role_id = %role.id, role_name = %role.name, "Role created");
        Ok(role)
    }

    pub async fn get_all_roles(&self) -> Result<Vec<Role>, RoleServiceError> {
        let mut conn = self.conn().await?;
        let roles = Role::all(&mut conn).await?;
        debug!(count = roles.len(), "Listed all roles");
        Ok(roles)
    }

    pub async fn get_role_by_id(&self, role_id: Uuid) -> Result<Role, RoleServiceError> {
        let mut conn = self.conn().await?;
        Ok(Role::find_by_id(&mut conn, role_id).await?)
    }

    /// Partial update; renaming re-checks uniqueness
    pub async fn update_role(
        &self,
        role_id: Uuid,
        changes: RoleChangeset,
    ) -> Result<Role, RoleServiceError> {
        let mut conn = self.conn().await?;

        let role = Role::find_by_id(&mut conn, role_id).await?;

        if changes.name.is_none() && changes.description.is_none() && changes.permissions.is_none()
        {
            return Ok(role);
        }

        if let Some(ref new_name) = changes.name {
            if *new_name != role.name
                && Role::find_by_name(&mut conn, new_name).await?.is_some()
            {
                warn!(role_id = %role_id, new_name = %new_name, "Role rename to taken name");
                return Err(RoleServiceError::NameTaken(new_name.clone()));
            }
        }

        let role = Role::update(&mut conn, role_id, changes).await?;
        info!(role_id = %role.id, "Role updated");
        Ok(role)
    }

    /// Delete a role; bindings cascade at the storage layer
    pub async fn delete_role(&self, role_id: Uuid) -> Result<bool, RoleServiceError> {
        let mut conn = self.conn().await?;
        let deleted = Role::delete(&mut conn, role_id).await?;
        if deleted {
            info!(role_id = %role_id, "Role deleted");
        } else {
            warn!(role_id = %role_id, "Role not found for deletion");
        }
        Ok(deleted)
    }

    /// Bind a role to a user. Rejected when either endpoint is missing or
    /// the binding already exists.
    pub async fn assign_role_to_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), RoleServiceError> {
        let mut conn = self.conn().await?;

        let user_exists = User::find_by_id(&mut conn, user_id).await.is_ok();
        let role_exists = Role::find_by_id(&mut conn, role_id).await.is_ok();
        if !user_exists || !role_exists {
            warn!(user_id = %user_id, role_id = %role_id, "User or role missing for assignment");
            return Err(RoleServiceError::AssignmentRejected);
        }

        if UserRole::exists(&mut conn, user_id, role_id).await? {
            warn!(user_id = %user_id, role_id = %role_id, "Role already assigned");
            return Err(RoleServiceError::AssignmentRejected);
        }

        UserRole::insert(&mut conn, user_id, role_id).await?;

        // Invalidation is part of the mutation: if the cache entry cannot be
        // dropped, the grant is not acknowledged
        self.token_store.invalidate_permissions(user_id).await?;

        info!(user_id = %user_id, role_id = %role_id, "Role assigned to user");
        Ok(())
    }

    /// Remove a binding; the reverse of assign
    pub async fn revoke_role_from_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), RoleServiceError> {
        let mut conn = self.conn().await?;

        if !UserRole::remove(&mut conn, user_id, role_id).await? {
            warn!(user_id = %user_id, role_id = %role_id, "Binding not found for revocation");
            return Err(RoleServiceError::BindingNotFound);
        }

        self.token_store.invalidate_permissions(user_id).await?;

        info!(user_id = %user_id, role_id = %role_id, "Role revoked from user");
        Ok(())
    }

    /// Direct (uncached) union of the user's role permissions. May be empty.
    pub async fn get_user_permissions(&self, user_id: Uuid) -> Result<Vec<String>, RoleServiceError> {
        let mut conn = self.conn().await?;

        let permission_sets = UserRole::permissions_for_user(&mut conn, user_id).await?;
        let union: BTreeSet<String> = permission_sets.into_iter().flatten().collect();

        let permissions: Vec<String> = union.into_iter().collect();
        debug!(user_id = %user_id, permissions = ?permissions, "Resolved user permissions");
        Ok(permissions)
    }

    /// Effective permissions for the authenticator: cache read first, miss
    /// falls through to the relational store and writes back with a short
    /// TTL. Superusers short-circuit to the wildcard; a non-superuser with
    /// no permissions defaults to view_content.
    pub async fn cached_permissions(&self, user: &User) -> Result<Vec<String>, RoleServiceError> {
        match self.token_store.cached_permissions(user.id).await {
            Ok(Some(permissions)) => {
                debug!(user_id = %user.id, "Permissions served from cache");
                return Ok(permissions);
            }
            Ok(None) => {}
            Err(e) => {
                // Cache miss semantics on a degraded cache: resolve from the
                // relational store instead of failing the request
                warn!(user_id = %user.id, error = %e, "Permission cache unavailable");
            }
        }

        let permissions = if user.is_superuser {
            vec!["*".to_string()]
        } else {
            let resolved = self.get_user_permissions(user.id).await?;
            if resolved.is_empty() {
                vec!["view_content".to_string()]
            } else {
                resolved
            }
        };

        if let Err(e) = self
            .token_store
            .cache_permissions(user.id, &permissions, self.cache_ttl)
            .await
        {
            warn!(user_id = %user.id, error = %e, "Failed to write permission cache");
        }

        Ok(permissions)
    }

    /// Role names for the rate-limit tier lookup. Superusers additionally
    /// carry "superuser"; users with no bindings carry "user".
    pub async fn get_user_roles(&self, user: &User) -> Result<Vec<String>, RoleServiceError> {
        let mut conn = self.conn().await?;

        let mut names = UserRole::role_names_for_user(&mut conn, user.id).await?;
        if user.is_superuser {
            names.push("superuser".to_string());
        }
        if names.is_empty() {
            names.push("user".to_string());
        }
        Ok(names)
    }
}
