// Role database model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::roles;

/// Role model: a named bundle of permission strings
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// New role for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = roles)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
}

/// Partial role update
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = roles)]
pub struct RoleChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// Errors for role operations
#[derive(thiserror::Error, Debug)]
pub enum RoleError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Role not found")]
    NotFound,
}

impl Role {
    /// Find role by ID
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        role_id: Uuid,
    ) -> Result<Self, RoleError> {
        use crate::schema::roles::dsl::*;

        roles
            .filter(id.eq(role_id))
            .first::<Role>(conn)
            .await
            .map_err(not_found)
    }

    /// Find role by unique name
    pub async fn find_by_name(
        conn: &mut AsyncPgConnection,
        name_str: &str,
    ) -> Result<Option<Self>, RoleError> {
        use crate::schema::roles::dsl::*;

        roles
            .filter(name.eq(name_str))
            .first::<Role>(conn)
            .await
            .optional()
            .map_err(RoleError::Database)
    }

    /// List all roles
    pub async fn all(conn: &mut AsyncPgConnection) -> Result<Vec<Self>, RoleError> {
        use crate::schema::roles::dsl::*;

        roles
            .order(name.asc())
            .load::<Role>(conn)
            .await
            .map_err(RoleError::Database)
    }

    /// Create a new role
    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_role: NewRole,
    ) -> Result<Self, RoleError> {
        use crate::schema::roles::dsl::*;

        diesel::insert_into(roles)
            .values(&new_role)
            .get_result::<Role>(conn)
            .await
            .map_err(RoleError::Database)
    }

    /// Apply a partial update
    pub async fn update(
        conn: &mut AsyncPgConnection,
        role_id: Uuid,
        changes: RoleChangeset,
    ) -> Result<Self, RoleError> {
        use crate::schema::roles::dsl::*;

        diesel::update(roles.filter(id.eq(role_id)))
            .set(&changes)
            .get_result::<Role>(conn)
            .await
            .map_err(not_found)
    }

    /// Delete a role; bindings cascade at the storage layer
    /// Returns true when a row was removed
    pub async fn delete(conn: &mut AsyncPgConnection, role_id: Uuid) -> Result<bool, RoleError> {
        use crate::schema::roles::dsl::*;

        let deleted = diesel::delete(roles.filter(id.eq(role_id)))
            .execute(conn)
            .await
            .map_err(RoleError::Database)?;

        Ok(deleted > 0)
    }
}

fn not_found(e: diesel::result::Error) -> RoleError {
    match e {
        diesel::result::Error::NotFound => RoleError::NotFound,
        _ => RoleError::Database(e),
    }
}
