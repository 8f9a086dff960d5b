// User-role binding, composite primary key (user_id, role_id)

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::role::RoleError;
use crate::schema::user_roles;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = user_roles)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

impl UserRole {
    /// Check whether a binding already exists
    pub async fn exists(
        conn: &mut AsyncPgConnection,
        user: Uuid,
        role: Uuid,
    ) -> Result<bool, RoleError> {
        use crate::schema::user_roles::dsl::*;

        let found: Option<UserRole> = user_roles
            .filter(user_id.eq(user).and(role_id.eq(role)))
            .first::<UserRole>(conn)
            .await
            .optional()
            .map_err(RoleError::Database)?;

        Ok(found.is_some())
    }

    /// Insert a binding
    pub async fn insert(
        conn: &mut AsyncPgConnection,
        user: Uuid,
        role: Uuid,
    ) -> Result<(), RoleError> {
        use crate::schema::user_roles::dsl::*;

        diesel::insert_into(user_roles)
            .values(&UserRole {
                user_id: user,
                role_id: role,
            })
            .execute(conn)
            .await
            .map_err(RoleError::Database)?;

        Ok(())
    }

    /// Remove a binding; returns true when a row was removed
    pub async fn remove(
        conn: &mut AsyncPgConnection,
        user: Uuid,
        role: Uuid,
    ) -> Result<bool, RoleError> {
        use crate::schema::user_roles::dsl::*;

        let deleted = diesel::delete(user_roles.filter(user_id.eq(user).and(role_id.eq(role))))
            .execute(conn)
            .await
            .map_err(RoleError::Database)?;

        Ok(deleted > 0)
    }

    /// Permission arrays of every role bound to the user
    pub async fn permissions_for_user(
        conn: &mut AsyncPgConnection,
        user: Uuid,
    ) -> Result<Vec<Vec<String>>, RoleError> {
        use crate::schema::roles;
        use crate::schema::user_roles::dsl::*;

        user_roles
            .inner_join(roles::table)
            .filter(user_id.eq(user))
            .select(roles::permissions)
            .load::<Vec<String>>(conn)
            .await
            .map_err(RoleError::Database)
    }

    /// Names of every role bound to the user
    pub async fn role_names_for_user(
        conn: &mut AsyncPgConnection,
        user: Uuid,
    ) -> Result<Vec<String>, RoleError> {
        use crate::schema::roles;
        use crate::schema::user_roles::dsl::*;

        user_roles
            .inner_join(roles::table)
            .filter(user_id.eq(user))
            .select(roles::name)
            .load::<String>(conn)
            .await
            .map_err(RoleError::Database)
    }
}
