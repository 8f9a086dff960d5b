// User database model

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::users;

/// User model - queryable from database
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// New user for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub is_superuser: bool,
}

/// Partial user update
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserUpdate {
    pub login: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Errors for user operations
#[derive(thiserror::Error, Debug)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("User not found")]
    NotFound,
}

impl User {
    /// Find user by ID
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        users
            .filter(id.eq(user_id))
            .first::<User>(conn)
            .await
            .map_err(not_found)
    }

    /// Find user by login (case-sensitive: logins are stored verbatim)
    pub async fn find_by_login(
        conn: &mut AsyncPgConnection,
        login_str: &str,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        users
            .filter(login.eq(login_str))
            .first::<User>(conn)
            .await
            .map_err(not_found)
    }

    /// Single lookup over login and (optionally) email, used by registration
    /// to report per-field conflicts without a second round trip
    pub async fn find_by_login_or_email(
        conn: &mut AsyncPgConnection,
        login_str: &str,
        email_str: Option<&str>,
    ) -> Result<Option<Self>, UserError> {
        use crate::schema::users::dsl::*;

        let query = match email_str {
            Some(email_val) => users
                .filter(login.eq(login_str))
                .or_filter(email.eq(email_val))
                .into_boxed(),
            None => users.filter(login.eq(login_str)).into_boxed(),
        };

        query
            .first::<User>(conn)
            .await
            .optional()
            .map_err(UserError::Database)
    }

    /// Create a new user
    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_user: NewUser,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        diesel::insert_into(users)
            .values(&new_user)
            .get_result::<User>(conn)
            .await
            .map_err(UserError::Database)
    }

    /// Apply a partial update
    pub async fn update(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        mut update: UserUpdate,
    ) -> Result<Self, UserError> {
        use crate::schema::users::dsl::*;

        update.updated_at = Some(Utc::now());

        diesel::update(users.filter(id.eq(user_id)))
            .set(&update)
            .get_result::<User>(conn)
            .await
            .map_err(not_found)
    }
}

fn not_found(e: diesel::result::Error) -> UserError {
    match e {
        diesel::result::Error::NotFound => UserError::NotFound,
        _ => UserError::Database(e),
    }
}
