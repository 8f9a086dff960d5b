// Append-only login audit log
// The table is range-partitioned by login_at; the PK is (login_at, id) so
// the partition key is covered

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserError;
use crate::schema::login_history;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = login_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LoginHistoryEntry {
    pub login_at: DateTime<Utc>,
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = login_history)]
pub struct NewLoginHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewLoginHistoryEntry {
    pub fn new(user_id: Uuid, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            ip_address,
            user_agent,
        }
    }
}

impl LoginHistoryEntry {
    /// Append an entry; login_at is stamped by the database
    pub async fn insert(
        conn: &mut AsyncPgConnection,
        entry: NewLoginHistoryEntry,
    ) -> Result<Self, UserError> {
        use crate::schema::login_history::dsl::*;

        diesel::insert_into(login_history)
            .values(&entry)
            .get_result::<LoginHistoryEntry>(conn)
            .await
            .map_err(UserError::Database)
    }

    /// Most recent entries for a user, newest first
    pub async fn recent_for_user(
        conn: &mut AsyncPgConnection,
        user: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, UserError> {
        use crate::schema::login_history::dsl::*;

        login_history
            .filter(user_id.eq(user))
            .order(login_at.desc())
            .limit(limit)
            .offset(offset)
            .load::<LoginHistoryEntry>(conn)
            .await
            .map_err(UserError::Database)
    }
}
