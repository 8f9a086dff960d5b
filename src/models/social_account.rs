// Federated identity link: (provider, provider_user_id) -> local user
// The OAuth redirect flow lives outside the core; only the linkage is stored

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::social_accounts;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = social_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SocialAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = social_accounts)]
pub struct NewSocialAccount {
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
}
