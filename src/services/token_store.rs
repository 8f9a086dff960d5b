// Fast-KV session state: per-user refresh session index, revoked-token
// deny-list, and the permission cache. All keys are TTL-backed so state
// expires with the tokens it tracks.

use redis::RedisError;
use thiserror::Error;
use uuid::Uuid;

use crate::db::RedisPool;

#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),
}

/// Key for the per-user set of active refresh JTIs
fn session_index_key(user_id: Uuid) -> String {
    format!("user_active_refresh_jtis:{}", user_id)
}

/// Key for a deny-listed token ID
fn denylist_key(jti: &str) -> String {
    format!("blacklist:{}", jti)
}

/// Key for a user's cached permission list
fn permissions_key(user_id: Uuid) -> String {
    format!("permissions:{}", user_id)
}

#[derive(Clone)]
pub struct TokenStore {
    redis_pool: RedisPool,
}

impl TokenStore {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    // ---- Session index ---------------------------------------------------

    /// Add a refresh JTI to the user's session index and push the set's TTL
    /// out to the full refresh lifetime
    pub async fn add_session_jti(
        &self,
        user_id: Uuid,
        jti: &str,
        ttl_seconds: u64,
    ) -> Result<(), TokenStoreError> {
        let key = session_index_key(user_id);
        self.redis_pool.sadd(&key, jti).await?;
        self.redis_pool.expire(&key, ttl_seconds as i64).await?;
        Ok(())
    }

    /// Remove a refresh JTI from the user's session index
    pub async fn remove_session_jti(&self, user_id: Uuid, jti: &str) -> Result<(), TokenStoreError> {
        self.redis_pool
            .srem(&session_index_key(user_id), jti)
            .await?;
        Ok(())
    }

    /// Whether the JTI is currently a member of the user's session index
    pub async fn is_active_session(&self, user_id: Uuid, jti: &str) -> Result<bool, TokenStoreError> {
        Ok(self
            .redis_pool
            .sismember(&session_index_key(user_id), jti)
            .await?)
    }

    /// All active refresh JTIs for the user
    pub async fn session_jtis(&self, user_id: Uuid) -> Result<Vec<String>, TokenStoreError> {
        Ok(self.redis_pool.smembers(&session_index_key(user_id)).await?)
    }

    /// Replace the session index with the singleton {jti}
    pub async fn replace_sessions(
        &self,
        user_id: Uuid,
        jti: &str,
        ttl_seconds: u64,
    ) -> Result<(), TokenStoreError> {
        let key = session_index_key(user_id);
        self.redis_pool.del(&key).await?;
        self.redis_pool.sadd(&key, jti).await?;
        self.redis_pool.expire(&key, ttl_seconds as i64).await?;
        Ok(())
    }

    // ---- Deny-list -------------------------------------------------------

    /// Deny-list a token ID until its natural expiry
    pub async fn deny(&self, jti: &str, ttl_seconds: u64) -> Result<(), TokenStoreError> {
        self.redis_pool
            .set_with_expiry(&denylist_key(jti), "1".to_string(), ttl_seconds)
            .await?;
        Ok(())
    }

    /// Whether a token ID has been revoked
    pub async fn is_denied(&self, jti: &str) -> Result<bool, TokenStoreError> {
        Ok(self.redis_pool.exists(&denylist_key(jti)).await?)
    }

    // ---- Permission cache ------------------------------------------------

    /// Cached permission list for a user, if present
    pub async fn cached_permissions(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Vec<String>>, TokenStoreError> {
        let raw = self.redis_pool.get(&permissions_key(user_id)).await?;
        Ok(raw.map(|joined| joined.split(',').map(str::to_string).collect()))
    }

    /// Write a user's resolved permissions through to the cache
    pub async fn cache_permissions(
        &self,
        user_id: Uuid,
        permissions: &[String],
        ttl_seconds: u64,
    ) -> Result<(), TokenStoreError> {
        self.redis_pool
            .set_with_expiry(&permissions_key(user_id), permissions.join(","), ttl_seconds)
            .await?;
        Ok(())
    }

    /// Drop a user's cached permissions; called on every role grant/revoke
    pub async fn invalidate_permissions(&self, user_id: Uuid) -> Result<(), TokenStoreError> {
        self.redis_pool.del(&permissions_key(user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        let user = Uuid::nil();
        assert_eq!(
            session_index_key(user),
            "user_active_refresh_jtis:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(denylist_key("abc"), "blacklist:abc");
        assert_eq!(
            permissions_key(user),
            "permissions:00000000-0000-0000-0000-000000000000"
        );
    }
}
