// Leaky-bucket admission control backed by Redis.
// The read-modify-write on a bucket is a single Lua script, so concurrent
// checks from multiple service replicas serialize on the key.

use redis::RedisError;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{BucketConfig, RateLimitMatrix};
use crate::db::RedisPool;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Redis connection error: {0}")]
    Redis(#[from] RedisError),

    #[error("Clock error: {0}")]
    Clock(String),
}

/// Outcome of one admission check
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Bucket level after this request was counted
    pub level: f64,
    pub capacity: u32,
}

// Bucket state lives in a hash {level, last_refill}. The level leaks
// continuously at leak_rate per second; each admitted request adds one.
// A denied request leaves the stored state untouched.
const LEAKY_BUCKET_SCRIPT: &str = r#"
    local key = KEYS[1]
    local now = tonumber(ARGV[1])
    local capacity = tonumber(ARGV[2])
    local leak_rate = tonumber(ARGV[3])
    local ttl = tonumber(ARGV[4])

    local state = redis.call('HMGET', key, 'level', 'last_refill')
    local level = tonumber(state[1]) or 0.0
    local last_refill = tonumber(state[2]) or now

    local leaked = (now - last_refill) * leak_rate
    level = math.max(0.0, level - leaked) + 1.0

    if level > capacity then
        return {0, tostring(level)}
    end

    redis.call('HSET', key, 'level', tostring(level), 'last_refill', tostring(now))
    redis.call('EXPIRE', key, ttl)
    return {1, tostring(level)}
"#;

/// Distributed rate limiting service
pub struct RateLimitService {
    redis_pool: RedisPool,
    matrix: RateLimitMatrix,
}

impl RateLimitService {
    pub fn new(redis_pool: RedisPool, matrix: RateLimitMatrix) -> Self {
        Self { redis_pool, matrix }
    }

    /// Resolve the bucket parameters for (class, roles) without touching Redis
    pub fn effective_config(&self, traffic_class: &str, roles: &[String]) -> &BucketConfig {
        self.matrix.effective_config(traffic_class, roles)
    }

    /// Admission check for one request on key (traffic_class, identifier).
    /// The identifier is the authenticated user id when a principal is
    /// present, else the client IP.
    pub async fn allow_request(
        &self,
        identifier: &str,
        roles: &[String],
        traffic_class: &str,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let config = self.matrix.effective_config(traffic_class, roles);
        let key = format!("rate_limit:{}:{}", traffic_class, identifier);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RateLimitError::Clock(e.to_string()))?
            .as_secs_f64();

        let mut conn = self.redis_pool.get_connection().await?;
        let (allowed, level): (i64, String) = redis::Script::new(LEAKY_BUCKET_SCRIPT)
            .key(&key)
            .arg(now)
            .arg(config.capacity)
            .arg(config.leak_rate)
            .arg(config.ttl_seconds)
            .invoke_async(&mut conn)
            .await?;
        self.redis_pool.return_connection(conn).await;

        let level: f64 = level.parse().unwrap_or(0.0);
        let allowed = allowed == 1;

        if allowed {
            debug!(
                key = %key,
                level = level,
                capacity = config.capacity,
                "Request admitted"
            );
        } else {
            warn!(
                key = %key,
                level = level,
                capacity = config.capacity,
                "Rate limit exceeded"
            );
        }

        Ok(RateLimitDecision {
            allowed,
            level,
            capacity: config.capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The Redis-side algorithm is exercised end to end against a live
    // instance; here we pin the pure pieces: config resolution and the
    // leak arithmetic the script encodes.

    fn leak_step(level: f64, elapsed: f64, leak_rate: f64) -> f64 {
        (level - elapsed * leak_rate).max(0.0) + 1.0
    }

    #[test]
    fn test_leak_arithmetic_admits_within_capacity() {
        let capacity = 5.0;
        let leak_rate = 0.5;
        let mut level = 0.0;

        // Six back-to-back requests within one second: five fit, the sixth
        // overflows the bucket
        let mut admitted = 0;
        for i in 0..6 {
            let candidate = leak_step(level, 0.15, leak_rate);
            if candidate <= capacity {
                admitted += 1;
                level = candidate;
            } else {
                assert_eq!(i, 5);
            }
        }
        assert_eq!(admitted, 5);
    }

    #[test]
    fn test_leak_arithmetic_drains_over_time() {
        let leak_rate = 0.5;
        // A full bucket at level 5 drains to 1 (the new request) after the
        // leak has had 10 seconds to run
        let level = leak_step(5.0, 10.0, leak_rate);
        assert_eq!(level, 1.0);
    }

    #[test]
    fn test_leak_never_goes_negative() {
        let level = leak_step(1.0, 3600.0, 2.0);
        assert_eq!(level, 1.0);
    }
}
