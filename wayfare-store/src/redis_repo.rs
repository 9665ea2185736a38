use std::sync::Arc;

use async_trait::async_trait;
use redis::RedisResult;
use tracing::info;
use wayfare_core::repository::AttemptStore;
use wayfare_core::BookingAttempt;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn set_json(&self, key: &str, value: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
    }

    pub async fn get_json(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("GET").arg(key).query_async(&mut conn).await
    }

    /// Fixed-window counter. The window starts with the first request seen for `key`.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = rate_limit_pipeline(key, window_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

/// `INCR` and `EXPIRE ... NX` in one MULTI/EXEC. Only the first hit of a window sets the TTL.
fn rate_limit_pipeline(key: &str, window_seconds: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .cmd("EXPIRE").arg(key).arg(window_seconds).arg("NX").ignore();
    pipe
}

/// Attempt ledger stored as JSON strings under `booking-attempt:{key}`, expiring after `ttl_seconds`.
pub struct RedisAttemptStore {
    redis: Arc<RedisClient>,
    ttl_seconds: u64,
}

impl RedisAttemptStore {
    pub fn new(redis: Arc<RedisClient>, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}

fn attempt_key(key: &str) -> String {
    format!("booking-attempt:{}", key)
}

#[async_trait]
impl AttemptStore for RedisAttemptStore {
    async fn get_attempt(
        &self,
        key: &str,
    ) -> Result<Option<BookingAttempt>, Box<dyn std::error::Error + Send + Sync>> {
        match self.redis.get_json(&attempt_key(key)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save_attempt(
        &self,
        attempt: &BookingAttempt,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let raw = serde_json::to_string(attempt)?;
        self.redis.set_json(&attempt_key(&attempt.key), &raw, self.ttl_seconds).await?;
        info!("Booking attempt {} saved at stage {:?}", attempt.key, attempt.stage);
        Ok(())
    }
}
