use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::{KeyValueStorage, Result};

/// 基于 Redis 的持久化存储，记录不设置过期时间
pub struct RedisStorage {
    redis_client: Arc<RedisClient>,
}

impl RedisStorage {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self { redis_client }
    }
}

#[async_trait]
impl KeyValueStorage for RedisStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(key, value).await?;
        tracing::debug!(key = %key, "record persisted");
        Ok(())
    }

    async fn set_items(&self, items: Vec<(String, String)>) -> Result<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        // MULTI/EXEC 保证多条记录同时生效
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in &items {
            pipe.set(key, value).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        tracing::debug!(count = items.len(), "records persisted atomically");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
