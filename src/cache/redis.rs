use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::debug;

use crate::cache::DedupCache;
use crate::errors::{AfftrackError, Result};

/// Redis-backed dedup cache.
///
/// `SET NX EX` is the atomic insert-if-absent primitive; the reply tells
/// us whether this call was the first writer.
pub struct RedisDedupCache {
    manager: ConnectionManager,
    key_prefix: String,
    ttl_secs: u64,
}

impl RedisDedupCache {
    pub async fn new(redis_url: &str, key_prefix: &str, ttl_secs: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AfftrackError::cache_connection(format!("Redis URL 无效: {}", e)))?;

        // ConnectionManager 自带断线重连
        let manager = ConnectionManager::new(client).await.map_err(|e| {
            AfftrackError::cache_connection(format!("无法连接到 Redis: {}", e))
        })?;

        debug!("Redis dedup cache connected, prefix: {}", key_prefix);

        Ok(Self {
            manager,
            key_prefix: key_prefix.to_string(),
            ttl_secs,
        })
    }

    fn key(&self, hash: &str) -> String {
        format!("{}{}", self.key_prefix, hash)
    }
}

#[async_trait]
impl DedupCache for RedisDedupCache {
    async fn insert_if_absent(&self, hash: &str, url: &str) -> Result<bool> {
        let mut conn = self.manager.clone();

        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(hash))
            .arg(url)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await?;

        // NX: nil 回复表示键已存在
        Ok(reply.is_some())
    }

    async fn get(&self, hash: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(self.key(hash)).await?;
        Ok(value)
    }
}
