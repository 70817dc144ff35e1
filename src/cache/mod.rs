pub mod memory;
pub mod redis;
pub mod traits;

use std::sync::Arc;
use tracing::error;

pub use memory::MokaDedupCache;
pub use redis::RedisDedupCache;
pub use traits::DedupCache;

use crate::config::CacheConfig;
use crate::errors::{AfftrackError, Result};

/// 根据配置创建 dedup cache 后端
pub async fn create_dedup_cache(config: &CacheConfig) -> Result<Arc<dyn DedupCache>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MokaDedupCache::new(config.ttl)) as Arc<dyn DedupCache>),
        "redis" => {
            let cache =
                RedisDedupCache::new(&config.redis_url, &config.redis_key_prefix, config.ttl)
                    .await?;
            Ok(Arc::new(cache) as Arc<dyn DedupCache>)
        }
        other => {
            error!("Unknown cache backend: {}", other);
            Err(AfftrackError::cache_connection(format!(
                "Unknown cache backend: {}. Supported: memory, redis",
                other
            )))
        }
    }
}
