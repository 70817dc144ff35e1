use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use crate::cache::DedupCache;
use crate::errors::Result;

/// In-process dedup cache backed by moka.
///
/// The entry API makes insert-if-absent a single atomic step, so two
/// concurrent `ensure` calls for the same hash agree on one writer.
pub struct MokaDedupCache {
    inner: Cache<String, String>,
}

impl MokaDedupCache {
    pub fn new(ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(100_000)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self { inner }
    }
}

#[async_trait]
impl DedupCache for MokaDedupCache {
    async fn insert_if_absent(&self, hash: &str, url: &str) -> Result<bool> {
        let entry = self
            .inner
            .entry_by_ref(hash)
            .or_insert_with(async { url.to_string() })
            .await;
        Ok(entry.is_fresh())
    }

    async fn get(&self, hash: &str) -> Result<Option<String>> {
        Ok(self.inner.get(hash).await)
    }
}
