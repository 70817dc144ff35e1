use async_trait::async_trait;

use crate::errors::Result;

/// Content-hash keyed dedup cache for teaser ingestion.
///
/// First writer wins: an existing entry is never overwritten. The
/// insert must be atomic — no check-then-put.
#[async_trait]
pub trait DedupCache: Send + Sync {
    /// Store `url` under `hash` if no entry exists yet.
    /// Returns `true` when this call created the entry.
    async fn insert_if_absent(&self, hash: &str, url: &str) -> Result<bool>;

    /// Canonical URL stored for `hash`, if any
    async fn get(&self, hash: &str) -> Result<Option<String>>;
}
