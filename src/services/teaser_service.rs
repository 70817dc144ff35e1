//! Teaser ingestion dedup

use std::sync::Arc;

use tracing::debug;

use crate::cache::DedupCache;
use crate::errors::{AfftrackError, Result};
use crate::utils::content_hash;

/// Content-hash dedup over the teaser catalog.
///
/// `ensure` is a single atomic insert-if-absent on the cache, so two
/// concurrent ingests of the same URL agree on one entry.
pub struct TeaserService {
    cache: Arc<dyn DedupCache>,
}

impl TeaserService {
    pub fn new(cache: Arc<dyn DedupCache>) -> Self {
        Self { cache }
    }

    /// Hash the URL and store it under that hash if no entry exists yet.
    /// Returns the hash either way.
    pub async fn ensure(&self, url: &str) -> Result<String> {
        let hash = content_hash(url);

        let created = self.cache.insert_if_absent(&hash, url).await?;
        if created {
            debug!("Teaser cached: {} -> {}", hash, url);
        }

        Ok(hash)
    }

    /// Annotate a batch of teaser records with their content hash.
    ///
    /// Each record must carry a `url` field; everything else passes
    /// through untouched.
    pub async fn ingest(
        &self,
        mut teasers: Vec<serde_json::Value>,
    ) -> Result<Vec<serde_json::Value>> {
        for teaser in teasers.iter_mut() {
            let url = teaser
                .get("url")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    AfftrackError::validation("teaser record is missing a 'url' field".to_string())
                })?
                .to_string();

            let hash = self.ensure(&url).await?;

            if let Some(object) = teaser.as_object_mut() {
                object.insert("hash".to_string(), serde_json::Value::String(hash));
            }
        }

        Ok(teasers)
    }
}
