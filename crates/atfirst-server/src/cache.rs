//! Read-through feed cache keyed by repository and collection.

use std::sync::Arc;
use std::time::Duration;

use atfirst_renderer::ItemView;

use crate::config::Config;

/// Rendered views of one feed, shared between the cache and responses.
pub type Feed = Arc<[ItemView]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub did: String,
    pub collection: String,
}

impl FeedKey {
    pub fn new(did: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            collection: collection.into(),
        }
    }
}

/// Best-effort feed storage. Misses are normal and never an error.
pub trait FeedCache: Send + Sync {
    fn get(&self, key: &FeedKey) -> Option<Feed>;
    fn insert(&self, key: FeedKey, feed: Feed);
}

/// TTL cache backed by mini-moka.
#[derive(Clone)]
pub struct MokaCache {
    inner: mini_moka::sync::Cache<FeedKey, Feed>,
}

impl MokaCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: mini_moka::sync::Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

impl FeedCache for MokaCache {
    fn get(&self, key: &FeedKey) -> Option<Feed> {
        self.inner.get(key)
    }

    fn insert(&self, key: FeedKey, feed: Feed) {
        self.inner.insert(key, feed);
    }
}

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl FeedCache for NoopCache {
    fn get(&self, _key: &FeedKey) -> Option<Feed> {
        None
    }

    fn insert(&self, _key: FeedKey, _feed: Feed) {}
}

pub fn from_config(config: &Config) -> Arc<dyn FeedCache> {
    match config.cache_ttl() {
        Some(ttl) => Arc::new(MokaCache::new(config.cache_capacity, ttl)),
        None => Arc::new(NoopCache),
    }
}
