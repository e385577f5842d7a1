//! Entity cache: per-kind map of id → detached entity snapshot.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::RwLock;

use lru::LruCache;
use uuid::Uuid;

use crate::domain::{Kind, RawEntity};

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::entity";

/// In-memory cache of individually addressed entities.
///
/// One LRU shard per kind, bounded by `entity_limit`. Eviction is a capacity
/// concern only; correctness comes from the explicit invalidation the DAO
/// performs before every write.
pub struct EntityCache {
    shards: RwLock<HashMap<Kind, LruCache<Uuid, RawEntity>>>,
    limit: NonZeroUsize,
}

impl EntityCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            shards: RwLock::new(HashMap::new()),
            limit: config.entity_limit_non_zero(),
        }
    }

    /// Look up an entity snapshot. A miss is a normal outcome, never a failure.
    pub fn get(&self, kind: Kind, id: Uuid) -> Option<RawEntity> {
        let mut shards = rw_write(&self.shards, SOURCE, "get");
        shards.get_mut(&kind)?.get(&id).cloned()
    }

    pub fn put(&self, kind: Kind, id: Uuid, entity: RawEntity) {
        let mut shards = rw_write(&self.shards, SOURCE, "put");
        shards
            .entry(kind)
            .or_insert_with(|| LruCache::new(self.limit))
            .put(id, entity);
    }

    /// Drop the entry for a single id, if present.
    pub fn remove(&self, kind: Kind, id: Uuid) {
        let mut shards = rw_write(&self.shards, SOURCE, "remove");
        if let Some(shard) = shards.get_mut(&kind) {
            shard.pop(&id);
        }
    }

    /// Drop every entry for a kind.
    pub fn remove_all(&self, kind: Kind) {
        let mut shards = rw_write(&self.shards, SOURCE, "remove_all");
        shards.remove(&kind);
    }

    /// Drop every entry for every kind.
    pub fn clear(&self) {
        rw_write(&self.shards, SOURCE, "clear").clear();
    }

    /// Number of cached entities for a kind.
    pub fn len(&self, kind: Kind) -> usize {
        rw_read(&self.shards, SOURCE, "len")
            .get(&kind)
            .map_or(0, LruCache::len)
    }
}
