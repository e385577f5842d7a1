//! Cache service: the process-wide cache pair shared by every DAO.

use std::sync::Arc;

use metrics::counter;
use uuid::Uuid;

use crate::domain::{Kind, RawEntity};
use crate::telemetry::{
    METRIC_ENTITY_HIT, METRIC_ENTITY_MISS, METRIC_INVALIDATION, METRIC_QUERY_HIT,
    METRIC_QUERY_MISS,
};

use super::config::CacheConfig;
use super::entity::EntityCache;
use super::query::{QueryCache, QuerySignature};

/// Owns the entity cache and the query cache for the whole process.
///
/// Constructed once at startup and shared by `Arc` into every DAO. When the
/// cache is disabled by configuration, lookups miss and population is a
/// no-op; invalidation still runs so a re-enabled cache never starts stale.
pub struct CacheService {
    config: CacheConfig,
    entity: EntityCache,
    query: QueryCache,
}

impl CacheService {
    pub fn new(config: CacheConfig) -> Self {
        let entity = EntityCache::new(&config);
        let query = QueryCache::new(&config);
        Self {
            config,
            entity,
            query,
        }
    }

    pub fn shared(config: CacheConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn entity(&self) -> &EntityCache {
        &self.entity
    }

    pub fn query(&self) -> &QueryCache {
        &self.query
    }

    pub fn entity_get(&self, kind: Kind, id: Uuid) -> Option<RawEntity> {
        if !self.config.enabled {
            return None;
        }
        let hit = self.entity.get(kind, id);
        match hit {
            Some(_) => counter!(METRIC_ENTITY_HIT, "kind" => kind.as_str()).increment(1),
            None => counter!(METRIC_ENTITY_MISS, "kind" => kind.as_str()).increment(1),
        }
        hit
    }

    pub fn entity_put(&self, kind: Kind, id: Uuid, entity: RawEntity) {
        if !self.config.enabled {
            return;
        }
        self.entity.put(kind, id, entity);
    }

    pub fn entity_remove(&self, kind: Kind, id: Uuid) {
        self.entity.remove(kind, id);
        counter!(METRIC_INVALIDATION, "kind" => kind.as_str(), "scope" => "entity").increment(1);
    }

    pub fn entity_remove_all(&self, kind: Kind) {
        self.entity.remove_all(kind);
        counter!(METRIC_INVALIDATION, "kind" => kind.as_str(), "scope" => "entity_kind")
            .increment(1);
    }

    pub fn query_get(&self, kind: Kind, signature: &QuerySignature) -> Option<Arc<[RawEntity]>> {
        if !self.config.enabled {
            return None;
        }
        let hit = self.query.get(kind, signature);
        match hit {
            Some(_) => counter!(METRIC_QUERY_HIT, "kind" => kind.as_str()).increment(1),
            None => counter!(METRIC_QUERY_MISS, "kind" => kind.as_str()).increment(1),
        }
        hit
    }

    pub fn query_put(&self, kind: Kind, signature: QuerySignature, result: Arc<[RawEntity]>) {
        if !self.config.enabled {
            return;
        }
        self.query.put(kind, signature, result);
    }

    pub fn query_remove_all(&self, kind: Kind) {
        self.query.remove_all(kind);
        counter!(METRIC_INVALIDATION, "kind" => kind.as_str(), "scope" => "query_kind")
            .increment(1);
    }

    /// Administrative purge of both caches for one kind.
    pub fn clear_kind(&self, kind: Kind) {
        self.entity.remove_all(kind);
        self.query.remove_all(kind);
        counter!(METRIC_INVALIDATION, "kind" => kind.as_str(), "scope" => "kind").increment(1);
    }

    /// Purge everything, every kind.
    pub fn clear_all(&self) {
        self.entity.clear();
        self.query.clear();
    }
}
