//! Query cache: per-kind map of query signature → materialized result list.

use std::collections::HashMap;
use std::fmt::Write;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use lru::LruCache;

use crate::domain::{Kind, RawEntity};
use crate::store::Query;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::query";

/// Deterministic key identifying a query and its bound parameter values.
///
/// The rendered clause list is the key itself, not a hash of it, so equal
/// signatures are guaranteed to mean the same query with the same parameters.
/// The select-all signature is the bare kind marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature {
    key: String,
}

impl QuerySignature {
    pub fn of(kind: Kind, query: &Query) -> Self {
        let mut key = String::from(kind.as_str());
        for (index, clause) in query.clauses().iter().enumerate() {
            key.push(if index == 0 { '?' } else { '&' });
            let _ = write!(
                key,
                "{} {} {}",
                clause.field,
                clause.comparison.keyword(),
                clause.value
            );
        }
        if let Some(order) = query.order() {
            let _ = write!(key, "#order {} {}", order.field, order.direction.keyword());
        }
        Self { key }
    }

    pub fn select_all(kind: Kind) -> Self {
        Self::of(kind, &Query::default())
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

/// In-memory cache of materialized query results.
///
/// Result lists are stored as `Arc<[RawEntity]>`: shared immutable snapshots,
/// so no caller can corrupt a cached entry through a returned list.
/// Invalidation is coarse on purpose: any mutation of a kind purges every
/// signature for that kind.
pub struct QueryCache {
    shards: RwLock<HashMap<Kind, LruCache<QuerySignature, Arc<[RawEntity]>>>>,
    limit: NonZeroUsize,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            shards: RwLock::new(HashMap::new()),
            limit: config.query_limit_non_zero(),
        }
    }

    pub fn get(&self, kind: Kind, signature: &QuerySignature) -> Option<Arc<[RawEntity]>> {
        let mut shards = rw_write(&self.shards, SOURCE, "get");
        shards.get_mut(&kind)?.get(signature).cloned()
    }

    pub fn put(&self, kind: Kind, signature: QuerySignature, result: Arc<[RawEntity]>) {
        let mut shards = rw_write(&self.shards, SOURCE, "put");
        shards
            .entry(kind)
            .or_insert_with(|| LruCache::new(self.limit))
            .put(signature, result);
    }

    /// Drop every cached result list for a kind.
    pub fn remove_all(&self, kind: Kind) {
        let mut shards = rw_write(&self.shards, SOURCE, "remove_all");
        shards.remove(&kind);
    }

    /// Drop every cached result list for every kind.
    pub fn clear(&self) {
        rw_write(&self.shards, SOURCE, "clear").clear();
    }

    /// Number of cached result lists for a kind.
    pub fn len(&self, kind: Kind) -> usize {
        rw_read(&self.shards, SOURCE, "len")
            .get(&kind)
            .map_or(0, LruCache::len)
    }
}
