//! Generic data access: read-through caching with invalidate-before-write.
//!
//! One `Dao<E>` per entity kind, all sharing the process-wide
//! [`CacheService`]. Every mutation purges the affected cache partitions
//! *before* the store write is issued, so no reader can observe a result
//! computed against soon-to-be-stale state.

use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{CacheService, QuerySignature};
use crate::domain::{Entity, Kind, RawEntity};
use crate::store::{Query, StoreAdapter, StoreError};

#[derive(Debug, Error)]
pub enum DaoError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode `{kind}` entity payload")]
    Encode {
        kind: Kind,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode `{kind}` entity payload")]
    Decode {
        kind: Kind,
        #[source]
        source: serde_json::Error,
    },
}

/// Data-access object for one entity kind.
///
/// Cheap to clone; the store and cache service are shared.
pub struct Dao<E> {
    store: Arc<dyn StoreAdapter>,
    cache: Arc<CacheService>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Dao<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Dao<E> {
    pub fn new(store: Arc<dyn StoreAdapter>, cache: Arc<CacheService>) -> Self {
        Self {
            store,
            cache,
            _entity: PhantomData,
        }
    }

    /// Fetch one entity by id, through the entity cache.
    ///
    /// `None` ids short-circuit without touching the store. A row the store
    /// cannot find, or an identifier it rejects as malformed, is absence
    /// rather than an error, and caches nothing.
    pub async fn get_by_id(&self, id: impl Into<Option<Uuid>>) -> Result<Option<E>, DaoError> {
        let Some(id) = id.into() else {
            return Ok(None);
        };

        if let Some(raw) = self.cache.entity_get(E::KIND, id) {
            return self.decode(&raw).map(Some);
        }

        let fetched = match self.store.get_by_id(E::KIND, id).await {
            Ok(found) => found,
            Err(StoreError::InvalidInput { message }) => {
                debug!(kind = %E::KIND, %id, message, "treating malformed identifier as absent");
                None
            }
            Err(err) => return Err(err.into()),
        };

        let Some(raw) = fetched else {
            return Ok(None);
        };

        self.cache.entity_put(E::KIND, id, raw.clone());
        self.decode(&raw).map(Some)
    }

    /// Insert or update an entity.
    ///
    /// The query cache for the kind is purged unconditionally and the entity
    /// entry (when the entity already has an id) is purged before the write.
    /// The returned entity carries the store-assigned identifier. The entity
    /// cache is not repopulated here; the next read fetches the persisted
    /// row, including anything the store defaulted or derived.
    pub async fn save(&self, entity: E) -> Result<E, DaoError> {
        self.cache.query_remove_all(E::KIND);
        if let Some(id) = entity.id() {
            self.cache.entity_remove(E::KIND, id);
        }

        let data = RawEntity::encode(&entity).map_err(|source| DaoError::Encode {
            kind: E::KIND,
            source,
        })?;
        let raw = self.store.insert_or_update(E::KIND, entity.id(), data).await?;
        self.decode(&raw)
    }

    /// Delete one entity by id. `None` is a no-op; a row already gone from
    /// the store is success, the desired end state holds either way.
    pub async fn remove(&self, id: impl Into<Option<Uuid>>) -> Result<(), DaoError> {
        let Some(id) = id.into() else {
            return Ok(());
        };

        self.cache.entity_remove(E::KIND, id);
        self.cache.query_remove_all(E::KIND);
        self.store.delete_by_id(E::KIND, id).await?;
        Ok(())
    }

    /// Delete a batch of ids.
    ///
    /// All cache invalidation happens before the first delete, so an
    /// interrupted batch can never leave either cache staler than
    /// "re-fetch". Every id is attempted; the first store fault is returned
    /// after the loop, later faults are logged.
    pub async fn remove_many(&self, ids: &[Uuid]) -> Result<(), DaoError> {
        self.cache.query_remove_all(E::KIND);
        for &id in ids {
            self.cache.entity_remove(E::KIND, id);
        }

        let mut first_failure = None;
        for &id in ids {
            if let Err(err) = self.store.delete_by_id(E::KIND, id).await {
                warn!(kind = %E::KIND, %id, error = %err, "batch delete entry failed");
                first_failure.get_or_insert(err);
            }
        }

        match first_failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Delete every entity of the kind. Returns the number removed.
    pub async fn remove_all(&self) -> Result<u64, DaoError> {
        self.remove_selected(&Query::new()).await
    }

    /// Delete every entity matching the query. The whole kind is purged from
    /// both caches: the delete may touch any subset of the collection.
    pub async fn remove_selected(&self, query: &Query) -> Result<u64, DaoError> {
        self.cache.entity_remove_all(E::KIND);
        self.cache.query_remove_all(E::KIND);
        Ok(self.store.execute_bulk_delete(E::KIND, query).await?)
    }

    /// Fetch the whole collection, through the query cache.
    pub async fn select_all(&self) -> Result<Vec<E>, DaoError> {
        self.select(&Query::new()).await
    }

    /// Execute a query, through the query cache.
    ///
    /// Results are detached snapshots in the order the store returned them.
    pub async fn select(&self, query: &Query) -> Result<Vec<E>, DaoError> {
        let signature = QuerySignature::of(E::KIND, query);

        if let Some(rows) = self.cache.query_get(E::KIND, &signature) {
            return rows.iter().map(|raw| self.decode(raw)).collect();
        }

        let rows: Arc<[RawEntity]> = self.store.execute_query(E::KIND, query).await?.into();
        self.cache.query_put(E::KIND, signature, Arc::clone(&rows));
        rows.iter().map(|raw| self.decode(raw)).collect()
    }

    /// First result of a query, or absent.
    pub async fn select_one(&self, query: &Query) -> Result<Option<E>, DaoError> {
        Ok(self.select(query).await?.into_iter().next())
    }

    /// Narrow the full collection with an in-memory predicate, preserving
    /// store order. The full-collection read benefits from the query cache.
    pub async fn select_where<F>(&self, filter: F) -> Result<Vec<E>, DaoError>
    where
        F: Fn(&E) -> bool,
    {
        let mut entities = self.select_all().await?;
        entities.retain(|entity| filter(entity));
        Ok(entities)
    }

    /// First entity matching the predicate, or absent.
    pub async fn select_first<F>(&self, filter: F) -> Result<Option<E>, DaoError>
    where
        F: Fn(&E) -> bool,
    {
        Ok(self.select_all().await?.into_iter().find(|entity| filter(entity)))
    }

    /// Administrative escape hatch: purge both caches for this kind.
    ///
    /// Not part of the normal read/write flow; cache faults are contained
    /// inside the cache layer, so this cannot fail or block persistence.
    pub fn clear_cache(&self) {
        debug!(kind = %E::KIND, "clearing caches");
        self.cache.clear_kind(E::KIND);
    }

    fn decode(&self, raw: &RawEntity) -> Result<E, DaoError> {
        raw.decode().map_err(|source| DaoError::Decode {
            kind: E::KIND,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use crate::cache::CacheConfig;
    use crate::store::{Comparison, MemoryStore};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Page {
        #[serde(default)]
        id: Option<Uuid>,
        title: String,
        published: bool,
    }

    impl Entity for Page {
        const KIND: Kind = Kind::new("page");

        fn id(&self) -> Option<Uuid> {
            self.id
        }

        fn set_id(&mut self, id: Uuid) {
            self.id = Some(id);
        }
    }

    fn page(title: &str, published: bool) -> Page {
        Page {
            id: None,
            title: title.to_string(),
            published,
        }
    }

    fn dao() -> Dao<Page> {
        Dao::new(
            Arc::new(MemoryStore::new()),
            CacheService::shared(CacheConfig::default()),
        )
    }

    #[tokio::test]
    async fn save_assigns_identifier_and_get_by_id_finds_it() {
        let dao = dao();

        let saved = dao.save(page("home", true)).await.expect("save");
        let id = saved.id.expect("assigned id");

        let fetched = dao.get_by_id(id).await.expect("get").expect("present");
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn absent_id_returns_none() {
        let dao = dao();
        assert!(dao.get_by_id(None).await.expect("get").is_none());
        assert!(dao.get_by_id(Uuid::new_v4()).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn remove_of_none_is_a_noop() {
        let dao = dao();
        dao.remove(None).await.expect("remove");
    }

    #[tokio::test]
    async fn remove_tolerates_missing_row() {
        let dao = dao();
        dao.remove(Uuid::new_v4()).await.expect("remove");
    }

    #[tokio::test]
    async fn select_one_returns_first_match() {
        let dao = dao();
        dao.save(page("a", true)).await.expect("save");
        dao.save(page("b", true)).await.expect("save");

        let found = dao
            .select_one(&Query::new().filter("title", Comparison::Eq, "b"))
            .await
            .expect("select")
            .expect("present");
        assert_eq!(found.title, "b");

        let missing = dao
            .select_one(&Query::new().filter("title", Comparison::Eq, "zzz"))
            .await
            .expect("select");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn filter_path_matches_external_filtering() {
        let dao = dao();
        dao.save(page("a", true)).await.expect("save");
        dao.save(page("b", false)).await.expect("save");
        dao.save(page("c", true)).await.expect("save");

        let filtered = dao
            .select_where(|entity| entity.published)
            .await
            .expect("select_where");
        let expected: Vec<Page> = dao
            .select_all()
            .await
            .expect("select_all")
            .into_iter()
            .filter(|entity| entity.published)
            .collect();
        assert_eq!(filtered, expected);

        let first = dao
            .select_first(|entity| entity.published)
            .await
            .expect("select_first")
            .expect("present");
        assert_eq!(first.title, "a");
    }

    #[tokio::test]
    async fn remove_all_reports_count_and_empties_collection() {
        let dao = dao();
        dao.save(page("a", true)).await.expect("save");
        dao.save(page("b", false)).await.expect("save");

        let removed = dao.remove_all().await.expect("remove_all");
        assert_eq!(removed, 2);
        assert!(dao.select_all().await.expect("select").is_empty());
    }

    #[tokio::test]
    async fn remove_selected_only_deletes_matches() {
        let dao = dao();
        dao.save(page("a", true)).await.expect("save");
        dao.save(page("b", false)).await.expect("save");

        let removed = dao
            .remove_selected(&Query::new().filter("published", Comparison::Eq, false))
            .await
            .expect("remove_selected");
        assert_eq!(removed, 1);

        let left = dao.select_all().await.expect("select");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].title, "a");
    }
}
