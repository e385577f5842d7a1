//! Brezza persistence layer
//!
//! The data-access core of the Brezza publishing system: a generic DAO per
//! entity kind, backed by a durable store adapter and fronted by two
//! in-process caches (entities by id, materialized query results by
//! signature). Every mutation invalidates the affected cache partitions
//! before the store write is issued, so reads are cheap and never stale.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use brezza::{CacheConfig, CacheService, Dao, Entity, Kind, MemoryStore};
//! use serde::{Deserialize, Serialize};
//! use uuid::Uuid;
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Page {
//!     #[serde(default)]
//!     id: Option<Uuid>,
//!     title: String,
//! }
//!
//! impl Entity for Page {
//!     const KIND: Kind = Kind::new("page");
//!     fn id(&self) -> Option<Uuid> {
//!         self.id
//!     }
//!     fn set_id(&mut self, id: Uuid) {
//!         self.id = Some(id);
//!     }
//! }
//!
//! # async fn demo() -> Result<(), brezza::DaoError> {
//! let cache = CacheService::shared(CacheConfig::default());
//! let dao: Dao<Page> = Dao::new(Arc::new(MemoryStore::new()), cache);
//! let saved = dao.save(Page { id: None, title: "Home".into() }).await?;
//! let _fetched = dao.get_by_id(saved.id()).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dao;
pub mod domain;
pub mod store;
pub mod telemetry;

pub use cache::{CacheConfig, CacheService, EntityCache, QueryCache, QuerySignature};
pub use dao::{Dao, DaoError};
pub use domain::{Entity, Kind, RawEntity};
pub use store::{
    Comparison, Direction, FilterClause, MemoryStore, OrderClause, PostgresStore, Query,
    StoreAdapter, StoreError,
};
