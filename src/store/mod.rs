//! Store adapters: the durable backends behind the DAO.

pub mod memory;
pub mod postgres;
mod query;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use query::{Comparison, Direction, FilterClause, OrderClause, Query};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Kind, RawEntity};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("store timeout")]
    Timeout,
}

impl StoreError {
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Contract every durable backend fulfills.
///
/// Rows are raw `(id, payload)` records partitioned by kind; everything an
/// adapter returns is a detached snapshot with no live reference to
/// store-managed state. Absence is an `Option`/`bool`, never an error.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    async fn get_by_id(&self, kind: Kind, id: Uuid) -> Result<Option<RawEntity>, StoreError>;

    /// Insert or update one entity. A missing id means "insert": the store
    /// assigns the identifier and returns it on the persisted record.
    async fn insert_or_update(
        &self,
        kind: Kind,
        id: Option<Uuid>,
        data: Value,
    ) -> Result<RawEntity, StoreError>;

    /// Delete one row. `Ok(false)` when no such row existed.
    async fn delete_by_id(&self, kind: Kind, id: Uuid) -> Result<bool, StoreError>;

    /// Execute a query, returning matching rows in a stable order.
    async fn execute_query(&self, kind: Kind, query: &Query) -> Result<Vec<RawEntity>, StoreError>;

    /// Delete every row matching the query, returning the count removed.
    async fn execute_bulk_delete(&self, kind: Kind, query: &Query) -> Result<u64, StoreError>;
}
