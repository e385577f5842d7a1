//! Postgres-backed store adapter.
//!
//! One `entities` table holds every kind: `(kind, id, data jsonb)` plus row
//! timestamps. Structured queries compile to jsonb field comparisons.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{Kind, RawEntity};

use super::query::{Direction, Query};
use super::{StoreAdapter, StoreError};

#[derive(Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct EntityRow {
    id: Uuid,
    data: Value,
}

impl From<EntityRow> for RawEntity {
    fn from(row: EntityRow) -> Self {
        Self::new(row.id, row.data)
    }
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn apply_filter_clauses(qb: &mut QueryBuilder<'_, Postgres>, filter: &Query) {
        for clause in filter.clauses() {
            qb.push(" AND data -> ");
            qb.push_bind(clause.field.clone());
            qb.push(" ");
            qb.push(clause.comparison.sql());
            qb.push(" ");
            qb.push_bind(clause.value.clone());
        }
    }
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.message().contains("invalid input syntax") => {
            StoreError::invalid_input(db.message())
        }
        sqlx::Error::Database(db) if db.message().contains("violates") => StoreError::Integrity {
            message: db.message().to_string(),
        },
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            StoreError::Timeout
        }
        other => StoreError::unavailable(other),
    }
}

#[async_trait]
impl StoreAdapter for PostgresStore {
    async fn get_by_id(&self, kind: Kind, id: Uuid) -> Result<Option<RawEntity>, StoreError> {
        let row = sqlx::query_as::<_, EntityRow>(
            "SELECT id, data FROM entities WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(RawEntity::from))
    }

    async fn insert_or_update(
        &self,
        kind: Kind,
        id: Option<Uuid>,
        data: Value,
    ) -> Result<RawEntity, StoreError> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let now = OffsetDateTime::now_utc();

        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            INSERT INTO entities (kind, id, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (kind, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
            RETURNING id, data
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(data)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(RawEntity::from(row))
    }

    async fn delete_by_id(&self, kind: Kind, id: Uuid) -> Result<bool, StoreError> {
        let result = query("DELETE FROM entities WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn execute_query(&self, kind: Kind, filter: &Query) -> Result<Vec<RawEntity>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id, data FROM entities WHERE kind = ");
        qb.push_bind(kind.as_str());
        Self::apply_filter_clauses(&mut qb, filter);

        match filter.order() {
            Some(order) => {
                qb.push(" ORDER BY data -> ");
                qb.push_bind(order.field.clone());
                qb.push(match order.direction {
                    Direction::Asc => " ASC",
                    Direction::Desc => " DESC",
                });
                qb.push(", created_at, id");
            }
            None => {
                qb.push(" ORDER BY created_at, id");
            }
        }

        let rows = qb
            .build_query_as::<EntityRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(RawEntity::from).collect())
    }

    async fn execute_bulk_delete(&self, kind: Kind, filter: &Query) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM entities WHERE kind = ");
        qb.push_bind(kind.as_str());
        Self::apply_filter_clauses(&mut qb, filter);

        let result = qb
            .build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
