//! In-memory store adapter.
//!
//! Full adapter semantics over concurrent kind tables: identifier
//! assignment, stable insertion order, structured-query filtering, bulk
//! delete. Backs the test suites and the embedded mode.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{self, AtomicU64};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{Kind, RawEntity};

use super::query::{Comparison, Direction, FilterClause, Query};
use super::{StoreAdapter, StoreError};

pub struct MemoryStore {
    tables: DashMap<Kind, KindTable>,
    sequence: AtomicU64,
}

#[derive(Default)]
struct KindTable {
    rows: HashMap<Uuid, StoredRow>,
}

struct StoredRow {
    seq: u64,
    data: Value,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, atomic::Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn scalar_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn clause_matches(clause: &FilterClause, data: &Value) -> bool {
    let field = data.get(&clause.field).unwrap_or(&Value::Null);
    match clause.comparison {
        Comparison::Eq => field == &clause.value,
        Comparison::Ne => field != &clause.value,
        Comparison::Lt => scalar_cmp(field, &clause.value).is_some_and(Ordering::is_lt),
        Comparison::Le => scalar_cmp(field, &clause.value).is_some_and(Ordering::is_le),
        Comparison::Gt => scalar_cmp(field, &clause.value).is_some_and(Ordering::is_gt),
        Comparison::Ge => scalar_cmp(field, &clause.value).is_some_and(Ordering::is_ge),
    }
}

fn row_matches(query: &Query, data: &Value) -> bool {
    query.clauses().iter().all(|clause| clause_matches(clause, data))
}

#[async_trait]
impl StoreAdapter for MemoryStore {
    async fn get_by_id(&self, kind: Kind, id: Uuid) -> Result<Option<RawEntity>, StoreError> {
        let Some(table) = self.tables.get(&kind) else {
            return Ok(None);
        };
        Ok(table
            .rows
            .get(&id)
            .map(|row| RawEntity::new(id, row.data.clone())))
    }

    async fn insert_or_update(
        &self,
        kind: Kind,
        id: Option<Uuid>,
        data: Value,
    ) -> Result<RawEntity, StoreError> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut table = self.tables.entry(kind).or_default();
        let seq = match table.rows.get(&id) {
            Some(existing) => existing.seq,
            None => self.next_seq(),
        };
        table.rows.insert(
            id,
            StoredRow {
                seq,
                data: data.clone(),
            },
        );
        Ok(RawEntity::new(id, data))
    }

    async fn delete_by_id(&self, kind: Kind, id: Uuid) -> Result<bool, StoreError> {
        let Some(mut table) = self.tables.get_mut(&kind) else {
            return Ok(false);
        };
        Ok(table.rows.remove(&id).is_some())
    }

    async fn execute_query(&self, kind: Kind, query: &Query) -> Result<Vec<RawEntity>, StoreError> {
        let Some(table) = self.tables.get(&kind) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<(u64, Uuid, Value)> = table
            .rows
            .iter()
            .filter(|(_, row)| row_matches(query, &row.data))
            .map(|(id, row)| (row.seq, *id, row.data.clone()))
            .collect();
        drop(table);

        match query.order() {
            Some(order) => {
                rows.sort_by(|a, b| {
                    let left = a.2.get(&order.field).unwrap_or(&Value::Null);
                    let right = b.2.get(&order.field).unwrap_or(&Value::Null);
                    let ord = scalar_cmp(left, right).unwrap_or(Ordering::Equal);
                    let ord = match order.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    ord.then(a.0.cmp(&b.0))
                });
            }
            None => rows.sort_by_key(|&(seq, _, _)| seq),
        }

        Ok(rows
            .into_iter()
            .map(|(_, id, data)| RawEntity::new(id, data))
            .collect())
    }

    async fn execute_bulk_delete(&self, kind: Kind, query: &Query) -> Result<u64, StoreError> {
        let Some(mut table) = self.tables.get_mut(&kind) else {
            return Ok(0);
        };
        let before = table.rows.len();
        table.rows.retain(|_, row| !row_matches(query, &row.data));
        Ok((before - table.rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: Kind = Kind::new("page");

    fn page(title: &str, views: i64) -> Value {
        serde_json::json!({ "title": title, "views": views })
    }

    #[tokio::test]
    async fn insert_assigns_an_identifier() {
        let store = MemoryStore::new();

        let persisted = store
            .insert_or_update(PAGE, None, page("home", 3))
            .await
            .expect("insert");

        let fetched = store
            .get_by_id(PAGE, persisted.id)
            .await
            .expect("get")
            .expect("row present");
        assert_eq!(fetched.data["title"], "home");
    }

    #[tokio::test]
    async fn update_keeps_identifier_and_position() {
        let store = MemoryStore::new();

        let first = store
            .insert_or_update(PAGE, None, page("first", 1))
            .await
            .expect("insert");
        store
            .insert_or_update(PAGE, None, page("second", 2))
            .await
            .expect("insert");
        store
            .insert_or_update(PAGE, Some(first.id), page("first-edited", 1))
            .await
            .expect("update");

        let rows = store
            .execute_query(PAGE, &Query::new())
            .await
            .expect("query");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, first.id);
        assert_eq!(rows[0].data["title"], "first-edited");
    }

    #[tokio::test]
    async fn query_filters_and_orders() {
        let store = MemoryStore::new();
        store
            .insert_or_update(PAGE, None, page("a", 10))
            .await
            .expect("insert");
        store
            .insert_or_update(PAGE, None, page("b", 30))
            .await
            .expect("insert");
        store
            .insert_or_update(PAGE, None, page("c", 20))
            .await
            .expect("insert");

        let rows = store
            .execute_query(
                PAGE,
                &Query::new()
                    .filter("views", Comparison::Ge, 20)
                    .order_by("views", Direction::Desc),
            )
            .await
            .expect("query");

        let titles: Vec<_> = rows.iter().map(|row| row.data["title"].clone()).collect();
        assert_eq!(titles, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn missing_field_never_matches_range_clauses() {
        let store = MemoryStore::new();
        store
            .insert_or_update(PAGE, None, serde_json::json!({ "title": "no-views" }))
            .await
            .expect("insert");

        let rows = store
            .execute_query(PAGE, &Query::new().filter("views", Comparison::Gt, 0))
            .await
            .expect("query");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn delete_by_id_reports_absence() {
        let store = MemoryStore::new();
        let persisted = store
            .insert_or_update(PAGE, None, page("home", 1))
            .await
            .expect("insert");

        assert!(store.delete_by_id(PAGE, persisted.id).await.expect("delete"));
        assert!(!store.delete_by_id(PAGE, persisted.id).await.expect("delete"));
    }

    #[tokio::test]
    async fn bulk_delete_counts_matches() {
        let store = MemoryStore::new();
        store
            .insert_or_update(PAGE, None, page("a", 10))
            .await
            .expect("insert");
        store
            .insert_or_update(PAGE, None, page("b", 30))
            .await
            .expect("insert");

        let removed = store
            .execute_bulk_delete(PAGE, &Query::new().filter("views", Comparison::Lt, 20))
            .await
            .expect("bulk delete");
        assert_eq!(removed, 1);

        let rows = store
            .execute_query(PAGE, &Query::new())
            .await
            .expect("query");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data["title"], "b");
    }
}
