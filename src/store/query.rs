//! Portable query expressions executed by store adapters.

use serde_json::Value;

/// Comparison operator applied to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// SQL operator text. Safe to splice: the set is closed.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Keyword used when rendering query signatures.
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
        }
    }
}

/// Sort direction for an ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One `field <op> value` condition; all clauses are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub comparison: Comparison,
    pub value: Value,
}

/// Ordering applied to the result list.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub field: String,
    pub direction: Direction,
}

/// A structured query over one entity kind.
///
/// The empty query selects the whole collection. Adapters fall back to
/// insertion order when no ordering clause is given, so repeated executions
/// of the same query return rows in the same order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    clauses: Vec<FilterClause>,
    order: Option<OrderClause>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(
        mut self,
        field: impl Into<String>,
        comparison: Comparison,
        value: impl Into<Value>,
    ) -> Self {
        self.clauses.push(FilterClause {
            field: field.into(),
            comparison,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(OrderClause {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn order(&self) -> Option<&OrderClause> {
        self.order.as_ref()
    }

    /// True for the select-all / delete-all query.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.order.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_clauses_in_order() {
        let query = Query::new()
            .filter("status", Comparison::Eq, "published")
            .filter("views", Comparison::Ge, 100)
            .order_by("published_at", Direction::Desc);

        assert_eq!(query.clauses().len(), 2);
        assert_eq!(query.clauses()[0].field, "status");
        assert_eq!(query.clauses()[1].value, Value::from(100));
        assert_eq!(query.order().expect("order clause").field, "published_at");
        assert!(!query.is_empty());
    }

    #[test]
    fn empty_query_selects_all() {
        assert!(Query::new().is_empty());
        assert!(!Query::new().filter("a", Comparison::Eq, 1).is_empty());
    }
}
