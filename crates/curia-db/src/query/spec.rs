//! The in-memory description of one SQL statement.

use super::bindings::{BindingCategory, Bindings};
use super::nodes::{Aggregate, Column, Having, JoinClause, LockMode, OrderClause, UnionClause, WhereNode};

/// A query description, compiled by [`Grammar`](super::Grammar).
///
/// Built incrementally through [`QueryBuilder`](super::QueryBuilder);
/// compiling never changes it. Clones are deep: every collection, the
/// bindings included, is copied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// The target table; `None` omits the `from` clause.
    pub table: Option<Column>,
    /// Selected columns; `None` selects `*`.
    pub columns: Option<Vec<Column>>,
    /// `select distinct`.
    pub distinct: bool,
    /// `where` predicates.
    pub wheres: Vec<WhereNode>,
    /// Joins, in order.
    pub joins: Vec<JoinClause>,
    /// `group by` columns.
    pub groups: Vec<Column>,
    /// `having` predicates.
    pub havings: Vec<Having>,
    /// `order by` items.
    pub orders: Vec<OrderClause>,
    /// `limit n`.
    pub limit: Option<u64>,
    /// `offset n`.
    pub offset: Option<u64>,
    /// Union members.
    pub unions: Vec<UnionClause>,
    /// `order by` applied to the whole union.
    pub union_orders: Vec<OrderClause>,
    /// `limit` applied to the whole union.
    pub union_limit: Option<u64>,
    /// `offset` applied to the whole union.
    pub union_offset: Option<u64>,
    /// Aggregate replacing the select list.
    pub aggregate: Option<Aggregate>,
    /// Row lock.
    pub lock: Option<LockMode>,
    /// Values for the placeholders, by clause.
    pub bindings: Bindings,
}

/// A resettable part of a [`QuerySpec`], for [`QuerySpec::clone_without`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `columns`
    Columns,
    /// `orders`
    Orders,
    /// `limit`
    Limit,
    /// `offset`
    Offset,
    /// `aggregate`
    Aggregate,
    /// `lock`
    Lock,
}

impl QuerySpec {
    /// Creates an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a description targeting `table`.
    pub fn for_table(table: impl Into<Column>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    /// Returns the table name or raw table SQL.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_ref().map(Column::text)
    }

    /// Returns `true` once a union member has been added. Ordering and
    /// limiting then apply to the union as a whole.
    pub fn has_unions(&self) -> bool {
        !self.unions.is_empty()
    }

    /// Returns a copy with the listed fields reset.
    pub fn clone_without(&self, fields: &[Field]) -> Self {
        let mut clone = self.clone();
        for field in fields {
            match field {
                Field::Columns => clone.columns = None,
                Field::Orders => clone.orders.clear(),
                Field::Limit => clone.limit = None,
                Field::Offset => clone.offset = None,
                Field::Aggregate => clone.aggregate = None,
                Field::Lock => clone.lock = None,
            }
        }
        clone
    }

    /// Returns a copy with the listed binding buckets emptied.
    pub fn clone_without_bindings(&self, categories: &[BindingCategory]) -> Self {
        let mut clone = self.clone();
        for category in categories {
            clone.bindings.clear(*category);
        }
        clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_clone_without_leaves_source_untouched() {
        let mut spec = QuerySpec::for_table("users");
        spec.columns = Some(vec![Column::from("id"), Column::from("name")]);
        spec.bindings.add(BindingCategory::Select, Value::Int(1));

        let mut clone = spec
            .clone_without(&[Field::Columns])
            .clone_without_bindings(&[BindingCategory::Select]);
        assert!(clone.columns.is_none());
        assert!(clone.bindings.is_empty());

        clone.columns = Some(vec![Column::from("email")]);
        clone.wheres.push(WhereNode::Raw {
            sql: "1 = 1".into(),
            boolean: super::super::nodes::Boolean::And,
        });

        assert_eq!(spec.columns.as_ref().map(Vec::len), Some(2));
        assert!(spec.wheres.is_empty());
        assert_eq!(spec.bindings.len(), 1);
    }

    #[test]
    fn test_table_name() {
        assert_eq!(QuerySpec::for_table("posts").table_name(), Some("posts"));
        assert_eq!(QuerySpec::new().table_name(), None);
    }
}
