//! The fluent query builder.
//!
//! [`QueryBuilder`] pairs a [`QuerySpec`] with the connection that will run
//! it. Construction methods consume the builder and return it, so queries are
//! assembled by chaining; terminal methods (`get`, `count`, `insert`,
//! `update`, `delete`, ...) borrow it, compile the `QuerySpec` with the
//! connection's [`Grammar`] and hand the SQL and flattened bindings to the
//! connection.
//!
//! Chained calls never fail. A call that is rejected (for example an
//! ordering operator compared against NULL) is recorded, and the first such
//! failure is returned by [`to_sql`](QueryBuilder::to_sql) and by every
//! terminal method before any SQL is sent.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use curia_db::connection::{Connection, ConnectionExt};
//! use curia_db::testing::RecordingConnection;
//! use curia_db::value::Value;
//!
//! let conn: Rc<dyn Connection> = Rc::new(RecordingConnection::new());
//! let query = conn
//!     .table("users")
//!     .where_("age", ">", 18)
//!     .order_by("name", "asc")
//!     .limit(10);
//!
//! assert_eq!(
//!     query.to_sql().unwrap(),
//!     "select * from `users` where `age` > ? order by `name` asc limit 10"
//! );
//! assert_eq!(query.get_bindings(), vec![Value::Int(18)]);
//! ```

use std::fmt;
use std::rc::Rc;

use curia_core::{CuriaError, CuriaResult};

use super::bindings::{BindingCategory, Bindings};
use super::expression::Expression;
use super::grammar::{Grammar, Record};
use super::nodes::{
    is_operator, prepare_comparison, Aggregate, Boolean, Column, DatePart, Direction, Having,
    JoinClause, JoinKind, LockMode, Operand, OrderClause, UnionClause, WhereNode,
};
use super::spec::{Field, QuerySpec};
use crate::connection::Connection;
use crate::row::{FromValue, Row};
use crate::value::Value;

/// A query under construction, bound to a connection.
#[derive(Clone)]
pub struct QueryBuilder {
    connection: Rc<dyn Connection>,
    query: QuerySpec,
    /// The first rejected call, reported when the query is compiled.
    invalid: Option<String>,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("connection", &self.connection.name())
            .field("query", &self.query)
            .field("invalid", &self.invalid)
            .finish()
    }
}

impl QueryBuilder {
    /// Creates an empty builder on `connection`.
    pub fn new(connection: Rc<dyn Connection>) -> Self {
        Self {
            connection,
            query: QuerySpec::new(),
            invalid: None,
        }
    }

    /// Creates a builder on `connection` from an existing description.
    pub fn from_spec(connection: Rc<dyn Connection>, query: QuerySpec) -> Self {
        Self {
            connection,
            query,
            invalid: None,
        }
    }

    /// Returns the connection this builder runs on.
    pub fn connection(&self) -> &Rc<dyn Connection> {
        &self.connection
    }

    /// Returns the connection's grammar.
    pub fn grammar(&self) -> &Grammar {
        self.connection.grammar()
    }

    /// Returns the query description.
    pub fn spec(&self) -> &QuerySpec {
        &self.query
    }

    /// Consumes the builder, returning the query description.
    pub fn into_spec(self) -> QuerySpec {
        self.query
    }

    /// Creates an empty builder on the same connection.
    pub fn new_query(&self) -> Self {
        Self::new(Rc::clone(&self.connection))
    }

    /// Creates the builder handed to sub-query callbacks.
    pub fn for_sub_query(&self) -> Self {
        self.new_query()
    }

    /// Creates the builder handed to nested-where callbacks: empty, but
    /// targeting the same table.
    pub fn for_nested_where(&self) -> Self {
        let mut query = self.new_query();
        query.query.table.clone_from(&self.query.table);
        query
    }

    fn fail(mut self, message: String) -> Self {
        self.invalid.get_or_insert(message);
        self
    }

    fn absorb(&mut self, invalid: Option<String>) {
        if let Some(message) = invalid {
            self.invalid.get_or_insert(message);
        }
    }

    fn check(&self) -> CuriaResult<()> {
        match &self.invalid {
            Some(message) => Err(CuriaError::ValidationError(message.clone())),
            None => Ok(()),
        }
    }

    // ── Select list and source ──────────────────────────────────────

    /// Sets the selected columns.
    pub fn select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.query.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds columns to the select list.
    pub fn add_select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.query
            .columns
            .get_or_insert_with(Vec::new)
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Adds a raw select expression with its own bindings.
    pub fn select_raw(mut self, sql: &str, bindings: Vec<Value>) -> Self {
        self.query.bindings.extend(BindingCategory::Select, bindings);
        self.add_select([Expression::new(sql)])
    }

    /// Makes the query `select distinct`.
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    /// Sets the target table.
    pub fn from(mut self, table: impl Into<Column>) -> Self {
        self.query.table = Some(table.into());
        self
    }

    // ── Where ───────────────────────────────────────────────────────

    /// Adds `column operator ?`.
    ///
    /// A NULL value becomes `is null` (or `is not null` for `<>`/`!=`);
    /// any other operator with NULL is rejected. An operator outside the
    /// known set is taken as the value of an `=` comparison.
    pub fn where_(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add_where(column.into(), operator, value.into(), Boolean::And)
    }

    /// Adds `or column operator ?`.
    pub fn or_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add_where(column.into(), operator, value.into(), Boolean::Or)
    }

    /// Adds `column = ?`.
    pub fn where_eq(self, column: impl Into<Column>, value: impl Into<Operand>) -> Self {
        self.where_(column, "=", value)
    }

    /// Adds `or column = ?`.
    pub fn or_where_eq(self, column: impl Into<Column>, value: impl Into<Operand>) -> Self {
        self.or_where(column, "=", value)
    }

    fn add_where(mut self, column: Column, operator: &str, value: Operand, boolean: Boolean) -> Self {
        let (operator, value) = match prepare_comparison(operator, value) {
            Ok(prepared) => prepared,
            Err(message) => return self.fail(message),
        };
        if value.is_null() {
            return self.add_null(column, operator != "=", boolean);
        }
        if let Some(v) = value.binding() {
            self.query.bindings.add(BindingCategory::Where, v.clone());
        }
        self.query.wheres.push(WhereNode::Basic {
            column,
            operator,
            value,
            boolean,
        });
        self
    }

    /// Adds a parenthesized group of `column = ?` comparisons, joined by
    /// `and`.
    pub fn where_map<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Column>,
        V: Into<Operand>,
    {
        self.add_where_map(pairs, Boolean::And)
    }

    /// Like [`where_map`](Self::where_map), joined by `or`.
    pub fn or_where_map<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Column>,
        V: Into<Operand>,
    {
        self.add_where_map(pairs, Boolean::Or)
    }

    fn add_where_map<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>, boolean: Boolean) -> Self
    where
        K: Into<Column>,
        V: Into<Operand>,
    {
        self.add_nested(
            |mut query| {
                for (column, value) in pairs {
                    query = query.add_where(column.into(), "=", value.into(), boolean);
                }
                query
            },
            boolean,
        )
    }

    /// Adds a parenthesized group of `(column, operator, value)`
    /// comparisons, joined by `and`.
    ///
    /// Each triple goes through [`where_`](Self::where_), so an unknown
    /// operator is read as the value and a null value becomes `is null`.
    pub fn where_conditions<C, O, V>(
        self,
        conditions: impl IntoIterator<Item = (C, O, V)>,
    ) -> Self
    where
        C: Into<Column>,
        O: AsRef<str>,
        V: Into<Operand>,
    {
        self.add_where_conditions(conditions, Boolean::And)
    }

    /// Adds `or (...)` holding `(column, operator, value)` comparisons.
    pub fn or_where_conditions<C, O, V>(
        self,
        conditions: impl IntoIterator<Item = (C, O, V)>,
    ) -> Self
    where
        C: Into<Column>,
        O: AsRef<str>,
        V: Into<Operand>,
    {
        self.add_where_conditions(conditions, Boolean::Or)
    }

    fn add_where_conditions<C, O, V>(
        self,
        conditions: impl IntoIterator<Item = (C, O, V)>,
        boolean: Boolean,
    ) -> Self
    where
        C: Into<Column>,
        O: AsRef<str>,
        V: Into<Operand>,
    {
        self.add_nested(
            |mut query| {
                for (column, operator, value) in conditions {
                    query =
                        query.add_where(column.into(), operator.as_ref(), value.into(), Boolean::And);
                }
                query
            },
            boolean,
        )
    }

    /// Adds a parenthesized group built by `callback`.
    ///
    /// A group the callback leaves empty adds nothing.
    pub fn where_nested(self, callback: impl FnOnce(Self) -> Self) -> Self {
        self.add_nested(callback, Boolean::And)
    }

    /// Adds `or (...)`.
    pub fn or_where_nested(self, callback: impl FnOnce(Self) -> Self) -> Self {
        self.add_nested(callback, Boolean::Or)
    }

    fn add_nested(mut self, callback: impl FnOnce(Self) -> Self, boolean: Boolean) -> Self {
        let nested = callback(self.for_nested_where());
        self.absorb(nested.invalid);
        if nested.query.wheres.is_empty() {
            return self;
        }
        self.query.bindings.extend(
            BindingCategory::Where,
            nested.query.bindings.get(BindingCategory::Where).to_vec(),
        );
        self.query.wheres.push(WhereNode::Nested {
            wheres: nested.query.wheres,
            boolean,
        });
        self
    }

    /// Adds `column operator (select ...)`, the sub-select built by
    /// `callback`.
    pub fn where_sub(
        self,
        column: impl Into<Column>,
        operator: &str,
        callback: impl FnOnce(Self) -> Self,
    ) -> Self {
        self.add_sub(column.into(), operator, callback, Boolean::And)
    }

    /// Adds `or column operator (select ...)`.
    pub fn or_where_sub(
        self,
        column: impl Into<Column>,
        operator: &str,
        callback: impl FnOnce(Self) -> Self,
    ) -> Self {
        self.add_sub(column.into(), operator, callback, Boolean::Or)
    }

    fn add_sub(
        mut self,
        column: Column,
        operator: &str,
        callback: impl FnOnce(Self) -> Self,
        boolean: Boolean,
    ) -> Self {
        if !is_operator(operator) {
            return self.add_where(column, operator, Operand::Value(Value::Null), boolean);
        }
        let sub = callback(self.for_sub_query());
        self.absorb(sub.invalid);
        self.query
            .bindings
            .extend(BindingCategory::Where, sub.query.bindings.flatten());
        self.query.wheres.push(WhereNode::Sub {
            column,
            operator: operator.to_string(),
            query: Box::new(sub.query),
            boolean,
        });
        self
    }

    /// Adds `column in (?, ...)`. An empty list matches nothing.
    pub fn where_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_in(column.into(), collect_operands(values), false, Boolean::And)
    }

    /// Adds `or column in (?, ...)`.
    pub fn or_where_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_in(column.into(), collect_operands(values), false, Boolean::Or)
    }

    /// Adds `column not in (?, ...)`. An empty list matches everything.
    pub fn where_not_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_in(column.into(), collect_operands(values), true, Boolean::And)
    }

    /// Adds `or column not in (?, ...)`.
    pub fn or_where_not_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_in(column.into(), collect_operands(values), true, Boolean::Or)
    }

    fn add_in(mut self, column: Column, values: Vec<Operand>, negated: bool, boolean: Boolean) -> Self {
        self.query.bindings.extend(
            BindingCategory::Where,
            values.iter().filter_map(Operand::binding).cloned(),
        );
        self.query.wheres.push(WhereNode::In {
            column,
            values,
            negated,
            boolean,
        });
        self
    }

    /// Adds `column in (select ...)`, the sub-select built by `callback`.
    pub fn where_in_sub(self, column: impl Into<Column>, callback: impl FnOnce(Self) -> Self) -> Self {
        let sub = callback(self.for_sub_query());
        self.add_in_sub(column.into(), sub, false, Boolean::And)
    }

    /// Adds `or column in (select ...)`.
    pub fn or_where_in_sub(self, column: impl Into<Column>, callback: impl FnOnce(Self) -> Self) -> Self {
        let sub = callback(self.for_sub_query());
        self.add_in_sub(column.into(), sub, false, Boolean::Or)
    }

    /// Adds `column not in (select ...)`.
    pub fn where_not_in_sub(self, column: impl Into<Column>, callback: impl FnOnce(Self) -> Self) -> Self {
        let sub = callback(self.for_sub_query());
        self.add_in_sub(column.into(), sub, true, Boolean::And)
    }

    /// Adds `or column not in (select ...)`.
    pub fn or_where_not_in_sub(
        self,
        column: impl Into<Column>,
        callback: impl FnOnce(Self) -> Self,
    ) -> Self {
        let sub = callback(self.for_sub_query());
        self.add_in_sub(column.into(), sub, true, Boolean::Or)
    }

    /// Adds `column in (<query>)` for an already built query, merging its
    /// bindings.
    pub fn where_in_query(self, column: impl Into<Column>, query: Self) -> Self {
        self.add_in_sub(column.into(), query, false, Boolean::And)
    }

    /// Adds `column not in (<query>)`.
    pub fn where_not_in_query(self, column: impl Into<Column>, query: Self) -> Self {
        self.add_in_sub(column.into(), query, true, Boolean::And)
    }

    fn add_in_sub(mut self, column: Column, sub: Self, negated: bool, boolean: Boolean) -> Self {
        self.absorb(sub.invalid);
        self.query
            .bindings
            .extend(BindingCategory::Where, sub.query.bindings.flatten());
        self.query.wheres.push(WhereNode::InSub {
            column,
            query: Box::new(sub.query),
            negated,
            boolean,
        });
        self
    }

    /// Adds `column is null`.
    pub fn where_null(self, column: impl Into<Column>) -> Self {
        self.add_null(column.into(), false, Boolean::And)
    }

    /// Adds `or column is null`.
    pub fn or_where_null(self, column: impl Into<Column>) -> Self {
        self.add_null(column.into(), false, Boolean::Or)
    }

    /// Adds `column is not null`.
    pub fn where_not_null(self, column: impl Into<Column>) -> Self {
        self.add_null(column.into(), true, Boolean::And)
    }

    /// Adds `or column is not null`.
    pub fn or_where_not_null(self, column: impl Into<Column>) -> Self {
        self.add_null(column.into(), true, Boolean::Or)
    }

    fn add_null(mut self, column: Column, negated: bool, boolean: Boolean) -> Self {
        self.query.wheres.push(WhereNode::Null {
            column,
            negated,
            boolean,
        });
        self
    }

    /// Adds `column between ? and ?`.
    pub fn where_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.add_between(column.into(), low.into(), high.into(), false, Boolean::And)
    }

    /// Adds `or column between ? and ?`.
    pub fn or_where_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.add_between(column.into(), low.into(), high.into(), false, Boolean::Or)
    }

    /// Adds `column not between ? and ?`.
    pub fn where_not_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.add_between(column.into(), low.into(), high.into(), true, Boolean::And)
    }

    /// Adds `or column not between ? and ?`.
    pub fn or_where_not_between(
        self,
        column: impl Into<Column>,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Self {
        self.add_between(column.into(), low.into(), high.into(), true, Boolean::Or)
    }

    fn add_between(
        mut self,
        column: Column,
        low: Operand,
        high: Operand,
        negated: bool,
        boolean: Boolean,
    ) -> Self {
        self.query.bindings.extend(
            BindingCategory::Where,
            [&low, &high].into_iter().filter_map(Operand::binding).cloned(),
        );
        self.query.wheres.push(WhereNode::Between {
            column,
            low,
            high,
            negated,
            boolean,
        });
        self
    }

    /// Adds `first operator second`, comparing two columns.
    pub fn where_column(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_column(first.into(), operator, second.into(), Boolean::And)
    }

    /// Adds `or first operator second`.
    pub fn or_where_column(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_column(first.into(), operator, second.into(), Boolean::Or)
    }

    fn add_column(mut self, first: Column, operator: &str, second: Column, boolean: Boolean) -> Self {
        let (operator, second) = if is_operator(operator) {
            (operator.to_string(), second)
        } else {
            ("=".to_string(), Column::Name(operator.to_string()))
        };
        self.query.wheres.push(WhereNode::Column {
            first,
            operator,
            second,
            boolean,
        });
        self
    }

    /// Adds `date(column) operator ?`.
    pub fn where_date(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Date, column.into(), operator, value.into(), Boolean::And)
    }

    /// Adds `or date(column) operator ?`.
    pub fn or_where_date(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Date, column.into(), operator, value.into(), Boolean::Or)
    }

    /// Adds `time(column) operator ?`.
    pub fn where_time(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Time, column.into(), operator, value.into(), Boolean::And)
    }

    /// Adds `or time(column) operator ?`.
    pub fn or_where_time(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Time, column.into(), operator, value.into(), Boolean::Or)
    }

    /// Adds `day(column) operator ?`.
    pub fn where_day(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Day, column.into(), operator, value.into(), Boolean::And)
    }

    /// Adds `or day(column) operator ?`.
    pub fn or_where_day(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Day, column.into(), operator, value.into(), Boolean::Or)
    }

    /// Adds `month(column) operator ?`.
    pub fn where_month(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Month, column.into(), operator, value.into(), Boolean::And)
    }

    /// Adds `or month(column) operator ?`.
    pub fn or_where_month(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Month, column.into(), operator, value.into(), Boolean::Or)
    }

    /// Adds `year(column) operator ?`.
    pub fn where_year(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Year, column.into(), operator, value.into(), Boolean::And)
    }

    /// Adds `or year(column) operator ?`.
    pub fn or_where_year(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_date(DatePart::Year, column.into(), operator, value.into(), Boolean::Or)
    }

    fn add_date(
        mut self,
        part: DatePart,
        column: Column,
        operator: &str,
        value: Operand,
        boolean: Boolean,
    ) -> Self {
        let (operator, value) = match prepare_comparison(operator, value) {
            Ok(prepared) => prepared,
            Err(message) => return self.fail(message),
        };
        if let Some(v) = value.binding() {
            self.query.bindings.add(BindingCategory::Where, v.clone());
        }
        self.query.wheres.push(WhereNode::DatePart {
            part,
            column,
            operator,
            value,
            boolean,
        });
        self
    }

    /// Adds `exists (select ...)`, the sub-select built by `callback`.
    pub fn where_exists(self, callback: impl FnOnce(Self) -> Self) -> Self {
        self.add_exists(callback, false, Boolean::And)
    }

    /// Adds `or exists (select ...)`.
    pub fn or_where_exists(self, callback: impl FnOnce(Self) -> Self) -> Self {
        self.add_exists(callback, false, Boolean::Or)
    }

    /// Adds `not exists (select ...)`.
    pub fn where_not_exists(self, callback: impl FnOnce(Self) -> Self) -> Self {
        self.add_exists(callback, true, Boolean::And)
    }

    /// Adds `or not exists (select ...)`.
    pub fn or_where_not_exists(self, callback: impl FnOnce(Self) -> Self) -> Self {
        self.add_exists(callback, true, Boolean::Or)
    }

    fn add_exists(mut self, callback: impl FnOnce(Self) -> Self, negated: bool, boolean: Boolean) -> Self {
        let sub = callback(self.for_sub_query());
        self.absorb(sub.invalid);
        self.query
            .bindings
            .extend(BindingCategory::Where, sub.query.bindings.flatten());
        self.query.wheres.push(WhereNode::Exists {
            query: Box::new(sub.query),
            negated,
            boolean,
        });
        self
    }

    /// Adds a raw predicate with its own bindings.
    pub fn where_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.add_raw(sql, bindings, Boolean::And)
    }

    /// Adds `or <sql>`.
    pub fn or_where_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.add_raw(sql, bindings, Boolean::Or)
    }

    fn add_raw(mut self, sql: &str, bindings: Vec<Value>, boolean: Boolean) -> Self {
        self.query.bindings.extend(BindingCategory::Where, bindings);
        self.query.wheres.push(WhereNode::Raw {
            sql: sql.to_string(),
            boolean,
        });
        self
    }

    // ── Joins ───────────────────────────────────────────────────────

    /// Adds `inner join table on first operator second`.
    pub fn join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_join(JoinKind::Inner, table.into(), |join| join.on(first, operator, second))
    }

    /// Adds an inner join whose `on` clause is built by `callback`.
    pub fn join_on(self, table: impl Into<Column>, callback: impl FnOnce(JoinClause) -> JoinClause) -> Self {
        self.add_join(JoinKind::Inner, table.into(), callback)
    }

    /// Adds `inner join table on first operator ?`.
    pub fn join_where(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add_join(JoinKind::Inner, table.into(), |join| join.where_(first, operator, value))
    }

    /// Adds `left join table on first operator second`.
    pub fn left_join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_join(JoinKind::Left, table.into(), |join| join.on(first, operator, second))
    }

    /// Adds a left join whose `on` clause is built by `callback`.
    pub fn left_join_on(
        self,
        table: impl Into<Column>,
        callback: impl FnOnce(JoinClause) -> JoinClause,
    ) -> Self {
        self.add_join(JoinKind::Left, table.into(), callback)
    }

    /// Adds `left join table on first operator ?`.
    pub fn left_join_where(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add_join(JoinKind::Left, table.into(), |join| join.where_(first, operator, value))
    }

    /// Adds `right join table on first operator second`.
    pub fn right_join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_join(JoinKind::Right, table.into(), |join| join.on(first, operator, second))
    }

    /// Adds a right join whose `on` clause is built by `callback`.
    pub fn right_join_on(
        self,
        table: impl Into<Column>,
        callback: impl FnOnce(JoinClause) -> JoinClause,
    ) -> Self {
        self.add_join(JoinKind::Right, table.into(), callback)
    }

    /// Adds `right join table on first operator ?`.
    pub fn right_join_where(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add_join(JoinKind::Right, table.into(), |join| join.where_(first, operator, value))
    }

    /// Adds `cross join table`.
    pub fn cross_join(mut self, table: impl Into<Column>) -> Self {
        self.query.joins.push(JoinClause::new(JoinKind::Cross, table));
        self
    }

    /// Adds `inner join (<query>) as alias on first operator second`.
    pub fn join_sub(
        self,
        query: Self,
        alias: &str,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_join_sub(JoinKind::Inner, query, alias, first.into(), operator, second.into())
    }

    /// Adds `left join (<query>) as alias on first operator second`.
    pub fn left_join_sub(
        self,
        query: Self,
        alias: &str,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_join_sub(JoinKind::Left, query, alias, first.into(), operator, second.into())
    }

    /// Adds `right join (<query>) as alias on first operator second`.
    pub fn right_join_sub(
        self,
        query: Self,
        alias: &str,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_join_sub(JoinKind::Right, query, alias, first.into(), operator, second.into())
    }

    fn add_join_sub(
        mut self,
        kind: JoinKind,
        query: Self,
        alias: &str,
        first: Column,
        operator: &str,
        second: Column,
    ) -> Self {
        let grammar = self.connection.grammar();
        let expression = Expression::new(format!(
            "({}) as {}",
            grammar.compile_select(&query.query),
            grammar.wrap_table(&Column::from(alias))
        ));
        self.absorb(query.invalid);
        self.query
            .bindings
            .extend(BindingCategory::Join, query.query.bindings.flatten());
        self.add_join(kind, Column::Raw(expression), |join| join.on(first, operator, second))
    }

    fn add_join(
        mut self,
        kind: JoinKind,
        table: Column,
        callback: impl FnOnce(JoinClause) -> JoinClause,
    ) -> Self {
        let mut join = callback(JoinClause::new(kind, table));
        let (bindings, invalid) = join.take_bindings();
        self.absorb(invalid);
        self.query.bindings.extend(BindingCategory::Join, bindings);
        self.query.joins.push(join);
        self
    }

    // ── Grouping and having ─────────────────────────────────────────

    /// Adds `group by` columns.
    pub fn group_by<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.query.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Adds `having column operator ?`.
    pub fn having(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_having(column.into(), operator, value.into(), Boolean::And)
    }

    /// Adds `or column operator ?` to the having clause.
    pub fn or_having(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_having(column.into(), operator, value.into(), Boolean::Or)
    }

    fn add_having(mut self, column: Column, operator: &str, value: Operand, boolean: Boolean) -> Self {
        let (operator, value) = match prepare_comparison(operator, value) {
            Ok(prepared) => prepared,
            Err(message) => return self.fail(message),
        };
        if let Some(v) = value.binding() {
            self.query.bindings.add(BindingCategory::Having, v.clone());
        }
        self.query.havings.push(Having::Basic {
            column,
            operator,
            value,
            boolean,
        });
        self
    }

    /// Adds a raw having predicate with its own bindings.
    pub fn having_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.add_having_raw(sql, bindings, Boolean::And)
    }

    /// Adds `or <sql>` to the having clause.
    pub fn or_having_raw(self, sql: &str, bindings: Vec<Value>) -> Self {
        self.add_having_raw(sql, bindings, Boolean::Or)
    }

    fn add_having_raw(mut self, sql: &str, bindings: Vec<Value>, boolean: Boolean) -> Self {
        self.query.bindings.extend(BindingCategory::Having, bindings);
        self.query.havings.push(Having::Raw {
            sql: sql.to_string(),
            boolean,
        });
        self
    }

    // ── Ordering, limits, unions, locks ─────────────────────────────

    /// Adds `order by column direction`. Anything but `asc` sorts
    /// descending. After a union, orders the union as a whole.
    pub fn order_by(self, column: impl Into<Column>, direction: &str) -> Self {
        self.push_order(OrderClause::Column {
            column: column.into(),
            direction: Direction::parse(direction),
        })
    }

    /// Adds `order by column desc`.
    pub fn order_by_desc(self, column: impl Into<Column>) -> Self {
        self.order_by(column, "desc")
    }

    /// Orders newest first by `column`.
    pub fn latest(self, column: impl Into<Column>) -> Self {
        self.order_by(column, "desc")
    }

    /// Orders oldest first by `column`.
    pub fn oldest(self, column: impl Into<Column>) -> Self {
        self.order_by(column, "asc")
    }

    /// Orders by `RAND(seed)`.
    pub fn in_random_order(self, seed: &str) -> Self {
        self.order_by_raw(&Grammar::compile_random(seed), Vec::new())
    }

    /// Adds a raw `order by` fragment with its own bindings.
    pub fn order_by_raw(mut self, sql: &str, bindings: Vec<Value>) -> Self {
        let category = if self.query.has_unions() {
            BindingCategory::UnionOrder
        } else {
            BindingCategory::Order
        };
        self.query.bindings.extend(category, bindings);
        self.push_order(OrderClause::Raw {
            sql: sql.to_string(),
        })
    }

    fn push_order(mut self, order: OrderClause) -> Self {
        if self.query.has_unions() {
            self.query.union_orders.push(order);
        } else {
            self.query.orders.push(order);
        }
        self
    }

    /// Sets `limit`. Negative values are ignored.
    pub fn limit(mut self, value: i64) -> Self {
        if value >= 0 {
            let value = Some(value.unsigned_abs());
            if self.query.has_unions() {
                self.query.union_limit = value;
            } else {
                self.query.limit = value;
            }
        }
        self
    }

    /// Alias of [`limit`](Self::limit).
    pub fn take(self, value: i64) -> Self {
        self.limit(value)
    }

    /// Sets `offset`. Negative values count as zero.
    pub fn offset(mut self, value: i64) -> Self {
        let value = Some(value.max(0).unsigned_abs());
        if self.query.has_unions() {
            self.query.union_offset = value;
        } else {
            self.query.offset = value;
        }
        self
    }

    /// Alias of [`offset`](Self::offset).
    pub fn skip(self, value: i64) -> Self {
        self.offset(value)
    }

    /// Limits the query to page `page` (1-based) of `per_page` rows.
    pub fn for_page(self, page: i64, per_page: i64) -> Self {
        self.skip((page - 1) * per_page).take(per_page)
    }

    /// Adds `union (<query>)`.
    pub fn union(self, query: Self) -> Self {
        self.add_union(query, false)
    }

    /// Adds `union all (<query>)`.
    pub fn union_all(self, query: Self) -> Self {
        self.add_union(query, true)
    }

    fn add_union(mut self, query: Self, all: bool) -> Self {
        self.absorb(query.invalid);
        self.query
            .bindings
            .extend(BindingCategory::Union, query.query.bindings.flatten());
        self.query.unions.push(UnionClause {
            query: Box::new(query.query),
            all,
        });
        self
    }

    /// Locks the selected rows.
    pub fn lock(mut self, mode: LockMode) -> Self {
        self.query.lock = Some(mode);
        self
    }

    /// Appends `for update`.
    pub fn lock_for_update(self) -> Self {
        self.lock(LockMode::Update)
    }

    /// Appends `lock in share mode`.
    pub fn shared_lock(self) -> Self {
        self.lock(LockMode::Shared)
    }

    /// Applies `callback` only when `condition` holds.
    pub fn when(self, condition: bool, callback: impl FnOnce(Self) -> Self) -> Self {
        if condition {
            callback(self)
        } else {
            self
        }
    }

    // ── Bindings ────────────────────────────────────────────────────

    /// Adds a binding to the bucket named `category`.
    ///
    /// Unknown names fail immediately with a configuration error.
    pub fn add_binding(mut self, category: &str, value: impl Into<Value>) -> CuriaResult<Self> {
        self.query.bindings.add_named(category, value.into())?;
        Ok(self)
    }

    /// Appends every bucket of `other` to the matching bucket here.
    pub fn merge_bindings(mut self, other: &Self) -> Self {
        for category in BindingCategory::ALL {
            self.query
                .bindings
                .extend(category, other.query.bindings.get(category).to_vec());
        }
        self
    }

    /// Returns the bindings in placeholder order.
    pub fn get_bindings(&self) -> Vec<Value> {
        self.query.bindings.flatten()
    }

    /// Returns the bucketed bindings.
    pub fn raw_bindings(&self) -> &Bindings {
        &self.query.bindings
    }

    /// Returns a copy with the listed fields reset.
    pub fn clone_without(&self, fields: &[Field]) -> Self {
        Self {
            connection: Rc::clone(&self.connection),
            query: self.query.clone_without(fields),
            invalid: self.invalid.clone(),
        }
    }

    /// Returns a copy with the listed binding buckets emptied.
    pub fn clone_without_bindings(&self, categories: &[BindingCategory]) -> Self {
        Self {
            connection: Rc::clone(&self.connection),
            query: self.query.clone_without_bindings(categories),
            invalid: self.invalid.clone(),
        }
    }

    // ── Compilation ─────────────────────────────────────────────────

    /// Compiles the query to a `select` statement.
    pub fn to_sql(&self) -> CuriaResult<String> {
        self.check()?;
        Ok(self.grammar().compile_select(&self.query))
    }

    fn run_select(&self, query: &QuerySpec) -> CuriaResult<Vec<Row>> {
        self.check()?;
        let sql = self.grammar().compile_select(query);
        self.connection.select(&sql, &query.bindings.flatten())
    }

    fn missing(&self) -> CuriaError {
        CuriaError::DoesNotExist(format!(
            "No rows matched the query on {}.",
            self.query.table_name().unwrap_or("<no table>")
        ))
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Runs the query and returns every row.
    pub fn get(&self) -> CuriaResult<Vec<Row>> {
        self.run_select(&self.query)
    }

    /// Returns the first row.
    pub fn first(&self) -> CuriaResult<Option<Row>> {
        Ok(self.clone().take(1).get()?.into_iter().next())
    }

    /// Returns the first row, or [`CuriaError::DoesNotExist`].
    pub fn first_or_fail(&self) -> CuriaResult<Row> {
        self.first()?.ok_or_else(|| self.missing())
    }

    /// Returns the row whose `id` equals `id`.
    pub fn find(&self, id: impl Into<Value>) -> CuriaResult<Option<Row>> {
        self.clone().where_("id", "=", id.into()).first()
    }

    /// Like [`find`](Self::find), failing with [`CuriaError::DoesNotExist`].
    pub fn find_or_fail(&self, id: impl Into<Value>) -> CuriaResult<Row> {
        self.find(id)?.ok_or_else(|| self.missing())
    }

    /// Returns `column` of the first row.
    ///
    /// The select list and its bindings are replaced by `column`.
    pub fn value(&self, column: &str) -> CuriaResult<Option<Value>> {
        let mut query = self.clone();
        query.query = query
            .query
            .clone_without(&[Field::Columns])
            .clone_without_bindings(&[BindingCategory::Select]);
        let row = query.select([column]).first()?;
        Ok(row.and_then(|row| row.into_values().into_iter().next()))
    }

    fn select_for_pluck(&self, columns: &[&str]) -> CuriaResult<Vec<Row>> {
        if self.query.columns.is_some() {
            return self.get();
        }
        self.clone().select(columns.iter().copied()).get()
    }

    /// Returns `column` of every row.
    ///
    /// A table qualifier (`users.name`) or alias (`name as n`) is stripped
    /// from the name used to read each row.
    pub fn pluck(&self, column: &str) -> CuriaResult<Vec<Value>> {
        let rows = self.select_for_pluck(&[column])?;
        let name = strip_table_for_pluck(column);
        Ok(rows.iter().map(|row| read_plucked(row, name)).collect())
    }

    /// Returns `(key, column)` pairs for every row.
    pub fn pluck_with_key(&self, column: &str, key: &str) -> CuriaResult<Vec<(Value, Value)>> {
        let rows = self.select_for_pluck(&[column, key])?;
        let name = strip_table_for_pluck(column);
        let key = strip_table_for_pluck(key);
        Ok(rows
            .iter()
            .map(|row| (read_plucked(row, key), read_plucked(row, name)))
            .collect())
    }

    /// Joins `column` of every row with `glue`. NULLs become empty strings.
    pub fn implode(&self, column: &str, glue: &str) -> CuriaResult<String> {
        Ok(self
            .pluck(column)?
            .iter()
            .map(|value| match value {
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(glue))
    }

    /// Returns `true` if the query matches at least one row.
    pub fn exists(&self) -> CuriaResult<bool> {
        self.check()?;
        let sql = self.grammar().compile_exists(&self.query);
        let row = self.connection.select_one(&sql, &self.get_bindings())?;
        Ok(row
            .as_ref()
            .and_then(|row| row.get_value_ignore_case("exists"))
            .is_some_and(Value::is_truthy))
    }

    /// Returns `true` if the query matches no row.
    pub fn doesnt_exist(&self) -> CuriaResult<bool> {
        Ok(!self.exists()?)
    }

    /// Runs `function(columns)` over the query and returns the result.
    ///
    /// The select list and its bindings are dropped; without a `group by`
    /// the ordering is dropped too. The builder itself is left unchanged.
    pub fn aggregate(&self, function: &str, columns: &[&str]) -> CuriaResult<Option<Value>> {
        let mut query = self
            .query
            .clone_without(&[Field::Columns])
            .clone_without_bindings(&[BindingCategory::Select]);
        if query.groups.is_empty() {
            query.orders.clear();
            query.bindings.clear(BindingCategory::Order);
        }
        query.aggregate = Some(Aggregate {
            function: function.to_string(),
            columns: columns.iter().map(|column| Column::from(*column)).collect(),
        });

        let rows = self.run_select(&query)?;
        Ok(rows
            .first()
            .and_then(|row| row.get_value_ignore_case("aggregate"))
            .filter(|value| !value.is_null())
            .cloned())
    }

    /// Returns the number of matching rows.
    pub fn count(&self) -> CuriaResult<i64> {
        self.count_column("*")
    }

    /// Returns the number of non-null values of `column`.
    pub fn count_column(&self, column: &str) -> CuriaResult<i64> {
        match self.aggregate("count", &[column])? {
            Some(value) => i64::from_value(&value),
            None => Ok(0),
        }
    }

    /// Returns the smallest value of `column`.
    pub fn min(&self, column: &str) -> CuriaResult<Option<Value>> {
        self.aggregate("min", &[column])
    }

    /// Returns the largest value of `column`.
    pub fn max(&self, column: &str) -> CuriaResult<Option<Value>> {
        self.aggregate("max", &[column])
    }

    /// Returns the sum of `column`; `0` when no row matches.
    pub fn sum(&self, column: &str) -> CuriaResult<Value> {
        Ok(self.aggregate("sum", &[column])?.unwrap_or(Value::Int(0)))
    }

    /// Returns the average of `column`.
    pub fn avg(&self, column: &str) -> CuriaResult<Option<Value>> {
        self.aggregate("avg", &[column])
    }

    /// Alias of [`avg`](Self::avg).
    pub fn average(&self, column: &str) -> CuriaResult<Option<Value>> {
        self.avg(column)
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Inserts one record. An empty record is a no-op.
    pub fn insert<K, V>(&self, record: impl IntoIterator<Item = (K, V)>) -> CuriaResult<bool>
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        self.insert_records(vec![to_record(record)])
    }

    /// Inserts several records in one statement.
    ///
    /// Every record must have the same columns. An empty batch is a no-op.
    pub fn insert_batch<R, K, V>(&self, records: impl IntoIterator<Item = R>) -> CuriaResult<bool>
    where
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Operand>,
    {
        self.insert_records(records.into_iter().map(to_record).collect())
    }

    fn insert_records(&self, records: Vec<Record>) -> CuriaResult<bool> {
        self.check()?;
        if records.iter().all(Record::is_empty) {
            return Ok(true);
        }
        let sql = self.grammar().compile_insert(&self.query, &records)?;
        self.connection
            .insert(&sql, &Grammar::prepare_bindings_for_insert(&records))?;
        Ok(true)
    }

    /// Inserts one record and returns the generated id.
    ///
    /// An empty record has no id to return and fails with
    /// [`CuriaError::ValidationError`].
    pub fn insert_get_id<K, V>(
        &self,
        record: impl IntoIterator<Item = (K, V)>,
        sequence: Option<&str>,
    ) -> CuriaResult<i64>
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        self.check()?;
        let records = vec![to_record(record)];
        if records.iter().all(Record::is_empty) {
            return Err(CuriaError::validation("Cannot insert an empty record."));
        }
        let sql = self.grammar().compile_insert(&self.query, &records)?;
        self.connection
            .insert(&sql, &Grammar::prepare_bindings_for_insert(&records))?;
        self.connection.last_insert_id(sequence)
    }

    /// Updates the matching rows and returns the affected count.
    pub fn update<K, V>(&self, values: impl IntoIterator<Item = (K, V)>) -> CuriaResult<u64>
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        self.update_values(&to_pairs(values))
    }

    fn update_values(&self, values: &[(String, Operand)]) -> CuriaResult<u64> {
        self.check()?;
        if values.is_empty() {
            return Ok(0);
        }
        let sql = self.grammar().compile_update(&self.query, values)?;
        let bindings = Grammar::prepare_bindings_for_update(&self.query.bindings, values);
        self.connection.update(&sql, &bindings)
    }

    /// Updates the row matching `attributes`, or inserts `attributes` plus
    /// `values` when none matches.
    pub fn update_or_insert<K1, V1, K2, V2>(
        &self,
        attributes: impl IntoIterator<Item = (K1, V1)>,
        values: impl IntoIterator<Item = (K2, V2)>,
    ) -> CuriaResult<bool>
    where
        K1: Into<String>,
        V1: Into<Operand>,
        K2: Into<String>,
        V2: Into<Operand>,
    {
        let attributes = to_pairs(attributes);
        let values = to_pairs(values);
        let query = self.clone().where_map(attributes.clone());

        if query.doesnt_exist()? {
            let mut record: Record = attributes.into_iter().collect();
            record.extend(values);
            return self.insert_records(vec![record]);
        }
        Ok(query.take(1).update_values(&values)? > 0)
    }

    /// Adds `amount` to `column` on every matching row.
    pub fn increment(&self, column: &str, amount: impl Into<Value>) -> CuriaResult<u64> {
        self.adjust("increment", column, amount.into(), Vec::new())
    }

    /// Like [`increment`](Self::increment), also setting `extra` columns.
    pub fn increment_with<K, V>(
        &self,
        column: &str,
        amount: impl Into<Value>,
        extra: impl IntoIterator<Item = (K, V)>,
    ) -> CuriaResult<u64>
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        self.adjust("increment", column, amount.into(), to_pairs(extra))
    }

    /// Subtracts `amount` from `column` on every matching row.
    pub fn decrement(&self, column: &str, amount: impl Into<Value>) -> CuriaResult<u64> {
        self.adjust("decrement", column, amount.into(), Vec::new())
    }

    /// Like [`decrement`](Self::decrement), also setting `extra` columns.
    pub fn decrement_with<K, V>(
        &self,
        column: &str,
        amount: impl Into<Value>,
        extra: impl IntoIterator<Item = (K, V)>,
    ) -> CuriaResult<u64>
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        self.adjust("decrement", column, amount.into(), to_pairs(extra))
    }

    fn adjust(
        &self,
        method: &str,
        column: &str,
        amount: Value,
        extra: Vec<(String, Operand)>,
    ) -> CuriaResult<u64> {
        let numeric = match amount {
            Value::Int(_) => true,
            Value::Float(f) => f.is_finite(),
            _ => false,
        };
        if !numeric {
            return Err(CuriaError::ConfigurationError(format!(
                "Non-numeric value passed to {method} method."
            )));
        }
        let sign = if method == "increment" { "+" } else { "-" };
        let wrapped = self.grammar().wrap_str(column);
        let mut values = vec![(
            column.to_string(),
            Operand::Raw(Expression::new(format!("{wrapped} {sign} {amount}"))),
        )];
        for (key, value) in extra {
            match values.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => values.push((key, value)),
            }
        }
        self.update_values(&values)
    }

    /// Deletes the matching rows and returns the affected count.
    pub fn delete(&self) -> CuriaResult<u64> {
        self.check()?;
        let sql = self.grammar().compile_delete(&self.query)?;
        let bindings = Grammar::prepare_bindings_for_delete(&self.query.bindings);
        self.connection.delete(&sql, &bindings)
    }

    /// Deletes the row whose `<table>.id` equals `id`.
    pub fn delete_by_id(&self, id: impl Into<Value>) -> CuriaResult<u64> {
        let column = match self.query.table_name() {
            Some(table) => format!("{table}.id"),
            None => "id".to_string(),
        };
        self.clone().where_(column, "=", id.into()).delete()
    }

    /// Empties the table.
    pub fn truncate(&self) -> CuriaResult<()> {
        self.check()?;
        let sql = self.grammar().compile_truncate(&self.query)?;
        self.connection.statement(&sql, &[])?;
        Ok(())
    }
}

fn collect_operands<V: Into<Operand>>(values: impl IntoIterator<Item = V>) -> Vec<Operand> {
    values.into_iter().map(Into::into).collect()
}

fn to_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Vec<(String, Operand)>
where
    K: Into<String>,
    V: Into<Operand>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

fn to_record<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Record
where
    K: Into<String>,
    V: Into<Operand>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// `users.name` -> `name`, `name as n` -> `n`.
fn strip_table_for_pluck(column: &str) -> &str {
    if let Some(pos) = column.to_ascii_lowercase().rfind(" as ") {
        return &column[pos + 4..];
    }
    column.rsplit('.').next().unwrap_or(column)
}

fn read_plucked(row: &Row, column: &str) -> Value {
    row.get_value(column).cloned().unwrap_or(Value::Null)
}
