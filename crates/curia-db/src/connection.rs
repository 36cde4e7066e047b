//! The execution adapter boundary.
//!
//! A [`Connection`] runs compiled `(sql, bindings)` pairs against a database.
//! It is the only part of curia that talks to a live engine; everything above
//! it deals in [`QuerySpec`](crate::query::QuerySpec)s and SQL text.
//!
//! Connections are single-threaded and shared as `Rc<dyn Connection>`. The
//! [`ConnectionExt`] trait adds the builder entry points to such handles.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use curia_db::connection::{Connection, ConnectionExt};
//! use curia_db::testing::RecordingConnection;
//!
//! let conn: Rc<dyn Connection> = Rc::new(RecordingConnection::new());
//! let sql = conn.table("users").where_("active", "=", 1).to_sql().unwrap();
//! assert_eq!(sql, "select * from `users` where `active` = ?");
//! ```

use std::rc::Rc;

use curia_core::CuriaResult;

use crate::query::{Column, Expression, Grammar, QueryBuilder};
use crate::row::Row;
use crate::value::Value;

/// A database connection that executes compiled statements.
///
/// Values are bound by 1-based position: the n-th binding fills the n-th
/// `?` placeholder. Implementations never retry.
pub trait Connection {
    /// The name this connection is registered under.
    fn name(&self) -> &str;

    /// The driver name (`sqlite`, `mysql`, ...).
    fn driver_name(&self) -> &str;

    /// The grammar used to compile queries for this connection.
    fn grammar(&self) -> &Grammar;

    /// Runs a `select` and returns every row.
    fn select(&self, sql: &str, bindings: &[Value]) -> CuriaResult<Vec<Row>>;

    /// Runs a `select` and returns the first row, if any.
    fn select_one(&self, sql: &str, bindings: &[Value]) -> CuriaResult<Option<Row>> {
        Ok(self.select(sql, bindings)?.into_iter().next())
    }

    /// Runs a statement and returns the number of affected rows.
    fn statement(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64>;

    /// Runs an `insert`.
    fn insert(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.statement(sql, bindings)
    }

    /// Runs an `update`.
    fn update(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.affecting_statement(sql, bindings)
    }

    /// Runs a `delete`.
    fn delete(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.affecting_statement(sql, bindings)
    }

    /// Runs a statement whose affected-row count matters to the caller.
    fn affecting_statement(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.statement(sql, bindings)
    }

    /// Returns the id generated by the last insert on this connection.
    ///
    /// `sequence` names the id column or sequence for drivers that need it;
    /// the bundled drivers ignore it.
    fn last_insert_id(&self, sequence: Option<&str>) -> CuriaResult<i64>;

    /// Starts a transaction, or a savepoint inside an open one.
    fn begin_transaction(&self) -> CuriaResult<()>;

    /// Commits the innermost transaction level.
    fn commit(&self) -> CuriaResult<()>;

    /// Rolls back the innermost transaction level.
    fn rollback(&self) -> CuriaResult<()>;

    /// The current transaction nesting depth (0 outside a transaction).
    fn transaction_level(&self) -> u32;
}

/// Builder entry points for shared connection handles.
pub trait ConnectionExt {
    /// Starts a query against `table`.
    fn table(&self, table: impl Into<Column>) -> QueryBuilder;

    /// Starts a query with no table.
    fn query(&self) -> QueryBuilder;

    /// Wraps raw SQL so it is emitted verbatim.
    fn raw(&self, sql: impl Into<String>) -> Expression;
}

impl ConnectionExt for Rc<dyn Connection> {
    fn table(&self, table: impl Into<Column>) -> QueryBuilder {
        QueryBuilder::new(Rc::clone(self)).from(table)
    }

    fn query(&self) -> QueryBuilder {
        QueryBuilder::new(Rc::clone(self))
    }

    fn raw(&self, sql: impl Into<String>) -> Expression {
        Expression::new(sql)
    }
}
