//! # curia-db
//!
//! The query pipeline of curia: a fluent [`QueryBuilder`](query::QueryBuilder)
//! assembles a [`QuerySpec`](query::QuerySpec), the
//! [`Grammar`](query::Grammar) compiles it to MySQL-dialect SQL with `?`
//! placeholders, and the [`Bindings`](query::Bindings) accumulator keeps the
//! parameter values in placeholder order. A [`Connection`](connection::Connection)
//! runs the result.
//!
//! ## Module Overview
//!
//! - [`value`] - the backend-agnostic [`Value`](value::Value) enum
//! - [`row`] - result rows and typed column access
//! - [`query`] - expressions, bindings, nodes, `QuerySpec`, grammar and builder
//! - [`connection`] - the execution adapter contract
//! - [`transactions`] - transaction scopes and savepoints
//! - [`manager`] - the named connection registry
//! - [`model`] - the [`Model`](model::Model) trait
//! - [`testing`] - a recording stub connection

// These clippy lints are intentionally allowed for the query crate:
// - too_many_lines: the grammar's where compiler is one large match
// - result_large_err: CuriaError is the crate-wide error type
// - format_push_string: format! with push_str reads better for SQL generation
// - doc_markdown: SQL keywords in docs are not code items
// - needless_pass_by_value: builder methods take owned arguments for chaining
// - return_self_not_must_use: builder pattern methods are self-documenting
#![allow(clippy::too_many_lines)]
#![allow(clippy::result_large_err)]
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::should_implement_trait)]

pub mod connection;
pub mod manager;
pub mod model;
pub mod query;
pub mod row;
pub mod testing;
pub mod transactions;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use connection::{Connection, ConnectionExt};
pub use manager::DatabaseManager;
pub use model::Model;
pub use query::{
    BindingCategory, Bindings, Column, Expression, Grammar, JoinClause, LockMode, Operand,
    QueryBuilder, QuerySpec,
};
pub use row::{FromValue, Row};
pub use transactions::{transaction, TransactionManager};
pub use value::Value;
