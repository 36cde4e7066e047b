//! # curia-db-backends
//!
//! Execution adapters for curia. Each adapter implements
//! [`curia_db::Connection`] for one database engine and compiles with the
//! MySQL-dialect [`Grammar`](curia_db::Grammar), configured with the
//! connection's table prefix.
//!
//! Supported drivers:
//! - `SQLite` via `rusqlite` (feature `sqlite`, on by default)
//! - `MySQL` via `mysql_async` (feature `mysql`)
//!
//! [`connect`] opens an adapter from [`ConnectionSettings`](curia_core::ConnectionSettings)
//! and is the connector handed to [`DatabaseManager`](curia_db::DatabaseManager).

#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]

pub mod base;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use base::{connect, manager, supported_drivers};
#[cfg(feature = "mysql")]
pub use mysql::MySqlConnection;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;
