//! # curia
//!
//! A fluent SQL query builder. Queries are assembled with a chainable
//! [`QueryBuilder`](db::QueryBuilder), compiled to MySQL-dialect SQL with
//! positional `?` placeholders, and run through a
//! [`Connection`](db::Connection).
//!
//! This is the meta-crate that re-exports all sub-crates for convenient
//! access.
//!
//! ```
//! use curia::prelude::*;
//!
//! let db = curia::open(&Settings::default());
//! let query = db.table("users").unwrap().where_("age", ">", 18).order_by("name", "asc");
//! assert_eq!(
//!     query.to_sql().unwrap(),
//!     "select * from `users` where `age` > ? order by `name` asc"
//! );
//! ```

#![allow(clippy::result_large_err)]

/// Error types, settings, and logging setup.
pub use curia_core as core;

/// Values, rows, the query builder, the grammar, and the connection contract.
pub use curia_db as db;

/// Execution adapters: `SQLite` and `MySQL`.
pub use curia_db_backends as db_backends;

/// Testing utilities.
#[cfg(feature = "testing")]
pub use curia_test as test;

use curia_core::Settings;
use curia_db::DatabaseManager;

/// Commonly used types.
pub mod prelude {
    pub use curia_core::{ConnectionSettings, CuriaError, CuriaResult, DatabaseSection, Settings};
    pub use curia_db::{
        transaction, Connection, ConnectionExt, DatabaseManager, Expression, Model, QueryBuilder,
        Row, Value,
    };
}

/// Installs logging from `settings` and returns a connection registry over
/// its `[database]` section.
///
/// Connections open lazily, so a misconfigured connection surfaces on first
/// use rather than here.
pub fn open(settings: &Settings) -> DatabaseManager {
    curia_core::logging::setup_logging(settings);
    let names = settings.database.connections.len();
    tracing::info!(default = %settings.database.default, connections = names, "database registry ready");
    curia_db_backends::manager(settings.database.clone())
}
