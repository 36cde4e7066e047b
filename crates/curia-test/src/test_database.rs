//! Test database utilities for curia.
//!
//! Provides [`TestDatabase`], an in-memory SQLite database for use in tests.
//! Every query and write run through it is counted and logged, so tests can
//! assert how many statements an operation issued (see
//! [`assert_num_queries`](crate::assert_num_queries)).
//!
//! ## Example
//!
//! ```
//! use curia_test::TestDatabase;
//!
//! let db = TestDatabase::new();
//! db.execute_raw("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
//!     .unwrap();
//! db.table("users").insert([("name", "Ann")]).unwrap();
//! assert_eq!(db.table("users").count().unwrap(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use curia_core::{ConnectionSettings, CuriaResult, DatabaseSection};
use curia_db::{Connection, ConnectionExt, DatabaseManager, Grammar, QueryBuilder, Row, Value};
use curia_db_backends::SqliteConnection;

/// Wraps a [`SqliteConnection`] and counts the statements it runs.
///
/// Transaction control statements are not counted.
struct CountingConnection {
    inner: SqliteConnection,
    count: Cell<usize>,
    log: RefCell<Vec<String>>,
}

impl CountingConnection {
    fn record(&self, sql: &str) {
        self.count.set(self.count.get() + 1);
        self.log.borrow_mut().push(sql.to_string());
    }
}

impl Connection for CountingConnection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn driver_name(&self) -> &str {
        self.inner.driver_name()
    }

    fn grammar(&self) -> &Grammar {
        self.inner.grammar()
    }

    fn select(&self, sql: &str, bindings: &[Value]) -> CuriaResult<Vec<Row>> {
        self.record(sql);
        self.inner.select(sql, bindings)
    }

    fn statement(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.record(sql);
        self.inner.statement(sql, bindings)
    }

    fn insert(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.record(sql);
        self.inner.insert(sql, bindings)
    }

    fn update(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.record(sql);
        self.inner.update(sql, bindings)
    }

    fn delete(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.record(sql);
        self.inner.delete(sql, bindings)
    }

    fn last_insert_id(&self, sequence: Option<&str>) -> CuriaResult<i64> {
        self.inner.last_insert_id(sequence)
    }

    fn begin_transaction(&self) -> CuriaResult<()> {
        self.inner.begin_transaction()
    }

    fn commit(&self) -> CuriaResult<()> {
        self.inner.commit()
    }

    fn rollback(&self) -> CuriaResult<()> {
        self.inner.rollback()
    }

    fn transaction_level(&self) -> u32 {
        self.inner.transaction_level()
    }
}

/// An in-memory SQLite database for testing.
///
/// The database is created fresh in memory for each `TestDatabase::new()`
/// call, providing complete test isolation. Clones share the database and
/// the counter.
#[derive(Clone)]
pub struct TestDatabase {
    conn: Rc<CountingConnection>,
}

impl std::fmt::Debug for TestDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDatabase")
            .field("query_count", &self.query_count())
            .finish_non_exhaustive()
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDatabase {
    /// Creates a new in-memory SQLite test database.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory database cannot be created.
    pub fn new() -> Self {
        Self::with_settings(&ConnectionSettings::sqlite_memory())
    }

    /// Creates a test database whose grammar applies `prefix` to table names.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory database cannot be created.
    pub fn with_prefix(prefix: &str) -> Self {
        Self::with_settings(&ConnectionSettings::sqlite_memory().with_prefix(prefix))
    }

    fn with_settings(settings: &ConnectionSettings) -> Self {
        let inner = SqliteConnection::open("default", settings)
            .expect("Failed to create in-memory SQLite database");
        Self {
            conn: Rc::new(CountingConnection {
                inner,
                count: Cell::new(0),
                log: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Returns a shared handle to the counting connection.
    pub fn connection(&self) -> Rc<dyn Connection> {
        self.conn.clone()
    }

    /// Starts a query against `table`.
    pub fn table(&self, table: &str) -> QueryBuilder {
        self.connection().table(table)
    }

    /// Returns a [`DatabaseManager`] whose default connection is this
    /// database. Other names fail to open.
    pub fn manager(&self) -> DatabaseManager {
        let manager = DatabaseManager::new(DatabaseSection::default(), |name, _| {
            Err(curia_core::CuriaError::ConfigurationError(format!(
                "Test database cannot open connection [{name}]."
            )))
        });
        manager.add_connection("default", self.connection());
        manager
    }

    /// Runs one or more `;`-separated statements with no bindings.
    ///
    /// Counts as a single query.
    pub fn execute_raw(&self, sql: &str) -> CuriaResult<()> {
        self.conn.record(sql);
        self.conn.inner.execute_batch(sql)
    }

    /// Drops all user-created tables in the database.
    ///
    /// Does not touch the query counter.
    pub fn teardown(&self) -> CuriaResult<()> {
        let rows = self.conn.inner.select(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            &[],
        )?;
        for row in &rows {
            let table_name: String = row.get("name")?;
            self.conn
                .inner
                .execute_batch(&format!("DROP TABLE IF EXISTS \"{table_name}\""))?;
        }
        tracing::debug!(tables = rows.len(), "dropped test tables");
        Ok(())
    }

    /// Returns the current query count.
    pub fn query_count(&self) -> usize {
        self.conn.count.get()
    }

    /// Returns the SQL of every counted statement, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.conn.log.borrow().clone()
    }

    /// Resets the query counter and log.
    pub fn reset_query_count(&self) {
        self.conn.count.set(0);
        self.conn.log.borrow_mut().clear();
    }
}
