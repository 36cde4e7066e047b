//! SQLite execution adapter using `rusqlite`.
//!
//! [`SqliteConnection`] owns one `rusqlite::Connection` and runs every
//! statement on the calling thread. SQLite accepts the backtick-quoted
//! identifiers the grammar emits, so compiled queries run unchanged, with
//! the exception of MySQL-only syntax (`truncate table`, parenthesized
//! union members, `RAND()`, date-part functions, `lock in share mode`).
//!
//! Features:
//! - WAL mode enabled for file-based databases
//! - In-memory database support via `:memory:` (great for testing)
//! - Foreign key enforcement on

use std::path::PathBuf;

use curia_core::logging::query_span;
use curia_core::{ConnectionSettings, CuriaError, CuriaResult};
use curia_db::{Connection, Grammar, Row, TransactionManager, Value};
use rusqlite::types::ValueRef;

/// A connection to one SQLite database.
pub struct SqliteConnection {
    name: String,
    path: PathBuf,
    conn: rusqlite::Connection,
    grammar: Grammar,
    transactions: TransactionManager,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("transaction_level", &self.transactions.level())
            .finish_non_exhaustive()
    }
}

impl SqliteConnection {
    /// Opens the database named by `settings.database`.
    ///
    /// If the database is `:memory:`, an in-memory database is created.
    ///
    /// # Errors
    ///
    /// Returns [`CuriaError::OperationalError`] if the database cannot be
    /// opened or configured.
    pub fn open(name: &str, settings: &ConnectionSettings) -> CuriaResult<Self> {
        let path = PathBuf::from(&settings.database);
        let in_memory = settings.database == ":memory:";
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| CuriaError::OperationalError(format!("SQLite open failed: {e}")))?;

        let pragmas = if in_memory {
            "PRAGMA foreign_keys=ON;"
        } else {
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;"
        };
        conn.execute_batch(pragmas)
            .map_err(|e| CuriaError::OperationalError(format!("Failed to set pragmas: {e}")))?;

        tracing::debug!(connection = name, path = %path.display(), "opened SQLite database");
        Ok(Self {
            name: name.to_string(),
            path,
            conn,
            grammar: Grammar::with_table_prefix(settings.prefix.clone()),
            transactions: TransactionManager::new(),
        })
    }

    /// Opens an in-memory database named `default`.
    pub fn memory() -> CuriaResult<Self> {
        Self::open("default", &ConnectionSettings::sqlite_memory())
    }

    /// Returns the database file path (`:memory:` for in-memory databases).
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Runs one or more `;`-separated statements without bindings.
    ///
    /// Meant for schema setup; DDL is outside what the builder compiles.
    pub fn execute_batch(&self, sql: &str) -> CuriaResult<()> {
        let span = query_span(&self.name, "batch");
        let _guard = span.enter();
        tracing::debug!(sql, "running batch");
        self.conn.execute_batch(sql).map_err(map_error)
    }

    fn run_statement(&self, kind: &str, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        let span = query_span(&self.name, kind);
        let _guard = span.enter();
        tracing::debug!(sql, bindings = bindings.len(), "running statement");

        let mut stmt = self.conn.prepare(sql).map_err(map_error)?;
        bind_params(&mut stmt, bindings)?;
        let count = stmt.raw_execute().map_err(map_error)?;
        Ok(count as u64)
    }
}

/// Binds values to `?` placeholders by 1-based position.
fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> CuriaResult<()> {
    for (i, param) in params.iter().enumerate() {
        let idx = i + 1;
        match param {
            Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
            Value::Bool(b) => stmt.raw_bind_parameter(idx, i64::from(*b)),
            Value::Int(v) => stmt.raw_bind_parameter(idx, v),
            Value::Float(v) => stmt.raw_bind_parameter(idx, v),
            Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
            Value::Bytes(b) => stmt.raw_bind_parameter(idx, b.as_slice()),
            other => stmt.raw_bind_parameter(idx, other.to_string()),
        }
        .map_err(|e| CuriaError::DatabaseError(format!("Bind error: {e}")))?;
    }
    Ok(())
}

fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> CuriaResult<Row> {
    let values = (0..column_names.len())
        .map(|i| {
            let value = match sqlite_row.get_ref(i).map_err(map_error)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Int(v),
                ValueRef::Real(v) => Value::Float(v),
                ValueRef::Text(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
                ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
            };
            Ok(value)
        })
        .collect::<CuriaResult<Vec<_>>>()?;
    Ok(Row::new(column_names.to_vec(), values))
}

fn map_error(e: rusqlite::Error) -> CuriaError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            CuriaError::IntegrityError(e.to_string())
        }
        other => CuriaError::DatabaseError(other.to_string()),
    }
}

impl Connection for SqliteConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver_name(&self) -> &str {
        "sqlite"
    }

    fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn select(&self, sql: &str, bindings: &[Value]) -> CuriaResult<Vec<Row>> {
        let span = query_span(&self.name, "select");
        let _guard = span.enter();
        tracing::debug!(sql, bindings = bindings.len(), "running select");

        let mut stmt = self.conn.prepare(sql).map_err(map_error)?;
        let column_names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        bind_params(&mut stmt, bindings)?;

        let mut raw_rows = stmt.raw_query();
        let mut rows = Vec::new();
        while let Some(row) = raw_rows.next().map_err(map_error)? {
            rows.push(convert_row(row, &column_names)?);
        }
        Ok(rows)
    }

    fn statement(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.run_statement("statement", sql, bindings)
    }

    fn insert(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.run_statement("insert", sql, bindings)
    }

    fn update(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.run_statement("update", sql, bindings)
    }

    fn delete(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.run_statement("delete", sql, bindings)
    }

    fn last_insert_id(&self, _sequence: Option<&str>) -> CuriaResult<i64> {
        Ok(self.conn.last_insert_rowid())
    }

    fn begin_transaction(&self) -> CuriaResult<()> {
        self.transactions
            .begin(|sql| self.run_statement("transaction", sql, &[]).map(|_| ()))
    }

    fn commit(&self) -> CuriaResult<()> {
        self.transactions
            .commit(|sql| self.run_statement("transaction", sql, &[]).map(|_| ()))
    }

    fn rollback(&self) -> CuriaResult<()> {
        self.transactions
            .rollback(|sql| self.run_statement("transaction", sql, &[]).map(|_| ()))
    }

    fn transaction_level(&self) -> u32 {
        self.transactions.level()
    }
}
