//! Transaction scopes.
//!
//! [`TransactionManager`] tracks the nesting depth of one connection and
//! decides which statement opens, commits or rolls back each level: the
//! outermost level uses `BEGIN`/`COMMIT`/`ROLLBACK`, inner levels use
//! savepoints named `trans<N>`. Connection implementations own one manager
//! and hand it a closure that runs the chosen statement.
//!
//! [`transaction()`] is the entry point for callers: it runs a unit of work
//! inside a scope, commits when the work succeeds and rolls back when it
//! fails or panics.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use curia_db::connection::{Connection, ConnectionExt};
//! use curia_db::testing::RecordingConnection;
//! use curia_db::transactions::transaction;
//!
//! let recorder = Rc::new(RecordingConnection::new());
//! let conn: Rc<dyn Connection> = recorder.clone();
//!
//! transaction(&conn, |conn| {
//!     conn.table("accounts").where_("id", "=", 1).decrement("balance", 10)?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(recorder.sql_log().first().map(String::as_str), Some("BEGIN"));
//! assert_eq!(recorder.sql_log().last().map(String::as_str), Some("COMMIT"));
//! ```

use std::cell::Cell;
use std::rc::Rc;

use curia_core::{CuriaError, CuriaResult};

use crate::connection::Connection;

/// Transaction depth bookkeeping for a single connection.
#[derive(Debug, Default)]
pub struct TransactionManager {
    /// 0 = no transaction, 1 = outermost, 2+ = savepoint.
    level: Cell<u32>,
}

impl TransactionManager {
    /// Creates a manager outside any transaction.
    pub const fn new() -> Self {
        Self {
            level: Cell::new(0),
        }
    }

    /// Returns the current nesting depth.
    pub fn level(&self) -> u32 {
        self.level.get()
    }

    /// Opens a transaction, or a savepoint when one is already open.
    ///
    /// The depth only changes if `run` succeeds.
    pub fn begin(&self, run: impl FnOnce(&str) -> CuriaResult<()>) -> CuriaResult<()> {
        let level = self.level.get();
        let sql = if level == 0 {
            "BEGIN".to_string()
        } else {
            format!("SAVEPOINT trans{}", level + 1)
        };
        run(&sql)?;
        self.level.set(level + 1);
        Ok(())
    }

    /// Commits the transaction, or releases the innermost savepoint.
    pub fn commit(&self, run: impl FnOnce(&str) -> CuriaResult<()>) -> CuriaResult<()> {
        let level = self.level.get();
        let sql = match level {
            0 => {
                return Err(CuriaError::DatabaseError(
                    "Cannot commit: not in a transaction".to_string(),
                ))
            }
            1 => "COMMIT".to_string(),
            n => format!("RELEASE SAVEPOINT trans{n}"),
        };
        run(&sql)?;
        self.level.set(level - 1);
        Ok(())
    }

    /// Rolls back the transaction, or the innermost savepoint.
    ///
    /// The depth drops before the statement runs: a level whose rollback
    /// failed is not retried.
    pub fn rollback(&self, run: impl FnOnce(&str) -> CuriaResult<()>) -> CuriaResult<()> {
        let level = self.level.get();
        let sql = match level {
            0 => {
                return Err(CuriaError::DatabaseError(
                    "Cannot rollback: not in a transaction".to_string(),
                ))
            }
            1 => "ROLLBACK".to_string(),
            n => format!("ROLLBACK TO SAVEPOINT trans{n}"),
        };
        self.level.set(level - 1);
        run(&sql)
    }
}

/// Rolls back on drop unless disarmed.
struct RollbackGuard<'a> {
    connection: &'a Rc<dyn Connection>,
    armed: bool,
}

impl RollbackGuard<'_> {
    fn rollback(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        if let Err(err) = self.connection.rollback() {
            tracing::warn!(
                connection = self.connection.name(),
                error = %err,
                "rollback failed"
            );
        }
    }
}

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        self.rollback();
    }
}

/// Runs `work` inside a transaction scope on `connection`.
///
/// Commits when `work` returns `Ok`. When it returns `Err` the scope is
/// rolled back and the original error is returned; a rollback failure is
/// logged, not reported. A panic inside `work` also rolls back. Nested
/// calls use savepoints.
pub fn transaction<T>(
    connection: &Rc<dyn Connection>,
    work: impl FnOnce(&Rc<dyn Connection>) -> CuriaResult<T>,
) -> CuriaResult<T> {
    connection.begin_transaction()?;
    let mut guard = RollbackGuard {
        connection,
        armed: true,
    };

    match work(connection) {
        Ok(value) => {
            connection.commit()?;
            guard.armed = false;
            Ok(value)
        }
        Err(err) => {
            guard.rollback();
            Err(err)
        }
    }
}
