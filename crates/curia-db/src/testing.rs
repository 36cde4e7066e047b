//! A recording stub connection for tests.
//!
//! [`RecordingConnection`] never talks to a database. It records every
//! statement it is asked to run together with its bindings, answers selects
//! from a queue of scripted result sets, and reports a configurable
//! affected-row count. Use it to assert on the exact SQL a builder produces.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use curia_core::CuriaResult;

use crate::connection::Connection;
use crate::query::Grammar;
use crate::row::Row;
use crate::transactions::TransactionManager;
use crate::value::Value;

/// A recorded statement: its SQL text and flattened bindings.
pub type Statement = (String, Vec<Value>);

/// A stub [`Connection`] that records statements instead of running them.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use curia_db::connection::{Connection, ConnectionExt};
/// use curia_db::row::Row;
/// use curia_db::testing::RecordingConnection;
/// use curia_db::value::Value;
///
/// let recorder = Rc::new(RecordingConnection::new());
/// recorder.push_rows(vec![Row::from_pairs([("aggregate", Value::Int(3))])]);
///
/// let conn: Rc<dyn Connection> = recorder.clone();
/// assert_eq!(conn.table("users").count().unwrap(), 3);
/// assert_eq!(
///     recorder.sql_log(),
///     vec!["select count(*) as aggregate from `users`"]
/// );
/// ```
#[derive(Debug)]
pub struct RecordingConnection {
    name: String,
    grammar: Grammar,
    log: RefCell<Vec<Statement>>,
    results: RefCell<VecDeque<Vec<Row>>>,
    affected: Cell<u64>,
    next_id: Cell<i64>,
    transactions: TransactionManager,
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingConnection {
    /// Creates a recorder named `default` with no table prefix.
    pub fn new() -> Self {
        Self::with_grammar("default", Grammar::new())
    }

    /// Creates a recorder whose grammar applies `prefix` to table names.
    pub fn with_table_prefix(prefix: &str) -> Self {
        Self::with_grammar("default", Grammar::with_table_prefix(prefix))
    }

    /// Creates a recorder with an explicit name and grammar.
    pub fn with_grammar(name: &str, grammar: Grammar) -> Self {
        Self {
            name: name.to_string(),
            grammar,
            log: RefCell::new(Vec::new()),
            results: RefCell::new(VecDeque::new()),
            affected: Cell::new(1),
            next_id: Cell::new(0),
            transactions: TransactionManager::new(),
        }
    }

    /// Queues the result set returned by the next `select`.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.results.borrow_mut().push_back(rows);
    }

    /// Sets the affected-row count reported by every statement.
    pub fn set_affected(&self, affected: u64) {
        self.affected.set(affected);
    }

    /// Returns every recorded statement, oldest first.
    pub fn statements(&self) -> Vec<Statement> {
        self.log.borrow().clone()
    }

    /// Returns the most recent statement.
    pub fn last_statement(&self) -> Option<Statement> {
        self.log.borrow().last().cloned()
    }

    /// Returns the SQL of every recorded statement.
    pub fn sql_log(&self) -> Vec<String> {
        self.log.borrow().iter().map(|(sql, _)| sql.clone()).collect()
    }

    /// Forgets every recorded statement.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    fn record(&self, sql: &str, bindings: &[Value]) {
        self.log.borrow_mut().push((sql.to_string(), bindings.to_vec()));
    }
}

impl Connection for RecordingConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver_name(&self) -> &str {
        "recording"
    }

    fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn select(&self, sql: &str, bindings: &[Value]) -> CuriaResult<Vec<Row>> {
        self.record(sql, bindings);
        Ok(self.results.borrow_mut().pop_front().unwrap_or_default())
    }

    fn statement(&self, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        self.record(sql, bindings);
        Ok(self.affected.get())
    }

    fn last_insert_id(&self, _sequence: Option<&str>) -> CuriaResult<i64> {
        self.next_id.set(self.next_id.get() + 1);
        Ok(self.next_id.get())
    }

    fn begin_transaction(&self) -> CuriaResult<()> {
        self.transactions.begin(|sql| {
            self.record(sql, &[]);
            Ok(())
        })
    }

    fn commit(&self) -> CuriaResult<()> {
        self.transactions.commit(|sql| {
            self.record(sql, &[]);
            Ok(())
        })
    }

    fn rollback(&self) -> CuriaResult<()> {
        self.transactions.rollback(|sql| {
            self.record(sql, &[]);
            Ok(())
        })
    }

    fn transaction_level(&self) -> u32 {
        self.transactions.level()
    }
}

/// Substitutes each `?` in `sql` with the matching binding, in order.
///
/// Strings are single-quoted; a `?` with no binding left is kept as is.
/// Meant for reading test output, not for building executable SQL.
pub fn interpolate(sql: &str, bindings: &[Value]) -> String {
    let mut values = bindings.iter();
    let mut out = String::with_capacity(sql.len());
    for ch in sql.chars() {
        if ch != '?' {
            out.push(ch);
            continue;
        }
        match values.next() {
            Some(Value::Null) => out.push_str("NULL"),
            Some(value) if value.is_numeric() => out.push_str(&value.to_string()),
            Some(value) => out.push_str(&format!("'{value}'")),
            None => out.push('?'),
        }
    }
    out
}
