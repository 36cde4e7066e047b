//! MySQL execution adapter using `mysql_async`.
//!
//! [`MySqlConnection`] holds a single `mysql_async::Conn` and a private
//! current-thread `tokio` runtime that drives it, so callers stay
//! synchronous. One connection (rather than a pool) keeps transaction
//! statements and `last_insert_id` on the same session.
//!
//! Statements without bindings go over the text protocol; statements with
//! bindings are prepared and executed with positional parameters.

use std::cell::{RefCell, RefMut};

use curia_core::logging::query_span;
use curia_core::{ConnectionSettings, CuriaError, CuriaResult};
use curia_db::{Connection, Grammar, Row, TransactionManager, Value};
use mysql_async::prelude::Queryable;

/// A synchronous connection to one MySQL database.
pub struct MySqlConnection {
    name: String,
    runtime: tokio::runtime::Runtime,
    conn: RefCell<Option<mysql_async::Conn>>,
    grammar: Grammar,
    transactions: TransactionManager,
}

impl std::fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnection")
            .field("name", &self.name)
            .field("transaction_level", &self.transactions.level())
            .finish_non_exhaustive()
    }
}

impl MySqlConnection {
    /// Connects using the host, port, credentials and database in
    /// `settings`. Empty host and zero port fall back to `localhost:3306`.
    ///
    /// # Errors
    ///
    /// Returns [`CuriaError::OperationalError`] if the runtime cannot be
    /// created or the server cannot be reached.
    pub fn connect(name: &str, settings: &ConnectionSettings) -> CuriaResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CuriaError::OperationalError(format!("Failed to start runtime: {e}")))?;

        let conn = runtime
            .block_on(mysql_async::Conn::new(opts_from_settings(settings)))
            .map_err(|e| CuriaError::OperationalError(format!("MySQL connection error: {e}")))?;

        tracing::debug!(connection = name, host = %settings.host, database = %settings.database, "connected to MySQL");
        Ok(Self {
            name: name.to_string(),
            runtime,
            conn: RefCell::new(Some(conn)),
            grammar: Grammar::with_table_prefix(settings.prefix.clone()),
            transactions: TransactionManager::new(),
        })
    }

    fn conn(&self) -> CuriaResult<RefMut<'_, mysql_async::Conn>> {
        RefMut::filter_map(self.conn.borrow_mut(), Option::as_mut)
            .map_err(|_| CuriaError::OperationalError("MySQL connection is closed".to_string()))
    }

    fn run_statement(&self, kind: &str, sql: &str, bindings: &[Value]) -> CuriaResult<u64> {
        let span = query_span(&self.name, kind);
        let _guard = span.enter();
        tracing::debug!(sql, bindings = bindings.len(), "running statement");

        let mut conn = self.conn()?;
        let result = if bindings.is_empty() {
            self.runtime.block_on(conn.query_drop(sql))
        } else {
            self.runtime
                .block_on(conn.exec_drop(sql, values_to_params(bindings)))
        };
        result.map_err(map_error)?;
        Ok(conn.affected_rows())
    }
}

impl Drop for MySqlConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            if let Err(e) = self.runtime.block_on(conn.disconnect()) {
                tracing::warn!(connection = %self.name, error = %e, "failed to close MySQL connection");
            }
        }
    }
}

fn opts_from_settings(settings: &ConnectionSettings) -> mysql_async::OptsBuilder {
    let host = if settings.host.is_empty() {
        "localhost"
    } else {
        settings.host.as_str()
    };
    let port = if settings.port == 0 { 3306 } else { settings.port };
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    mysql_async::OptsBuilder::default()
        .ip_or_hostname(host)
        .tcp_port(port)
        .user(non_empty(&settings.username))
        .pass(non_empty(&settings.password))
        .db_name(non_empty(&settings.database))
}

/// Converts curia values to `mysql_async` parameter values.
fn values_to_params(params: &[Value]) -> Vec<mysql_async::Value> {
    params
        .iter()
        .map(|v| match v {
            Value::Null => mysql_async::Value::NULL,
            Value::Bool(b) => mysql_async::Value::from(i64::from(*b)),
            Value::Int(i) => mysql_async::Value::from(*i),
            Value::Float(f) => mysql_async::Value::from(*f),
            Value::String(s) => mysql_async::Value::from(s.as_str()),
            Value::Bytes(b) => mysql_async::Value::from(b.as_slice()),
            other => mysql_async::Value::from(other.to_string()),
        })
        .collect()
}

/// Converts one decoded column value.
fn from_mysql_value(value: Option<mysql_async::Value>) -> Value {
    match value {
        None | Some(mysql_async::Value::NULL) => Value::Null,
        Some(mysql_async::Value::Bytes(b)) => match String::from_utf8(b) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        Some(mysql_async::Value::Int(i)) => Value::Int(i),
        Some(mysql_async::Value::UInt(u)) => {
            i64::try_from(u).map_or_else(|_| Value::String(u.to_string()), Value::Int)
        }
        Some(mysql_async::Value::Float(f)) => Value::Float(f64::from(f)),
        Some(mysql_async::Value::Double(d)) => Value::Float(d),
        Some(mysql_async::Value::Date(year, month, day, hour, minute, second, micros)) => {
            chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(hour),
                        u32::from(minute),
                        u32::from(second),
                        micros,
                    )
                })
                .map_or(Value::Null, Value::DateTime)
        }
        Some(mysql_async::Value::Time(negative, days, hour, minute, second, micros)) => {
            if negative || days > 0 {
                let sign = if negative { "-" } else { "" };
                let hours = days * 24 + u32::from(hour);
                Value::String(format!("{sign}{hours:02}:{minute:02}:{second:02}"))
            } else {
                chrono::NaiveTime::from_hms_micro_opt(
                    u32::from(hour),
                    u32::from(minute),
                    u32::from(second),
                    micros,
                )
                .map_or(Value::Null, Value::Time)
            }
        }
    }
}

fn convert_row(mysql_row: mysql_async::Row) -> Row {
    let columns: Vec<String> = mysql_row
        .columns_ref()
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();
    let values = mysql_row.unwrap_raw().into_iter().map(from_mysql_value).collect();
    Row::new(columns, values)
}

fn map_error(e: mysql_async::Error) -> CuriaError {
    match e {
        // Duplicate key, foreign key and not-null violations.
        mysql_async::Error::Server(ref err) if matches!(err.code, 1048 | 1062 | 1451 | 1452) => {
            CuriaError::IntegrityError(e.to_string())
        }
        mysql_async::Error::Server(_) => CuriaError::DatabaseError(e.to_string()),
        other => CuriaError::OperationalError(other.to_string()),
    }
}

impl Connection for MySqlConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver_name(&self) -> &str {
        "mysql"
    }

    fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    fn select(&self, sql: &str, bindings: &[Value]) -> CuriaResult<Vec<Row>> {
        let span = query_span(&self.name, "select");
        let _guard = span.enter();
        tracing::debug!(sql, bindings = bindings.len(), "running select");

        let mut conn = self.conn()?;
        let result = if bindings.is_empty() {
            self.runtime.block_on(conn.query(sql))
        } else {
            self.runtime
                .block_on(conn.exec(sql, values_to_params(bindings)))
        };
        let rows: Vec<mysql_async::Row> = result.map_err(map_error)?;
        Ok(rows.into_iter().map(convert_row).collect())
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
        let id = self.conn()?.last_insert_id().unwrap_or(0);
        i64::try_from(id)
            .map_err(|_| CuriaError::DatabaseError(format!("Insert id {id} does not fit in i64")))
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

#[cfg(test)]
mod tests {
    use super::*;

    // ── Parameters ──────────────────────────────────────────────────

    #[test]
    fn test_values_to_params_basic() {
        let params = vec![
            Value::Bool(true),
            Value::Int(42),
            Value::Float(1.5),
            Value::String("hello".to_string()),
        ];
        let mysql_params = values_to_params(&params);
        assert_eq!(
            mysql_params,
            vec![
                mysql_async::Value::Int(1),
                mysql_async::Value::Int(42),
                mysql_async::Value::Double(1.5),
                mysql_async::Value::Bytes(b"hello".to_vec()),
            ]
        );
    }

    #[test]
    fn test_values_to_params_null() {
        let mysql_params = values_to_params(&[Value::Null]);
        assert_eq!(mysql_params, vec![mysql_async::Value::NULL]);
    }

    #[test]
    fn test_values_to_params_text_forms() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let u = uuid::Uuid::nil();
        let mysql_params = values_to_params(&[Value::Date(date), Value::Uuid(u)]);
        assert_eq!(mysql_params[0], mysql_async::Value::Bytes(b"2024-06-15".to_vec()));
        assert_eq!(
            mysql_params[1],
            mysql_async::Value::Bytes(u.to_string().into_bytes())
        );
    }

    // ── Decoding ────────────────────────────────────────────────────

    #[test]
    fn test_from_mysql_value_scalars() {
        assert_eq!(from_mysql_value(None), Value::Null);
        assert_eq!(from_mysql_value(Some(mysql_async::Value::NULL)), Value::Null);
        assert_eq!(from_mysql_value(Some(mysql_async::Value::Int(-3))), Value::Int(-3));
        assert_eq!(from_mysql_value(Some(mysql_async::Value::UInt(7))), Value::Int(7));
        assert_eq!(
            from_mysql_value(Some(mysql_async::Value::UInt(u64::MAX))),
            Value::String(u64::MAX.to_string())
        );
        assert_eq!(
            from_mysql_value(Some(mysql_async::Value::Double(2.5))),
            Value::Float(2.5)
        );
    }

    #[test]
    fn test_from_mysql_value_bytes() {
        assert_eq!(
            from_mysql_value(Some(mysql_async::Value::Bytes(b"abc".to_vec()))),
            Value::from("abc")
        );
        assert_eq!(
            from_mysql_value(Some(mysql_async::Value::Bytes(vec![0xff, 0xfe]))),
            Value::Bytes(vec![0xff, 0xfe])
        );
    }

    #[test]
    fn test_from_mysql_value_temporal() {
        let dt = from_mysql_value(Some(mysql_async::Value::Date(2024, 2, 29, 13, 5, 9, 0)));
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 5, 9)
            .unwrap();
        assert_eq!(dt, Value::DateTime(expected));

        let t = from_mysql_value(Some(mysql_async::Value::Time(false, 0, 8, 30, 0, 0)));
        assert_eq!(t, Value::Time(chrono::NaiveTime::from_hms_opt(8, 30, 0).unwrap()));

        let long = from_mysql_value(Some(mysql_async::Value::Time(true, 1, 2, 0, 0, 0)));
        assert_eq!(long, Value::from("-26:00:00"));
    }
}
