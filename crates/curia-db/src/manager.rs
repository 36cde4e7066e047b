//! The connection registry.
//!
//! [`DatabaseManager`] maps connection names to open [`Connection`]s. It is
//! built from the `[database]` settings section and a connector function
//! that knows how to open a connection for a driver; connections are opened
//! on first use and cached by name.
//!
//! There is no process-wide registry: code that needs a connection receives
//! the manager (or a connection handle) explicitly.
//!
//! ```
//! use std::rc::Rc;
//! use curia_core::DatabaseSection;
//! use curia_db::connection::Connection;
//! use curia_db::manager::DatabaseManager;
//! use curia_db::testing::RecordingConnection;
//!
//! let manager = DatabaseManager::new(DatabaseSection::default(), |_name, _settings| {
//!     let conn: Rc<dyn Connection> = Rc::new(RecordingConnection::new());
//!     Ok(conn)
//! });
//! let sql = manager.table("users").unwrap().to_sql().unwrap();
//! assert_eq!(sql, "select * from `users`");
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use curia_core::{ConnectionSettings, CuriaError, CuriaResult, DatabaseSection};

use crate::connection::{Connection, ConnectionExt};
use crate::query::{Column, Expression, QueryBuilder};

/// Opens a connection from its name and settings.
pub type Connector = dyn Fn(&str, &ConnectionSettings) -> CuriaResult<Rc<dyn Connection>>;

/// Named, lazily opened connections.
pub struct DatabaseManager {
    config: DatabaseSection,
    connector: Box<Connector>,
    connections: RefCell<HashMap<String, Rc<dyn Connection>>>,
}

impl fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut open: Vec<String> = self.connections.borrow().keys().cloned().collect();
        open.sort();
        f.debug_struct("DatabaseManager")
            .field("default", &self.config.default)
            .field("open", &open)
            .finish_non_exhaustive()
    }
}

impl DatabaseManager {
    /// Creates a registry over `config`, opening connections with
    /// `connector`.
    pub fn new(
        config: DatabaseSection,
        connector: impl Fn(&str, &ConnectionSettings) -> CuriaResult<Rc<dyn Connection>> + 'static,
    ) -> Self {
        Self {
            config,
            connector: Box::new(connector),
            connections: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the name of the default connection.
    pub fn default_connection_name(&self) -> &str {
        &self.config.default
    }

    /// Returns the configured connection names, sorted.
    pub fn configured_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.config.connections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the connection called `name`, or the default connection,
    /// opening it on first use.
    pub fn connection(&self, name: Option<&str>) -> CuriaResult<Rc<dyn Connection>> {
        let name = name.unwrap_or(&self.config.default);
        if let Some(conn) = self.connections.borrow().get(name) {
            return Ok(Rc::clone(conn));
        }

        let settings = self.config.connection(name).ok_or_else(|| {
            CuriaError::ConfigurationError(format!("Database connection [{name}] not configured."))
        })?;
        tracing::debug!(connection = name, driver = %settings.driver, "opening database connection");
        let conn = (self.connector)(name, settings)?;
        self.connections
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&conn));
        Ok(conn)
    }

    /// Registers an already open connection under `name`, replacing any
    /// cached one.
    pub fn add_connection(&self, name: impl Into<String>, connection: Rc<dyn Connection>) {
        self.connections.borrow_mut().insert(name.into(), connection);
    }

    /// Drops the cached connection called `name`. It is reopened on next
    /// use.
    pub fn disconnect(&self, name: &str) {
        self.connections.borrow_mut().remove(name);
    }

    /// Starts a query against `table` on the default connection.
    pub fn table(&self, table: impl Into<Column>) -> CuriaResult<QueryBuilder> {
        Ok(self.connection(None)?.table(table))
    }

    /// Wraps raw SQL so it is emitted verbatim.
    pub fn raw(&self, sql: impl Into<String>) -> Expression {
        Expression::new(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Grammar;
    use crate::testing::RecordingConnection;
    use std::cell::Cell;

    fn section() -> DatabaseSection {
        let mut section = DatabaseSection::default();
        section.connections.insert(
            "reporting".to_string(),
            ConnectionSettings::sqlite_memory().with_prefix("rpt_"),
        );
        section
    }

    fn recording_connector(
        opened: Rc<Cell<u32>>,
    ) -> impl Fn(&str, &ConnectionSettings) -> CuriaResult<Rc<dyn Connection>> {
        move |name, settings| {
            opened.set(opened.get() + 1);
            let conn: Rc<dyn Connection> = Rc::new(RecordingConnection::with_grammar(
                name,
                Grammar::with_table_prefix(settings.prefix.clone()),
            ));
            Ok(conn)
        }
    }

    #[test]
    fn test_connections_are_cached_by_name() {
        let opened = Rc::new(Cell::new(0));
        let manager = DatabaseManager::new(section(), recording_connector(Rc::clone(&opened)));

        let a = manager.connection(None).unwrap();
        let b = manager.connection(Some("default")).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(opened.get(), 1);

        let reporting = manager.connection(Some("reporting")).unwrap();
        assert_eq!(reporting.name(), "reporting");
        assert_eq!(reporting.grammar().table_prefix(), "rpt_");
        assert_eq!(opened.get(), 2);
    }

    #[test]
    fn test_unknown_connection() {
        let manager = DatabaseManager::new(section(), recording_connector(Rc::new(Cell::new(0))));
        let err = manager.connection(Some("missing")).err().expect("missing is not configured");
        assert_eq!(
            err.to_string(),
            "Configuration error: Database connection [missing] not configured."
        );
    }

    #[test]
    fn test_disconnect_reopens() {
        let opened = Rc::new(Cell::new(0));
        let manager = DatabaseManager::new(section(), recording_connector(Rc::clone(&opened)));
        manager.connection(None).unwrap();
        manager.disconnect("default");
        manager.connection(None).unwrap();
        assert_eq!(opened.get(), 2);
    }

    #[test]
    fn test_add_connection_overrides() {
        let manager = DatabaseManager::new(section(), |_, _| {
            Err(CuriaError::OperationalError("no driver".to_string()))
        });
        assert!(manager.connection(None).is_err());

        let conn: Rc<dyn Connection> = Rc::new(RecordingConnection::new());
        manager.add_connection("default", conn);
        assert_eq!(
            manager.table("posts").unwrap().to_sql().unwrap(),
            "select * from `posts`"
        );
        assert_eq!(manager.raw("NOW()").value(), "NOW()");
    }

    #[test]
    fn test_configured_names() {
        let manager = DatabaseManager::new(section(), recording_connector(Rc::new(Cell::new(0))));
        assert_eq!(manager.configured_names(), vec!["default", "reporting"]);
        assert_eq!(manager.default_connection_name(), "default");
    }
}
