//! Opening adapters from settings.
//!
//! [`connect`] dispatches on [`ConnectionSettings::driver`] to the adapters
//! compiled into this crate. It has the signature
//! [`DatabaseManager::new`] expects, and [`manager`] wires the two together.

use std::rc::Rc;

use curia_core::{ConnectionSettings, CuriaError, CuriaResult, DatabaseSection};
use curia_db::{Connection, DatabaseManager};

/// Returns the driver names this build can open.
pub fn supported_drivers() -> Vec<&'static str> {
    let mut drivers = Vec::new();
    if cfg!(feature = "sqlite") {
        drivers.push("sqlite");
    }
    if cfg!(feature = "mysql") {
        drivers.push("mysql");
    }
    drivers
}

/// Opens the connection called `name` described by `settings`.
///
/// # Errors
///
/// Returns [`CuriaError::ConfigurationError`] for a driver that is unknown
/// or not compiled in, and the adapter's error if opening fails.
pub fn connect(name: &str, settings: &ConnectionSettings) -> CuriaResult<Rc<dyn Connection>> {
    let conn: Rc<dyn Connection> = match settings.driver.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => Rc::new(crate::sqlite::SqliteConnection::open(name, settings)?),
        #[cfg(feature = "mysql")]
        "mysql" => Rc::new(crate::mysql::MySqlConnection::connect(name, settings)?),
        other => {
            return Err(CuriaError::ConfigurationError(format!(
                "Unsupported driver [{other}] for connection [{name}]."
            )))
        }
    };
    Ok(conn)
}

/// Creates a [`DatabaseManager`] over `section` that opens connections with
/// [`connect`].
///
/// # Examples
///
/// ```
/// use curia_core::DatabaseSection;
///
/// let db = curia_db_backends::manager(DatabaseSection::default());
/// assert_eq!(db.default_connection_name(), "default");
/// ```
pub fn manager(section: DatabaseSection) -> DatabaseManager {
    DatabaseManager::new(section, connect)
}
