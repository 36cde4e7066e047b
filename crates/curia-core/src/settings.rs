//! Settings for curia.
//!
//! [`Settings`] holds the logging configuration and the named database
//! connections. There is no global instance: load a `Settings` value (see
//! [`settings_loader`](crate::settings_loader)) and pass it, or its
//! [`DatabaseSection`], to whatever needs it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Connection parameters for one named database connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// The driver name (`sqlite` or `mysql`).
    pub driver: String,
    /// The database name (or file path / `:memory:` for `SQLite`).
    pub database: String,
    /// The database host.
    pub host: String,
    /// The database port.
    pub port: u16,
    /// The database user.
    pub username: String,
    /// The database password.
    pub password: String,
    /// Prefix prepended to every table name when identifiers are wrapped.
    pub prefix: String,
    /// Additional driver-specific options.
    pub options: HashMap<String, String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            database: ":memory:".to_string(),
            host: String::new(),
            port: 0,
            username: String::new(),
            password: String::new(),
            prefix: String::new(),
            options: HashMap::new(),
        }
    }
}

impl ConnectionSettings {
    /// Creates settings for an in-memory `SQLite` database.
    pub fn sqlite_memory() -> Self {
        Self::default()
    }

    /// Creates settings for a MySQL database.
    pub fn mysql(
        database: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            driver: "mysql".to_string(),
            database: database.into(),
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// The `database` section: the default connection name plus every named
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// The connection used when no name is given.
    pub default: String,
    /// Connection settings keyed by name.
    pub connections: HashMap<String, ConnectionSettings>,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let mut connections = HashMap::new();
        connections.insert("default".to_string(), ConnectionSettings::default());
        Self {
            default: "default".to_string(),
            connections,
        }
    }
}

impl DatabaseSection {
    /// Looks up the settings for a named connection.
    pub fn connection(&self, name: &str) -> Option<&ConnectionSettings> {
        self.connections.get(name)
    }
}

/// The complete set of curia settings.
///
/// # Examples
///
/// ```
/// use curia_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.database.default, "default");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log filter (e.g. "info", "curia_db=debug").
    pub log_level: String,
    /// Database connections.
    pub database: DatabaseSection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            database: DatabaseSection::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "info");
        let default = settings.database.connection("default").unwrap();
        assert_eq!(default.driver, "sqlite");
        assert_eq!(default.database, ":memory:");
        assert!(default.prefix.is_empty());
    }

    #[test]
    fn test_mysql_constructor() {
        let cfg = ConnectionSettings::mysql("shop", "127.0.0.1", 3306, "root", "secret")
            .with_prefix("shop_");
        assert_eq!(cfg.driver, "mysql");
        assert_eq!(cfg.port, 3306);
        assert_eq!(cfg.prefix, "shop_");
    }

    #[test]
    fn test_unknown_connection() {
        let section = DatabaseSection::default();
        assert!(section.connection("replica").is_none());
    }

    #[test]
    fn test_settings_roundtrip_json() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
