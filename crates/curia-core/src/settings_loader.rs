//! Settings loading from configuration files.
//!
//! Loads [`Settings`] from TOML or JSON and applies environment variable
//! overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (deep-merged over the defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `CURIA_DEBUG` | `debug` |
//! | `CURIA_LOG_LEVEL` | `log_level` |
//! | `CURIA_DB_CONNECTION` | `database.default` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use curia_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/database.toml").unwrap();
//! println!("default connection: {}", settings.database.default);
//! ```

use std::path::Path;

use crate::error::{CuriaError, CuriaResult};
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Fields not present in the TOML keep their default values. A connection
/// table only needs the keys that differ from [`ConnectionSettings`]'
/// defaults.
///
/// [`ConnectionSettings`]: crate::settings::ConnectionSettings
pub fn from_toml_str(toml_str: &str) -> CuriaResult<Settings> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| CuriaError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> CuriaResult<Settings> {
    let content = read_file(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> CuriaResult<Settings> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> CuriaResult<Settings> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| CuriaError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> CuriaResult<Settings> {
    let content = read_file(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// - `CURIA_DEBUG` -> `debug` ("true"/"1"/"yes" => true, anything else => false)
/// - `CURIA_LOG_LEVEL` -> `log_level`
/// - `CURIA_DB_CONNECTION` -> `database.default`
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("CURIA_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("CURIA_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("CURIA_DB_CONNECTION") {
        if !val.trim().is_empty() {
            settings.database.default = val.trim().to_string();
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_file(path: &Path, format: &str) -> CuriaResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        CuriaError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> CuriaResult<Settings> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        CuriaError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        CuriaError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            log_level = "curia_db=debug"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "curia_db=debug");
        // Defaults preserved
        assert_eq!(settings.database.default, "default");
    }

    #[test]
    fn test_from_toml_str_connections() {
        let toml = r#"
            [database]
            default = "mysql"

            [database.connections.mysql]
            driver = "mysql"
            database = "shop"
            host = "localhost"
            port = 3306
            username = "root"
            prefix = "shop_"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.database.default, "mysql");
        let mysql = settings.database.connection("mysql").unwrap();
        assert_eq!(mysql.driver, "mysql");
        assert_eq!(mysql.port, 3306);
        assert_eq!(mysql.prefix, "shop_");
        assert!(mysql.password.is_empty());
        // The built-in default connection survives the merge.
        assert!(settings.database.connection("default").is_some());
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(CuriaError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("debug = \"sometimes\"");
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "debug": false,
            "database": {
                "connections": {
                    "default": { "prefix": "app_" }
                }
            }
        }"#;

        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        let default = settings.database.connection("default").unwrap();
        assert_eq!(default.prefix, "app_");
        // Sibling keys keep their defaults after the deep merge.
        assert_eq!(default.database, ":memory:");
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{invalid json").is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();

        let settings = from_toml_file(file.path()).unwrap();
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"database": {{"default": "replica"}}}}"#).unwrap();

        let settings = from_json_file(file.path()).unwrap();
        assert_eq!(settings.database.default, "replica");
    }

    #[test]
    fn test_from_file_missing() {
        assert!(from_toml_file("/nonexistent/path/database.toml").is_err());
        assert!(from_json_file("/nonexistent/path/database.json").is_err());
    }

    // ── Environment variable overrides ──────────────────────────────

    #[test]
    fn test_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debug = true").unwrap();

        std::env::set_var("CURIA_DEBUG", "0");
        std::env::set_var("CURIA_LOG_LEVEL", "trace");
        std::env::set_var("CURIA_DB_CONNECTION", "reporting");

        let settings = from_toml_file_with_env(file.path()).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "trace");
        assert_eq!(settings.database.default, "reporting");

        std::env::set_var("CURIA_DEBUG", "yes");
        std::env::set_var("CURIA_DB_CONNECTION", "  ");
        let settings = from_env();
        assert!(settings.debug);
        assert_eq!(settings.database.default, "default");

        std::env::remove_var("CURIA_DEBUG");
        std::env::remove_var("CURIA_LOG_LEVEL");
        std::env::remove_var("CURIA_DB_CONNECTION");
    }

    // ── merge_json helper ───────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}, "c": 0});
        let over = serde_json::json!({"outer": {"b": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
        assert_eq!(merged["c"], 0);
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4, 5]});
        let merged = merge_json(base, over);
        assert_eq!(merged["list"], serde_json::json!([4, 5]));
    }

    #[test]
    fn test_toml_to_json() {
        let toml_val: toml::Value = toml::from_str(
            r#"
            name = "test"
            count = 42
            flag = true
            [nested]
            key = "value"
        "#,
        )
        .unwrap();

        let json = toml_to_json(toml_val);
        assert_eq!(json["name"], "test");
        assert_eq!(json["count"], 42);
        assert_eq!(json["flag"], true);
        assert_eq!(json["nested"]["key"], "value");
    }
}
