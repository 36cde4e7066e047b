//! Result rows returned by an execution adapter.
//!
//! A [`Row`] keeps the column names in select order alongside their values.
//! Typed access goes through the [`FromValue`] trait.

use curia_core::{CuriaError, CuriaResult};

use crate::value::Value;

/// One row of a result set.
///
/// # Examples
///
/// ```
/// use curia_db::row::Row;
/// use curia_db::value::Value;
///
/// let row = Row::new(vec!["id".into(), "name".into()], vec![Value::Int(1), "Ann".into()]);
/// let id: i64 = row.get("id").unwrap();
/// let name: String = row.get("name").unwrap();
/// assert_eq!((id, name.as_str()), (1, "Ann"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row, returning its values in column order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// A missing column is reported as [`CuriaError::DoesNotExist`].
    pub fn get<T: FromValue>(&self, column: &str) -> CuriaResult<T> {
        let value = self.get_value(column).ok_or_else(|| {
            CuriaError::DoesNotExist(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Gets a typed value by column index.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> CuriaResult<T> {
        let value = self.values.get(idx).ok_or_else(|| {
            CuriaError::DoesNotExist(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            ))
        })?;
        T::from_value(value)
    }

    /// Returns a reference to the raw value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Like [`get_value`](Self::get_value) but compares names ASCII
    /// case-insensitively.
    pub fn get_value_ignore_case(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|idx| &self.values[idx])
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> CuriaResult<Self>;
}

fn mismatch(expected: &str, value: &Value) -> CuriaError {
    CuriaError::DatabaseError(format!("Expected {expected}, got {value:?}"))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> CuriaResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(Self::from(*b)),
            // Drivers report DECIMAL aggregates as text.
            Value::String(s) => s.trim().parse().map_err(|_| mismatch("Int", value)),
            _ => Err(mismatch("Int", value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> CuriaResult<Self> {
        let wide = i64::from_value(value)?;
        Self::try_from(wide).map_err(|e| {
            CuriaError::DatabaseError(format!("Int value out of i32 range: {e}"))
        })
    }
}

impl FromValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> CuriaResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as Self),
            Value::String(s) => s.trim().parse().map_err(|_| mismatch("Float", value)),
            _ => Err(mismatch("Float", value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> CuriaResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("Bool", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> CuriaResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> CuriaResult<Self> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::String(s) => Self::parse_str(s).map_err(|_| mismatch("Uuid", value)),
            _ => Err(mismatch("Uuid", value)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> CuriaResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> CuriaResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::from_pairs([
            ("id", Value::Int(7)),
            ("name", Value::from("Ann")),
            ("total", Value::from("12.50")),
            ("active", Value::Int(1)),
            ("deleted_at", Value::Null),
        ])
    }

    #[test]
    fn test_get_typed() {
        let row = sample();
        assert_eq!(row.get::<i64>("id").unwrap(), 7);
        assert_eq!(row.get::<i32>("id").unwrap(), 7);
        assert_eq!(row.get::<String>("name").unwrap(), "Ann");
        assert!((row.get::<f64>("total").unwrap() - 12.5).abs() < f64::EPSILON);
        assert!(row.get::<bool>("active").unwrap());
        assert_eq!(row.get::<Option<String>>("deleted_at").unwrap(), None);
    }

    #[test]
    fn test_missing_column_is_not_found() {
        let err = sample().get::<i64>("email").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_type_mismatch() {
        assert!(sample().get::<i64>("name").is_err());
        assert!(sample().get_by_index::<String>(0).is_err());
        assert!(sample().get_by_index::<i64>(99).is_err());
    }

    #[test]
    fn test_ignore_case_lookup() {
        let row = Row::from_pairs([("AGGREGATE", Value::Int(3))]);
        assert_eq!(row.get_value("aggregate"), None);
        assert_eq!(row.get_value_ignore_case("aggregate"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_columns_and_values() {
        let row = sample();
        assert_eq!(row.len(), 5);
        assert_eq!(row.columns()[1], "name");
        assert_eq!(row.values()[0], Value::Int(7));
        assert!(!row.is_empty());
    }

    #[test]
    #[should_panic(expected = "Row column count must match value count")]
    fn test_new_mismatched_lengths() {
        let _ = Row::new(vec!["a".into()], vec![]);
    }
}
