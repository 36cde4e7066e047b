//! The binding accumulator.
//!
//! Values destined for `?` placeholders are collected into per-clause
//! buckets while a query is built. Flattening walks the buckets in the order
//! their clauses appear in a compiled `select`, so the n-th value lines up
//! with the n-th placeholder no matter in which order the builder methods
//! were called.

use std::fmt;
use std::str::FromStr;

use curia_core::CuriaError;

use crate::value::Value;

/// The clause a binding belongs to.
///
/// Declaration order is flatten order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingCategory {
    /// Raw select expressions.
    Select,
    /// The `from` clause.
    From,
    /// Join targets and on-clauses.
    Join,
    /// The `where` clause.
    Where,
    /// The `having` clause.
    Having,
    /// Raw `order by` fragments.
    Order,
    /// Union members.
    Union,
    /// Raw `order by` fragments added after a union, rendered after every
    /// union member.
    UnionOrder,
}

impl BindingCategory {
    /// Every category in flatten order.
    pub const ALL: [Self; 8] = [
        Self::Select,
        Self::From,
        Self::Join,
        Self::Where,
        Self::Having,
        Self::Order,
        Self::Union,
        Self::UnionOrder,
    ];

    /// Returns the category name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::From => "from",
            Self::Join => "join",
            Self::Where => "where",
            Self::Having => "having",
            Self::Order => "order",
            Self::Union => "union",
            Self::UnionOrder => "union_order",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingCategory {
    type Err = CuriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CuriaError::ConfigurationError(format!("Invalid binding type: {s}.")))
    }
}

/// Category-bucketed binding values.
///
/// # Examples
///
/// ```
/// use curia_db::query::{BindingCategory, Bindings};
/// use curia_db::value::Value;
///
/// let mut bindings = Bindings::new();
/// bindings.add(BindingCategory::Where, Value::Int(18));
/// bindings.add(BindingCategory::Join, Value::Int(1));
/// assert_eq!(bindings.flatten(), vec![Value::Int(1), Value::Int(18)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    buckets: [Vec<Value>; 8],
}

impl Bindings {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one value to a bucket.
    pub fn add(&mut self, category: BindingCategory, value: Value) {
        self.buckets[category.index()].push(value);
    }

    /// Appends several values to a bucket, keeping their order.
    pub fn extend(&mut self, category: BindingCategory, values: impl IntoIterator<Item = Value>) {
        self.buckets[category.index()].extend(values);
    }

    /// Appends a value to the bucket named `category`.
    ///
    /// Unknown names are a [`CuriaError::ConfigurationError`].
    pub fn add_named(&mut self, category: &str, value: Value) -> Result<(), CuriaError> {
        let category: BindingCategory = category.parse()?;
        self.add(category, value);
        Ok(())
    }

    /// Returns the values in one bucket.
    pub fn get(&self, category: BindingCategory) -> &[Value] {
        &self.buckets[category.index()]
    }

    /// Empties one bucket.
    pub fn clear(&mut self, category: BindingCategory) {
        self.buckets[category.index()].clear();
    }

    /// Returns every value, bucket by bucket in flatten order.
    pub fn flatten(&self) -> Vec<Value> {
        self.buckets.iter().flatten().cloned().collect()
    }

    /// Flattens every bucket except the listed ones.
    pub fn flatten_except(&self, except: &[BindingCategory]) -> Vec<Value> {
        BindingCategory::ALL
            .into_iter()
            .filter(|category| !except.contains(category))
            .flat_map(|category| self.get(category).iter().cloned())
            .collect()
    }

    /// Total number of values across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Returns `true` if no bucket holds a value.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_follows_clause_order() {
        let mut bindings = Bindings::new();
        bindings.add(BindingCategory::Union, Value::Int(7));
        bindings.add(BindingCategory::Where, Value::Int(3));
        bindings.add(BindingCategory::Select, Value::Int(1));
        bindings.add(BindingCategory::Having, Value::Int(4));
        bindings.add(BindingCategory::Join, Value::Int(2));
        bindings.add(BindingCategory::Where, Value::Int(5));
        bindings.add(BindingCategory::UnionOrder, Value::Int(8));
        bindings.add(BindingCategory::Order, Value::Int(6));

        let flat: Vec<i64> = bindings
            .flatten()
            .iter()
            .filter_map(Value::as_int)
            .collect();
        assert_eq!(flat, vec![1, 2, 3, 5, 4, 6, 7, 8]);
        assert_eq!(bindings.len(), 8);
    }

    #[test]
    fn test_unknown_category_fails() {
        let mut bindings = Bindings::new();
        let err = bindings.add_named("grouping", Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid binding type: grouping."
        );
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_named_category() {
        let mut bindings = Bindings::new();
        bindings.add_named("having", Value::Int(1)).unwrap();
        assert_eq!(bindings.get(BindingCategory::Having), &[Value::Int(1)]);
        assert_eq!("union_order".parse::<BindingCategory>().unwrap(), BindingCategory::UnionOrder);
    }

    #[test]
    fn test_clear_and_flatten_except() {
        let mut bindings = Bindings::new();
        bindings.extend(BindingCategory::Select, [Value::Int(1), Value::Int(2)]);
        bindings.add(BindingCategory::Join, Value::Int(3));
        bindings.add(BindingCategory::Where, Value::Int(4));

        assert_eq!(
            bindings.flatten_except(&[BindingCategory::Select, BindingCategory::Join]),
            vec![Value::Int(4)]
        );

        bindings.clear(BindingCategory::Select);
        assert_eq!(bindings.flatten(), vec![Value::Int(3), Value::Int(4)]);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = Bindings::new();
        original.add(BindingCategory::Where, Value::Int(1));
        let mut copy = original.clone();
        copy.add(BindingCategory::Where, Value::Int(2));
        assert_eq!(original.len(), 1);
        assert_eq!(copy.len(), 2);
    }
}
