//! Raw SQL fragments.

use std::fmt;

/// A literal SQL fragment that is emitted verbatim.
///
/// An `Expression` is never wrapped in identifier quotes and never becomes
/// a binding: wherever one appears in a column list, a where clause or an
/// insert/update payload, its text is copied into the compiled SQL as is.
///
/// # Examples
///
/// ```
/// use curia_db::query::Expression;
///
/// let now = Expression::new("NOW()");
/// assert_eq!(now.value(), "NOW()");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    /// Creates an expression from raw SQL text.
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// Returns the SQL text.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
