//! The node types a query description is made of.
//!
//! Predicates, joins, orderings, havings and unions are closed enums; the
//! grammar dispatches on them with an exhaustive `match`.

use super::expression::Expression;
use super::spec::QuerySpec;
use crate::value::Value;

/// Comparison operators accepted by `where`/`having`/`on`.
///
/// Anything else passed in operator position is read as the value of an
/// `=` comparison.
pub const OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "<=>",
    "like", "like binary", "not like", "ilike",
    "&", "|", "^", "<<", ">>",
    "rlike", "regexp", "not regexp",
    "~", "~*", "!~", "!~*", "similar to",
    "not similar to", "not ilike", "~~*", "!~~*",
];

/// Returns `true` if `operator` is a known comparison operator (ASCII
/// case-insensitive).
pub fn is_operator(operator: &str) -> bool {
    let lower = operator.to_ascii_lowercase();
    OPERATORS.contains(&lower.as_str())
}

/// Normalizes an `(operator, value)` pair the way every `where`-style call
/// does.
///
/// A null value paired with an ordering operator is rejected. An unknown
/// operator becomes the value of an `=` comparison and the given value is
/// dropped.
pub(crate) fn prepare_comparison(
    operator: &str,
    value: Operand,
) -> Result<(String, Operand), String> {
    let known = is_operator(operator);
    if value.is_null() && known && !matches!(operator, "=" | "<>" | "!=") {
        return Err("Illegal operator and value combination.".to_string());
    }
    if known {
        Ok((operator.to_string(), value))
    } else {
        Ok(("=".to_string(), Operand::Value(Value::String(operator.to_string()))))
    }
}

/// The connector placed in front of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    /// `and`
    And,
    /// `or`
    Or,
}

impl Boolean {
    /// Returns the SQL keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// A column reference: a (possibly dotted or aliased) name, or raw SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// A name such as `users.email` or `orders.total as grand_total`.
    Name(String),
    /// Raw SQL copied verbatim.
    Raw(Expression),
}

impl Column {
    /// Returns the name, or the raw SQL text.
    pub fn text(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Raw(expr) => expr.value(),
        }
    }
}

impl From<&str> for Column {
    fn from(v: &str) -> Self {
        Self::Name(v.to_string())
    }
}

impl From<String> for Column {
    fn from(v: String) -> Self {
        Self::Name(v)
    }
}

impl From<&String> for Column {
    fn from(v: &String) -> Self {
        Self::Name(v.clone())
    }
}

impl From<Expression> for Column {
    fn from(v: Expression) -> Self {
        Self::Raw(v)
    }
}

/// The right-hand side of a comparison: a bound value or raw SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A value rendered as `?` and added to the bindings.
    Value(Value),
    /// Raw SQL rendered verbatim, never bound.
    Raw(Expression),
}

impl Operand {
    /// Returns the value to bind, if any.
    pub const fn binding(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    /// Returns `true` for a bound SQL NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }
}

impl From<Expression> for Operand {
    fn from(v: Expression) -> Self {
        Self::Raw(v)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Self::Value(Value::from(v))
    }
}

macro_rules! impl_operand_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_operand_from!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    &String,
    Vec<u8>,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::NaiveTime,
    uuid::Uuid,
    serde_json::Value,
);

/// The part of a temporal column compared by a date-based where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    /// `date(col)`
    Date,
    /// `time(col)`
    Time,
    /// `day(col)`
    Day,
    /// `month(col)`
    Month,
    /// `year(col)`
    Year,
}

impl DatePart {
    /// Returns the SQL function name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// One predicate in a `where` (or join `on`) clause.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    /// `col op ?`
    Basic {
        column: Column,
        operator: String,
        value: Operand,
        boolean: Boolean,
    },
    /// A parenthesized group. Never empty.
    Nested {
        wheres: Vec<WhereNode>,
        boolean: Boolean,
    },
    /// `col op (select ...)`
    Sub {
        column: Column,
        operator: String,
        query: Box<QuerySpec>,
        boolean: Boolean,
    },
    /// `col [not] in (?, ...)`
    In {
        column: Column,
        values: Vec<Operand>,
        negated: bool,
        boolean: Boolean,
    },
    /// `col [not] in (select ...)`
    InSub {
        column: Column,
        query: Box<QuerySpec>,
        negated: bool,
        boolean: Boolean,
    },
    /// `col is [not] null`
    Null {
        column: Column,
        negated: bool,
        boolean: Boolean,
    },
    /// `col [not] between ? and ?`
    Between {
        column: Column,
        low: Operand,
        high: Operand,
        negated: bool,
        boolean: Boolean,
    },
    /// `part(col) op ?`
    DatePart {
        part: DatePart,
        column: Column,
        operator: String,
        value: Operand,
        boolean: Boolean,
    },
    /// `first op second`, both sides identifiers.
    Column {
        first: Column,
        operator: String,
        second: Column,
        boolean: Boolean,
    },
    /// `[not] exists (select ...)`
    Exists {
        query: Box<QuerySpec>,
        negated: bool,
        boolean: Boolean,
    },
    /// Raw SQL.
    Raw { sql: String, boolean: Boolean },
}

impl WhereNode {
    /// Returns the connector placed in front of this node.
    pub const fn boolean(&self) -> Boolean {
        match self {
            Self::Basic { boolean, .. }
            | Self::Nested { boolean, .. }
            | Self::Sub { boolean, .. }
            | Self::In { boolean, .. }
            | Self::InSub { boolean, .. }
            | Self::Null { boolean, .. }
            | Self::Between { boolean, .. }
            | Self::DatePart { boolean, .. }
            | Self::Column { boolean, .. }
            | Self::Exists { boolean, .. }
            | Self::Raw { boolean, .. } => *boolean,
        }
    }
}

/// The kind of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `inner join`
    Inner,
    /// `left join`
    Left,
    /// `right join`
    Right,
    /// `cross join`
    Cross,
}

impl JoinKind {
    /// Returns the SQL keyword preceding `join`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Cross => "cross",
        }
    }
}

/// A join target with its own `on` predicates.
///
/// The predicates use the same [`WhereNode`] set as the `where` clause and
/// are rendered with `on` in place of `where`. Values bound by `where_`-style
/// calls on the join are kept here and moved into the parent's `join` bucket
/// when the join is added.
///
/// # Examples
///
/// ```
/// use curia_db::query::{JoinClause, JoinKind};
///
/// let join = JoinClause::new(JoinKind::Left, "contacts")
///     .on("users.id", "=", "contacts.user_id")
///     .where_("contacts.kind", "=", "email");
/// assert_eq!(join.wheres.len(), 2);
/// assert_eq!(join.bindings().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// The join kind.
    pub kind: JoinKind,
    /// The joined table, or a raw sub-select.
    pub table: Column,
    /// The `on` predicates.
    pub wheres: Vec<WhereNode>,
    /// Joins nested inside this one, rendered as `(table <joins>)`.
    pub joins: Vec<JoinClause>,
    join_bindings: Vec<Value>,
    bindings: Vec<Value>,
    invalid: Option<String>,
}

impl JoinClause {
    /// Creates a join with no predicates.
    pub fn new(kind: JoinKind, table: impl Into<Column>) -> Self {
        Self {
            kind,
            table: table.into(),
            wheres: Vec::new(),
            joins: Vec::new(),
            join_bindings: Vec::new(),
            bindings: Vec::new(),
            invalid: None,
        }
    }

    /// Returns the values bound by this join's predicates.
    pub fn bindings(&self) -> &[Value] {
        &self.bindings
    }

    /// Moves the bound values and any recorded validation failure out.
    ///
    /// Values from nested joins come first, matching where their SQL is
    /// rendered.
    pub(crate) fn take_bindings(&mut self) -> (Vec<Value>, Option<String>) {
        let mut bindings = std::mem::take(&mut self.join_bindings);
        bindings.append(&mut self.bindings);
        (bindings, self.invalid.take())
    }

    /// Nests `inner join table on first op second` inside this join.
    pub fn join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.nest(JoinKind::Inner, table.into(), |join| join.on(first, operator, second))
    }

    /// Nests `left join table on first op second` inside this join.
    pub fn left_join(
        self,
        table: impl Into<Column>,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.nest(JoinKind::Left, table.into(), |join| join.on(first, operator, second))
    }

    /// Nests a join of `kind` whose predicates are built by `callback`.
    pub fn nest(
        mut self,
        kind: JoinKind,
        table: impl Into<Column>,
        callback: impl FnOnce(Self) -> Self,
    ) -> Self {
        let mut nested = callback(Self::new(kind, table));
        let (bindings, invalid) = nested.take_bindings();
        if let Some(message) = invalid {
            self = self.fail(message);
        }
        self.join_bindings.extend(bindings);
        self.joins.push(nested);
        self
    }

    fn fail(mut self, message: String) -> Self {
        self.invalid.get_or_insert(message);
        self
    }

    /// Adds `first op second`, comparing two columns.
    pub fn on(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_on(first.into(), operator, second.into(), Boolean::And)
    }

    /// Adds `or first op second`.
    pub fn or_on(
        self,
        first: impl Into<Column>,
        operator: &str,
        second: impl Into<Column>,
    ) -> Self {
        self.add_on(first.into(), operator, second.into(), Boolean::Or)
    }

    fn add_on(mut self, first: Column, operator: &str, second: Column, boolean: Boolean) -> Self {
        let (operator, second) = if is_operator(operator) {
            (operator.to_string(), second)
        } else {
            ("=".to_string(), Column::Name(operator.to_string()))
        };
        self.wheres.push(WhereNode::Column {
            first,
            operator,
            second,
            boolean,
        });
        self
    }

    /// Adds a parenthesized group of predicates built by `callback`.
    pub fn on_nested(mut self, callback: impl FnOnce(Self) -> Self) -> Self {
        let nested = callback(Self::new(self.kind, self.table.clone()));
        if let Some(message) = nested.invalid {
            self = self.fail(message);
        }
        if !nested.wheres.is_empty() {
            self.wheres.push(WhereNode::Nested {
                wheres: nested.wheres,
                boolean: Boolean::And,
            });
            self.bindings.extend(nested.bindings);
        }
        self
    }

    /// Adds `column op ?`, comparing against a bound value.
    pub fn where_(self, column: impl Into<Column>, operator: &str, value: impl Into<Operand>) -> Self {
        self.add_where(column.into(), operator, value.into(), Boolean::And)
    }

    /// Adds `or column op ?`.
    pub fn or_where(
        self,
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Self {
        self.add_where(column.into(), operator, value.into(), Boolean::Or)
    }

    fn add_where(mut self, column: Column, operator: &str, value: Operand, boolean: Boolean) -> Self {
        let (operator, value) = match prepare_comparison(operator, value) {
            Ok(prepared) => prepared,
            Err(message) => return self.fail(message),
        };
        if value.is_null() {
            self.wheres.push(WhereNode::Null {
                column,
                negated: operator != "=",
                boolean,
            });
            return self;
        }
        if let Some(v) = value.binding() {
            self.bindings.push(v.clone());
        }
        self.wheres.push(WhereNode::Basic {
            column,
            operator,
            value,
            boolean,
        });
        self
    }

    /// Adds `column is null`.
    pub fn where_null(mut self, column: impl Into<Column>) -> Self {
        self.wheres.push(WhereNode::Null {
            column: column.into(),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds `column is not null`.
    pub fn where_not_null(mut self, column: impl Into<Column>) -> Self {
        self.wheres.push(WhereNode::Null {
            column: column.into(),
            negated: true,
            boolean: Boolean::And,
        });
        self
    }

    /// Adds `column in (?, ...)`.
    pub fn where_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_in(column.into(), values.into_iter().map(Into::into).collect(), false)
    }

    /// Adds `column not in (?, ...)`.
    pub fn where_not_in<V: Into<Operand>>(
        self,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_in(column.into(), values.into_iter().map(Into::into).collect(), true)
    }

    fn add_in(mut self, column: Column, values: Vec<Operand>, negated: bool) -> Self {
        self.bindings
            .extend(values.iter().filter_map(Operand::binding).cloned());
        self.wheres.push(WhereNode::In {
            column,
            values,
            negated,
            boolean: Boolean::And,
        });
        self
    }
}

/// A `union` member.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionClause {
    /// The member query.
    pub query: Box<QuerySpec>,
    /// `union all` instead of `union`.
    pub all: bool,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `asc`
    Asc,
    /// `desc`
    Desc,
}

impl Direction {
    /// Parses a direction; anything but `asc` (any case) is descending.
    pub fn parse(direction: &str) -> Self {
        if direction.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    /// Returns the SQL keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One `order by` item.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderClause {
    /// `col asc|desc`
    Column { column: Column, direction: Direction },
    /// Raw SQL.
    Raw { sql: String },
}

/// One `having` predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Having {
    /// `col op ?`
    Basic {
        column: Column,
        operator: String,
        value: Operand,
        boolean: Boolean,
    },
    /// Raw SQL.
    Raw { sql: String, boolean: Boolean },
}

/// An aggregate function call replacing the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// The SQL function (`count`, `sum`, ...).
    pub function: String,
    /// Its arguments.
    pub columns: Vec<Column>,
}

/// Row locking mode appended to a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// `for update`
    Update,
    /// `lock in share mode`
    Shared,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_operator() {
        assert!(is_operator("="));
        assert!(is_operator("LIKE"));
        assert!(is_operator("not similar to"));
        assert!(!is_operator("John"));
    }

    #[test]
    fn test_prepare_comparison() {
        let (op, value) = prepare_comparison(">", Operand::from(18)).unwrap();
        assert_eq!(op, ">");
        assert_eq!(value, Operand::Value(Value::Int(18)));

        // Unknown operator is the value; the given value is dropped.
        let (op, value) = prepare_comparison("John", Operand::from(1)).unwrap();
        assert_eq!(op, "=");
        assert_eq!(value, Operand::Value(Value::from("John")));

        assert!(prepare_comparison(">", Operand::from(None::<i32>)).is_err());
        assert!(prepare_comparison("<>", Operand::from(None::<i32>)).is_ok());
    }

    #[test]
    fn test_operand_conversions() {
        assert_eq!(Operand::from(1), Operand::Value(Value::Int(1)));
        assert_eq!(Operand::from("x"), Operand::Value(Value::from("x")));
        assert!(Operand::from(None::<&str>).is_null());
        let raw = Operand::from(Expression::new("NOW()"));
        assert_eq!(raw.binding(), None);
    }

    #[test]
    fn test_join_clause_operator_shortcut() {
        let join = JoinClause::new(JoinKind::Inner, "contacts").on("users.id", "contacts.user_id", "ignored");
        match &join.wheres[0] {
            WhereNode::Column { operator, second, .. } => {
                assert_eq!(operator, "=");
                assert_eq!(second, &Column::from("contacts.user_id"));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_join_clause_where_null_value() {
        let join = JoinClause::new(JoinKind::Left, "contacts").where_("contacts.deleted_at", "=", None::<i32>);
        assert!(matches!(join.wheres[0], WhereNode::Null { negated: false, .. }));
        assert!(join.bindings().is_empty());
    }

    #[test]
    fn test_join_clause_nested_empty_is_dropped() {
        let join = JoinClause::new(JoinKind::Inner, "contacts").on_nested(|j| j);
        assert!(join.wheres.is_empty());
    }

    #[test]
    fn test_join_clause_nested_join_bindings_come_first() {
        let mut join = JoinClause::new(JoinKind::Left, "contacts")
            .where_("contacts.kind", "=", "email")
            .nest(JoinKind::Inner, "phones", |j| j.where_("phones.verified", "=", 1));
        assert_eq!(join.joins.len(), 1);
        let (bindings, invalid) = join.take_bindings();
        assert_eq!(bindings, vec![Value::Int(1), Value::from("email")]);
        assert!(invalid.is_none());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("ASC"), Direction::Asc);
        assert_eq!(Direction::parse("down"), Direction::Desc);
    }
}
