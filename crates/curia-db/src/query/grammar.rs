//! SQL compilation for the MySQL dialect.
//!
//! [`Grammar`] turns a [`QuerySpec`] into SQL text with backtick-quoted
//! identifiers and `?` placeholders. Every method is read-only: the `QuerySpec` is
//! never modified, and compiling it twice yields the same text.
//!
//! A `select` is assembled from a fixed sequence of components (aggregate,
//! columns, from, joins, wheres, groups, havings, orders, limit, offset,
//! unions, lock). The binding accumulator flattens its buckets in the same
//! order, which keeps placeholders and values aligned.

use std::collections::BTreeMap;

use curia_core::{CuriaError, CuriaResult};

use super::bindings::{BindingCategory, Bindings};
use super::nodes::{
    Aggregate, Column, Having, JoinClause, LockMode, Operand, OrderClause, WhereNode,
};
use super::spec::QuerySpec;
use crate::value::Value;

/// One row of an insert, keyed by column. Keys iterate in sorted order.
pub type Record = BTreeMap<String, Operand>;

/// The dialect compiler.
///
/// # Examples
///
/// ```
/// use curia_db::query::{Column, Grammar};
///
/// let grammar = Grammar::with_table_prefix("app_");
/// assert_eq!(
///     grammar.wrap(&Column::from("users.name as author")),
///     "`app_users`.`name` as `author`"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    table_prefix: String,
}

impl Grammar {
    /// Creates a grammar with no table prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grammar that prepends `prefix` to every table name.
    pub fn with_table_prefix(prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: prefix.into(),
        }
    }

    /// Returns the table prefix.
    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    // ── Select ──────────────────────────────────────────────────────

    /// Compiles a `select` statement.
    pub fn compile_select(&self, query: &QuerySpec) -> String {
        let star = [Column::Name("*".to_string())];
        let columns: &[Column] = query.columns.as_deref().unwrap_or(&star);

        let segments = [
            query
                .aggregate
                .as_ref()
                .map(|aggregate| self.compile_aggregate(query, aggregate)),
            query
                .aggregate
                .is_none()
                .then(|| self.compile_columns(query, columns)),
            query.table.as_ref().map(|table| self.compile_from(table)),
            (!query.joins.is_empty()).then(|| self.compile_joins(&query.joins)),
            (!query.wheres.is_empty()).then(|| self.compile_wheres(&query.wheres, "where")),
            (!query.groups.is_empty()).then(|| format!("group by {}", self.columnize(&query.groups))),
            (!query.havings.is_empty()).then(|| self.compile_havings(&query.havings)),
            (!query.orders.is_empty()).then(|| self.compile_orders(&query.orders)),
            query.limit.map(|limit| format!("limit {limit}")),
            query.offset.map(|offset| format!("offset {offset}")),
            query.has_unions().then(|| self.compile_unions(query)),
            query.lock.map(|lock| Self::compile_lock(lock).to_string()),
        ];

        segments
            .into_iter()
            .flatten()
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    fn compile_aggregate(&self, query: &QuerySpec, aggregate: &Aggregate) -> String {
        let mut column = self.columnize(&aggregate.columns);
        if query.distinct && column != "*" {
            column = format!("distinct {column}");
        }
        format!("select {}({column}) as aggregate", aggregate.function)
    }

    fn compile_columns(&self, query: &QuerySpec, columns: &[Column]) -> String {
        let select = if query.distinct {
            "select distinct "
        } else {
            "select "
        };
        format!("{select}{}", self.columnize(columns))
    }

    fn compile_from(&self, table: &Column) -> String {
        format!("from {}", self.wrap_table(table))
    }

    fn compile_joins(&self, joins: &[JoinClause]) -> String {
        joins
            .iter()
            .map(|join| {
                let mut table = self.wrap_table(&join.table);
                if !join.joins.is_empty() {
                    table = format!("({table} {})", self.compile_joins(&join.joins));
                }
                let on = if join.wheres.is_empty() {
                    String::new()
                } else {
                    format!(" {}", self.compile_wheres(&join.wheres, "on"))
                };
                format!("{} join {table}{on}", join.kind.as_str())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Compiles a list of predicates, prefixed by `conjunction` (`where`,
    /// or `on` inside a join). An empty list compiles to an empty string.
    pub fn compile_wheres(&self, wheres: &[WhereNode], conjunction: &str) -> String {
        if wheres.is_empty() {
            return String::new();
        }
        format!(
            "{conjunction} {}",
            remove_leading_boolean(&self.join_wheres(wheres))
        )
    }

    fn join_wheres(&self, wheres: &[WhereNode]) -> String {
        wheres
            .iter()
            .map(|node| format!("{} {}", node.boolean().as_str(), self.compile_where(node)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn compile_where(&self, node: &WhereNode) -> String {
        match node {
            WhereNode::Basic {
                column,
                operator,
                value,
                ..
            } => format!("{} {operator} {}", self.wrap(column), self.parameter(value)),
            WhereNode::Nested { wheres, .. } => {
                format!("({})", remove_leading_boolean(&self.join_wheres(wheres)))
            }
            WhereNode::Sub {
                column,
                operator,
                query,
                ..
            } => format!(
                "{} {operator} ({})",
                self.wrap(column),
                self.compile_select(query)
            ),
            WhereNode::In {
                column,
                values,
                negated,
                ..
            } => {
                if values.is_empty() {
                    return if *negated { "1 = 1" } else { "0 = 1" }.to_string();
                }
                format!(
                    "{} {}in ({})",
                    self.wrap(column),
                    not(*negated),
                    self.parameterize(values)
                )
            }
            WhereNode::InSub {
                column,
                query,
                negated,
                ..
            } => format!(
                "{} {}in ({})",
                self.wrap(column),
                not(*negated),
                self.compile_select(query)
            ),
            WhereNode::Null {
                column, negated, ..
            } => format!("{} is {}null", self.wrap(column), not(*negated)),
            WhereNode::Between {
                column,
                low,
                high,
                negated,
                ..
            } => format!(
                "{} {}between {} and {}",
                self.wrap(column),
                not(*negated),
                self.parameter(low),
                self.parameter(high)
            ),
            WhereNode::DatePart {
                part,
                column,
                operator,
                value,
                ..
            } => format!(
                "{}({}) {operator} {}",
                part.as_str(),
                self.wrap(column),
                self.parameter(value)
            ),
            WhereNode::Column {
                first,
                operator,
                second,
                ..
            } => format!("{} {operator} {}", self.wrap(first), self.wrap(second)),
            WhereNode::Exists { query, negated, .. } => {
                format!("{}exists ({})", not(*negated), self.compile_select(query))
            }
            WhereNode::Raw { sql, .. } => sql.clone(),
        }
    }

    fn compile_havings(&self, havings: &[Having]) -> String {
        let sql = havings
            .iter()
            .map(|having| match having {
                Having::Basic {
                    column,
                    operator,
                    value,
                    boolean,
                } => format!(
                    "{} {} {operator} {}",
                    boolean.as_str(),
                    self.wrap(column),
                    self.parameter(value)
                ),
                Having::Raw { sql, boolean } => format!("{} {sql}", boolean.as_str()),
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!("having {}", remove_leading_boolean(&sql))
    }

    fn compile_orders(&self, orders: &[OrderClause]) -> String {
        if orders.is_empty() {
            return String::new();
        }
        let items: Vec<String> = orders
            .iter()
            .map(|order| match order {
                OrderClause::Column { column, direction } => {
                    format!("{} {}", self.wrap(column), direction.as_str())
                }
                OrderClause::Raw { sql } => sql.clone(),
            })
            .collect();
        format!("order by {}", items.join(", "))
    }

    fn compile_unions(&self, query: &QuerySpec) -> String {
        let mut sql = String::new();
        for union in &query.unions {
            let conjunction = if union.all { " union all " } else { " union " };
            sql.push_str(&format!("{conjunction}({})", self.compile_select(&union.query)));
        }
        if !query.union_orders.is_empty() {
            sql.push_str(&format!(" {}", self.compile_orders(&query.union_orders)));
        }
        if let Some(limit) = query.union_limit {
            sql.push_str(&format!(" limit {limit}"));
        }
        if let Some(offset) = query.union_offset {
            sql.push_str(&format!(" offset {offset}"));
        }
        sql.trim_start().to_string()
    }

    const fn compile_lock(lock: LockMode) -> &'static str {
        match lock {
            LockMode::Update => "for update",
            LockMode::Shared => "lock in share mode",
        }
    }

    /// Returns the `order by` fragment for random ordering.
    pub fn compile_random(seed: &str) -> String {
        format!("RAND({seed})")
    }

    /// Compiles `select exists(<select>) as `exists``.
    pub fn compile_exists(&self, query: &QuerySpec) -> String {
        format!(
            "select exists({}) as {}",
            self.compile_select(query),
            self.wrap_value("exists")
        )
    }

    // ── Writes ──────────────────────────────────────────────────────

    fn require_table(&self, query: &QuerySpec, statement: &str) -> CuriaResult<String> {
        query
            .table
            .as_ref()
            .map(|table| self.wrap_table(table))
            .ok_or_else(|| {
                CuriaError::ValidationError(format!("Cannot compile {statement} without a table."))
            })
    }

    /// Compiles a (batch) insert.
    ///
    /// The column list comes from the first record; every other record must
    /// have exactly the same columns.
    pub fn compile_insert(&self, query: &QuerySpec, records: &[Record]) -> CuriaResult<String> {
        let table = self.require_table(query, "an insert")?;
        let first = records.first().ok_or_else(|| {
            CuriaError::ValidationError("Cannot compile an insert without records.".to_string())
        })?;
        if records.iter().any(|record| !record.keys().eq(first.keys())) {
            return Err(CuriaError::ValidationError(
                "Every inserted record must have the same columns.".to_string(),
            ));
        }

        let columns = first
            .keys()
            .map(|key| self.wrap_str(key))
            .collect::<Vec<_>>()
            .join(", ");
        let parameters = records
            .iter()
            .map(|record| format!("({})", self.parameterize(record.values())))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("insert into {table} ({columns}) values {parameters}"))
    }

    /// Bindings for [`compile_insert`](Self::compile_insert): every non-raw
    /// value, record by record.
    pub fn prepare_bindings_for_insert(records: &[Record]) -> Vec<Value> {
        records
            .iter()
            .flat_map(|record| record.values().filter_map(Operand::binding).cloned())
            .collect()
    }

    /// Compiles an update. Joins, wheres, `order by` and `limit` carry over.
    pub fn compile_update(
        &self,
        query: &QuerySpec,
        values: &[(String, Operand)],
    ) -> CuriaResult<String> {
        let table = self.require_table(query, "an update")?;
        let columns = values
            .iter()
            .map(|(column, value)| format!("{} = {}", self.wrap_str(column), self.parameter(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let joins = if query.joins.is_empty() {
            String::new()
        } else {
            format!(" {}", self.compile_joins(&query.joins))
        };
        let wheres = self.compile_wheres(&query.wheres, "where");

        let mut sql = format!("update {table}{joins} set {columns} {wheres}")
            .trim_end()
            .to_string();
        if !query.orders.is_empty() {
            sql.push_str(&format!(" {}", self.compile_orders(&query.orders)));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" limit {limit}"));
        }
        Ok(sql)
    }

    /// Bindings for [`compile_update`](Self::compile_update): join values,
    /// then the new column values, then everything else except `select`.
    pub fn prepare_bindings_for_update(bindings: &Bindings, values: &[(String, Operand)]) -> Vec<Value> {
        let mut flat = bindings.get(BindingCategory::Join).to_vec();
        flat.extend(values.iter().filter_map(|(_, value)| value.binding()).cloned());
        flat.extend(bindings.flatten_except(&[BindingCategory::Select, BindingCategory::Join]));
        flat
    }

    /// Compiles a delete. With joins the deleted table is named by its alias.
    pub fn compile_delete(&self, query: &QuerySpec) -> CuriaResult<String> {
        let table = self.require_table(query, "a delete")?;
        let wheres = self.compile_wheres(&query.wheres, "where");

        if !query.joins.is_empty() {
            let joins = self.compile_joins(&query.joins);
            let alias = split_alias(&table).map_or(table.as_str(), |(_, alias)| alias);
            return Ok(format!("delete {alias} from {table} {joins} {wheres}")
                .trim()
                .to_string());
        }

        let mut sql = format!("delete from {table} {wheres}").trim().to_string();
        if !query.orders.is_empty() {
            sql.push_str(&format!(" {}", self.compile_orders(&query.orders)));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" limit {limit}"));
        }
        Ok(sql)
    }

    /// Bindings for [`compile_delete`](Self::compile_delete).
    pub fn prepare_bindings_for_delete(bindings: &Bindings) -> Vec<Value> {
        let mut flat = bindings.get(BindingCategory::Join).to_vec();
        flat.extend(bindings.flatten_except(&[BindingCategory::Select, BindingCategory::Join]));
        flat
    }

    /// Compiles `truncate <table>`.
    pub fn compile_truncate(&self, query: &QuerySpec) -> CuriaResult<String> {
        Ok(format!("truncate {}", self.require_table(query, "a truncate")?))
    }

    // ── Identifiers and parameters ──────────────────────────────────

    /// Wraps a column reference. Raw SQL passes through untouched.
    pub fn wrap(&self, column: &Column) -> String {
        match column {
            Column::Name(name) => self.wrap_str(name),
            Column::Raw(expr) => expr.value().to_string(),
        }
    }

    /// Wraps a dotted, possibly aliased, identifier.
    ///
    /// The first of several dotted segments is a table and gets the prefix.
    pub fn wrap_str(&self, value: &str) -> String {
        if let Some((name, alias)) = split_alias(value) {
            return format!("{} as {}", self.wrap_str(name), self.wrap_value(alias));
        }

        let segments: Vec<&str> = value.split('.').collect();
        let many = segments.len() > 1;
        segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                if i == 0 && many {
                    self.wrap_table_str(segment)
                } else {
                    self.wrap_value(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Wraps a table reference, applying the prefix.
    pub fn wrap_table(&self, table: &Column) -> String {
        match table {
            Column::Name(name) => self.wrap_table_str(name),
            Column::Raw(expr) => expr.value().to_string(),
        }
    }

    /// The prefix goes on the last dotted segment only, so
    /// `schema.users` becomes `schema`.`<prefix>users`. Aliases are left
    /// unprefixed.
    fn wrap_table_str(&self, table: &str) -> String {
        if let Some((name, alias)) = split_alias(table) {
            return format!("{} as {}", self.wrap_table_str(name), self.wrap_value(alias));
        }
        let prefixed = |name: &str| self.wrap_value(&format!("{}{name}", self.table_prefix));
        match table.rsplit_once('.') {
            Some((schema, name)) => {
                let schema = schema
                    .split('.')
                    .map(|segment| self.wrap_value(segment))
                    .collect::<Vec<_>>()
                    .join(".");
                format!("{schema}.{}", prefixed(name))
            }
            None => prefixed(table),
        }
    }

    /// Quotes a single identifier segment. `*` is left alone.
    pub fn wrap_value(&self, value: &str) -> String {
        if value == "*" {
            return value.to_string();
        }
        format!("`{}`", value.replace('`', "``"))
    }

    /// Wraps and comma-joins a column list.
    pub fn columnize(&self, columns: &[Column]) -> String {
        columns
            .iter()
            .map(|column| self.wrap(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `?` for a bound value, the SQL text for raw SQL.
    pub fn parameter(&self, value: &Operand) -> String {
        match value {
            Operand::Value(_) => "?".to_string(),
            Operand::Raw(expr) => expr.value().to_string(),
        }
    }

    /// Comma-joined [`parameter`](Self::parameter)s.
    pub fn parameterize<'a>(&self, values: impl IntoIterator<Item = &'a Operand>) -> String {
        values
            .into_iter()
            .map(|value| self.parameter(value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

const fn not(negated: bool) -> &'static str {
    if negated {
        "not "
    } else {
        ""
    }
}

/// Drops the connector in front of the first predicate.
fn remove_leading_boolean(sql: &str) -> &str {
    sql.strip_prefix("and ")
        .or_else(|| sql.strip_prefix("or "))
        .unwrap_or(sql)
}

/// Splits `name as alias` (any case) into its two sides.
fn split_alias(value: &str) -> Option<(&str, &str)> {
    let pos = value.to_ascii_lowercase().find(" as ")?;
    Some((value[..pos].trim_end(), value[pos + 4..].trim_start()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::nodes::{Boolean, Direction, JoinKind, UnionClause};
    use crate::query::Expression;

    fn grammar() -> Grammar {
        Grammar::new()
    }

    // ── Identifier wrapping ─────────────────────────────────────────

    #[test]
    fn test_wrap_plain_and_dotted() {
        let g = grammar();
        assert_eq!(g.wrap_str("name"), "`name`");
        assert_eq!(g.wrap_str("users.name"), "`users`.`name`");
        assert_eq!(g.wrap_str("users.*"), "`users`.*");
        assert_eq!(g.wrap_str("*"), "*");
    }

    #[test]
    fn test_wrap_alias() {
        let g = grammar();
        assert_eq!(
            g.wrap_str("orders.total as grand_total"),
            "`orders`.`total` as `grand_total`"
        );
        assert_eq!(g.wrap_str("name AS n"), "`name` as `n`");
    }

    #[test]
    fn test_wrap_escapes_backticks() {
        assert_eq!(grammar().wrap_str("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_wrap_raw_expression() {
        let raw = Column::Raw(Expression::new("count(*) as c"));
        assert_eq!(grammar().wrap(&raw), "count(*) as c");
    }

    #[test]
    fn test_table_prefix() {
        let g = Grammar::with_table_prefix("app_");
        assert_eq!(g.wrap_str("users.id"), "`app_users`.`id`");
        assert_eq!(g.wrap_str("id"), "`id`");
        assert_eq!(g.wrap_table(&Column::from("users as u")), "`app_users` as `u`");
    }

    #[test]
    fn test_table_prefix_on_schema_qualified_table() {
        let g = Grammar::with_table_prefix("app_");
        assert_eq!(g.wrap_table(&Column::from("crm.users")), "`crm`.`app_users`");
        assert_eq!(
            g.wrap_table(&Column::from("crm.users as u")),
            "`crm`.`app_users` as `u`"
        );
        let spec = QuerySpec::for_table("crm.users");
        assert_eq!(g.compile_select(&spec), "select * from `crm`.`app_users`");
    }

    // ── Select ──────────────────────────────────────────────────────

    #[test]
    fn test_select_star() {
        let spec = QuerySpec::for_table("users");
        assert_eq!(grammar().compile_select(&spec), "select * from `users`");
        // Compilation leaves the column list unset.
        assert!(spec.columns.is_none());
    }

    #[test]
    fn test_select_without_table() {
        let mut spec = QuerySpec::new();
        spec.columns = Some(vec![Column::Raw(Expression::new("1 as one"))]);
        assert_eq!(grammar().compile_select(&spec), "select 1 as one");
    }

    #[test]
    fn test_empty_in_sets() {
        let mut spec = QuerySpec::for_table("users");
        spec.wheres.push(WhereNode::In {
            column: "id".into(),
            values: vec![],
            negated: false,
            boolean: Boolean::And,
        });
        spec.wheres.push(WhereNode::In {
            column: "id".into(),
            values: vec![],
            negated: true,
            boolean: Boolean::Or,
        });
        assert_eq!(
            grammar().compile_select(&spec),
            "select * from `users` where 0 = 1 or 1 = 1"
        );
    }

    #[test]
    fn test_join_renders_on() {
        let mut spec = QuerySpec::for_table("posts");
        spec.joins.push(
            JoinClause::new(JoinKind::Left, "users as u")
                .on("posts.user_id", "=", "u.id")
                .or_on("posts.editor_id", "=", "u.id"),
        );
        spec.joins.push(JoinClause::new(JoinKind::Cross, "tags"));
        assert_eq!(
            grammar().compile_select(&spec),
            "select * from `posts` left join `users` as `u` on `posts`.`user_id` = `u`.`id` \
             or `posts`.`editor_id` = `u`.`id` cross join `tags`"
        );
    }

    #[test]
    fn test_aggregate_distinct() {
        let mut spec = QuerySpec::for_table("users");
        spec.distinct = true;
        spec.aggregate = Some(Aggregate {
            function: "count".into(),
            columns: vec!["email".into()],
        });
        assert_eq!(
            grammar().compile_select(&spec),
            "select count(distinct `email`) as aggregate from `users`"
        );

        spec.aggregate = Some(Aggregate {
            function: "count".into(),
            columns: vec!["*".into()],
        });
        assert_eq!(
            grammar().compile_select(&spec),
            "select count(*) as aggregate from `users`"
        );
    }

    #[test]
    fn test_unions_with_trailing_order_and_limit() {
        let mut spec = QuerySpec::for_table("a");
        spec.unions.push(UnionClause {
            query: Box::new(QuerySpec::for_table("b")),
            all: false,
        });
        spec.unions.push(UnionClause {
            query: Box::new(QuerySpec::for_table("c")),
            all: true,
        });
        spec.union_orders.push(OrderClause::Column {
            column: "id".into(),
            direction: Direction::Desc,
        });
        spec.union_limit = Some(5);
        assert_eq!(
            grammar().compile_select(&spec),
            "select * from `a` union (select * from `b`) union all (select * from `c`) \
             order by `id` desc limit 5"
        );
    }

    #[test]
    fn test_lock_modes() {
        let mut spec = QuerySpec::for_table("accounts");
        spec.lock = Some(LockMode::Update);
        assert_eq!(grammar().compile_select(&spec), "select * from `accounts` for update");
        spec.lock = Some(LockMode::Shared);
        assert_eq!(
            grammar().compile_select(&spec),
            "select * from `accounts` lock in share mode"
        );
    }

    #[test]
    fn test_exists() {
        let spec = QuerySpec::for_table("users");
        assert_eq!(
            grammar().compile_exists(&spec),
            "select exists(select * from `users`) as `exists`"
        );
    }

    // ── Writes ──────────────────────────────────────────────────────

    fn record(pairs: &[(&str, i64)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Operand::from(*v)))
            .collect()
    }

    #[test]
    fn test_insert_batch() {
        let spec = QuerySpec::for_table("t");
        let records = vec![record(&[("b", 2), ("a", 1)]), record(&[("a", 3), ("b", 4)])];
        assert_eq!(
            grammar().compile_insert(&spec, &records).unwrap(),
            "insert into `t` (`a`, `b`) values (?, ?), (?, ?)"
        );
        assert_eq!(
            Grammar::prepare_bindings_for_insert(&records),
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
        );
    }

    #[test]
    fn test_insert_rejects_mismatched_records() {
        let spec = QuerySpec::for_table("t");
        let records = vec![record(&[("a", 1), ("b", 2)]), record(&[("a", 3), ("c", 4)])];
        let err = grammar().compile_insert(&spec, &records).unwrap_err();
        assert!(matches!(err, CuriaError::ValidationError(_)));
    }

    #[test]
    fn test_write_without_table() {
        let spec = QuerySpec::new();
        assert!(grammar().compile_delete(&spec).is_err());
        assert!(grammar().compile_truncate(&spec).is_err());
    }

    #[test]
    fn test_update_with_order_and_limit() {
        let mut spec = QuerySpec::for_table("users");
        spec.wheres.push(WhereNode::Basic {
            column: "id".into(),
            operator: ">".into(),
            value: Operand::from(10),
            boolean: Boolean::And,
        });
        spec.orders.push(OrderClause::Column {
            column: "id".into(),
            direction: Direction::Asc,
        });
        spec.limit = Some(1);
        let values = vec![
            ("name".to_string(), Operand::from("x")),
            ("votes".to_string(), Operand::Raw(Expression::new("`votes` + 1"))),
        ];
        assert_eq!(
            grammar().compile_update(&spec, &values).unwrap(),
            "update `users` set `name` = ?, `votes` = `votes` + 1 where `id` > ? order by `id` asc limit 1"
        );
    }

    #[test]
    fn test_update_bindings_order() {
        let mut bindings = Bindings::new();
        bindings.add(BindingCategory::Where, Value::Int(3));
        bindings.add(BindingCategory::Join, Value::Int(1));
        bindings.add(BindingCategory::Select, Value::Int(99));
        let values = vec![("a".to_string(), Operand::from(2))];
        assert_eq!(
            Grammar::prepare_bindings_for_update(&bindings, &values),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn test_delete_with_join_uses_alias() {
        let mut spec = QuerySpec::for_table("users as u");
        spec.joins
            .push(JoinClause::new(JoinKind::Inner, "posts").on("posts.user_id", "=", "u.id"));
        assert_eq!(
            grammar().compile_delete(&spec).unwrap(),
            "delete `u` from `users` as `u` inner join `posts` on `posts`.`user_id` = `u`.`id`"
        );
    }

    #[test]
    fn test_delete_plain() {
        let mut spec = QuerySpec::for_table("users");
        spec.limit = Some(2);
        assert_eq!(grammar().compile_delete(&spec).unwrap(), "delete from `users` limit 2");
        assert_eq!(grammar().compile_truncate(&spec).unwrap(), "truncate `users`");
    }

    #[test]
    fn test_compile_random() {
        assert_eq!(Grammar::compile_random(""), "RAND()");
        assert_eq!(Grammar::compile_random("7"), "RAND(7)");
    }
}
