//! End-to-end tests for curia.
//!
//! These tests exercise the complete path:
//!   fluent builder -> grammar -> bindings -> SQLite adapter -> rows
//!
//! against a fresh in-memory database per test. Only syntax shared by MySQL
//! and SQLite is used here; MySQL-only output (unions, `RAND()`, date-part
//! functions, truncate) is covered by the compiler's unit tests.

use curia_core::{CuriaError, CuriaResult};
use curia_db::{transaction, ConnectionExt, Model, Row, Value};
use curia_test::{assert_max_queries, assert_num_queries, TestDatabase};

// ============================================================================
// Fixtures
// ============================================================================

fn blog() -> TestDatabase {
    let db = TestDatabase::new();
    db.execute_raw(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            role TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            deleted_at TEXT
        );
        CREATE TABLE posts (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            title TEXT NOT NULL,
            score INTEGER NOT NULL DEFAULT 0
        );",
    )
    .unwrap();

    db.table("users")
        .insert_batch([
            vec![("name", Value::from("ann")), ("age", Value::from(34)), ("role", Value::from("admin"))],
            vec![("name", Value::from("bob")), ("age", Value::from(17)), ("role", Value::from("member"))],
            vec![("name", Value::from("cy")), ("age", Value::from(25)), ("role", Value::from("member"))],
            vec![("name", Value::from("dee")), ("age", Value::from(41)), ("role", Value::Null)],
        ])
        .unwrap();
    db.table("users")
        .where_eq("name", "dee")
        .update([("active", Value::from(0)), ("deleted_at", Value::from("2024-01-01"))])
        .unwrap();

    db.table("posts")
        .insert_batch([
            [("user_id", Value::from(1)), ("title", Value::from("hello")), ("score", Value::from(10))],
            [("user_id", Value::from(1)), ("title", Value::from("again")), ("score", Value::from(5))],
            [("user_id", Value::from(3)), ("title", Value::from("notes")), ("score", Value::from(7))],
            [("user_id", Value::from(4)), ("title", Value::from("old")), ("score", Value::from(1))],
        ])
        .unwrap();
    db.reset_query_count();
    db
}

fn names(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|row| row.get::<String>("name").unwrap()).collect()
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn test_where_order_limit() {
    let db = blog();
    let query = db.table("users").where_("age", ">", 18).order_by("name", "asc").limit(10);
    assert_eq!(
        query.to_sql().unwrap(),
        "select * from `users` where `age` > ? order by `name` asc limit 10"
    );
    assert_eq!(query.get_bindings(), vec![Value::Int(18)]);
    assert_eq!(names(&query.get().unwrap()), vec!["ann", "cy", "dee"]);
}

#[test]
fn test_where_in_and_empty_sets() {
    let db = blog();
    let rows = db.table("users").where_in("id", [1, 2, 3]).get().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(db.queries(), vec!["select * from `users` where `id` in (?, ?, ?)"]);

    let none = db.table("users").where_in("id", Vec::<i64>::new()).get().unwrap();
    assert!(none.is_empty());
    let all = db.table("users").where_not_in("id", Vec::<i64>::new()).count().unwrap();
    assert_eq!(all, 4);
}

#[test]
fn test_null_or_where() {
    let db = blog();
    let query = db.table("users").where_null("deleted_at").or_where("role", "=", "admin");
    assert_eq!(
        query.to_sql().unwrap(),
        "select * from `users` where `deleted_at` is null or `role` = ?"
    );
    assert_eq!(query.get().unwrap().len(), 3);
}

#[test]
fn test_nested_where_groups() {
    let db = blog();
    let rows = db
        .table("users")
        .where_eq("active", 1)
        .where_nested(|q| q.where_("age", "<", 18).or_where("role", "=", "admin"))
        .order_by("id", "asc")
        .get()
        .unwrap();
    assert_eq!(names(&rows), vec!["ann", "bob"]);
}

#[test]
fn test_join_count() {
    let db = blog();
    let count = assert_num_queries(&db, 1, || {
        db.table("posts")
            .join("users", "posts.user_id", "=", "users.id")
            .where_eq("users.active", 1)
            .count()
            .unwrap()
    });
    assert_eq!(count, 3);
    assert_eq!(
        db.queries()[0],
        "select count(*) as aggregate from `posts` inner join `users` on `posts`.`user_id` = `users`.`id` where `users`.`active` = ?"
    );
}

#[test]
fn test_left_join_with_select_aliases() {
    let db = blog();
    let rows = db
        .table("users")
        .select(["users.name", "posts.score as points"])
        .left_join("posts", "posts.user_id", "=", "users.id")
        .where_eq("users.name", "bob")
        .get()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_value("points"), Some(&Value::Null));
}

#[test]
fn test_group_by_having() {
    let db = blog();
    let rows = db
        .table("posts")
        .select_raw("user_id, sum(score) as total", vec![])
        .group_by(["user_id"])
        .having_raw("sum(score) > ?", vec![Value::from(6)])
        .order_by("user_id", "asc")
        .get()
        .unwrap();
    let totals: Vec<(i64, i64)> = rows
        .iter()
        .map(|row| (row.get("user_id").unwrap(), row.get("total").unwrap()))
        .collect();
    assert_eq!(totals, vec![(1, 15), (3, 7)]);
}

#[test]
fn test_aggregates() {
    let db = blog();
    let posts = db.table("posts");
    assert_eq!(posts.count().unwrap(), 4);
    assert_eq!(posts.sum("score").unwrap(), Value::Int(23));
    assert_eq!(posts.max("score").unwrap(), Some(Value::Int(10)));
    assert_eq!(posts.min("score").unwrap(), Some(Value::Int(1)));
    assert_eq!(posts.avg("score").unwrap(), Some(Value::Float(5.75)));
    assert_eq!(posts.clone().where_eq("user_id", 99).max("score").unwrap(), None);
    assert_eq!(posts.where_eq("user_id", 99).sum("score").unwrap(), Value::Int(0));
}

#[test]
fn test_ordered_count_drops_order() {
    let db = blog();
    let count = db.table("users").order_by_desc("age").count().unwrap();
    assert_eq!(count, 4);
    assert_eq!(db.queries(), vec!["select count(*) as aggregate from `users`"]);
}

#[test]
fn test_pluck_implode_value() {
    let db = blog();
    let users = db.table("users").order_by("id", "asc");
    assert_eq!(
        users.pluck("users.name").unwrap(),
        vec![Value::from("ann"), Value::from("bob"), Value::from("cy"), Value::from("dee")]
    );
    assert_eq!(users.implode("role", ",").unwrap(), "admin,member,member,");
    assert_eq!(
        users.pluck_with_key("name", "id").unwrap()[1],
        (Value::Int(2), Value::from("bob"))
    );
    assert_eq!(users.value("name").unwrap(), Some(Value::from("ann")));
}

#[test]
fn test_exists_and_sub_queries() {
    let db = blog();
    assert!(db.table("users").where_eq("role", "admin").exists().unwrap());
    assert!(db.table("users").where_eq("role", "owner").doesnt_exist().unwrap());

    let authors = db
        .table("users")
        .where_exists(|q| {
            q.from("posts")
                .where_column("posts.user_id", "=", "users.id")
                .where_("posts.score", ">=", 5)
        })
        .order_by("id", "asc")
        .get()
        .unwrap();
    assert_eq!(names(&authors), vec!["ann", "cy"]);

    let silent = db
        .table("users")
        .where_not_in_sub("id", |q| q.from("posts").select(["user_id"]))
        .pluck("name")
        .unwrap();
    assert_eq!(silent, vec![Value::from("bob")]);
}

#[test]
fn test_between_and_pagination() {
    let db = blog();
    let page = db
        .table("users")
        .where_between("age", 18, 40)
        .order_by("age", "asc")
        .for_page(1, 1)
        .get()
        .unwrap();
    assert_eq!(names(&page), vec!["cy"]);

    let second = db.table("users").order_by("id", "asc").for_page(2, 3).get().unwrap();
    assert_eq!(names(&second), vec!["dee"]);
}

#[test]
fn test_when_applies_conditionally() {
    let db = blog();
    let only_adults = true;
    let filtered = db
        .table("users")
        .when(only_adults, |q| q.where_("age", ">=", 18))
        .when(false, |q| q.where_eq("role", "admin"))
        .count()
        .unwrap();
    assert_eq!(filtered, 3);
}

#[test]
fn test_first_or_fail_and_find() {
    let db = blog();
    let ann = db.table("users").find_or_fail(1).unwrap();
    assert_eq!(ann.get::<String>("name").unwrap(), "ann");
    assert!(db.table("users").find(42).unwrap().is_none());
    let err = db.table("users").where_eq("name", "zed").first_or_fail().unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Writes
// ============================================================================

#[test]
fn test_update_or_insert() {
    let db = blog();
    assert_max_queries(&db, 2, || {
        db.table("users")
            .update_or_insert([("name", "eve")], [("age", 29)])
            .unwrap();
    });
    assert_eq!(db.table("users").where_eq("name", "eve").value("age").unwrap(), Some(Value::Int(29)));
    assert_eq!(db.table("users").where_eq("name", "eve").count().unwrap(), 1);
}

#[test]
fn test_increment_with_extra_columns() {
    let db = blog();
    let affected = db
        .table("posts")
        .where_eq("user_id", 1)
        .increment_with("score", 2, [("title", "bumped")])
        .unwrap();
    assert_eq!(affected, 2);
    assert_eq!(db.table("posts").where_eq("title", "bumped").sum("score").unwrap(), Value::Int(19));

    let err = db.table("posts").increment("score", "lots").unwrap_err();
    assert!(matches!(err, CuriaError::ConfigurationError(_)));
}

#[test]
fn test_delete_by_id_and_where() {
    let db = blog();
    assert_eq!(db.table("posts").delete_by_id(4).unwrap(), 1);
    assert_eq!(db.table("posts").where_("score", "<", 8).delete().unwrap(), 2);
    assert_eq!(db.table("posts").pluck("id").unwrap(), vec![Value::Int(1)]);
}

#[test]
fn test_heterogeneous_batch_insert_is_rejected() {
    let db = blog();
    let err = assert_num_queries(&db, 0, || {
        db.table("posts")
            .insert_batch([
                vec![("user_id", Value::from(1)), ("title", Value::from("a"))],
                vec![("user_id", Value::from(1)), ("score", Value::from(3))],
            ])
            .unwrap_err()
    });
    assert!(matches!(err, CuriaError::ValidationError(_)));
}

#[test]
fn test_transaction_rollback_discards_writes() {
    let db = blog();
    let conn = db.connection();
    let result: CuriaResult<()> = transaction(&conn, |conn| {
        conn.table("posts").delete()?;
        Err(CuriaError::validation("keep the posts"))
    });
    assert!(result.is_err());
    assert_eq!(db.table("posts").count().unwrap(), 4);
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, PartialEq)]
struct Post {
    id: i64,
    user_id: i64,
    title: String,
}

impl Model for Post {
    fn table_name() -> &'static str {
        "posts"
    }

    fn from_row(row: &Row) -> CuriaResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
        })
    }
}

#[test]
fn test_model_round_trip() {
    let db = blog();
    let manager = db.manager();

    let created = Post::create(&manager, [("user_id", Value::from(2)), ("title", Value::from("hi"))]).unwrap();
    assert_eq!(
        created,
        Post {
            id: 5,
            user_id: 2,
            title: "hi".to_string()
        }
    );
    assert_eq!(Post::all(&manager).unwrap().len(), 5);
    assert_eq!(Post::destroy(&manager, 5).unwrap(), 1);
    assert!(Post::find(&manager, 5).unwrap().is_none());

    let by_ann = Post::query(&manager).unwrap().where_eq("user_id", 1).count().unwrap();
    assert_eq!(by_ann, 2);
}
