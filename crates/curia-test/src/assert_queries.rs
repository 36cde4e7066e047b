//! Query counting assertions for database tests.
//!
//! Provides [`assert_num_queries`] which counts the number of SQL statements
//! run during a closure and asserts that the count matches an expected
//! value. This is essential for detecting N+1 query problems.
//!
//! ## Example
//!
//! ```
//! use curia_test::{assert_num_queries, TestDatabase};
//!
//! let db = TestDatabase::new();
//! db.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, val TEXT)").unwrap();
//!
//! let count = assert_num_queries(&db, 2, || {
//!     db.table("t").insert([("val", "x")]).unwrap();
//!     db.table("t").count().unwrap()
//! });
//! assert_eq!(count, 1);
//! ```

use crate::test_database::TestDatabase;

/// Asserts that exactly `expected_count` SQL statements run during `f`, and
/// returns what `f` returned.
///
/// Resets the query counter on the [`TestDatabase`] before running the
/// closure. The failure message lists the statements that ran.
///
/// # Panics
///
/// Panics if the number of statements does not match `expected_count`.
pub fn assert_num_queries<T>(db: &TestDatabase, expected_count: usize, f: impl FnOnce() -> T) -> T {
    db.reset_query_count();
    let result = f();
    let actual = db.query_count();
    assert_eq!(
        actual,
        expected_count,
        "Expected {expected_count} SQL queries, but {actual} were executed: {:?}",
        db.queries()
    );
    result
}

/// Asserts that at most `max_count` SQL statements run during `f`.
///
/// Useful when the exact count is not important but you want to prevent
/// query count regression.
///
/// # Panics
///
/// Panics if more than `max_count` statements run.
pub fn assert_max_queries<T>(db: &TestDatabase, max_count: usize, f: impl FnOnce() -> T) -> T {
    db.reset_query_count();
    let result = f();
    let actual = db.query_count();
    assert!(
        actual <= max_count,
        "Expected at most {max_count} SQL queries, but {actual} were executed: {:?}",
        db.queries()
    );
    result
}
