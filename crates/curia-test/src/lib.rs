//! # curia-test
//!
//! Testing utilities for curia: an in-memory SQLite [`TestDatabase`] that
//! counts the statements run through it, and assertions over that count for
//! catching N+1 query patterns.

#![allow(clippy::result_large_err)]

pub mod assert_queries;
pub mod test_database;

pub use assert_queries::{assert_max_queries, assert_num_queries};
pub use test_database::TestDatabase;
