//! Query construction and compilation.
//!
//! - [`expression`] - raw SQL fragments
//! - [`bindings`] - the category-bucketed binding accumulator
//! - [`nodes`] - where, join, order, having and union nodes
//! - [`spec`] - the [`QuerySpec`] description of one statement
//! - [`grammar`] - the MySQL-dialect compiler
//! - [`builder`] - the fluent [`QueryBuilder`] and its terminal operations

pub mod bindings;
pub mod builder;
pub mod expression;
pub mod grammar;
pub mod nodes;
pub mod spec;

pub use bindings::{BindingCategory, Bindings};
pub use builder::QueryBuilder;
pub use expression::Expression;
pub use grammar::{Grammar, Record};
pub use nodes::{
    is_operator, Aggregate, Boolean, Column, DatePart, Direction, Having, JoinClause, JoinKind,
    LockMode, Operand, OrderClause, UnionClause, WhereNode, OPERATORS,
};
pub use spec::{Field, QuerySpec};
