//!
//! # Dynamic Query Construction
//!
//! Per-request SQL is assembled from typed predicate and assignment lists
//! with positional-parameter tracking. Column names come from fixed string
//! literals inside this crate; user-supplied values only ever travel as bind
//! parameters, so the "only supplied fields" semantics never opens an
//! injection path. The generated SQL is executed with
//! `sqlx::query_as_with` / `query_scalar_with` against a `PgArguments`
//! buffer built from the same typed list.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;

use crate::models::TodoPriority;

/// A typed value destined for a positional bind parameter.
///
/// Nullable variants carry `Option` so an explicit SQL NULL can be bound
/// for sparse updates that clear a column.
#[derive(Debug, Clone)]
pub enum SqlParam {
    Int(i32),
    BigInt(i64),
    Bool(bool),
    Text(Option<String>),
    Priority(TodoPriority),
    Timestamp(Option<DateTime<Utc>>),
}

impl SqlParam {
    /// Encodes this value into the argument buffer, in positional order.
    pub fn add_to(self, args: &mut PgArguments) {
        match self {
            SqlParam::Int(v) => args.add(v),
            SqlParam::BigInt(v) => args.add(v),
            SqlParam::Bool(v) => args.add(v),
            SqlParam::Text(v) => args.add(v),
            SqlParam::Priority(v) => args.add(v),
            SqlParam::Timestamp(v) => args.add(v),
        }
    }
}

/// Builds a `PgArguments` buffer from a parameter list.
pub fn build_arguments<I>(params: I) -> PgArguments
where
    I: IntoIterator<Item = SqlParam>,
{
    let mut args = PgArguments::default();
    for param in params {
        param.add_to(&mut args);
    }
    args
}

/// Conjunctive WHERE predicate builder.
///
/// Clauses are appended in call order and joined with AND, so callers control
/// the (stable, testable) parameter positions. The first clause pushed is
/// always the owner-equality predicate.
#[derive(Debug, Default)]
pub struct PredicateList {
    clauses: Vec<String>,
    params: Vec<SqlParam>,
}

impl PredicateList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `column = $n` where `n` is the next parameter position.
    pub fn push(&mut self, column: &str, param: SqlParam) {
        self.clauses.push(format!("{} = ${}", column, self.params.len() + 1));
        self.params.push(param);
    }

    pub fn where_clause(&self) -> String {
        self.clauses.join(" AND ")
    }

    /// The placeholder index the next pushed parameter would receive.
    /// Used when a caller appends LIMIT/OFFSET placeholders by hand.
    pub fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// Argument buffer for this predicate set. Callable repeatedly, so the
    /// count query and the page query bind the identical values.
    pub fn arguments(&self) -> PgArguments {
        build_arguments(self.params.iter().cloned())
    }
}

/// SET-assignment builder for partial updates.
///
/// Only explicitly supplied fields are pushed; `build_update` then appends the
/// unconditional `updated_at = NOW()` refresh and the `id AND user_id`
/// ownership predicate, making ownership verification and mutation a single
/// atomic statement.
#[derive(Debug, Default)]
pub struct AssignmentList {
    assignments: Vec<String>,
    params: Vec<SqlParam>,
}

impl AssignmentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: &str, param: SqlParam) {
        self.assignments
            .push(format!("{} = ${}", column, self.params.len() + 1));
        self.params.push(param);
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Compiles the final UPDATE statement and its bind list.
    pub fn build_update(
        mut self,
        returning: &str,
        todo_id: i32,
        user_id: i32,
    ) -> (String, Vec<SqlParam>) {
        self.assignments.push("updated_at = NOW()".to_string());
        let id_pos = self.params.len() + 1;
        let sql = format!(
            "UPDATE todos SET {} WHERE id = ${} AND user_id = ${} RETURNING {}",
            self.assignments.join(", "),
            id_pos,
            id_pos + 1,
            returning
        );
        self.params.push(SqlParam::Int(todo_id));
        self.params.push(SqlParam::Int(user_id));
        (sql, self.params)
    }
}

/// Windowed result-set metadata returned alongside every list response.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total_count: i64) -> Self {
        let total_pages = (total_count + limit - 1) / limit;
        Self {
            page,
            limit,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}
