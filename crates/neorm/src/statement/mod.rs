//! Fluent, dialect-aware SQL statement builder.
//!
//! A [`Statement`] accumulates SQL text and a positional argument list. Each chained call
//! appends one fragment; value-bearing clauses never inline values but emit the dialect's
//! placeholder for the current argument count. After [`Statement::finish`] the statement is
//! handed to a [`Database`](crate::Database) for execution, which fills the result slots read
//! back through [`Statement::rows`], [`Statement::length`], [`Statement::last_insert_id`] and
//! [`Statement::rows_affected`].
//!
//! ```ignore
//! let mut stmt = Statement::new(Dialect::Postgres);
//! stmt.select(["id", "name"])?
//!     .table("users")
//!     .where_("status", "=", "active")?
//!     .and("age", ">", 18)?
//!     .finish();
//! assert_eq!(stmt.sql(), "SELECT id, name FROM users WHERE status = $1 AND age > $2;");
//! ```

mod query;
mod schema;
mod users;

#[cfg(test)]
mod tests;

pub use query::{Clause, Columns};
pub use users::Privileges;

use crate::dialect::Dialect;
use crate::driver::ExecResult;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;

/// Execution path chosen for a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatementKind {
    /// Row-returning query.
    Select,
    /// `INSERT INTO ...`
    Insert,
    /// `UPDATE` / `DELETE FROM`
    Mutation,
    /// Stored procedure call, optionally read back through a result alias.
    Call,
    /// `SELECT COUNT(*) AS length ...`, read as a single integer.
    Count,
    /// DDL and user administration.
    Schema,
    /// Caller-supplied text.
    #[default]
    Raw,
}

impl StatementKind {
    /// Whether execution returns rows rather than a mutation descriptor.
    pub const fn returns_rows(self) -> bool {
        matches!(self, StatementKind::Select | StatementKind::Count)
    }
}

/// Builder bookkeeping that replaces re-scanning the text.
#[derive(Debug, Clone, Default)]
struct BuildState {
    has_set_clause: bool,
    /// Byte offset right after `INSERT INTO`, where the table name goes.
    insert_table_at: Option<usize>,
    /// Byte offset right after `CREATE DATABASE` / `CREATE TABLE`.
    if_not_exists_at: Option<usize>,
    creating_table: bool,
    altering_table: bool,
    column_list_opened: bool,
    column_list_closed: bool,
    has_primary_key: bool,
    /// Declared type of the column currently being defined.
    column_type: Option<String>,
    paren_depth: usize,
    /// The next predicate directly follows `(` and takes no connective.
    group_start: bool,
    finished: bool,
}

/// Account a user-administration statement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserRef {
    name: String,
    scope: String,
}

/// A SQL statement under construction, plus the results of its last execution.
#[derive(Debug, Clone)]
pub struct Statement {
    dialect: Dialect,
    text: String,
    kind: StatementKind,
    table: Option<String>,
    args: Vec<Value>,
    result_alias: Option<String>,
    schema: Option<String>,
    user: Option<UserRef>,
    state: BuildState,
    rows: Vec<Row>,
    count: i64,
    mutation: Option<ExecResult>,
}

impl Statement {
    /// Create an empty statement for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            text: String::new(),
            kind: StatementKind::default(),
            table: None,
            args: Vec::new(),
            result_alias: None,
            schema: None,
            user: None,
            state: BuildState::default(),
            rows: Vec::new(),
            count: -1,
            mutation: None,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Current SQL text.
    pub fn sql(&self) -> &str {
        &self.text
    }

    /// Bound arguments in placeholder order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Table named by the last [`table`](Statement::table) or `create_table`/`alter_table`.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn result_alias(&self) -> Option<&str> {
        self.result_alias.as_deref()
    }

    /// Schema used by [`Database::query_drop`](crate::Database::query_drop) before
    /// `CREATE TABLE`.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Set the schema without emitting any SQL.
    pub fn with_schema(&mut self, schema: impl Into<String>) -> &mut Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    /// Terminate the statement.
    ///
    /// A `CREATE TABLE` whose column list is still open gets `)` before the `;`. Calling
    /// this again is a no-op.
    pub fn finish(&mut self) -> &mut Self {
        if self.state.finished {
            return self;
        }
        self.close_column_list();
        self.text.push(';');
        self.state.finished = true;
        self
    }

    /// Rows produced by the last execution; empty before any execution.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Take ownership of the rows, leaving the slot empty.
    pub fn take_rows(&mut self) -> Vec<Row> {
        std::mem::take(&mut self.rows)
    }

    /// Result of the last count execution, `-1` before one has run.
    pub fn length(&self) -> i64 {
        self.count
    }

    /// Identifier generated by the last mutation.
    ///
    /// Returns `-1` before any mutation has run and [`OrmError::Unsupported`] when the
    /// driver cannot report it.
    pub fn last_insert_id(&self) -> OrmResult<i64> {
        match self.mutation {
            None => Ok(-1),
            Some(result) => result.last_insert_id.ok_or_else(|| {
                OrmError::unsupported("driver does not report the last inserted id")
            }),
        }
    }

    /// Rows affected by the last mutation; same sentinel rules as
    /// [`last_insert_id`](Statement::last_insert_id).
    pub fn rows_affected(&self) -> OrmResult<i64> {
        match self.mutation {
            None => Ok(-1),
            Some(result) => {
                let affected = result.rows_affected.ok_or_else(|| {
                    OrmError::unsupported("driver does not report affected rows")
                })?;
                Ok(i64::try_from(affected).unwrap_or(i64::MAX))
            }
        }
    }

    /// Mutation descriptor of the last execution, if it produced one.
    pub fn exec_result(&self) -> Option<ExecResult> {
        self.mutation
    }

    // ------------------------------------------------------------------
    // Text assembly
    // ------------------------------------------------------------------

    /// Replace the text and reset everything tied to the previous statement.
    ///
    /// Results, schema, and the user context survive.
    fn start(&mut self, kind: StatementKind, text: impl Into<String>) {
        self.text = text.into();
        self.kind = kind;
        self.table = None;
        self.args.clear();
        self.result_alias = None;
        self.state = BuildState::default();
    }

    fn push(&mut self, fragment: &str) -> &mut Self {
        self.text.push_str(fragment);
        self
    }

    /// Append `value` to the arguments and emit its placeholder.
    fn push_bind(&mut self, value: Value) {
        self.args.push(value);
        self.dialect.write_placeholder(&mut self.text, self.args.len());
    }

    /// Emit a comma-separated placeholder list; an empty list emits `NULL`.
    fn push_bind_list<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut first = true;
        for value in values {
            if !first {
                self.text.push_str(", ");
            }
            first = false;
            self.push_bind(value.into());
        }
        if first {
            self.text.push_str("NULL");
        }
    }

    /// Emit ` KEYWORD ` unless this predicate opens a parenthesized group.
    fn push_connective(&mut self, keyword: &str) {
        if self.state.group_start {
            self.state.group_start = false;
        } else {
            self.text.push(' ');
            self.text.push_str(keyword);
            self.text.push(' ');
        }
    }

    // ------------------------------------------------------------------
    // Result slots, driven by the executor
    // ------------------------------------------------------------------

    pub(crate) fn clear_results(&mut self) {
        self.rows.clear();
        self.count = -1;
        self.mutation = None;
    }

    pub(crate) fn store_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    pub(crate) fn store_count(&mut self, count: i64) {
        self.count = count;
    }

    pub(crate) fn store_exec(&mut self, result: ExecResult) {
        self.mutation = Some(result);
    }

    pub(crate) fn clear_args(&mut self) {
        self.args.clear();
    }

    pub(crate) fn clear_result_alias(&mut self) {
        self.result_alias = None;
    }
}
