//! Query clauses: select/insert/update/delete, predicates, joins, ordering, calls.

use super::{Statement, StatementKind};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::str::FromStr;

/// Column set for [`Statement::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Columns {
    /// A single string column set. Only `"*"` is accepted.
    Wildcard(String),
    /// Explicit column names.
    List(Vec<String>),
}

impl Columns {
    /// `*`
    pub fn all() -> Self {
        Columns::Wildcard("*".to_string())
    }

    fn render(&self) -> OrmResult<String> {
        match self {
            Columns::Wildcard(w) if w.trim() == "*" => Ok("*".to_string()),
            Columns::Wildcard(w) => Err(OrmError::usage(format!(
                "a single string column set must be '*', got '{w}'; pass a list of names instead"
            ))),
            Columns::List(names) if names.is_empty() => {
                Err(OrmError::usage("select requires at least one column"))
            }
            Columns::List(names) if names.len() > 1 && names.iter().any(|n| n.trim() == "*") => {
                Err(OrmError::usage("'*' cannot be combined with other columns"))
            }
            Columns::List(names) => Ok(names.join(", ")),
        }
    }
}

impl From<&str> for Columns {
    fn from(s: &str) -> Self {
        Columns::Wildcard(s.to_string())
    }
}

impl From<String> for Columns {
    fn from(s: String) -> Self {
        Columns::Wildcard(s)
    }
}

impl From<Vec<String>> for Columns {
    fn from(v: Vec<String>) -> Self {
        Columns::List(v)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(v: Vec<&str>) -> Self {
        Columns::List(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Columns {
    fn from(v: &[&str]) -> Self {
        Columns::List(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(v: [&str; N]) -> Self {
        Columns::List(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Connective that introduces a predicate or parenthesized group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Where,
    And,
    Or,
}

impl Clause {
    pub const fn keyword(self) -> &'static str {
        match self {
            Clause::Where => "WHERE",
            Clause::And => "AND",
            Clause::Or => "OR",
        }
    }
}

impl FromStr for Clause {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WHERE" => Ok(Clause::Where),
            "AND" => Ok(Clause::And),
            "OR" => Ok(Clause::Or),
            other => Err(OrmError::usage(format!(
                "clause must be WHERE, AND or OR, got '{other}'"
            ))),
        }
    }
}

impl Statement {
    /// Start `SELECT <columns> FROM`.
    pub fn select(&mut self, columns: impl Into<Columns>) -> OrmResult<&mut Self> {
        let columns = columns.into().render()?;
        self.start(StatementKind::Select, format!("SELECT {columns} FROM"));
        Ok(self)
    }

    /// Start `INSERT INTO (<columns>) VALUES (<placeholders>)`; the table name is spliced in
    /// by [`table`](Statement::table).
    pub fn insert<C, V>(&mut self, columns: C, values: V) -> OrmResult<&mut Self>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: Into<Value>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(OrmError::usage("insert requires at least one column"));
        }
        if columns.len() != values.len() {
            return Err(OrmError::usage(format!(
                "insert has {} columns but {} values",
                columns.len(),
                values.len()
            )));
        }

        self.start(StatementKind::Insert, "INSERT INTO");
        self.state.insert_table_at = Some(self.text.len());
        self.text.push_str(" (");
        self.text.push_str(&columns.join(", "));
        self.text.push_str(") VALUES (");
        self.push_bind_list(values);
        self.text.push(')');
        Ok(self)
    }

    /// Start `UPDATE`.
    pub fn update(&mut self) -> &mut Self {
        self.start(StatementKind::Mutation, "UPDATE");
        self
    }

    /// Start `DELETE FROM`.
    pub fn delete(&mut self) -> &mut Self {
        self.start(StatementKind::Mutation, "DELETE FROM");
        self
    }

    /// Name the target table.
    pub fn table(&mut self, name: &str) -> &mut Self {
        self.table = Some(name.to_string());
        match self.state.insert_table_at.take() {
            Some(at) => self.text.insert_str(at, &format!(" {name}")),
            None => {
                self.text.push(' ');
                self.text.push_str(name);
            }
        }
        self
    }

    /// ` WHERE column op ?`
    pub fn where_(
        &mut self,
        column: &str,
        op: &str,
        value: impl Into<Value>,
    ) -> OrmResult<&mut Self> {
        self.predicate(Clause::Where, column, op, value.into())
    }

    /// ` AND column op ?`
    pub fn and(&mut self, column: &str, op: &str, value: impl Into<Value>) -> OrmResult<&mut Self> {
        self.predicate(Clause::And, column, op, value.into())
    }

    /// ` OR column op ?`
    pub fn or(&mut self, column: &str, op: &str, value: impl Into<Value>) -> OrmResult<&mut Self> {
        self.predicate(Clause::Or, column, op, value.into())
    }

    fn predicate(
        &mut self,
        clause: Clause,
        column: &str,
        op: &str,
        value: Value,
    ) -> OrmResult<&mut Self> {
        if value.is_null() {
            let test = match op.trim() {
                "=" => "IS NULL",
                "!=" | "<>" => "IS NOT NULL",
                other => {
                    return Err(OrmError::usage(format!(
                        "operator '{other}' cannot compare against NULL; use '=' or '!='"
                    )));
                }
            };
            self.push_connective(clause.keyword());
            self.text.push_str(column);
            self.text.push(' ');
            self.text.push_str(test);
            return Ok(self);
        }

        self.push_connective(clause.keyword());
        self.text.push_str(column);
        self.text.push(' ');
        self.text.push_str(op.trim());
        self.text.push(' ');
        self.push_bind(value);
        Ok(self)
    }

    /// ` SET column = ?`, then `, column = ?` on later calls. `NULL` is written literally.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        self.text
            .push_str(if self.state.has_set_clause { ", " } else { " SET " });
        self.state.has_set_clause = true;
        self.text.push_str(column);
        self.text.push_str(" = ");
        if value.is_null() {
            self.text.push_str("NULL");
        } else {
            self.push_bind(value);
        }
        self
    }

    /// ` <clause> column IN(?, ?, ...)`
    pub fn in_<I>(&mut self, clause: Clause, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.membership(clause, column, "IN", values)
    }

    /// ` <clause> column NOT IN(?, ?, ...)`
    pub fn not_in<I>(&mut self, clause: Clause, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.membership(clause, column, "NOT IN", values)
    }

    fn membership<I>(&mut self, clause: Clause, column: &str, op: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push_connective(clause.keyword());
        self.text.push_str(column);
        self.text.push(' ');
        self.text.push_str(op);
        self.text.push('(');
        self.push_bind_list(values);
        self.text.push(')');
        self
    }

    /// Match `%pattern%` against each column, OR-ed together.
    pub fn like<I>(&mut self, columns: I, pattern: &str) -> &mut Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for (i, column) in columns.into_iter().enumerate() {
            self.push_connective(if i == 0 { "WHERE" } else { "OR" });
            self.text.push_str(column.as_ref());
            self.text.push_str(" LIKE ");
            self.push_bind(Value::Text(format!("%{pattern}%")));
        }
        self
    }

    /// ` INNER JOIN table ON left op right`
    pub fn inner_join(&mut self, table: &str, left: &str, op: &str, right: &str) -> &mut Self {
        self.join("INNER JOIN", table, left, op, right)
    }

    /// ` LEFT JOIN table ON left op right`
    pub fn left_join(&mut self, table: &str, left: &str, op: &str, right: &str) -> &mut Self {
        self.join("LEFT JOIN", table, left, op, right)
    }

    /// ` RIGHT JOIN table ON left op right`
    pub fn right_join(&mut self, table: &str, left: &str, op: &str, right: &str) -> &mut Self {
        self.join("RIGHT JOIN", table, left, op, right)
    }

    fn join(&mut self, kind: &str, table: &str, left: &str, op: &str, right: &str) -> &mut Self {
        self.push(&format!(" {kind} {table} ON {left} {op} {right}"))
    }

    /// ` NATURAL JOIN table`
    pub fn natural_join(&mut self, table: &str) -> &mut Self {
        self.push(&format!(" NATURAL JOIN {table}"))
    }

    /// ` CROSS JOIN table`
    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.push(&format!(" CROSS JOIN {table}"))
    }

    /// ` ORDER BY column ASC|DESC`
    pub fn order_by(&mut self, column: &str, ordering: &str) -> OrmResult<&mut Self> {
        let ordering = ordering.trim().to_ascii_uppercase();
        if ordering != "ASC" && ordering != "DESC" {
            return Err(OrmError::usage(format!(
                "ordering must be ASC or DESC, got '{ordering}'"
            )));
        }
        Ok(self.push(&format!(" ORDER BY {column} {ordering}")))
    }

    /// ` ORDER BY FIELD(column, ?, ?, ...)`
    pub fn order_by_field<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.text.push_str(" ORDER BY FIELD(");
        self.text.push_str(column);
        for value in values {
            self.text.push_str(", ");
            self.push_bind(value.into());
        }
        self.text.push(')');
        self
    }

    /// ` ORDER BY RAND()` (or the dialect's random function).
    pub fn order_random(&mut self) -> &mut Self {
        let function = self.dialect.random_function();
        self.push(&format!(" ORDER BY {function}"))
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.push(&format!(" LIMIT {n}"))
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.push(&format!(" OFFSET {n}"))
    }

    /// Start `SELECT COUNT(*) AS length FROM table`. Predicates may follow.
    pub fn count(&mut self, table: &str) -> &mut Self {
        self.start(
            StatementKind::Count,
            format!("SELECT COUNT(*) AS length FROM {table}"),
        );
        self.table = Some(table.to_string());
        self
    }

    /// Start `CALL procedure(?, ...)`.
    ///
    /// A non-empty `result_alias` (e.g. `@result`) is selected back on the same connection
    /// after the call and becomes the statement's rows.
    pub fn call<I>(&mut self, procedure: &str, result_alias: &str, args: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.start(StatementKind::Call, format!("CALL {procedure}("));
        let mut first = true;
        for arg in args {
            if !first {
                self.text.push_str(", ");
            }
            first = false;
            self.push_bind(arg.into());
        }
        self.text.push(')');
        let alias = result_alias.trim();
        if !alias.is_empty() {
            self.result_alias = Some(alias.to_string());
        }
        self
    }

    /// Replace the statement with caller-supplied SQL.
    pub fn custom_query(&mut self, sql: impl Into<String>) -> &mut Self {
        self.start(StatementKind::Raw, sql);
        self
    }

    /// Bind an extra argument without emitting a placeholder (for placeholders written by
    /// hand in [`custom_query`](Statement::custom_query) text).
    pub fn bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.args.push(value.into());
        self
    }

    /// ` <clause> (`; the next predicate takes no connective.
    pub fn open_parenthesis(&mut self, clause: Clause) -> &mut Self {
        self.push_connective(clause.keyword());
        self.text.push('(');
        self.state.paren_depth += 1;
        self.state.group_start = true;
        self
    }

    /// `)` closing the innermost open group.
    pub fn close_parenthesis(&mut self) -> OrmResult<&mut Self> {
        if self.state.paren_depth == 0 {
            return Err(OrmError::usage("close_parenthesis without a matching open_parenthesis"));
        }
        self.state.paren_depth -= 1;
        self.state.group_start = false;
        self.text.push(')');
        Ok(self)
    }

    /// Number of groups opened and not yet closed.
    pub fn open_groups(&self) -> usize {
        self.state.paren_depth
    }
}
