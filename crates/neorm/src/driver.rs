//! Driver collaborator traits.
//!
//! The executor only needs three capabilities from a database driver: hand out a pooled
//! connection, prepare SQL text on it, and run a prepared statement either as a
//! row-returning query or as a mutation. Implement [`Driver`] and [`Connection`] to plug in
//! an engine; the `pool` feature ships a PostgreSQL implementation
//! ([`PgDriver`](crate::PgDriver)).

use crate::error::OrmResult;
use crate::value::Value;
use std::future::Future;

/// Raw rows as returned by a driver, before decoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// A single-row, single-column result.
    pub fn scalar(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            columns: vec![column.into()],
            rows: vec![vec![value.into()]],
        }
    }
}

/// Outcome of a non-row-returning statement (the mutation descriptor).
///
/// `None` means the engine cannot report the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: Option<u64>,
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: Option<u64>, last_insert_id: Option<i64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }

    /// Result carrying only an affected-row count.
    pub fn affected(rows: u64) -> Self {
        Self {
            rows_affected: Some(rows),
            last_insert_id: None,
        }
    }
}

/// A connection pool.
pub trait Driver: Send + Sync {
    /// Connection type handed out by the pool; returned to the pool on drop.
    type Conn: Connection;

    /// Acquire one connection from the pool.
    fn acquire(&self) -> impl Future<Output = OrmResult<Self::Conn>> + Send;

    /// Close the pool. Connections already handed out stay usable until dropped.
    fn close(&self) {}
}

/// A single physical connection.
pub trait Connection: Send + Sync {
    /// Driver-specific prepared statement handle.
    type Prepared: Send + Sync;

    /// Prepare SQL text on this connection.
    fn prepare(&self, sql: &str) -> impl Future<Output = OrmResult<Self::Prepared>> + Send;

    /// Run a prepared statement and return all rows.
    fn query(
        &self,
        stmt: &Self::Prepared,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<RowSet>> + Send;

    /// Run a prepared statement as a mutation.
    fn exec(
        &self,
        stmt: &Self::Prepared,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send;

    /// Run SQL text without preparing it (session statements, fire-and-forget DDL).
    fn exec_unprepared(&self, sql: &str) -> impl Future<Output = OrmResult<ExecResult>> + Send;

    /// Release a connection whose session state is unknown, such as one still inside a
    /// transaction, without awaiting.
    ///
    /// The next acquisition from the pool must not observe that state. Pooled
    /// implementations detach the connection so it is closed instead of recycled. The
    /// default just drops it.
    fn discard(self)
    where
        Self: Sized,
    {
    }
}
