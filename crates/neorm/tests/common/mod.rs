//! Scripted in-memory driver shared by the integration tests.
#![allow(dead_code)]

use neorm::{Connection, Driver, ExecResult, OrmError, OrmResult, RowSet, Value};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock does when it sees SQL starting with a given prefix.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows(RowSet),
    Exec(ExecResult),
    Fail(String),
    Sleep(Duration),
}

/// One statement as seen by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub conn: usize,
    pub sql: String,
    pub args: Vec<Value>,
    pub prepared: bool,
}

#[derive(Default)]
struct MockState {
    acquisitions: AtomicUsize,
    opened: AtomicUsize,
    idle: Mutex<Vec<usize>>,
    open_transactions: Mutex<HashSet<usize>>,
    discarded: Mutex<Vec<usize>>,
    script: Mutex<Vec<(String, Reply)>>,
    executed: Mutex<Vec<Executed>>,
    closed: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a reply for SQL starting with `prefix`. Later scripts win.
    pub fn on(&self, prefix: &str, reply: Reply) -> &Self {
        self.state
            .script
            .lock()
            .unwrap()
            .insert(0, (prefix.to_string(), reply));
        self
    }

    pub fn acquisitions(&self) -> usize {
        self.state.acquisitions.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state.executed.lock().unwrap().clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.executed().into_iter().map(|e| e.sql).collect()
    }

    /// Distinct connection ids that ran at least one statement.
    pub fn connections_used(&self) -> BTreeSet<usize> {
        self.executed().into_iter().map(|e| e.conn).collect()
    }

    pub fn close_calls(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Connections discarded instead of being returned to the pool.
    pub fn discarded(&self) -> Vec<usize> {
        self.state.discarded.lock().unwrap().clone()
    }

    /// Whether connection `conn` has a transaction that was never ended.
    pub fn in_transaction(&self, conn: usize) -> bool {
        self.state.open_transactions.lock().unwrap().contains(&conn)
    }
}

impl Driver for MockDriver {
    type Conn = MockConnection;

    /// Idle connections are reused most-recently-released first, like a real pool.
    async fn acquire(&self) -> OrmResult<MockConnection> {
        self.state.acquisitions.fetch_add(1, Ordering::SeqCst);
        let reused = self.state.idle.lock().unwrap().pop();
        let id = match reused {
            Some(id) => id,
            None => self.state.opened.fetch_add(1, Ordering::SeqCst) + 1,
        };
        Ok(MockConnection {
            id,
            state: Arc::clone(&self.state),
            discarded: false,
        })
    }

    fn close(&self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockConnection {
    id: usize,
    state: Arc<MockState>,
    discarded: bool,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if !self.discarded {
            self.state.idle.lock().unwrap().push(self.id);
        }
    }
}

impl MockConnection {
    fn record(&self, sql: &str, args: &[Value], prepared: bool) -> Option<Reply> {
        self.state.executed.lock().unwrap().push(Executed {
            conn: self.id,
            sql: sql.to_string(),
            args: args.to_vec(),
            prepared,
        });
        let reply = self
            .state
            .script
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| sql.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone());

        if !matches!(reply, Some(Reply::Fail(_))) {
            let mut open = self.state.open_transactions.lock().unwrap();
            if sql.starts_with("BEGIN") || sql.starts_with("START TRANSACTION") {
                open.insert(self.id);
            } else if sql.starts_with("COMMIT") || sql.starts_with("ROLLBACK") {
                open.remove(&self.id);
            }
        }
        reply
    }

    async fn run_exec(&self, sql: &str, args: &[Value], prepared: bool) -> OrmResult<ExecResult> {
        match self.record(sql, args, prepared) {
            Some(Reply::Exec(result)) => Ok(result),
            Some(Reply::Fail(message)) => Err(OrmError::driver(message)),
            Some(Reply::Sleep(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(ExecResult::affected(0))
            }
            Some(Reply::Rows(_)) | None => Ok(ExecResult::affected(0)),
        }
    }
}

impl Connection for MockConnection {
    type Prepared = String;

    async fn prepare(&self, sql: &str) -> OrmResult<String> {
        Ok(sql.to_string())
    }

    async fn query(&self, stmt: &String, args: &[Value]) -> OrmResult<RowSet> {
        match self.record(stmt, args, true) {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(OrmError::driver(message)),
            Some(Reply::Sleep(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(RowSet::default())
            }
            Some(Reply::Exec(_)) | None => Ok(RowSet::default()),
        }
    }

    async fn exec(&self, stmt: &String, args: &[Value]) -> OrmResult<ExecResult> {
        self.run_exec(stmt, args, true).await
    }

    async fn exec_unprepared(&self, sql: &str) -> OrmResult<ExecResult> {
        self.run_exec(sql, &[], false).await
    }

    fn discard(mut self) {
        self.discarded = true;
        self.state.discarded.lock().unwrap().push(self.id);
    }
}
