//! The connection handle and statement execution.

use crate::config::DatabaseConfig;
use crate::dialect::Dialect;
use crate::driver::{Connection, Driver, RowSet};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::statement::{Columns, Statement, StatementKind};
use crate::value::Value;
use std::future::Future;
use tokio::sync::Mutex;

/// A connection handle: one pool, one dialect, and an optional open transaction.
///
/// Statements are built against the handle's dialect and executed with
/// [`Database::execute`]. While a transaction is open (see [`Database::begin`]) every
/// execution runs on the transaction's connection; otherwise each execution takes one
/// connection from the pool and returns it when done.
///
/// # Example
///
/// ```ignore
/// let db = Database::connect("postgres", "postgres://localhost/app")?;
///
/// let mut users = db.select(["id", "name"])?;
/// users.table("users").where_("active", "=", true)?.finish();
/// users.execute(&db).await?;
///
/// for row in users.rows() {
///     println!("{:?}", row.get("name"));
/// }
/// ```
pub struct Database<D: Driver> {
    driver: D,
    dialect: Dialect,
    config: DatabaseConfig,
    pub(crate) tx: Mutex<Option<D::Conn>>,
}

impl<D: Driver> Database<D> {
    /// Create a handle over `driver` with default configuration.
    pub fn new(dialect: Dialect, driver: D) -> Self {
        Self::with_config(dialect, driver, DatabaseConfig::default())
    }

    /// Create a handle with custom configuration.
    pub fn with_config(dialect: Dialect, driver: D, config: DatabaseConfig) -> Self {
        Self {
            driver,
            dialect,
            config,
            tx: Mutex::new(None),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Close the underlying pool.
    pub fn close(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "neorm", dialect = %self.dialect, "closing connection pool");
        self.driver.close();
    }

    /// An empty statement in this handle's dialect.
    pub fn statement(&self) -> Statement {
        Statement::new(self.dialect)
    }

    // ------------------------------------------------------------------
    // Statement entry points
    // ------------------------------------------------------------------

    /// See [`Statement::select`].
    pub fn select(&self, columns: impl Into<Columns>) -> OrmResult<Statement> {
        let mut stmt = self.statement();
        stmt.select(columns)?;
        Ok(stmt)
    }

    /// See [`Statement::insert`].
    pub fn insert<C, V>(&self, columns: C, values: V) -> OrmResult<Statement>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: Into<Value>,
    {
        let mut stmt = self.statement();
        stmt.insert(columns, values)?;
        Ok(stmt)
    }

    pub fn update(&self) -> Statement {
        let mut stmt = self.statement();
        stmt.update();
        stmt
    }

    pub fn delete(&self) -> Statement {
        let mut stmt = self.statement();
        stmt.delete();
        stmt
    }

    pub fn count(&self, table: &str) -> Statement {
        let mut stmt = self.statement();
        stmt.count(table);
        stmt
    }

    /// See [`Statement::call`].
    pub fn call<I>(&self, procedure: &str, result_alias: &str, args: I) -> Statement
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut stmt = self.statement();
        stmt.call(procedure, result_alias, args);
        stmt
    }

    pub fn custom_query(&self, sql: impl Into<String>) -> Statement {
        let mut stmt = self.statement();
        stmt.custom_query(sql);
        stmt
    }

    pub fn create_schema(&self, name: &str) -> Statement {
        let mut stmt = self.statement();
        stmt.create_schema(name);
        stmt
    }

    pub fn use_schema(&self, name: &str) -> Statement {
        let mut stmt = self.statement();
        stmt.use_schema(name);
        stmt
    }

    pub fn create_table(&self, name: &str) -> Statement {
        let mut stmt = self.statement();
        stmt.create_table(name);
        stmt
    }

    pub fn alter_table(&self, name: &str) -> Statement {
        let mut stmt = self.statement();
        stmt.alter_table(name);
        stmt
    }

    pub fn create_user(&self, name: &str, scope: &str) -> Statement {
        let mut stmt = self.statement();
        stmt.create_user(name, scope);
        stmt
    }

    /// A statement whose user context is `name@scope`, for grants and account changes.
    pub fn for_user(&self, name: &str, scope: &str) -> Statement {
        let mut stmt = self.statement();
        stmt.for_user(name, scope);
        stmt
    }

    pub fn drop_user(&self, name: &str, scope: &str) -> Statement {
        let mut stmt = self.statement();
        stmt.drop_user(name, scope);
        stmt
    }

    pub fn all_users(&self) -> Statement {
        let mut stmt = self.statement();
        stmt.all_users();
        stmt
    }

    pub fn flush_privileges(&self) -> Statement {
        let mut stmt = self.statement();
        stmt.flush_privileges();
        stmt
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Execute `stmt`, replacing its result slots.
    ///
    /// Rows, count and mutation descriptor are cleared first; on failure none of them is
    /// populated and the driver error is returned unchanged.
    pub async fn execute(&self, stmt: &mut Statement) -> OrmResult<()> {
        stmt.clear_results();

        let tx = self.tx.lock().await;
        if let Some(conn) = &*tx {
            return self.dispatch(conn, stmt).await;
        }
        drop(tx);

        let conn = self.acquire().await?;
        self.dispatch(&conn, stmt).await
    }

    /// Run the statement text without preparing it and discard any result.
    ///
    /// A `CREATE TABLE` statement carrying a schema runs `USE <schema>;` first on the same
    /// connection. Stops at the first failure.
    pub async fn query_drop(&self, stmt: &Statement) -> OrmResult<()> {
        if !stmt.args().is_empty() {
            return Err(OrmError::usage(
                "query_drop runs unprepared SQL and cannot bind arguments; use execute",
            ));
        }

        let tx = self.tx.lock().await;
        if let Some(conn) = &*tx {
            return self.run_unprepared(conn, stmt).await;
        }
        drop(tx);

        let conn = self.acquire().await?;
        self.run_unprepared(&conn, stmt).await
    }

    async fn dispatch<C: Connection>(&self, conn: &C, stmt: &mut Statement) -> OrmResult<()> {
        let kind = stmt.kind();
        match kind {
            StatementKind::Select => {
                let set = self.query(conn, kind, stmt.sql(), stmt.args()).await?;
                stmt.store_rows(decode_rows(set)?);
                stmt.clear_args();
            }
            StatementKind::Count => {
                let set = self.query(conn, kind, stmt.sql(), stmt.args()).await?;
                if let Some(count) = read_count(set)? {
                    stmt.store_count(count);
                }
            }
            StatementKind::Call => {
                let result = self.exec(conn, kind, stmt.sql(), stmt.args()).await?;
                match stmt.result_alias().map(alias_query) {
                    Some(select) => {
                        let set = self.query(conn, StatementKind::Select, &select, &[]).await?;
                        stmt.store_rows(decode_rows(set)?);
                        stmt.clear_result_alias();
                    }
                    None => stmt.store_exec(result),
                }
                stmt.clear_args();
            }
            StatementKind::Insert
            | StatementKind::Mutation
            | StatementKind::Schema
            | StatementKind::Raw => {
                let result = self.exec(conn, kind, stmt.sql(), stmt.args()).await?;
                stmt.store_exec(result);
                stmt.clear_args();
            }
        }
        Ok(())
    }

    async fn query<C: Connection>(
        &self,
        conn: &C,
        kind: StatementKind,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<RowSet> {
        self.log_sql(kind, sql, args.len(), true);
        let prepared = self.timed(conn.prepare(sql)).await?;
        self.timed(conn.query(&prepared, args)).await
    }

    async fn exec<C: Connection>(
        &self,
        conn: &C,
        kind: StatementKind,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<crate::driver::ExecResult> {
        self.log_sql(kind, sql, args.len(), true);
        let prepared = self.timed(conn.prepare(sql)).await?;
        self.timed(conn.exec(&prepared, args)).await
    }

    async fn run_unprepared<C: Connection>(&self, conn: &C, stmt: &Statement) -> OrmResult<()> {
        if let Some(schema) = stmt.schema()
            && stmt.sql().trim_start().starts_with("CREATE TABLE")
        {
            let use_schema = format!("USE {schema};");
            self.log_sql(StatementKind::Schema, &use_schema, 0, false);
            self.timed(conn.exec_unprepared(&use_schema)).await?;
        }

        self.log_sql(stmt.kind(), stmt.sql(), 0, false);
        self.timed(conn.exec_unprepared(stmt.sql())).await?;
        Ok(())
    }

    /// Take one connection from the pool.
    pub(crate) async fn acquire(&self) -> OrmResult<D::Conn> {
        let conn = self.timed(self.driver.acquire()).await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "neorm", dialect = %self.dialect, "acquired pooled connection");
        Ok(conn)
    }

    /// Apply the configured query timeout to one driver round trip.
    pub(crate) async fn timed<T>(&self, fut: impl Future<Output = OrmResult<T>>) -> OrmResult<T> {
        match self.config.query_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result,
                Err(_) => Err(OrmError::Timeout(limit)),
            },
            None => fut.await,
        }
    }

    #[cfg(feature = "tracing")]
    pub(crate) fn log_sql(
        &self,
        kind: StatementKind,
        sql: &str,
        param_count: usize,
        prepared: bool,
    ) {
        if let Some(log) = &self.config.sql_log {
            log.emit(kind, sql, param_count, prepared);
        }
    }

    #[cfg(not(feature = "tracing"))]
    pub(crate) fn log_sql(
        &self,
        _kind: StatementKind,
        _sql: &str,
        _param_count: usize,
        _prepared: bool,
    ) {
    }
}

impl Statement {
    /// Execute this statement on `db`. See [`Database::execute`].
    pub async fn execute<D: Driver>(&mut self, db: &Database<D>) -> OrmResult<()> {
        db.execute(self).await
    }

    /// Run this statement unprepared on `db`. See [`Database::query_drop`].
    pub async fn query_drop<D: Driver>(&self, db: &Database<D>) -> OrmResult<()> {
        db.query_drop(self).await
    }
}

/// `SELECT @alias AS alias`
fn alias_query(alias: &str) -> String {
    format!("SELECT {alias} AS {}", alias.trim_start_matches('@'))
}

/// Pair every driver row with the column list; a row of the wrong width is a decode error.
fn decode_rows(set: RowSet) -> OrmResult<Vec<Row>> {
    let RowSet { columns, rows } = set;
    rows.into_iter()
        .enumerate()
        .map(|(idx, values)| {
            if values.len() != columns.len() {
                return Err(OrmError::decode(
                    format!("row {idx}"),
                    format!("expected {} values, got {}", columns.len(), values.len()),
                ));
            }
            Ok(Row::new(columns.clone(), values))
        })
        .collect()
}

/// First column of the first row as an integer; `None` when there are no rows.
fn read_count(set: RowSet) -> OrmResult<Option<i64>> {
    let column = set
        .columns
        .first()
        .cloned()
        .unwrap_or_else(|| "length".to_string());
    let Some(value) = set.rows.into_iter().next().and_then(|row| row.into_iter().next()) else {
        return Ok(None);
    };

    match value.decode_bytes() {
        Value::Int(n) => Ok(Some(n)),
        Value::Text(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: std::num::ParseIntError| OrmError::decode(column, e.to_string())),
        other => Err(OrmError::decode(
            column,
            format!("expected an integer count, got {}", other.type_name()),
        )),
    }
}
