//! Transaction overlay on a [`Database`] handle.
//!
//! A handle holds at most one open transaction. Between [`Database::begin`] and
//! [`Database::commit`] / [`Database::rollback`] every execution on the handle runs on the
//! transaction's connection instead of taking one from the pool.
//!
//! ```ignore
//! db.begin().await?;
//! let mut debit = db.update();
//! debit.table("accounts").set("balance", 90).where_("id", "=", 1)?.finish();
//! if let Err(e) = debit.execute(&db).await {
//!     db.rollback().await?;
//!     return Err(e);
//! }
//! db.commit().await?;
//! ```

use crate::driver::{Connection, Driver};
use crate::error::{OrmError, OrmResult};
use crate::executor::Database;
use crate::statement::StatementKind;

impl<D: Driver> Database<D> {
    /// Open a transaction on a dedicated pooled connection.
    ///
    /// Fails with a usage error if this handle already has one open.
    pub async fn begin(&self) -> OrmResult<()> {
        let mut tx = self.tx.lock().await;
        if tx.is_some() {
            return Err(OrmError::usage("a transaction is already open on this handle"));
        }

        let conn = self.acquire().await?;
        let sql = self.dialect().begin_sql();
        self.log_sql(StatementKind::Raw, sql, 0, false);
        if let Err(e) = self.timed(conn.exec_unprepared(sql)).await {
            conn.discard();
            return Err(e);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(target: "neorm", "transaction started");
        *tx = Some(conn);
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// The transaction is cleared from the handle even if `COMMIT` fails; the connection is
    /// then discarded rather than returned to the pool.
    pub async fn commit(&self) -> OrmResult<()> {
        self.end_transaction(self.dialect().commit_sql()).await
    }

    /// Roll back the open transaction.
    ///
    /// The transaction is cleared from the handle even if `ROLLBACK` fails.
    pub async fn rollback(&self) -> OrmResult<()> {
        self.end_transaction(self.dialect().rollback_sql()).await
    }

    /// Whether executions currently route through an open transaction.
    pub async fn in_transaction(&self) -> bool {
        self.tx.lock().await.is_some()
    }

    async fn end_transaction(&self, sql: &'static str) -> OrmResult<()> {
        let conn = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| OrmError::usage(format!("{sql} without an open transaction")))?;

        self.log_sql(StatementKind::Raw, sql, 0, false);
        if let Err(e) = self.timed(conn.exec_unprepared(sql)).await {
            conn.discard();
            return Err(e);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(target: "neorm", statement = sql, "transaction finished");
        Ok(())
    }
}

/// A handle dropped mid-transaction cannot await a rollback, so the connection is
/// discarded and the server aborts the transaction when the session closes.
impl<D: Driver> Drop for Database<D> {
    fn drop(&mut self) {
        if let Some(conn) = self.tx.get_mut().take() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                target: "neorm",
                "database handle dropped with an open transaction; discarding its connection",
            );
            conn.discard();
        }
    }
}
