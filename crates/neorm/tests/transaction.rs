mod common;

use common::{MockDriver, Reply};
use neorm::{Database, Dialect, RowSet};
use std::collections::BTreeSet;

#[tokio::test]
async fn executions_inside_a_transaction_share_one_connection() {
    let driver = MockDriver::new();
    driver.on("SELECT", Reply::Rows(RowSet::scalar("balance", 90)));
    let db = Database::new(Dialect::MySql, driver.clone());

    db.begin().await.unwrap();
    assert!(db.in_transaction().await);

    let mut debit = db.update();
    debit.table("accounts").set("balance", 90);
    debit.where_("id", "=", 1).unwrap().finish();
    debit.execute(&db).await.unwrap();

    let mut check = db.select(["balance"]).unwrap();
    check.table("accounts").where_("id", "=", 1).unwrap().finish();
    check.execute(&db).await.unwrap();

    db.commit().await.unwrap();
    assert!(!db.in_transaction().await);

    assert_eq!(driver.acquisitions(), 1);
    assert_eq!(driver.connections_used().len(), 1);
    assert_eq!(
        driver.executed_sql(),
        vec![
            "START TRANSACTION",
            "UPDATE accounts SET balance = ? WHERE id = ?;",
            "SELECT balance FROM accounts WHERE id = ?;",
            "COMMIT",
        ]
    );
    assert!(!driver.executed()[0].prepared);
    assert_eq!(check.rows().len(), 1);
}

#[tokio::test]
async fn executions_after_commit_use_the_pool_again() {
    let driver = MockDriver::new();
    let db = Database::new(Dialect::MySql, driver.clone());

    db.begin().await.unwrap();
    db.commit().await.unwrap();

    let mut stmt = db.delete();
    stmt.table("sessions").finish();
    stmt.execute(&db).await.unwrap();

    assert_eq!(driver.acquisitions(), 2);
    assert_eq!(driver.connections_used().len(), 1);
    assert!(!driver.in_transaction(1));
}

#[tokio::test]
async fn nested_begin_is_a_usage_error() {
    let driver = MockDriver::new();
    let db = Database::new(Dialect::MySql, driver.clone());

    db.begin().await.unwrap();
    let err = db.begin().await.unwrap_err();
    assert!(err.is_usage());
    assert_eq!(driver.acquisitions(), 1);

    db.rollback().await.unwrap();
}

#[tokio::test]
async fn ending_without_a_transaction_is_a_usage_error() {
    let driver = MockDriver::new();
    let db = Database::new(Dialect::Postgres, driver.clone());

    assert!(db.commit().await.unwrap_err().is_usage());
    assert!(db.rollback().await.unwrap_err().is_usage());
    assert!(driver.executed().is_empty());
}

#[tokio::test]
async fn rollback_clears_the_context() {
    let driver = MockDriver::new();
    let db = Database::new(Dialect::Postgres, driver.clone());

    db.begin().await.unwrap();
    let mut stmt = db.insert(["name"], ["ann"]).unwrap();
    stmt.table("people").finish();
    stmt.execute(&db).await.unwrap();
    db.rollback().await.unwrap();

    assert!(!db.in_transaction().await);
    assert_eq!(
        driver.executed_sql(),
        vec![
            "BEGIN",
            "INSERT INTO people (name) VALUES ($1);",
            "ROLLBACK",
        ]
    );
}

#[tokio::test]
async fn failed_commit_still_clears_the_context() {
    let driver = MockDriver::new();
    driver.on("COMMIT", Reply::Fail("serialization failure".into()));
    let db = Database::new(Dialect::MySql, driver.clone());

    db.begin().await.unwrap();
    assert!(db.commit().await.is_err());
    assert!(!db.in_transaction().await);
    assert_eq!(driver.discarded(), vec![1]);

    // a fresh transaction can be opened afterwards, on a new connection
    db.begin().await.unwrap();
    assert_eq!(driver.acquisitions(), 2);
    db.rollback().await.unwrap();
    assert_eq!(driver.connections_used(), BTreeSet::from([1, 2]));
}

#[tokio::test]
async fn failed_begin_leaves_no_transaction() {
    let driver = MockDriver::new();
    driver.on("BEGIN", Reply::Fail("too many connections".into()));
    let db = Database::new(Dialect::Sqlite, driver.clone());

    assert!(db.begin().await.is_err());
    assert!(!db.in_transaction().await);
    assert_eq!(driver.discarded(), vec![1]);
}

#[tokio::test]
async fn dropping_a_handle_mid_transaction_discards_its_connection() {
    let driver = MockDriver::new();

    let first = Database::new(Dialect::Postgres, driver.clone());
    first.begin().await.unwrap();
    first
        .custom_query("CREATE TABLE scratch (id INT)")
        .query_drop(&first)
        .await
        .unwrap();
    drop(first);

    assert_eq!(driver.discarded(), vec![1]);

    let second = Database::new(Dialect::Postgres, driver.clone());
    let mut stmt = second.select("*").unwrap();
    stmt.table("scratch").finish();
    stmt.execute(&second).await.unwrap();

    let last = driver.executed().pop().unwrap();
    assert_ne!(last.conn, 1);
    assert!(!driver.in_transaction(last.conn));
}

#[tokio::test]
async fn closed_transactions_return_their_connection_to_the_pool() {
    let driver = MockDriver::new();
    let db = Database::new(Dialect::MySql, driver.clone());

    db.begin().await.unwrap();
    db.rollback().await.unwrap();
    drop(db);

    assert!(driver.discarded().is_empty());
    assert!(!driver.in_transaction(1));
}

#[tokio::test]
async fn transaction_statements_follow_the_dialect() {
    let driver = MockDriver::new();
    let db = Database::new(Dialect::SqlServer, driver.clone());

    db.begin().await.unwrap();
    db.rollback().await.unwrap();
    db.begin().await.unwrap();
    db.commit().await.unwrap();

    assert_eq!(
        driver.executed_sql(),
        vec![
            "BEGIN TRANSACTION",
            "ROLLBACK TRANSACTION",
            "BEGIN TRANSACTION",
            "COMMIT TRANSACTION",
        ]
    );
}

#[tokio::test]
async fn query_drop_inside_a_transaction_uses_its_connection() {
    let driver = MockDriver::new();
    let db = Database::new(Dialect::MySql, driver.clone());

    db.begin().await.unwrap();
    db.custom_query("SET autocommit = 0")
        .query_drop(&db)
        .await
        .unwrap();
    db.commit().await.unwrap();

    assert_eq!(driver.acquisitions(), 1);
    assert_eq!(driver.connections_used().len(), 1);
    assert_eq!(driver.executed_sql()[1], "SET autocommit = 0");
}
