//! # neorm
//!
//! A fluent SQL statement builder with pooled execution, for MySQL, PostgreSQL, SQLite and
//! SQL Server dialects.
//!
//! ## Features
//!
//! - **Fluent builder**: chain clauses on a [`Statement`]; values are always bound, never inlined
//! - **Dialect aware**: `?`, `$N` or `@pN` placeholders chosen by the handle's [`Dialect`]
//! - **Schema chain**: `CREATE TABLE` / `ALTER TABLE` / user administration with checked defaults
//! - **Uniform results**: rows come back as ordered column → [`Value`] maps
//! - **Transaction overlay**: `begin` / `commit` / `rollback` on the handle itself
//! - **Pluggable drivers**: implement [`Driver`] + [`Connection`]; PostgreSQL ships built in
//!
//! ## Example
//!
//! ```ignore
//! use neorm::prelude::*;
//!
//! let db = Database::connect("postgres", "postgres://localhost/app")?;
//!
//! let mut stmt = db.select(["id", "name"])?;
//! stmt.table("users")
//!     .where_("status", "=", "active")?
//!     .and("age", ">", 18)?
//!     .order_by("name", "ASC")?
//!     .limit(10)
//!     .finish();
//! stmt.execute(&db).await?;
//!
//! let mut total = db.count("users");
//! total.execute(&db).await?;
//! println!("{} of {} users", stmt.rows().len(), total.length());
//! ```

pub mod config;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod row;
pub mod statement;
pub mod transaction;
pub mod value;

#[cfg(feature = "tracing")]
pub mod monitor;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub mod postgres;

pub use config::DatabaseConfig;
pub use dialect::{Dialect, PlaceholderScheme, TypeFamily};
pub use driver::{Connection, Driver, ExecResult, RowSet};
pub use error::{OrmError, OrmResult};
pub use executor::Database;
pub use row::Row;
pub use statement::{Clause, Columns, Privileges, Statement, StatementKind};
pub use value::Value;

#[cfg(feature = "tracing")]
pub use monitor::SqlLogConfig;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(feature = "pool")]
pub use postgres::{PgConnection, PgDriver};
