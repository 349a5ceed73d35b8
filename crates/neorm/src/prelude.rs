//! Convenient imports for typical `neorm` usage.
//!
//! ```ignore
//! use neorm::prelude::*;
//! ```

pub use crate::{
    Clause, Database, DatabaseConfig, Dialect, OrmError, OrmResult, Privileges, Row, Statement,
    StatementKind, Value,
};

#[cfg(feature = "pool")]
pub use crate::{PgDriver, create_pool, create_pool_with_config};

#[cfg(feature = "tracing")]
pub use crate::SqlLogConfig;
