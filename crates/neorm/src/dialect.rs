//! SQL dialect descriptor.
//!
//! Every dialect-dependent rule lives here: placeholder syntax, connector name, a few
//! function/keyword spellings, and the column type families checked by
//! [`Statement::default`](crate::Statement::default). A dialect is chosen once when the
//! handle is created and copied into every statement built from it.

use crate::error::{OrmError, OrmResult};
use std::fmt;
use std::str::FromStr;

/// Supported SQL engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// MySQL / MariaDB (`?` placeholders)
    #[default]
    MySql,
    /// PostgreSQL (`$1, $2, ...` placeholders)
    Postgres,
    /// SQLite (`?` placeholders)
    Sqlite,
    /// Microsoft SQL Server (`@p1, @p2, ...` placeholders)
    SqlServer,
}

/// Placeholder shape used by a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderScheme {
    /// The same token for every argument.
    Positional(&'static str),
    /// Prefix followed by the 1-based argument index.
    Numbered(&'static str),
}

/// Declared column type family, used to validate `DEFAULT` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Boolean,
    Text,
    DateTime,
}

const INTEGER_TYPES: &[&str] = &["INT", "TINYINT", "SMALLINT", "MEDIUMINT", "BIGINT", "BIT"];
const BOOLEAN_TYPES: &[&str] = &["BOOL", "BOOLEAN"];
const TEXT_TYPES: &[&str] = &[
    "CHAR",
    "VARCHAR",
    "TEXT",
    "TINYTEXT",
    "MEDIUMTEXT",
    "LONGTEXT",
    "BINARY",
    "VARBINARY",
];
const DATETIME_TYPES: &[&str] = &["DATETIME", "TIMESTAMP"];

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::MySql,
        Dialect::Postgres,
        Dialect::Sqlite,
        Dialect::SqlServer,
    ];

    /// Placeholder scheme of this dialect.
    pub const fn placeholder_scheme(self) -> PlaceholderScheme {
        match self {
            Dialect::MySql | Dialect::Sqlite => PlaceholderScheme::Positional("?"),
            Dialect::Postgres => PlaceholderScheme::Numbered("$"),
            Dialect::SqlServer => PlaceholderScheme::Numbered("@p"),
        }
    }

    /// Placeholder token for the `index`-th bound argument (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self.placeholder_scheme() {
            PlaceholderScheme::Positional(token) => token.to_string(),
            PlaceholderScheme::Numbered(prefix) => format!("{prefix}{index}"),
        }
    }

    /// Append the placeholder for argument `index` to `out`.
    pub(crate) fn write_placeholder(self, out: &mut String, index: usize) {
        match self.placeholder_scheme() {
            PlaceholderScheme::Positional(token) => out.push_str(token),
            PlaceholderScheme::Numbered(prefix) => {
                out.push_str(prefix);
                out.push_str(&index.to_string());
            }
        }
    }

    /// Connector (driver registry) name.
    pub const fn driver_name(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite3",
            Dialect::SqlServer => "sqlserver",
        }
    }

    /// Function used by `ORDER BY` for random ordering.
    pub const fn random_function(self) -> &'static str {
        match self {
            Dialect::MySql => "RAND()",
            Dialect::Postgres | Dialect::Sqlite => "RANDOM()",
            Dialect::SqlServer => "NEWID()",
        }
    }

    /// Statement that opens a transaction.
    pub const fn begin_sql(self) -> &'static str {
        match self {
            Dialect::MySql => "START TRANSACTION",
            Dialect::SqlServer => "BEGIN TRANSACTION",
            Dialect::Postgres | Dialect::Sqlite => "BEGIN",
        }
    }

    pub const fn commit_sql(self) -> &'static str {
        match self {
            Dialect::SqlServer => "COMMIT TRANSACTION",
            _ => "COMMIT",
        }
    }

    pub const fn rollback_sql(self) -> &'static str {
        match self {
            Dialect::SqlServer => "ROLLBACK TRANSACTION",
            _ => "ROLLBACK",
        }
    }

    /// Classify a declared column type keyword.
    ///
    /// A parenthesized size (`VARCHAR(255)`) is ignored. The keyword groups are shared by all
    /// dialects.
    pub fn type_family(self, keyword: &str) -> Option<TypeFamily> {
        let base = keyword
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();
        let base = base.as_str();

        if INTEGER_TYPES.contains(&base) {
            Some(TypeFamily::Integer)
        } else if BOOLEAN_TYPES.contains(&base) {
            Some(TypeFamily::Boolean)
        } else if TEXT_TYPES.contains(&base) {
            Some(TypeFamily::Text)
        } else if DATETIME_TYPES.contains(&base) {
            Some(TypeFamily::DateTime)
        } else {
            None
        }
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    /// Parse a driver keyword as accepted by `Database::connect`.
    fn from_str(s: &str) -> OrmResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" | "pq" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mssql" | "sqlserver" | "microsoftsqlserver" => Ok(Dialect::SqlServer),
            other => Err(OrmError::config(format!(
                "unsupported database driver '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_name())
    }
}
