//! PostgreSQL driver over `deadpool-postgres` / `tokio-postgres`.
//!
//! Statements are prepared with the per-connection statement cache, [`Value`] arguments are
//! encoded for whatever parameter type the server inferred, and result cells are decoded by
//! column type.

use crate::config::DatabaseConfig;
use crate::dialect::Dialect;
use crate::driver::{Connection, Driver, ExecResult, RowSet};
use crate::error::{OrmError, OrmResult};
use crate::executor::Database;
use crate::pool::create_pool_with_config;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use deadpool_postgres::Pool;
use rust_decimal::Decimal;
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// [`Driver`] backed by a `deadpool_postgres::Pool`.
#[derive(Clone)]
pub struct PgDriver {
    pool: Pool,
}

impl PgDriver {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

impl Driver for PgDriver {
    type Conn = PgConnection;

    async fn acquire(&self) -> OrmResult<PgConnection> {
        let client = self.pool.get().await?;
        Ok(PgConnection { client })
    }

    fn close(&self) {
        self.pool.close();
    }
}

/// A pooled PostgreSQL connection; returned to the pool on drop.
pub struct PgConnection {
    client: deadpool_postgres::Client,
}

impl PgConnection {
    /// Access the underlying pooled client.
    pub fn client(&self) -> &deadpool_postgres::Client {
        &self.client
    }
}

fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Connection for PgConnection {
    type Prepared = tokio_postgres::Statement;

    async fn prepare(&self, sql: &str) -> OrmResult<Self::Prepared> {
        Ok(self.client.prepare_cached(sql).await?)
    }

    async fn query(&self, stmt: &Self::Prepared, args: &[Value]) -> OrmResult<RowSet> {
        let params = params(args);
        let rows = self.client.query(stmt, &params).await?;

        let columns = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let rows = rows.iter().map(decode_row).collect::<OrmResult<Vec<_>>>()?;
        Ok(RowSet::new(columns, rows))
    }

    async fn exec(&self, stmt: &Self::Prepared, args: &[Value]) -> OrmResult<ExecResult> {
        let params = params(args);
        let affected = self.client.execute(stmt, &params).await?;
        // PostgreSQL has no session-level "last insert id"; use RETURNING instead.
        Ok(ExecResult::affected(affected))
    }

    async fn exec_unprepared(&self, sql: &str) -> OrmResult<ExecResult> {
        self.client.batch_execute(sql).await?;
        Ok(ExecResult::default())
    }

    /// Detach the client from the pool; dropping it closes the session, which makes the
    /// server roll back anything left open.
    fn discard(self) {
        drop(deadpool_postgres::Object::take(self.client));
    }
}

impl Database<PgDriver> {
    /// Connect using a driver keyword (`"postgres"`, `"pg"`, ...) and a database URL.
    ///
    /// Only PostgreSQL ships a built-in driver; other dialects are served by implementing
    /// [`Driver`] and calling [`Database::new`].
    pub fn connect(driver: &str, database_url: &str) -> OrmResult<Self> {
        Self::connect_with_config(driver, database_url, DatabaseConfig::default())
    }

    /// Connect with custom configuration; the pool size comes from
    /// [`DatabaseConfig::max_pool_size`].
    pub fn connect_with_config(
        driver: &str,
        database_url: &str,
        config: DatabaseConfig,
    ) -> OrmResult<Self> {
        let dialect: Dialect = driver.parse()?;
        if dialect != Dialect::Postgres {
            return Err(OrmError::config(format!(
                "no built-in driver for '{dialect}'; implement neorm::Driver and use Database::new"
            )));
        }

        let pool = create_pool_with_config(database_url, config.max_pool_size)?;
        Ok(Database::with_config(dialect, PgDriver::new(pool), config))
    }
}

// ----------------------------------------------------------------------
// Parameter encoding
// ----------------------------------------------------------------------

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => {
                let v = *v;
                if *ty == Type::INT2 {
                    i16::try_from(v)?.to_sql_checked(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(v)?.to_sql_checked(ty, out)
                } else if *ty == Type::OID {
                    u32::try_from(v)?.to_sql_checked(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (v as f32).to_sql_checked(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (v as f64).to_sql_checked(ty, out)
                } else if *ty == Type::NUMERIC {
                    Decimal::from(v).to_sql_checked(ty, out)
                } else {
                    v.to_sql_checked(ty, out)
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql_checked(ty, out)
                } else if *ty == Type::NUMERIC {
                    Decimal::try_from(*v)?.to_sql_checked(ty, out)
                } else {
                    v.to_sql_checked(ty, out)
                }
            }
            Value::Text(v) => text_to_sql(v, ty, out),
            Value::Raw(v) => v.as_slice().to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Text arguments bound to numeric, temporal or uuid parameters are parsed first.
fn text_to_sql(
    v: &str,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    if *ty == Type::UUID {
        Uuid::parse_str(v)?.to_sql_checked(ty, out)
    } else if *ty == Type::NUMERIC {
        v.trim().parse::<Decimal>()?.to_sql_checked(ty, out)
    } else if *ty == Type::DATE {
        NaiveDate::parse_from_str(v, "%Y-%m-%d")?.to_sql_checked(ty, out)
    } else if *ty == Type::TIME {
        v.parse::<NaiveTime>()?.to_sql_checked(ty, out)
    } else if *ty == Type::TIMESTAMP {
        parse_naive_datetime(v)?.to_sql_checked(ty, out)
    } else if *ty == Type::TIMESTAMPTZ {
        DateTime::parse_from_rfc3339(v)?
            .with_timezone(&Utc)
            .to_sql_checked(ty, out)
    } else {
        v.to_sql_checked(ty, out)
    }
}

fn parse_naive_datetime(v: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    v.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%.f"))
}

// ----------------------------------------------------------------------
// Row decoding
// ----------------------------------------------------------------------

/// Label of a user-defined enum; the binary format of an enum is its UTF-8 label.
struct EnumLabel(String);

impl<'a> FromSql<'a> for EnumLabel {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(EnumLabel(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_))
    }
}

fn decode_row(row: &tokio_postgres::Row) -> OrmResult<Vec<Value>> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn text<T: ToString>(v: Option<T>) -> Value {
    v.map(|v| v.to_string()).into()
}

fn decode_cell(row: &tokio_postgres::Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(idx)
                .map_err(|e| OrmError::decode(column.name(), e.to_string()))?
        };
    }

    let value = if *ty == Type::BOOL {
        get!(bool).into()
    } else if *ty == Type::INT2 {
        get!(i16).into()
    } else if *ty == Type::INT4 {
        get!(i32).into()
    } else if *ty == Type::INT8 {
        get!(i64).into()
    } else if *ty == Type::OID {
        get!(u32).into()
    } else if *ty == Type::FLOAT4 {
        get!(f32).into()
    } else if *ty == Type::FLOAT8 {
        get!(f64).into()
    } else if <String as FromSql<'_>>::accepts(ty) {
        get!(String).into()
    } else if *ty == Type::BYTEA {
        get!(Vec<u8>).into()
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get!(serde_json::Value).into()
    } else if *ty == Type::DATE {
        text(get!(NaiveDate))
    } else if *ty == Type::TIME {
        text(get!(NaiveTime))
    } else if *ty == Type::TIMESTAMP {
        text(get!(NaiveDateTime))
    } else if *ty == Type::TIMESTAMPTZ {
        get!(DateTime<Utc>).map(|v| v.to_rfc3339()).into()
    } else if *ty == Type::UUID {
        text(get!(Uuid))
    } else if *ty == Type::NUMERIC {
        text(get!(Decimal))
    } else if *ty == Type::CHAR {
        get!(i8).into()
    } else if <EnumLabel as FromSql<'_>>::accepts(ty) {
        get!(EnumLabel).map(|label| label.0).into()
    } else {
        // Results arrive in binary format; there is no safe text fallback.
        return Err(OrmError::decode(
            column.name(),
            format!("no decoder for PostgreSQL type '{}'", ty.name()),
        ));
    };
    Ok(value)
}
