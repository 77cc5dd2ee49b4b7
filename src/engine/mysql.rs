use super::{DbEngine, DbSession};
use crate::engine::dialect::SqlDialect;
use crate::engine::value::{SqlValue, TabularResult};
use crate::error::{Error, Result};
use crate::record::Param;
use crate::util::dialects::mysql::MYSQL_DIALECT;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor, Row, Statement as _, TypeInfo, ValueRef};
use tracing::debug;

pub struct MysqlEngine;

#[async_trait]
impl DbEngine for MysqlEngine {
    async fn connect(&self, url: &str) -> Result<Box<dyn DbSession>> {
        let conn = MySqlConnection::connect(url)
            .await
            .map_err(Error::connect)?;

        Ok(Box::new(MysqlSession {
            conn,
            in_transaction: false,
        }))
    }
}

pub struct MysqlSession {
    conn: MySqlConnection,
    in_transaction: bool,
}

impl MysqlSession {
    /// Column names from the prepared statement, for result sets with no rows.
    async fn describe_columns(&mut self, sql: &str) -> Vec<String> {
        match (&mut self.conn).prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            Err(err) => {
                debug!(error = %err, "Could not describe statement columns");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DbSession for MysqlSession {
    fn dialect(&self) -> &'static dyn SqlDialect {
        &MYSQL_DIALECT
    }

    async fn fetch(&mut self, sql: &str, params: &[Param]) -> sqlx::Result<TabularResult> {
        debug!(sql, params = params.len(), "fetch");
        let rows: Vec<MySqlRow> = if params.is_empty() {
            (&mut self.conn).fetch_all(sql).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = query.bind(param.clone());
            }
            query.fetch_all(&mut self.conn).await?
        };

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => self.describe_columns(sql).await,
        };

        let rows = rows
            .iter()
            .map(|row| (0..row.len()).map(|i| convert_sqlx_value(row, i)).collect())
            .collect();

        Ok(TabularResult { columns, rows })
    }

    async fn execute(&mut self, sql: &str, params: &[Param]) -> sqlx::Result<u64> {
        debug!(sql, params = params.len(), "execute");
        let result = if params.is_empty() {
            (&mut self.conn).execute(sql).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = query.bind(param.clone());
            }
            query.execute(&mut self.conn).await?
        };
        Ok(result.rows_affected())
    }

    async fn begin(&mut self) -> sqlx::Result<()> {
        if self.in_transaction {
            return Err(sqlx::Error::Protocol(
                "a transaction is already open on this session".into(),
            ));
        }
        (&mut self.conn).execute("START TRANSACTION").await?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> sqlx::Result<()> {
        if self.in_transaction {
            (&mut self.conn).execute("COMMIT").await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> sqlx::Result<()> {
        if self.in_transaction {
            (&mut self.conn).execute("ROLLBACK").await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    async fn close(self: Box<Self>) -> sqlx::Result<()> {
        let session = *self;
        session.conn.close().await
    }
}

/// Convert a SQLx MySQL row value to SqlValue
fn convert_sqlx_value(row: &MySqlRow, index: usize) -> SqlValue {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return SqlValue::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return SqlValue::Null,
    };

    match type_name.as_str() {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            if let Ok(v) = row.try_get::<i64, _>(index) {
                return SqlValue::Int(v);
            }
            if let Ok(v) = row.try_get::<bool, _>(index) {
                return SqlValue::Int(i64::from(v));
            }
        }
        name if name.ends_with("UNSIGNED") => {
            if let Ok(v) = row.try_get::<u64, _>(index) {
                return SqlValue::UInt(v);
            }
        }
        "FLOAT" => {
            if let Ok(v) = row.try_get::<f32, _>(index) {
                return SqlValue::Float(f64::from(v));
            }
        }
        "DOUBLE" => {
            if let Ok(v) = row.try_get::<f64, _>(index) {
                return SqlValue::Float(v);
            }
        }
        "DECIMAL" => {
            if let Ok(v) = row.try_get::<sqlx::types::BigDecimal, _>(index) {
                return SqlValue::Decimal(v.to_string());
            }
        }
        "DATE" => {
            if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
                return SqlValue::Text(v.to_string());
            }
        }
        "TIME" => {
            if let Ok(v) = row.try_get::<NaiveTime, _>(index) {
                return SqlValue::Text(v.to_string());
            }
        }
        "DATETIME" | "TIMESTAMP" => {
            if let Ok(v) = row.try_get::<NaiveDateTime, _>(index) {
                return SqlValue::Text(v.to_string());
            }
            if let Ok(v) = row.try_get::<DateTime<Utc>, _>(index) {
                return SqlValue::Text(v.naive_utc().to_string());
            }
        }
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT" => {
            if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
                return SqlValue::Bytes(v);
            }
        }
        _ => {}
    }

    // Try string
    if let Ok(v) = row.try_get::<String, _>(index) {
        return SqlValue::Text(v);
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        return SqlValue::Int(v);
    }

    if let Ok(v) = row.try_get::<f64, _>(index) {
        return SqlValue::Float(v);
    }

    // Try bytes
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return SqlValue::Bytes(v);
    }

    // Default to null
    SqlValue::Null
}
