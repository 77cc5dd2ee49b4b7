pub mod dialect;
pub mod mysql;
pub mod sqlite;
pub mod value;

use crate::engine::dialect::SqlDialect;
use crate::engine::value::TabularResult;
use crate::error::{Error, Result};
use crate::record::Param;
use async_trait::async_trait;

/// Database engine trait for provider abstraction
#[async_trait]
pub trait DbEngine: Send + Sync {
    /// Connect to a database using the provider's URL format
    async fn connect(&self, url: &str) -> Result<Box<dyn DbSession>>;
}

/// Active database session, owned by the caller.
///
/// The core borrows a session for the duration of one operation and never
/// opens or closes it. One operation at a time: `&mut self` everywhere.
///
/// Statements without parameters go over the plain text protocol so that any
/// statement the server accepts can run; statements with parameters are
/// prepared and bound.
#[async_trait]
pub trait DbSession: Send {
    /// Dialect helper for placeholders, catalog queries and DDL forms
    fn dialect(&self) -> &'static dyn SqlDialect;

    /// Run a statement and fetch every row with its column names
    async fn fetch(&mut self, sql: &str, params: &[Param]) -> sqlx::Result<TabularResult>;

    /// Run a statement and return the number of affected rows
    async fn execute(&mut self, sql: &str, params: &[Param]) -> sqlx::Result<u64>;

    /// Open a transaction
    async fn begin(&mut self) -> sqlx::Result<()>;

    /// Commit current transaction
    async fn commit(&mut self) -> sqlx::Result<()>;

    /// Roll back current transaction
    async fn rollback(&mut self) -> sqlx::Result<()>;

    /// Whether a transaction opened by `begin` is still pending
    fn in_transaction(&self) -> bool;

    /// Close the underlying connection
    async fn close(self: Box<Self>) -> sqlx::Result<()>;
}

/// Factory for creating database engines
pub fn create_engine(provider: &str) -> Result<Box<dyn DbEngine>> {
    match provider.to_lowercase().as_str() {
        "mysql" => Ok(Box::new(mysql::MysqlEngine)),
        "sqlite" => Ok(Box::new(sqlite::SqliteEngine)),
        _ => Err(Error::UnsupportedProvider(provider.to_string())),
    }
}

/// Guess the provider from a connection URL.
pub fn provider_for_url(url: &str) -> Option<&'static str> {
    if url.starts_with("mysql://") || url.starts_with("mariadb://") {
        Some("mysql")
    } else if url.starts_with("sqlite:") || url.ends_with(".db") {
        Some("sqlite")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers() {
        assert!(create_engine("MySQL").is_ok());
        assert!(create_engine("sqlite").is_ok());
        assert!(matches!(
            create_engine("oracle"),
            Err(Error::UnsupportedProvider(_))
        ));
        assert_eq!(provider_for_url("mysql://root@localhost/db"), Some("mysql"));
        assert_eq!(provider_for_url("sqlite::memory:"), Some("sqlite"));
        assert_eq!(provider_for_url("postgres://x"), None);
    }
}
