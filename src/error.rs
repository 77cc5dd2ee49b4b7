//! Error types for the SQL execution core.

use crate::ident::IdentifierProblem;

/// Errors returned by the core. Nothing here is fatal to the process: the
/// session stays usable after any of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Identifier failed the grammar check. Never reaches the database.
    #[error("Invalid identifier '{raw}': {problem}")]
    InvalidIdentifier {
        /// The rejected input.
        raw: String,
        /// Why it was rejected.
        problem: IdentifierProblem,
    },

    /// Column type clause is empty or tries to terminate the statement.
    #[error("Invalid column definition '{0}'")]
    InvalidTypeClause(String),

    /// A metadata query failed.
    #[error("Introspection failed: {message}")]
    Introspection {
        /// Native database message.
        message: String,
    },

    /// Update/delete addressing requires a primary key the table does not have.
    #[error("Table '{table}' has no primary key")]
    NoPrimaryKey {
        /// Table that was addressed.
        table: String,
    },

    /// Every change in an update was empty.
    #[error("Nothing to update in table '{table}'")]
    NoOpUpdate {
        /// Table that was addressed.
        table: String,
    },

    /// Insert without any column.
    #[error("No values given for insert into '{table}'")]
    EmptyRecord {
        /// Table that was addressed.
        table: String,
    },

    /// Table definition without any column.
    #[error("Table '{table}' needs at least one column")]
    NoColumns {
        /// Table that was addressed.
        table: String,
    },

    /// A record names a column the table does not have.
    #[error("Table '{table}' has no column '{column}'")]
    UnknownColumn {
        /// Table that was addressed.
        table: String,
        /// Offending column name.
        column: String,
    },

    /// A key column has no value in the addressing record.
    #[error("Missing value for key column '{column}'")]
    MissingKeyValue {
        /// Key column without a value.
        column: String,
    },

    /// Number of key values does not match the key width.
    #[error("Primary key has {expected} column(s) but {actual} value(s) were given")]
    KeyArity {
        /// Number of key columns.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// The target dialect has no form for this operation.
    #[error("{operation} is not supported by {dialect}")]
    Unsupported {
        /// Requested operation.
        operation: &'static str,
        /// Dialect display name.
        dialect: &'static str,
    },

    /// The database rejected or failed a statement.
    #[error("Query failed: {message}")]
    Query {
        /// Native database message.
        message: String,
    },

    /// First failing or refused statement inside a script.
    #[error("Statement {position} of {total} failed after {executed} succeeded: {source}")]
    Script {
        /// 1-based position of the failing statement.
        position: usize,
        /// Number of statements in the script.
        total: usize,
        /// Statements that ran successfully before the failure.
        executed: usize,
        /// `Query` for a failed statement, `Unsupported` for a refused one.
        #[source]
        source: Box<Error>,
    },

    /// BEGIN, COMMIT or ROLLBACK failed.
    #[error("Transaction control failed: {message}")]
    Transaction {
        /// Native database message.
        message: String,
    },

    /// Could not open a session.
    #[error("Connection failed: {message}")]
    Connect {
        /// Native database message.
        message: String,
    },

    /// Unknown provider name.
    #[error("Unsupported database provider: {0}")]
    UnsupportedProvider(String),
}

impl Error {
    pub(crate) fn query(err: sqlx::Error) -> Self {
        Error::Query {
            message: native_message(&err),
        }
    }

    pub(crate) fn introspection(err: sqlx::Error) -> Self {
        Error::Introspection {
            message: native_message(&err),
        }
    }

    pub(crate) fn transaction(err: sqlx::Error) -> Self {
        Error::Transaction {
            message: native_message(&err),
        }
    }

    pub(crate) fn connect(err: sqlx::Error) -> Self {
        Error::Connect {
            message: native_message(&err),
        }
    }
}

/// Prefer the server's own message over sqlx's wrapper text.
fn native_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
