//! SQL execution core for a desktop database browser.
//!
//! Introspects schemas, tables, columns and primary keys, builds
//! parameterized DML and DDL from validated identifiers, runs queries and
//! runs multi-statement scripts inside one transaction. Sessions are opened
//! by the caller through [`engine::create_engine`]; the core only borrows
//! them.

pub mod builder;
pub mod engine;
pub mod error;
pub mod ident;
pub mod introspect;
pub mod query;
pub mod record;
pub mod script;
pub mod util;

pub use builder::{ColumnDefinition, DdlRequest, Statement, StatementBuilder};
pub use engine::value::{SqlValue, TabularResult};
pub use engine::{create_engine, provider_for_url, DbEngine, DbSession};
pub use error::{Error, Result};
pub use ident::{validate_identifier, Identifier, SchemaRef, TableRef, TypeClause};
pub use introspect::{
    describe_columns, describe_table, get_primary_key, list_schemas, list_tables,
    ColumnDescriptor, Listing, PrimaryKeySet, TableSchema,
};
pub use query::{run_query, run_statement, run_write};
pub use record::{Param, RowRecord};
pub use script::{run_script, run_script_with_progress, split_statements, ScriptOutcome};
