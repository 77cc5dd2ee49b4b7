use crate::builder::Statement;
use crate::ident::{Identifier, SchemaRef, TableRef, TypeClause};

/// SQL dialect abstraction: placeholders, catalog queries and the DDL forms
/// that differ between servers.
///
/// DDL methods return `None` when the dialect has no form for the operation.
pub trait SqlDialect: Send + Sync {
    /// Dialect display name (used in logs and errors).
    fn name(&self) -> &'static str;

    /// Bind marker for the `index`-th (0-based) parameter.
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Schemas that belong to the server itself and are never listed.
    fn system_schemas(&self) -> &'static [&'static str];

    /// Catalog query yielding one schema name per row.
    fn list_schemas_query(&self) -> Statement;

    /// Catalog query yielding one table name per row.
    fn list_tables_query(&self, schema: &SchemaRef) -> Statement;

    /// Catalog query yielding `(name, declared_type, is_primary_key, is_nullable)`
    /// rows in the table's column order. Flags are 0/1 integers.
    fn columns_query(&self, table: &TableRef) -> Statement;

    /// Catalog query yielding primary-key column names ordered by key ordinal.
    fn primary_key_query(&self, table: &TableRef) -> Statement;

    fn create_database(&self, _schema: &SchemaRef) -> Option<String> {
        None
    }

    fn drop_database(&self, _schema: &SchemaRef) -> Option<String> {
        None
    }

    fn rename_column(
        &self,
        table: &TableRef,
        from: &Identifier,
        to: &Identifier,
        definition: &TypeClause,
    ) -> Option<String>;

    fn change_column_type(
        &self,
        _table: &TableRef,
        _column: &Identifier,
        _definition: &TypeClause,
    ) -> Option<String> {
        None
    }

    fn rename_table(&self, table: &TableRef, to: &Identifier) -> Option<String>;

    fn truncate_table(&self, table: &TableRef) -> Option<String>;
}
