use crate::builder::Statement;
use crate::engine::dialect::SqlDialect;
use crate::ident::{Identifier, SchemaRef, TableRef, TypeClause};

#[derive(Debug)]
pub struct SqliteDialect;

pub static SQLITE_DIALECT: SqliteDialect = SqliteDialect;

/// Schema used when a table reference is unqualified.
const DEFAULT_SCHEMA: &str = "main";

impl SqliteDialect {
    fn schema_param(table: &TableRef) -> Option<String> {
        Some(
            table
                .schema()
                .map_or_else(|| DEFAULT_SCHEMA.to_string(), |s| s.to_string()),
        )
    }
}

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn system_schemas(&self) -> &'static [&'static str] {
        &["temp"]
    }

    fn list_schemas_query(&self) -> Statement {
        Statement::new("SELECT name FROM pragma_database_list ORDER BY seq")
    }

    fn list_tables_query(&self, schema: &SchemaRef) -> Statement {
        Statement::new(
            "SELECT name FROM pragma_table_list \
             WHERE schema = ? AND type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .bind(Some(schema.to_string()))
    }

    fn columns_query(&self, table: &TableRef) -> Statement {
        Statement::new(
            "SELECT name, type, CASE WHEN pk > 0 THEN 1 ELSE 0 END, \
             CASE WHEN \"notnull\" = 0 THEN 1 ELSE 0 END \
             FROM pragma_table_info(?, ?) ORDER BY cid",
        )
        .bind(Some(table.name().to_string()))
        .bind(Self::schema_param(table))
    }

    fn primary_key_query(&self, table: &TableRef) -> Statement {
        Statement::new("SELECT name FROM pragma_table_info(?, ?) WHERE pk > 0 ORDER BY pk")
            .bind(Some(table.name().to_string()))
            .bind(Self::schema_param(table))
    }

    /// SQLite keeps the declared type on rename; the definition is not needed.
    fn rename_column(
        &self,
        table: &TableRef,
        from: &Identifier,
        to: &Identifier,
        _definition: &TypeClause,
    ) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            table, from, to
        ))
    }

    // The new name must be unqualified.
    fn rename_table(&self, table: &TableRef, to: &Identifier) -> Option<String> {
        Some(format!("ALTER TABLE {} RENAME TO {}", table, to))
    }

    fn truncate_table(&self, table: &TableRef) -> Option<String> {
        Some(format!("DELETE FROM {}", table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unqualified_tables_resolve_to_main() {
        let table = TableRef::bare("orders").unwrap();
        let stmt = SQLITE_DIALECT.primary_key_query(&table);
        assert_eq!(
            stmt.params,
            vec![Some("orders".to_string()), Some("main".to_string())]
        );
    }

    #[test]
    fn server_level_operations_are_absent() {
        let schema = SchemaRef::new("shop").unwrap();
        assert!(SQLITE_DIALECT.create_database(&schema).is_none());
        assert!(SQLITE_DIALECT.drop_database(&schema).is_none());
        assert_eq!(
            SQLITE_DIALECT.truncate_table(&TableRef::bare("t").unwrap()),
            Some("DELETE FROM t".to_string())
        );
    }
}
