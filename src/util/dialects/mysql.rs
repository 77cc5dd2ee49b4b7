use crate::builder::Statement;
use crate::engine::dialect::SqlDialect;
use crate::ident::{Identifier, SchemaRef, TableRef, TypeClause};

#[derive(Debug)]
pub struct MysqlDialect;

pub static MYSQL_DIALECT: MysqlDialect = MysqlDialect;

const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "mysql", "performance_schema", "sys"];

impl SqlDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn system_schemas(&self) -> &'static [&'static str] {
        SYSTEM_SCHEMAS
    }

    fn list_schemas_query(&self) -> Statement {
        Statement::new("SELECT SCHEMA_NAME FROM information_schema.SCHEMATA ORDER BY SCHEMA_NAME")
    }

    fn list_tables_query(&self, schema: &SchemaRef) -> Statement {
        Statement::new(
            "SELECT TABLE_NAME FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = ? ORDER BY TABLE_NAME",
        )
        .bind(Some(schema.to_string()))
    }

    fn columns_query(&self, table: &TableRef) -> Statement {
        Statement::new(
            "SELECT c.COLUMN_NAME, c.COLUMN_TYPE, \
             EXISTS (SELECT 1 FROM information_schema.KEY_COLUMN_USAGE k \
                     WHERE k.TABLE_SCHEMA = c.TABLE_SCHEMA AND k.TABLE_NAME = c.TABLE_NAME \
                     AND k.COLUMN_NAME = c.COLUMN_NAME AND k.CONSTRAINT_NAME = 'PRIMARY'), \
             CASE WHEN c.IS_NULLABLE = 'YES' THEN 1 ELSE 0 END \
             FROM information_schema.COLUMNS c \
             WHERE c.TABLE_SCHEMA = COALESCE(?, DATABASE()) AND c.TABLE_NAME = ? \
             ORDER BY c.ORDINAL_POSITION",
        )
        .bind(table.schema().map(|s| s.to_string()))
        .bind(Some(table.name().to_string()))
    }

    fn primary_key_query(&self, table: &TableRef) -> Statement {
        Statement::new(
            "SELECT COLUMN_NAME FROM information_schema.KEY_COLUMN_USAGE \
             WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
             AND CONSTRAINT_NAME = 'PRIMARY' \
             ORDER BY ORDINAL_POSITION",
        )
        .bind(table.schema().map(|s| s.to_string()))
        .bind(Some(table.name().to_string()))
    }

    fn create_database(&self, schema: &SchemaRef) -> Option<String> {
        Some(format!("CREATE DATABASE {}", schema))
    }

    fn drop_database(&self, schema: &SchemaRef) -> Option<String> {
        Some(format!("DROP DATABASE {}", schema))
    }

    fn rename_column(
        &self,
        table: &TableRef,
        from: &Identifier,
        to: &Identifier,
        definition: &TypeClause,
    ) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} CHANGE {} {} {}",
            table, from, to, definition
        ))
    }

    fn change_column_type(
        &self,
        table: &TableRef,
        column: &Identifier,
        definition: &TypeClause,
    ) -> Option<String> {
        Some(format!("ALTER TABLE {} MODIFY {} {}", table, column, definition))
    }

    fn rename_table(&self, table: &TableRef, to: &Identifier) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} RENAME TO {}",
            table,
            table.renamed(to.clone())
        ))
    }

    fn truncate_table(&self, table: &TableRef) -> Option<String> {
        Some(format!("TRUNCATE TABLE {}", table))
    }
}
