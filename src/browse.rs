use anyhow::{Context, Result};
use dbdesk::{
    describe_table, get_primary_key, list_schemas, list_tables, run_statement, DbSession,
    SchemaRef, StatementBuilder, TableRef,
};

use crate::output::print_table;
use crate::records::key_values;

/// Names that exist but cannot be used in generated statements.
fn report_skipped(skipped: &[String]) {
    if !skipped.is_empty() {
        println!("Not addressable by name: {}", skipped.join(", "));
    }
}

pub async fn schemas(session: &mut dyn DbSession) -> Result<()> {
    let schemas = list_schemas(session)
        .await
        .context("Failed to list schemas")?;
    for schema in &schemas.items {
        println!("{}", schema);
    }
    println!("({} schemas)", schemas.items.len());
    report_skipped(&schemas.skipped);
    Ok(())
}

pub async fn tables(session: &mut dyn DbSession, schema: &str) -> Result<()> {
    let schema = SchemaRef::new(schema)?;
    let tables = list_tables(session, &schema)
        .await
        .with_context(|| format!("Failed to list tables of {}", schema))?;
    for table in &tables.items {
        println!("{}", table.name());
    }
    println!("({} tables)", tables.items.len());
    report_skipped(&tables.skipped);
    Ok(())
}

pub async fn describe(session: &mut dyn DbSession, table: &TableRef) -> Result<()> {
    let schema = describe_table(session, table)
        .await
        .with_context(|| format!("Failed to describe {}", table))?;

    println!("Table {}", table);
    for column in &schema.columns {
        println!(
            "  {:<24} {:<20} {}{}",
            column.name,
            column.declared_type,
            if column.nullable { "NULL" } else { "NOT NULL" },
            if column.is_primary_key { "  [key]" } else { "" }
        );
    }
    if schema.primary_key.is_empty() {
        println!("No primary key: rows cannot be updated or deleted individually");
    } else {
        let key: Vec<&str> = schema.primary_key.columns().iter().map(|c| c.as_str()).collect();
        println!("Primary key: ({})", key.join(", "));
    }
    Ok(())
}

pub async fn read(session: &mut dyn DbSession, table: &TableRef, limit: Option<u64>) -> Result<()> {
    let statement = StatementBuilder::for_session(session).select_all(table, limit);
    let result = run_statement(session, &statement)
        .await
        .with_context(|| format!("Failed to read {}", table))?;
    print_table(&result);
    Ok(())
}

pub async fn keys(session: &mut dyn DbSession, table: &TableRef) -> Result<()> {
    let key = get_primary_key(session, table).await?;
    let statement = StatementBuilder::for_session(session).select_key_values(table, &key)?;
    let result = run_statement(session, &statement)
        .await
        .with_context(|| format!("Failed to list keys of {}", table))?;
    print_table(&result);
    Ok(())
}

pub async fn show(
    session: &mut dyn DbSession,
    table: &TableRef,
    keys: Vec<(String, String)>,
) -> Result<()> {
    let schema = describe_table(session, table).await?;
    let values = key_values(&schema, keys)?;
    let statement =
        StatementBuilder::for_session(session).select_by_key(table, &schema.primary_key, &values)?;
    let result = run_statement(session, &statement)
        .await
        .with_context(|| format!("Failed to fetch row of {}", table))?;
    if result.is_empty() {
        println!("No row with that key");
    } else {
        print_table(&result);
    }
    Ok(())
}
