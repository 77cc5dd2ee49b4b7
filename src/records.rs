use anyhow::{Context, Result};
use dbdesk::{
    describe_table, run_write, DbSession, Error, Param, RowRecord, StatementBuilder, TableRef,
    TableSchema,
};

fn assignments(pairs: Vec<(String, String)>) -> RowRecord {
    pairs
        .into_iter()
        .map(|(column, value)| (column, Some(value)))
        .collect()
}

/// Key values in key order. Every key column must be given, and nothing else.
pub fn key_values(schema: &TableSchema, keys: Vec<(String, String)>) -> dbdesk::Result<Vec<Param>> {
    if schema.primary_key.is_empty() {
        return Err(Error::NoPrimaryKey {
            table: schema.table.to_string(),
        });
    }
    let record = assignments(keys);
    schema.check_record(&record)?;
    let values = schema.primary_key.values_from(&record)?;
    if record.len() != values.len() {
        return Err(Error::KeyArity {
            expected: values.len(),
            actual: record.len(),
        });
    }
    Ok(values)
}

pub async fn insert(
    session: &mut dyn DbSession,
    table: &TableRef,
    values: Vec<(String, String)>,
    nulls: Vec<String>,
) -> Result<()> {
    let schema = describe_table(session, table).await?;

    let mut record = assignments(values);
    for column in nulls {
        record.set(column, None);
    }
    schema.check_record(&record)?;

    let statement = StatementBuilder::for_session(session).insert(table, &record)?;
    let affected = run_write(session, &statement)
        .await
        .with_context(|| format!("Failed to insert into {}", table))?;
    println!("Inserted {} row(s) into {}", affected, table);
    Ok(())
}

pub async fn update(
    session: &mut dyn DbSession,
    table: &TableRef,
    keys: Vec<(String, String)>,
    values: Vec<(String, String)>,
) -> Result<()> {
    let schema = describe_table(session, table).await?;
    let key = key_values(&schema, keys)?;

    let changes = assignments(values);
    schema.check_record(&changes)?;

    let statement =
        StatementBuilder::for_session(session).update(table, &changes, &schema.primary_key, &key)?;
    let affected = run_write(session, &statement)
        .await
        .with_context(|| format!("Failed to update {}", table))?;
    println!("Updated {} row(s) in {}", affected, table);
    Ok(())
}

pub async fn delete(
    session: &mut dyn DbSession,
    table: &TableRef,
    keys: Vec<(String, String)>,
) -> Result<()> {
    let schema = describe_table(session, table).await?;
    let key = key_values(&schema, keys)?;

    let statement = StatementBuilder::for_session(session).delete(table, &schema.primary_key, &key)?;
    let affected = run_write(session, &statement)
        .await
        .with_context(|| format!("Failed to delete from {}", table))?;
    println!("Deleted {} row(s) from {}", affected, table);
    Ok(())
}
