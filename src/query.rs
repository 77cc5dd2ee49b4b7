//! Query runner.
//!
//! Result sets are fetched whole into memory. This layer serves interactive
//! inspection; callers reading large tables should cap rows with
//! [`crate::StatementBuilder::select_all`]'s limit.

use tracing::{debug, warn};

use crate::builder::Statement;
use crate::engine::value::TabularResult;
use crate::engine::DbSession;
use crate::error::{Error, Result};
use crate::record::Param;

/// Run one statement and return its columns and rows.
///
/// Raw text from any source (including generated SQL) is treated the same
/// way: it runs with the session's own privileges and nothing else.
pub async fn run_query(
    session: &mut dyn DbSession,
    sql: &str,
    params: &[Param],
) -> Result<TabularResult> {
    let result = session.fetch(sql, params).await.map_err(Error::query)?;
    debug!(
        columns = result.columns.len(),
        rows = result.rows.len(),
        "Query finished"
    );
    Ok(result)
}

/// [`run_query`] for a built statement.
pub async fn run_statement(
    session: &mut dyn DbSession,
    statement: &Statement,
) -> Result<TabularResult> {
    run_query(session, &statement.sql, &statement.params).await
}

/// Execute one write inside its own transaction and commit it.
///
/// On failure the transaction is rolled back and the session is left with
/// nothing pending. Returns the affected row count.
pub async fn run_write(session: &mut dyn DbSession, statement: &Statement) -> Result<u64> {
    session.begin().await.map_err(Error::transaction)?;

    let affected = match session.execute(&statement.sql, &statement.params).await {
        Ok(affected) => affected,
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed write also failed");
            }
            return Err(Error::query(err));
        }
    };

    if let Err(err) = session.commit().await {
        if let Err(rollback_err) = session.rollback().await {
            warn!(error = %rollback_err, "Rollback after failed commit also failed");
        }
        return Err(Error::transaction(err));
    }

    debug!(affected, "Write committed");
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StatementBuilder;
    use crate::engine::value::SqlValue;
    use crate::engine::sqlite::memory_session;
    use crate::ident::{SchemaRef, TableRef};
    use crate::introspect::describe_columns;
    use crate::record::RowRecord;

    #[tokio::test]
    async fn describe_insert_select_round_trip() {
        let mut session = memory_session().await;
        session
            .execute(
                "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL)",
                &[],
            )
            .await
            .unwrap();
        let table = TableRef::new(&SchemaRef::new("main").unwrap(), "t").unwrap();

        let columns = describe_columns(session.as_mut(), &table).await.unwrap();
        let values = ["1", "ada", "9.5"];
        let record: RowRecord = columns
            .iter()
            .zip(values)
            .map(|(column, value)| (column.name.clone(), Some(value.to_string())))
            .collect();

        let insert = StatementBuilder::for_session(session.as_ref())
            .insert(&table, &record)
            .unwrap();
        assert_eq!(run_write(session.as_mut(), &insert).await.unwrap(), 1);

        let result = run_query(session.as_mut(), "SELECT * FROM t", &[])
            .await
            .unwrap();
        assert_eq!(result.columns, vec!["id", "name", "score"]);
        assert_eq!(result.records(), vec![record]);
        assert_eq!(
            result.rows[0],
            vec![
                SqlValue::Int(1),
                SqlValue::Text("ada".into()),
                SqlValue::Float(9.5)
            ]
        );
    }

    #[tokio::test]
    async fn database_errors_carry_the_native_message() {
        let mut session = memory_session().await;
        let err = run_query(session.as_mut(), "SELECT * FROM missing", &[])
            .await
            .unwrap_err();
        match err {
            Error::Query { message } => assert!(message.contains("missing")),
            other => panic!("expected Query error, got {other:?}"),
        }

        // Session stays usable.
        let result = run_query(session.as_mut(), "SELECT 1 AS one", &[])
            .await
            .unwrap();
        assert_eq!(result.rows, vec![vec![SqlValue::Int(1)]]);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_open_transaction() {
        let mut session = memory_session().await;
        session
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[])
            .await
            .unwrap();

        let insert = Statement::new("INSERT INTO t (id) VALUES (?)").bind(Some("1".into()));
        run_write(session.as_mut(), &insert).await.unwrap();
        let err = run_write(session.as_mut(), &insert).await.unwrap_err();
        assert!(matches!(err, Error::Query { .. }));
        assert!(!session.in_transaction());

        let result = run_statement(session.as_mut(), &Statement::new("SELECT id FROM t"))
            .await
            .unwrap();
        assert_eq!(result.rows.len(), 1);
    }
}
