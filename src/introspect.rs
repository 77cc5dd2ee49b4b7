//! Schema introspection.
//!
//! Every call re-reads the catalog; nothing is cached between requests
//! because the schema can change underneath us.

use tracing::{debug, warn};

use crate::builder::{Statement, StatementBuilder};
use crate::engine::value::TabularResult;
use crate::engine::DbSession;
use crate::error::{Error, Result};
use crate::ident::{validate_identifier, Identifier, SchemaRef, TableRef};
use crate::record::{Param, RowRecord};

/// One column as the catalog describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
    pub is_primary_key: bool,
    pub nullable: bool,
}

/// Primary-key columns in key-ordinal order. Empty when the table has none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryKeySet(Vec<Identifier>);

impl PrimaryKeySet {
    pub fn new(columns: Vec<Identifier>) -> Self {
        PrimaryKeySet(columns)
    }

    pub fn columns(&self) -> &[Identifier] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_composite(&self) -> bool {
        self.0.len() > 1
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c.as_str() == column)
    }

    /// Key values picked out of `record`, in key order.
    pub fn values_from(&self, record: &RowRecord) -> Result<Vec<Param>> {
        self.0
            .iter()
            .map(|column| {
                record
                    .get(column.as_str())
                    .cloned()
                    .ok_or_else(|| Error::MissingKeyValue {
                        column: column.to_string(),
                    })
            })
            .collect()
    }
}

/// Columns and key of one table, read together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table: TableRef,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: PrimaryKeySet,
}

impl TableSchema {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Every column the record names must exist in the table.
    pub fn check_record(&self, record: &RowRecord) -> Result<()> {
        match record.columns().find(|column| !self.has_column(column)) {
            Some(column) => Err(Error::UnknownColumn {
                table: self.table.to_string(),
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Update and delete need a key to address a single row.
    pub fn supports_row_addressing(&self) -> bool {
        !self.primary_key.is_empty()
    }
}

async fn catalog(session: &mut dyn DbSession, statement: Statement) -> Result<TabularResult> {
    session
        .fetch(&statement.sql, &statement.params)
        .await
        .map_err(Error::introspection)
}

/// First column of every row as text.
fn names(result: &TabularResult) -> Vec<String> {
    result
        .rows
        .iter()
        .filter_map(|row| row.first().and_then(|value| value.to_param()))
        .collect()
}

/// Catalog names that can be addressed, plus the ones that cannot.
///
/// Names failing identifier validation (a table called `order` or
/// `my-table`) cannot be spliced into statements, so they are reported in
/// `skipped` instead of `items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub skipped: Vec<String>,
}

impl<T> Listing<T> {
    /// True when every catalog name was usable.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Databases visible to the session, without the server's own schemas.
pub async fn list_schemas(session: &mut dyn DbSession) -> Result<Listing<SchemaRef>> {
    let builder = StatementBuilder::for_session(session);
    let system = builder.dialect().system_schemas();
    let result = catalog(session, builder.list_schemas()).await?;

    let mut listing = Listing {
        items: Vec::new(),
        skipped: Vec::new(),
    };
    for name in names(&result) {
        if system.iter().any(|s| s.eq_ignore_ascii_case(&name)) {
            continue;
        }
        match SchemaRef::new(&name) {
            Ok(schema) => listing.items.push(schema),
            Err(err) => {
                warn!(schema = %name, error = %err, "Skipping schema");
                listing.skipped.push(name);
            }
        }
    }
    debug!(
        count = listing.items.len(),
        skipped = listing.skipped.len(),
        "Listed schemas"
    );
    Ok(listing)
}

/// Tables (and views) in `schema`.
pub async fn list_tables(
    session: &mut dyn DbSession,
    schema: &SchemaRef,
) -> Result<Listing<TableRef>> {
    let builder = StatementBuilder::for_session(session);
    let result = catalog(session, builder.list_tables(schema)).await?;

    let mut listing = Listing {
        items: Vec::new(),
        skipped: Vec::new(),
    };
    for name in names(&result) {
        match TableRef::new(schema, &name) {
            Ok(table) => listing.items.push(table),
            Err(err) => {
                warn!(%schema, table = %name, error = %err, "Skipping table");
                listing.skipped.push(name);
            }
        }
    }
    Ok(listing)
}

/// Columns in the table's own order.
pub async fn describe_columns(
    session: &mut dyn DbSession,
    table: &TableRef,
) -> Result<Vec<ColumnDescriptor>> {
    let builder = StatementBuilder::for_session(session);
    let result = catalog(session, builder.describe_columns(table)).await?;

    result
        .rows
        .iter()
        .map(|row| {
            let text = |i: usize| row.get(i).and_then(|v| v.to_param()).unwrap_or_default();
            let flag = |i: usize| row.get(i).and_then(|v| v.as_i64()) == Some(1);
            let name = text(0);
            if name.is_empty() {
                return Err(Error::Introspection {
                    message: format!("column without a name in {}", table),
                });
            }
            Ok(ColumnDescriptor {
                name,
                declared_type: text(1),
                is_primary_key: flag(2),
                nullable: flag(3),
            })
        })
        .collect()
}

/// Primary-key columns ordered by their position in the key.
pub async fn get_primary_key(
    session: &mut dyn DbSession,
    table: &TableRef,
) -> Result<PrimaryKeySet> {
    let builder = StatementBuilder::for_session(session);
    let result = catalog(session, builder.primary_key(table)).await?;

    let columns = names(&result)
        .iter()
        .map(|name| validate_identifier(name))
        .collect::<Result<Vec<_>>>()?;
    Ok(PrimaryKeySet::new(columns))
}

/// Columns and primary key together.
pub async fn describe_table(session: &mut dyn DbSession, table: &TableRef) -> Result<TableSchema> {
    let columns = describe_columns(session, table).await?;
    let primary_key = get_primary_key(session, table).await?;
    Ok(TableSchema {
        table: table.clone(),
        columns,
        primary_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sqlite::memory_session;

    async fn session_with(ddl: &[&str]) -> Box<dyn DbSession> {
        let mut session = memory_session().await;
        for sql in ddl {
            session.execute(sql, &[]).await.unwrap();
        }
        session
    }

    fn main_table(name: &str) -> TableRef {
        TableRef::new(&SchemaRef::new("main").unwrap(), name).unwrap()
    }

    #[tokio::test]
    async fn lists_schemas_and_tables() {
        let mut session = session_with(&[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER)",
        ])
        .await;

        let schemas = list_schemas(session.as_mut()).await.unwrap();
        assert_eq!(schemas.items, vec![SchemaRef::new("main").unwrap()]);
        assert!(schemas.is_complete());

        let tables = list_tables(session.as_mut(), &schemas.items[0]).await.unwrap();
        let names: Vec<String> = tables.items.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["orders", "users"]);
        assert_eq!(tables.items[0].to_string(), "main.orders");
    }

    #[tokio::test]
    async fn unaddressable_tables_are_reported_not_dropped() {
        let mut session = session_with(&[
            "CREATE TABLE \"my-table\" (id INTEGER)",
            "CREATE TABLE \"order\" (id INTEGER)",
            "CREATE TABLE items (id INTEGER)",
        ])
        .await;

        let tables = list_tables(session.as_mut(), &SchemaRef::new("main").unwrap())
            .await
            .unwrap();
        let names: Vec<&str> = tables.items.iter().map(|t| t.name().as_str()).collect();
        assert_eq!(names, vec!["items"]);
        assert_eq!(tables.skipped, vec!["my-table", "order"]);
        assert!(!tables.is_complete());
    }

    #[tokio::test]
    async fn describes_columns_in_table_order() {
        let mut session = session_with(&[
            "CREATE TABLE people (zeta TEXT NOT NULL, id INTEGER PRIMARY KEY, alpha VARCHAR(20))",
        ])
        .await;

        let columns = describe_columns(session.as_mut(), &main_table("people"))
            .await
            .unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "id", "alpha"]);
        assert_eq!(columns[2].declared_type, "VARCHAR(20)");
        assert!(columns[1].is_primary_key);
        assert!(!columns[0].is_primary_key);
        assert!(!columns[0].nullable);
        assert!(columns[2].nullable);
    }

    #[tokio::test]
    async fn primary_key_follows_key_ordinal() {
        let mut session = session_with(&[
            "CREATE TABLE sales (id INTEGER, amount INTEGER, region TEXT, PRIMARY KEY (region, id))",
        ])
        .await;

        let key = get_primary_key(session.as_mut(), &main_table("sales"))
            .await
            .unwrap();
        let names: Vec<&str> = key.columns().iter().map(Identifier::as_str).collect();
        assert_eq!(names, vec!["region", "id"]);
        assert!(key.is_composite());
    }

    #[tokio::test]
    async fn table_without_key_has_empty_set() {
        let mut session = session_with(&["CREATE TABLE log (msg TEXT)"]).await;

        let schema = describe_table(session.as_mut(), &TableRef::bare("log").unwrap())
            .await
            .unwrap();
        assert!(schema.primary_key.is_empty());
        assert!(!schema.supports_row_addressing());
        assert_eq!(schema.columns.len(), 1);
    }

    #[tokio::test]
    async fn schema_changes_are_seen_on_the_next_call() {
        let mut session = session_with(&["CREATE TABLE t (a TEXT)"]).await;
        let table = main_table("t");
        assert_eq!(describe_columns(session.as_mut(), &table).await.unwrap().len(), 1);

        session
            .execute("ALTER TABLE t ADD COLUMN b TEXT", &[])
            .await
            .unwrap();
        assert_eq!(describe_columns(session.as_mut(), &table).await.unwrap().len(), 2);
    }

    #[test]
    fn record_columns_must_exist() {
        let schema = TableSchema {
            table: TableRef::bare("t").unwrap(),
            columns: vec![ColumnDescriptor {
                name: "a".into(),
                declared_type: "TEXT".into(),
                is_primary_key: true,
                nullable: false,
            }],
            primary_key: PrimaryKeySet::new(vec![validate_identifier("a").unwrap()]),
        };
        assert!(schema
            .check_record(&RowRecord::new().with("a", Some("1".into())))
            .is_ok());
        assert!(matches!(
            schema.check_record(&RowRecord::new().with("b", None)),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn key_values_come_out_in_key_order() {
        let key = PrimaryKeySet::new(vec![
            validate_identifier("region").unwrap(),
            validate_identifier("id").unwrap(),
        ]);
        let record = RowRecord::new()
            .with("id", Some("4".into()))
            .with("region", Some("eu".into()));
        assert_eq!(
            key.values_from(&record).unwrap(),
            vec![Some("eu".to_string()), Some("4".to_string())]
        );
        assert!(matches!(
            key.values_from(&RowRecord::new().with("id", Some("4".into()))),
            Err(Error::MissingKeyValue { .. })
        ));
    }
}
