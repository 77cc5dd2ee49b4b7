//! Statement builder.
//!
//! The only place that assembles SQL text. Identifiers arrive already
//! validated (see [`crate::ident`]) and values are always emitted as bind
//! markers with an ordered parameter list.

use tracing::debug;

use crate::engine::dialect::SqlDialect;
use crate::engine::DbSession;
use crate::error::{Error, Result};
use crate::ident::{validate_identifier, Identifier, SchemaRef, TableRef, TypeClause};
use crate::introspect::PrimaryKeySet;
use crate::record::{is_blank, Param, RowRecord};

/// SQL text with bind markers plus the values for them, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append one bind value.
    #[must_use]
    pub fn bind(mut self, value: Param) -> Self {
        self.params.push(value);
        self
    }
}

/// One column of a table definition: validated name plus verbatim type text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: Identifier,
    pub definition: TypeClause,
}

impl ColumnDefinition {
    pub fn new(name: &str, definition: &str) -> Result<Self> {
        Ok(ColumnDefinition {
            name: validate_identifier(name)?,
            definition: TypeClause::new(definition)?,
        })
    }

    /// Parse `"name TYPE ..."`: the first word is the column name, the rest
    /// is the type clause.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        match text.split_once(char::is_whitespace) {
            Some((name, definition)) => ColumnDefinition::new(name, definition),
            None => Err(Error::InvalidTypeClause(text.to_string())),
        }
    }
}

/// Schema-changing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlRequest {
    CreateDatabase {
        schema: SchemaRef,
    },
    CreateTable {
        table: TableRef,
        columns: Vec<ColumnDefinition>,
        /// Optional table-level key, possibly composite.
        primary_key: Vec<Identifier>,
    },
    AddColumn {
        table: TableRef,
        column: ColumnDefinition,
    },
    /// Renames need the full new definition; some servers re-declare the
    /// column on rename.
    RenameColumn {
        table: TableRef,
        from: Identifier,
        to: Identifier,
        definition: TypeClause,
    },
    ChangeColumnType {
        table: TableRef,
        column: Identifier,
        definition: TypeClause,
    },
    DropColumn {
        table: TableRef,
        column: Identifier,
    },
    RenameTable {
        table: TableRef,
        to: Identifier,
    },
    DropTable {
        table: TableRef,
    },
    DropDatabase {
        schema: SchemaRef,
    },
    TruncateTable {
        table: TableRef,
    },
}

impl DdlRequest {
    /// Operation name for logs and errors.
    pub fn operation(&self) -> &'static str {
        match self {
            DdlRequest::CreateDatabase { .. } => "CREATE DATABASE",
            DdlRequest::CreateTable { .. } => "CREATE TABLE",
            DdlRequest::AddColumn { .. } => "ADD COLUMN",
            DdlRequest::RenameColumn { .. } => "RENAME COLUMN",
            DdlRequest::ChangeColumnType { .. } => "CHANGE COLUMN TYPE",
            DdlRequest::DropColumn { .. } => "DROP COLUMN",
            DdlRequest::RenameTable { .. } => "RENAME TABLE",
            DdlRequest::DropTable { .. } => "DROP TABLE",
            DdlRequest::DropDatabase { .. } => "DROP DATABASE",
            DdlRequest::TruncateTable { .. } => "TRUNCATE TABLE",
        }
    }
}

/// Builds statements for one dialect.
#[derive(Clone, Copy)]
pub struct StatementBuilder {
    dialect: &'static dyn SqlDialect,
}

impl StatementBuilder {
    pub fn new(dialect: &'static dyn SqlDialect) -> Self {
        StatementBuilder { dialect }
    }

    pub fn for_session(session: &dyn DbSession) -> Self {
        StatementBuilder::new(session.dialect())
    }

    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.dialect
    }

    /// `count` bind markers numbered from `start`.
    fn markers(&self, start: usize, count: usize) -> Vec<String> {
        (start..start + count)
            .map(|i| self.dialect.placeholder(i))
            .collect()
    }

    /// `pk1 = ? AND pk2 = ?`, numbered from `start`.
    fn key_predicate(&self, key: &PrimaryKeySet, start: usize) -> String {
        key.columns()
            .iter()
            .zip(self.markers(start, key.len()))
            .map(|(column, marker)| format!("{} = {}", column, marker))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn check_key(table: &TableRef, key: &PrimaryKeySet, values: &[Param]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::NoPrimaryKey {
                table: table.to_string(),
            });
        }
        if key.len() != values.len() {
            return Err(Error::KeyArity {
                expected: key.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }

    /// `INSERT INTO t (a, b) VALUES (?, ?)` with the record's values in order.
    pub fn insert(&self, table: &TableRef, record: &RowRecord) -> Result<Statement> {
        if record.is_empty() {
            return Err(Error::EmptyRecord {
                table: table.to_string(),
            });
        }

        let columns = record
            .columns()
            .map(validate_identifier)
            .collect::<Result<Vec<_>>>()?;
        let columns = columns
            .iter()
            .map(Identifier::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns,
            self.markers(0, record.len()).join(", ")
        );
        Ok(Statement {
            sql,
            params: record.iter().map(|(_, value)| value.clone()).collect(),
        })
    }

    /// `UPDATE t SET c = ? ... WHERE pk1 = ? AND ...`.
    ///
    /// Changes that are NULL or blank are left out of the SET list. If that
    /// leaves nothing, no statement is built.
    pub fn update(
        &self,
        table: &TableRef,
        changes: &RowRecord,
        key: &PrimaryKeySet,
        key_values: &[Param],
    ) -> Result<Statement> {
        Self::check_key(table, key, key_values)?;

        let mut assignments = Vec::new();
        for (column, value) in changes.iter() {
            let column = validate_identifier(column)?;
            if !is_blank(value) {
                assignments.push((column, value.clone()));
            }
        }
        if assignments.is_empty() {
            return Err(Error::NoOpUpdate {
                table: table.to_string(),
            });
        }

        let set_clause = assignments
            .iter()
            .zip(self.markers(0, assignments.len()))
            .map(|((column, _), marker)| format!("{} = {}", column, marker))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            set_clause,
            self.key_predicate(key, assignments.len())
        );

        let mut params: Vec<Param> = assignments.into_iter().map(|(_, value)| value).collect();
        params.extend(key_values.iter().cloned());
        Ok(Statement { sql, params })
    }

    /// `DELETE FROM t WHERE pk1 = ? AND ...`.
    pub fn delete(
        &self,
        table: &TableRef,
        key: &PrimaryKeySet,
        key_values: &[Param],
    ) -> Result<Statement> {
        Self::check_key(table, key, key_values)?;
        Ok(Statement {
            sql: format!("DELETE FROM {} WHERE {}", table, self.key_predicate(key, 0)),
            params: key_values.to_vec(),
        })
    }

    /// `SELECT * FROM t`, optionally capped with `LIMIT n`.
    ///
    /// The limit is a typed integer and is written into the text: MySQL
    /// rejects string-typed arguments to a `LIMIT ?` marker.
    pub fn select_all(&self, table: &TableRef, limit: Option<u64>) -> Statement {
        match limit {
            Some(limit) => Statement::new(format!("SELECT * FROM {} LIMIT {}", table, limit)),
            None => Statement::new(format!("SELECT * FROM {}", table)),
        }
    }

    /// Key columns of every row, for picking a row to change.
    pub fn select_key_values(&self, table: &TableRef, key: &PrimaryKeySet) -> Result<Statement> {
        if key.is_empty() {
            return Err(Error::NoPrimaryKey {
                table: table.to_string(),
            });
        }
        let columns = key
            .columns()
            .iter()
            .map(Identifier::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Statement::new(format!(
            "SELECT {} FROM {} ORDER BY {}",
            columns, table, columns
        )))
    }

    /// The current row addressed by its key.
    pub fn select_by_key(
        &self,
        table: &TableRef,
        key: &PrimaryKeySet,
        key_values: &[Param],
    ) -> Result<Statement> {
        Self::check_key(table, key, key_values)?;
        Ok(Statement {
            sql: format!("SELECT * FROM {} WHERE {}", table, self.key_predicate(key, 0)),
            params: key_values.to_vec(),
        })
    }

    /// Render a schema change. Fails with `Unsupported` when the dialect has
    /// no form for it.
    pub fn ddl(&self, request: &DdlRequest) -> Result<Statement> {
        let sql = match request {
            DdlRequest::CreateDatabase { schema } => self.dialect.create_database(schema),
            DdlRequest::CreateTable {
                table,
                columns,
                primary_key,
            } => Some(create_table_sql(table, columns, primary_key)?),
            DdlRequest::AddColumn { table, column } => Some(format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                table, column.name, column.definition
            )),
            DdlRequest::RenameColumn {
                table,
                from,
                to,
                definition,
            } => self.dialect.rename_column(table, from, to, definition),
            DdlRequest::ChangeColumnType {
                table,
                column,
                definition,
            } => self.dialect.change_column_type(table, column, definition),
            DdlRequest::DropColumn { table, column } => {
                Some(format!("ALTER TABLE {} DROP COLUMN {}", table, column))
            }
            DdlRequest::RenameTable { table, to } => self.dialect.rename_table(table, to),
            DdlRequest::DropTable { table } => Some(format!("DROP TABLE {}", table)),
            DdlRequest::DropDatabase { schema } => self.dialect.drop_database(schema),
            DdlRequest::TruncateTable { table } => self.dialect.truncate_table(table),
        };

        let sql = sql.ok_or(Error::Unsupported {
            operation: request.operation(),
            dialect: self.dialect.name(),
        })?;
        debug!(operation = request.operation(), %sql, "Built DDL statement");
        Ok(Statement::new(sql))
    }

    pub fn list_schemas(&self) -> Statement {
        self.dialect.list_schemas_query()
    }

    pub fn list_tables(&self, schema: &SchemaRef) -> Statement {
        self.dialect.list_tables_query(schema)
    }

    pub fn describe_columns(&self, table: &TableRef) -> Statement {
        self.dialect.columns_query(table)
    }

    pub fn primary_key(&self, table: &TableRef) -> Statement {
        self.dialect.primary_key_query(table)
    }
}

fn create_table_sql(
    table: &TableRef,
    columns: &[ColumnDefinition],
    primary_key: &[Identifier],
) -> Result<String> {
    if columns.is_empty() {
        return Err(Error::NoColumns {
            table: table.to_string(),
        });
    }

    let mut parts: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.definition))
        .collect();
    if !primary_key.is_empty() {
        let key = primary_key
            .iter()
            .map(Identifier::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("PRIMARY KEY ({})", key));
    }
    Ok(format!("CREATE TABLE {} ({})", table, parts.join(", ")))
}
