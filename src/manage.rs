use anyhow::{Context, Result};
use dbdesk::{
    run_write, validate_identifier, ColumnDefinition, DbSession, DdlRequest, SchemaRef,
    StatementBuilder, TypeClause,
};

use crate::cli::ManageAction;

/// Validate the command-line arguments into a schema-change request.
pub fn to_request(action: ManageAction) -> dbdesk::Result<DdlRequest> {
    let request = match action {
        ManageAction::CreateDatabase { name } => DdlRequest::CreateDatabase {
            schema: SchemaRef::new(&name)?,
        },
        ManageAction::CreateTable {
            target,
            columns,
            primary_key,
        } => DdlRequest::CreateTable {
            table: target.table_ref()?,
            columns: columns
                .iter()
                .map(|column| ColumnDefinition::parse(column))
                .collect::<dbdesk::Result<Vec<_>>>()?,
            primary_key: primary_key
                .iter()
                .map(|name| validate_identifier(name.trim()))
                .collect::<dbdesk::Result<Vec<_>>>()?,
        },
        ManageAction::AddColumn { target, column } => DdlRequest::AddColumn {
            table: target.table_ref()?,
            column: ColumnDefinition::parse(&column)?,
        },
        ManageAction::RenameColumn {
            target,
            from,
            to,
            definition,
        } => DdlRequest::RenameColumn {
            table: target.table_ref()?,
            from: validate_identifier(&from)?,
            to: validate_identifier(&to)?,
            definition: TypeClause::new(&definition)?,
        },
        ManageAction::ChangeColumnType {
            target,
            column,
            definition,
        } => DdlRequest::ChangeColumnType {
            table: target.table_ref()?,
            column: validate_identifier(&column)?,
            definition: TypeClause::new(&definition)?,
        },
        ManageAction::DropColumn { target, column } => DdlRequest::DropColumn {
            table: target.table_ref()?,
            column: validate_identifier(&column)?,
        },
        ManageAction::RenameTable { target, to } => DdlRequest::RenameTable {
            table: target.table_ref()?,
            to: validate_identifier(&to)?,
        },
        ManageAction::DropTable { target } => DdlRequest::DropTable {
            table: target.table_ref()?,
        },
        ManageAction::DropDatabase { name } => DdlRequest::DropDatabase {
            schema: SchemaRef::new(&name)?,
        },
        ManageAction::TruncateTable { target } => DdlRequest::TruncateTable {
            table: target.table_ref()?,
        },
    };
    Ok(request)
}

pub async fn manage(session: &mut dyn DbSession, action: ManageAction) -> Result<()> {
    let request = to_request(action)?;
    let statement = StatementBuilder::for_session(session).ddl(&request)?;

    println!("Executing: {}", statement.sql);
    run_write(session, &statement)
        .await
        .with_context(|| format!("{} failed", request.operation()))?;
    println!("{} completed", request.operation());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use dbdesk::{create_engine, describe_table, Error, TableRef};

    fn action(args: &[&str]) -> ManageAction {
        let mut argv = vec!["dbdesk", "manage"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Manage { action } => action,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn hostile_names_never_become_requests() {
        let err = to_request(action(&["drop-table", "t; DROP TABLE users"])).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { .. }));

        let err = to_request(action(&[
            "add-column",
            "t",
            "--column",
            "c INT; DROP TABLE users",
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTypeClause(_)));
    }

    #[tokio::test]
    async fn table_lifecycle_on_sqlite() {
        let engine = create_engine("sqlite").unwrap();
        let mut session = engine.connect("sqlite::memory:").await.unwrap();

        manage(
            session.as_mut(),
            action(&[
                "create-table",
                "books",
                "-c",
                "id INTEGER",
                "-c",
                "title TEXT NOT NULL",
                "--primary-key",
                "id",
            ]),
        )
        .await
        .unwrap();
        manage(
            session.as_mut(),
            action(&["add-column", "books", "--column", "year INTEGER"]),
        )
        .await
        .unwrap();
        manage(
            session.as_mut(),
            action(&[
                "rename-column",
                "books",
                "--from",
                "title",
                "--to",
                "name",
                "-d",
                "TEXT NOT NULL",
            ]),
        )
        .await
        .unwrap();
        manage(session.as_mut(), action(&["rename-table", "books", "--to", "volumes"]))
            .await
            .unwrap();

        let schema = describe_table(session.as_mut(), &TableRef::bare("volumes").unwrap())
            .await
            .unwrap();
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "year"]);
        assert!(schema.primary_key.contains("id"));

        manage(session.as_mut(), action(&["truncate-table", "volumes"]))
            .await
            .unwrap();
        manage(session.as_mut(), action(&["drop-table", "volumes"]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unsupported_operations_send_nothing() {
        let engine = create_engine("sqlite").unwrap();
        let mut session = engine.connect("sqlite::memory:").await.unwrap();
        let err = manage(session.as_mut(), action(&["create-database", "shop"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Unsupported { .. })
        ));
        assert!(!session.in_transaction());
    }
}
