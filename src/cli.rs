use clap::{Args, Parser, Subcommand};
use dbdesk::{provider_for_url, TableRef};

#[derive(Parser, Debug)]
#[command(name = "dbdesk")]
#[command(
    about = "Browse, edit and script MySQL and SQLite databases",
    long_about = None
)]
pub struct Cli {
    /// Database URL (mysql:// or sqlite:)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Environment variable containing the database URL
    #[arg(long, global = true)]
    pub url_env: Option<String>,

    /// Database provider (mysql|sqlite), guessed from the URL when omitted
    #[arg(long, global = true, value_parser = ["mysql", "sqlite"])]
    pub provider: Option<String>,

    /// Log every statement sent to the server
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// A table, optionally qualified by its schema.
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Schema (database) holding the table
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Table name
    pub table: String,
}

impl TableArgs {
    pub fn table_ref(&self) -> dbdesk::Result<TableRef> {
        TableRef::parse(self.schema.as_deref(), &self.table)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List user schemas
    Schemas,

    /// List tables of a schema
    Tables {
        /// Schema name
        schema: String,
    },

    /// Show columns and primary key of a table
    Describe {
        #[command(flatten)]
        target: TableArgs,
    },

    /// Print the rows of a table
    Read {
        #[command(flatten)]
        target: TableArgs,

        /// Maximum number of rows
        #[arg(long)]
        limit: Option<u64>,
    },

    /// List primary-key values of every row
    Keys {
        #[command(flatten)]
        target: TableArgs,
    },

    /// Print the row addressed by its primary key
    Show {
        #[command(flatten)]
        target: TableArgs,

        /// Key value as column=value (repeat for composite keys)
        #[arg(short, long = "key", value_parser = parse_assignment, required = true)]
        keys: Vec<(String, String)>,
    },

    /// Insert one row
    Insert {
        #[command(flatten)]
        target: TableArgs,

        /// Column value as column=value
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,

        /// Column to insert as NULL
        #[arg(long = "null")]
        nulls: Vec<String>,
    },

    /// Update the row addressed by its primary key
    Update {
        #[command(flatten)]
        target: TableArgs,

        /// Key value as column=value (repeat for composite keys)
        #[arg(short, long = "key", value_parser = parse_assignment, required = true)]
        keys: Vec<(String, String)>,

        /// New value as column=value; blank values are left unchanged
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        values: Vec<(String, String)>,
    },

    /// Delete the row addressed by its primary key
    Delete {
        #[command(flatten)]
        target: TableArgs,

        /// Key value as column=value (repeat for composite keys)
        #[arg(short, long = "key", value_parser = parse_assignment, required = true)]
        keys: Vec<(String, String)>,
    },

    /// Run one statement and print its result
    Query {
        /// SQL text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        sql: Option<String>,

        /// File holding the SQL text
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Run a script file in one transaction (.sql or .sql.gz)
    Script {
        /// Input file path
        #[arg(short, long)]
        input: String,
    },

    /// Change the schema
    Manage {
        #[command(subcommand)]
        action: ManageAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ManageAction {
    /// Create a schema (database)
    CreateDatabase {
        /// Schema name
        name: String,
    },

    /// Create a table
    CreateTable {
        #[command(flatten)]
        target: TableArgs,

        /// Column as "name TYPE ..." (repeat for each column)
        #[arg(short, long = "column", required = true)]
        columns: Vec<String>,

        /// Primary-key columns (comma-separated)
        #[arg(long, value_delimiter = ',')]
        primary_key: Vec<String>,
    },

    /// Add a column
    AddColumn {
        #[command(flatten)]
        target: TableArgs,

        /// Column as "name TYPE ..."
        #[arg(short, long)]
        column: String,
    },

    /// Rename a column
    RenameColumn {
        #[command(flatten)]
        target: TableArgs,

        /// Current column name
        #[arg(long)]
        from: String,

        /// New column name
        #[arg(long)]
        to: String,

        /// Full column definition after the rename
        #[arg(short, long)]
        definition: String,
    },

    /// Change the type of a column
    ChangeColumnType {
        #[command(flatten)]
        target: TableArgs,

        /// Column name
        #[arg(short, long)]
        column: String,

        /// New column definition
        #[arg(short, long)]
        definition: String,
    },

    /// Drop a column
    DropColumn {
        #[command(flatten)]
        target: TableArgs,

        /// Column name
        #[arg(short, long)]
        column: String,
    },

    /// Rename a table
    RenameTable {
        #[command(flatten)]
        target: TableArgs,

        /// New table name
        #[arg(long)]
        to: String,
    },

    /// Drop a table
    DropTable {
        #[command(flatten)]
        target: TableArgs,
    },

    /// Drop a schema (database)
    DropDatabase {
        /// Schema name
        name: String,
    },

    /// Remove every row of a table
    TruncateTable {
        #[command(flatten)]
        target: TableArgs,
    },
}

/// Parse `column=value`. The value may be empty or contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected column=value, got '{}'", raw)),
    }
}

impl Cli {
    /// Get database URL from either direct argument or environment variable
    pub fn get_url(direct: &Option<String>, env_var: &Option<String>) -> anyhow::Result<String> {
        if let Some(url) = direct {
            Ok(url.clone())
        } else if let Some(env) = env_var {
            std::env::var(env)
                .map_err(|_| anyhow::anyhow!("Environment variable {} not found", env))
        } else {
            Err(anyhow::anyhow!("Either --url or --url-env must be provided"))
        }
    }

    /// Explicit provider, else guessed from the URL, else MySQL.
    pub fn resolve_provider(&self, url: &str) -> String {
        self.provider
            .clone()
            .or_else(|| provider_for_url(url).map(str::to_string))
            .unwrap_or_else(|| "mysql".to_string())
    }

    /// Redact password from URL for logging
    pub fn redact_url(url: &str) -> String {
        let authority_start = url.find("://").map(|pos| pos + 3).unwrap_or(0);
        if let Some(at_pos) = url[authority_start..].find('@').map(|pos| pos + authority_start) {
            if let Some(colon_pos) = url[authority_start..at_pos].rfind(':') {
                let colon_pos = colon_pos + authority_start;
                let mut redacted = url.to_string();
                redacted.replace_range(colon_pos + 1..at_pos, "***");
                return redacted;
            }
        }
        url.to_string()
    }
}
