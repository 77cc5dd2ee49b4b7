mod browse;
mod cli;
mod execute;
mod manage;
mod output;
mod records;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use dbdesk::DbSession;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let url = Cli::get_url(&cli.url, &cli.url_env)?;
    let provider = cli.resolve_provider(&url);

    println!("Connecting to: {}", Cli::redact_url(&url));

    let engine = dbdesk::create_engine(&provider)?;
    let mut session = engine
        .connect(&url)
        .await
        .context("Failed to connect to database")?;

    let outcome = dispatch(session.as_mut(), cli.command).await;

    if let Err(err) = session.close().await {
        warn!(error = %err, "Failed to close connection");
    }
    outcome
}

async fn dispatch(session: &mut dyn DbSession, command: Commands) -> Result<()> {
    match command {
        Commands::Schemas => browse::schemas(session).await,
        Commands::Tables { schema } => browse::tables(session, &schema).await,
        Commands::Describe { target } => browse::describe(session, &target.table_ref()?).await,
        Commands::Read { target, limit } => {
            browse::read(session, &target.table_ref()?, limit).await
        }
        Commands::Keys { target } => browse::keys(session, &target.table_ref()?).await,
        Commands::Show { target, keys } => {
            browse::show(session, &target.table_ref()?, keys).await
        }
        Commands::Insert {
            target,
            values,
            nulls,
        } => records::insert(session, &target.table_ref()?, values, nulls).await,
        Commands::Update {
            target,
            keys,
            values,
        } => records::update(session, &target.table_ref()?, keys, values).await,
        Commands::Delete { target, keys } => {
            records::delete(session, &target.table_ref()?, keys).await
        }
        Commands::Query { sql, file } => execute::query(session, sql, file).await,
        Commands::Script { input } => execute::script(session, &input).await,
        Commands::Manage { action } => manage::manage(session, action).await,
    }
}
