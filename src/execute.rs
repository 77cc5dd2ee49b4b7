use anyhow::{Context, Result};
use dbdesk::{run_query, run_script_with_progress, split_statements, DbSession, ScriptOutcome};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;

use crate::output::print_table;

/// Read a script file, decompressing `.gz` input.
pub fn read_script(path: &str) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    let mut reader: Box<dyn Read> = if path.ends_with(".gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .with_context(|| format!("Failed to read {}", path))?;
    Ok(text)
}

pub async fn query(
    session: &mut dyn DbSession,
    sql: Option<String>,
    file: Option<String>,
) -> Result<()> {
    let sql = match (sql, file) {
        (Some(sql), _) => sql,
        (None, Some(path)) => read_script(&path)?,
        (None, None) => anyhow::bail!("Either --sql or --file must be provided"),
    };

    let result = run_query(session, sql.trim(), &[]).await?;
    if result.columns.is_empty() {
        println!("Statement executed");
    } else {
        print_table(&result);
    }
    Ok(())
}

pub async fn script(session: &mut dyn DbSession, input_path: &str) -> Result<()> {
    let text = read_script(input_path)?;
    let total = split_statements(&text).len();
    println!("Executing {} statements from {}...", total, input_path);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} statements {msg}")?
            .progress_chars("#>-"),
    );

    let outcome = run_script_with_progress(session, &text, |done, _| pb.set_position(done as u64))
        .await
        .context("Failed to start script transaction")?;

    if outcome.committed {
        pb.finish_with_message("committed");
    } else {
        pb.abandon();
    }
    report(outcome)
}

fn report(outcome: ScriptOutcome) -> Result<()> {
    println!(
        "Executed {} of {} statements, {} failed, {}",
        outcome.statements_executed,
        outcome.statements_total,
        outcome.statements_failed,
        if outcome.committed {
            "committed"
        } else {
            "rolled back"
        }
    );
    outcome
        .into_result()
        .map(|_| ())
        .context("Script was rolled back")
}
