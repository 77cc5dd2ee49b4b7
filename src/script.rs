//! Script executor.
//!
//! A script is plain text with statements separated by `;`. Splitting is
//! naive: a `;` inside a string literal or a stored-procedure body splits the
//! statement too. The whole script runs inside one transaction and is
//! committed only when every statement succeeded. Scripts that manage
//! transactions themselves are refused before anything runs. Servers that
//! commit implicitly on DDL or `LOCK TABLES` (MySQL) still cannot roll those
//! statements back.

use tracing::{info, warn};

use crate::engine::DbSession;
use crate::error::{Error, Result};

/// What happened to a script.
#[derive(Debug)]
pub struct ScriptOutcome {
    /// Non-empty statements found in the script.
    pub statements_total: usize,
    /// Statements that ran successfully.
    pub statements_executed: usize,
    /// 0 or 1: execution stops at the first failure.
    pub statements_failed: usize,
    /// [`Error::Script`] for a failing or refused statement,
    /// [`Error::Transaction`] for a failed commit.
    pub first_error: Option<Error>,
    pub committed: bool,
}

impl ScriptOutcome {
    fn empty() -> Self {
        ScriptOutcome {
            statements_total: 0,
            statements_executed: 0,
            statements_failed: 0,
            first_error: None,
            committed: true,
        }
    }

    pub fn is_success(&self) -> bool {
        self.first_error.is_none() && self.committed
    }

    /// Turn a failed outcome into its error.
    pub fn into_result(mut self) -> Result<Self> {
        match self.first_error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Split on every `;`, dropping fragments that hold nothing but comments.
///
/// Whole-line `--` and `#` comments are removed. A fragment left with only
/// `/* ... */` comments is dropped; `/*! ... */` is executable on MySQL and
/// counts as a statement.
pub fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(|fragment| {
            fragment
                .lines()
                .filter(|line| {
                    let line = line.trim_start();
                    !(line.starts_with("--") || line.starts_with('#'))
                })
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|statement| !strip_leading_comments(statement).is_empty())
        .collect()
}

/// Skip leading `/* ... */` comments. An unterminated comment swallows the rest.
fn strip_leading_comments(statement: &str) -> &str {
    let mut rest = statement.trim_start();
    while rest.starts_with("/*") && !rest.starts_with("/*!") {
        rest = match rest[2..].find("*/") {
            Some(end) => rest[end + 4..].trim_start(),
            None => "",
        };
    }
    rest
}

/// Statements that open, end or change the scope of a transaction.
fn is_transaction_control(statement: &str) -> bool {
    let mut words = strip_leading_comments(statement)
        .split(|c: char| c.is_whitespace() || c == '=')
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_uppercase);
    match words.next().as_deref() {
        Some("BEGIN" | "START" | "COMMIT" | "ROLLBACK" | "SAVEPOINT" | "RELEASE" | "END" | "XA") => {
            true
        }
        Some("SET") => words.any(|word| word.trim_start_matches('@').ends_with("AUTOCOMMIT")),
        _ => false,
    }
}

/// Run every statement of `script` in order, fail-fast, all-or-nothing.
///
/// An empty script runs nothing, opens no transaction and reports
/// `committed == true`. A script containing `BEGIN`, `COMMIT`, `ROLLBACK`,
/// savepoints or `SET autocommit` runs nothing and reports the first such
/// statement. `Err` is returned only when the transaction cannot be opened;
/// statement failures are reported in the outcome.
pub async fn run_script(session: &mut dyn DbSession, script: &str) -> Result<ScriptOutcome> {
    run_script_with_progress(session, script, |_, _| {}).await
}

/// [`run_script`] calling `progress(done, total)` after each statement.
pub async fn run_script_with_progress<F>(
    session: &mut dyn DbSession,
    script: &str,
    mut progress: F,
) -> Result<ScriptOutcome>
where
    F: FnMut(usize, usize) + Send,
{
    let statements = split_statements(script);
    let total = statements.len();
    if total == 0 {
        info!("Script contains no statements");
        return Ok(ScriptOutcome::empty());
    }

    if let Some(index) = statements.iter().position(|sql| is_transaction_control(sql)) {
        warn!(
            position = index + 1,
            total, "Script manages its own transaction, nothing was run"
        );
        return Ok(ScriptOutcome {
            statements_total: total,
            statements_executed: 0,
            statements_failed: 1,
            first_error: Some(Error::Script {
                position: index + 1,
                total,
                executed: 0,
                source: Box::new(Error::Unsupported {
                    operation: "transaction control inside a script",
                    dialect: session.dialect().name(),
                }),
            }),
            committed: false,
        });
    }

    session.begin().await.map_err(Error::transaction)?;

    for (index, sql) in statements.iter().enumerate() {
        if let Err(err) = session.execute(sql, &[]).await {
            warn!(
                position = index + 1,
                total,
                error = %err,
                "Script statement failed, rolling back"
            );
            if let Err(rollback_err) = session.rollback().await {
                warn!(error = %rollback_err, "Rollback of failed script also failed");
            }
            return Ok(ScriptOutcome {
                statements_total: total,
                statements_executed: index,
                statements_failed: 1,
                first_error: Some(Error::Script {
                    position: index + 1,
                    total,
                    executed: index,
                    source: Box::new(Error::query(err)),
                }),
                committed: false,
            });
        }
        progress(index + 1, total);
    }

    if let Err(err) = session.commit().await {
        warn!(error = %err, "Commit of script failed");
        if let Err(rollback_err) = session.rollback().await {
            warn!(error = %rollback_err, "Rollback of failed script also failed");
        }
        return Ok(ScriptOutcome {
            statements_total: total,
            statements_executed: total,
            statements_failed: 0,
            first_error: Some(Error::transaction(err)),
            committed: false,
        });
    }

    info!(statements = total, "Script committed");
    Ok(ScriptOutcome {
        statements_total: total,
        statements_executed: total,
        statements_failed: 0,
        first_error: None,
        committed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sqlite::memory_session;
    use crate::engine::value::SqlValue;
    use crate::query::run_query;

    async fn count(session: &mut dyn DbSession, table: &str) -> i64 {
        let result = run_query(session, &format!("SELECT COUNT(*) FROM {}", table), &[])
            .await
            .unwrap();
        match &result.rows[0][0] {
            SqlValue::Int(n) => *n,
            other => panic!("unexpected count {other:?}"),
        }
    }

    #[test]
    fn splits_on_semicolons_and_drops_blank_fragments() {
        let statements = split_statements(
            "-- seed data\nINSERT INTO t VALUES (1);\n\n ; INSERT INTO t VALUES (2);\n-- trailing\n",
        );
        assert_eq!(
            statements,
            vec!["INSERT INTO t VALUES (1)", "INSERT INTO t VALUES (2)"]
        );
        assert!(split_statements("  \n\t ;; ").is_empty());
    }

    #[test]
    fn naive_split_cuts_inside_literals() {
        // Documented limitation: no tokenizer.
        let statements = split_statements("INSERT INTO t VALUES ('a;b')");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn comment_only_fragments_are_dropped() {
        let statements = split_statements(
            "# dumped by hand\n/* header */;\nINSERT INTO t VALUES (1);\n/* a */ /* b */;\n\
             /*!40101 SET NAMES utf8 */;",
        );
        assert_eq!(
            statements,
            vec!["INSERT INTO t VALUES (1)", "/*!40101 SET NAMES utf8 */"]
        );
    }

    #[test]
    fn recognizes_transaction_control() {
        for sql in [
            "BEGIN",
            "begin transaction",
            "START TRANSACTION",
            "COMMIT",
            "rollback to savepoint s1",
            "SAVEPOINT s1",
            "RELEASE SAVEPOINT s1",
            "END",
            "/* note */ COMMIT",
            "SET autocommit=0",
            "SET @@session.autocommit = 1",
        ] {
            assert!(is_transaction_control(sql), "{sql}");
        }
        for sql in [
            "INSERT INTO t VALUES (1)",
            "SET NAMES utf8",
            "UPDATE t SET x = 1",
            "/*!40101 SET NAMES utf8 */",
        ] {
            assert!(!is_transaction_control(sql), "{sql}");
        }
    }

    #[tokio::test]
    async fn script_with_its_own_commit_runs_nothing() {
        let mut session = memory_session().await;
        session
            .execute("CREATE TABLE t (x INTEGER)", &[])
            .await
            .unwrap();

        let outcome = run_script(
            session.as_mut(),
            "INSERT INTO t VALUES (1);COMMIT;INSERT INTO t VALUES (2);INSERT INTO bad_table VALUES (1)",
        )
        .await
        .unwrap();

        assert!(!outcome.committed);
        assert_eq!(outcome.statements_total, 4);
        assert_eq!(outcome.statements_executed, 0);
        match &outcome.first_error {
            Some(Error::Script {
                position, source, ..
            }) => {
                assert_eq!(*position, 2);
                assert!(matches!(**source, Error::Unsupported { .. }));
            }
            other => panic!("expected script error, got {other:?}"),
        }

        // What the outcome reports matches what the database holds.
        assert!(!session.in_transaction());
        assert_eq!(count(session.as_mut(), "t").await, 0);
    }

    #[tokio::test]
    async fn autocommit_switch_is_refused() {
        let mut session = memory_session().await;
        session
            .execute("CREATE TABLE t (x INTEGER)", &[])
            .await
            .unwrap();

        let outcome = run_script(
            session.as_mut(),
            "INSERT INTO t VALUES (1);\nSET autocommit = 1;\nINSERT INTO t VALUES (2)",
        )
        .await
        .unwrap();
        assert!(!outcome.is_success());
        assert_eq!(count(session.as_mut(), "t").await, 0);
    }

    #[tokio::test]
    async fn stops_at_first_failure_and_commits_nothing() {
        let mut session = memory_session().await;
        session
            .execute("CREATE TABLE t (x INTEGER)", &[])
            .await
            .unwrap();

        let outcome = run_script(
            session.as_mut(),
            "INSERT INTO t VALUES (1);INSERT INTO bad_table VALUES (1);INSERT INTO t VALUES (2)",
        )
        .await
        .unwrap();

        assert_eq!(outcome.statements_total, 3);
        assert_eq!(outcome.statements_executed, 1);
        assert_eq!(outcome.statements_failed, 1);
        assert!(!outcome.committed);
        match &outcome.first_error {
            Some(Error::Script {
                position,
                executed,
                source,
                ..
            }) => {
                assert_eq!(*position, 2);
                assert_eq!(*executed, 1);
                assert!(matches!(**source, Error::Query { .. }));
            }
            other => panic!("expected script error, got {other:?}"),
        }

        assert!(!session.in_transaction());
        assert_eq!(count(session.as_mut(), "t").await, 0);
    }

    #[tokio::test]
    async fn empty_script_is_a_trivial_success() {
        let mut session = memory_session().await;
        for script in ["", "   \n\t", ";;", "-- nothing here\n"] {
            let outcome = run_script(session.as_mut(), script).await.unwrap();
            assert_eq!(outcome.statements_executed, 0);
            assert_eq!(outcome.statements_total, 0);
            assert!(outcome.committed);
            assert!(outcome.is_success());
        }
        assert!(!session.in_transaction());
    }

    #[tokio::test]
    async fn successful_script_commits_everything() {
        let mut session = memory_session().await;
        let mut seen = Vec::new();
        let outcome = run_script_with_progress(
            session.as_mut(),
            "CREATE TABLE t (x INTEGER);\nINSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2);\n",
            |done, total| seen.push((done, total)),
        )
        .await
        .unwrap();

        assert!(outcome.committed);
        assert_eq!(outcome.statements_executed, 3);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(count(session.as_mut(), "t").await, 2);
        assert!(outcome.into_result().is_ok());
    }

    #[tokio::test]
    async fn failed_outcome_converts_into_its_error() {
        let mut session = memory_session().await;
        let outcome = run_script(session.as_mut(), "SELECT * FROM nowhere")
            .await
            .unwrap();
        assert!(!outcome.is_success());
        assert!(matches!(
            outcome.into_result(),
            Err(Error::Script { position: 1, .. })
        ));
    }
}
