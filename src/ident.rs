//! Identifier validation.
//!
//! Database, table and column names cannot travel as bind parameters, so they
//! are spliced into SQL text. Every such name must pass through
//! [`validate_identifier`] first: ASCII letters, digits and underscores only,
//! at most [`MAX_IDENTIFIER_LEN`] characters, not purely numeric and not a
//! bare SQL keyword. Values never go through here; they are always bound.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// MySQL caps schema, table and column names at 64 characters.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Keywords that would change the meaning of a statement if spliced unquoted.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHANGE", "CHECK",
    "COLUMN", "CONSTRAINT", "CREATE", "CROSS", "DATABASE", "DATABASES", "DEFAULT", "DELETE",
    "DESC", "DESCRIBE", "DISTINCT", "DROP", "ELSE", "EXISTS", "FALSE", "FOREIGN", "FROM",
    "GRANT", "GROUP", "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTO", "IS", "JOIN", "KEY",
    "LEFT", "LIKE", "LIMIT", "MODIFY", "NOT", "NULL", "ON", "OR", "ORDER", "PRIMARY",
    "REFERENCES", "RENAME", "REPLACE", "RIGHT", "SCHEMA", "SELECT", "SET", "SHOW", "TABLE",
    "THEN", "TO", "TRUE", "TRUNCATE", "UNION", "UNIQUE", "UPDATE", "USE", "USING", "VALUES",
    "WHEN", "WHERE", "WITH",
];

/// Reason an identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierProblem {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier is longer than 64 characters")]
    TooLong,
    #[error("character {0:?} is not allowed")]
    IllegalCharacter(char),
    #[error("identifier is purely numeric")]
    Numeric,
    #[error("'{0}' is a reserved word")]
    ReservedWord(String),
}

/// A name that is safe to splice into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        validate_identifier(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate `raw` against the identifier grammar. On success the text is
/// returned unchanged.
pub fn validate_identifier(raw: &str) -> Result<Identifier> {
    check(raw)
        .map(|()| Identifier(raw.to_string()))
        .map_err(|problem| Error::InvalidIdentifier {
            raw: raw.to_string(),
            problem,
        })
}

fn check(raw: &str) -> std::result::Result<(), IdentifierProblem> {
    if raw.is_empty() {
        return Err(IdentifierProblem::Empty);
    }
    if raw.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(IdentifierProblem::TooLong);
    }
    if let Some(bad) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(IdentifierProblem::IllegalCharacter(bad));
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(IdentifierProblem::Numeric);
    }
    if RESERVED_WORDS
        .iter()
        .any(|word| word.eq_ignore_ascii_case(raw))
    {
        return Err(IdentifierProblem::ReservedWord(raw.to_string()));
    }
    Ok(())
}

/// A validated database (schema) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaRef(Identifier);

impl SchemaRef {
    pub fn new(raw: &str) -> Result<Self> {
        validate_identifier(raw).map(SchemaRef)
    }

    pub fn ident(&self) -> &Identifier {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Identifier> for SchemaRef {
    fn from(ident: Identifier) -> Self {
        SchemaRef(ident)
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated table name, optionally qualified by its schema.
///
/// Unqualified references resolve against the session's current database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    schema: Option<SchemaRef>,
    name: Identifier,
}

impl TableRef {
    /// Table `name` inside `schema`.
    pub fn new(schema: &SchemaRef, name: &str) -> Result<Self> {
        Ok(TableRef {
            schema: Some(schema.clone()),
            name: validate_identifier(name)?,
        })
    }

    /// Table `name` in the session's current database.
    pub fn bare(name: &str) -> Result<Self> {
        Ok(TableRef {
            schema: None,
            name: validate_identifier(name)?,
        })
    }

    /// Build from optional raw schema and table names.
    pub fn parse(schema: Option<&str>, name: &str) -> Result<Self> {
        match schema {
            Some(schema) => TableRef::new(&SchemaRef::new(schema)?, name),
            None => TableRef::bare(name),
        }
    }

    pub fn schema(&self) -> Option<&SchemaRef> {
        self.schema.as_ref()
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// Same schema, different table name.
    pub fn renamed(&self, name: Identifier) -> Self {
        TableRef {
            schema: self.schema.clone(),
            name,
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Free-form column type text such as `VARCHAR(255) NOT NULL`.
///
/// SQL type grammar has no parameterized form, so this text is spliced
/// verbatim. The only restriction is that it cannot end the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeClause(String);

impl TypeClause {
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains(';') {
            return Err(Error::InvalidTypeClause(raw.to_string()));
        }
        Ok(TypeClause(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(raw: &str) -> IdentifierProblem {
        match validate_identifier(raw) {
            Err(Error::InvalidIdentifier { problem, .. }) => problem,
            other => panic!("expected InvalidIdentifier for {raw:?}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_plain_names_unchanged() {
        for raw in ["orders_2024", "id", "Customer", "_tmp", "t"] {
            assert_eq!(validate_identifier(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn rejects_quotes_backticks_and_semicolons() {
        for raw in ["o'reilly", "a\"b", "my`table", "t;DROP", ";", "x'"] {
            assert!(matches!(
                problem(raw),
                IdentifierProblem::IllegalCharacter(_)
            ));
        }
    }

    #[test]
    fn rejects_whitespace_and_punctuation() {
        assert_eq!(problem("two words"), IdentifierProblem::IllegalCharacter(' '));
        assert_eq!(problem("tab\there"), IdentifierProblem::IllegalCharacter('\t'));
        assert_eq!(problem("a-b"), IdentifierProblem::IllegalCharacter('-'));
        assert_eq!(problem("db.t"), IdentifierProblem::IllegalCharacter('.'));
    }

    #[test]
    fn rejects_empty_numeric_and_long() {
        assert_eq!(problem(""), IdentifierProblem::Empty);
        assert_eq!(problem("2024"), IdentifierProblem::Numeric);
        assert_eq!(problem(&"a".repeat(65)), IdentifierProblem::TooLong);
        assert!(validate_identifier(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn rejects_reserved_words_case_insensitively() {
        assert!(matches!(problem("select"), IdentifierProblem::ReservedWord(_)));
        assert!(matches!(problem("Drop"), IdentifierProblem::ReservedWord(_)));
        assert!(validate_identifier("selection").is_ok());
    }

    #[test]
    fn table_ref_display_is_qualified() {
        let schema = SchemaRef::new("shop").unwrap();
        let table = TableRef::new(&schema, "orders").unwrap();
        assert_eq!(table.to_string(), "shop.orders");
        assert_eq!(TableRef::bare("orders").unwrap().to_string(), "orders");
        assert!(TableRef::parse(Some("sh op"), "orders").is_err());
    }

    #[test]
    fn type_clause_refuses_statement_terminator() {
        assert_eq!(
            TypeClause::new("  VARCHAR(255) NOT NULL ").unwrap().as_str(),
            "VARCHAR(255) NOT NULL"
        );
        assert!(TypeClause::new("INT; DROP TABLE t").is_err());
        assert!(TypeClause::new("   ").is_err());
    }
}
