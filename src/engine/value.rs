use std::fmt;

use crate::record::{Param, RowRecord};

/// Untyped cell value read back from a result set.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Textual form used for records and catalog reads. Binary data that is
    /// valid UTF-8 is read as text; other binary data is hex encoded.
    pub fn to_param(&self) -> Param {
        match self {
            SqlValue::Null => None,
            SqlValue::Bytes(bytes) => Some(match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => format!("0x{}", hex::encode(bytes)),
            }),
            other => Some(other.to_string()),
        }
    }

    /// Integer view, accepting numeric text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::UInt(v) => i64::try_from(*v).ok(),
            SqlValue::Text(s) | SqlValue::Decimal(s) => s.trim().parse().ok(),
            SqlValue::Bytes(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::UInt(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) | SqlValue::Text(v) => f.write_str(v),
            SqlValue::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
        }
    }
}

/// Column names plus all fetched rows of one statement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl TabularResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Rows reshaped as records keyed by column name.
    pub fn records(&self) -> Vec<RowRecord> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.as_str(), value.to_param()))
                    .collect()
            })
            .collect()
    }
}
