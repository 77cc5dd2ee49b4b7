/// A bind parameter value: text or SQL NULL.
pub type Param = Option<String>;

/// Column name to value mapping, kept in the order columns were set.
///
/// Used as the payload for inserts and updates, as key addressing, and as
/// the shape of rows read back through [`crate::TabularResult::records`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    entries: Vec<(String, Param)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`, replacing an earlier value for the same column.
    pub fn set(&mut self, column: impl Into<String>, value: Param) -> &mut Self {
        let column = column.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    /// Builder-style [`RowRecord::set`].
    pub fn with(mut self, column: impl Into<String>, value: Param) -> Self {
        self.set(column, value);
        self
    }

    /// Value for `column`. `None` when the column is absent, `Some(None)` for NULL.
    pub fn get(&self, column: &str) -> Option<&Param> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Param)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (K, Param)>>(iter: I) -> Self {
        let mut record = RowRecord::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}

/// True when a value carries nothing to write: NULL or only whitespace.
pub(crate) fn is_blank(value: &Param) -> bool {
    value.as_deref().map_or(true, |text| text.trim().is_empty())
}
