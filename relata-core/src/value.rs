use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// A single SQL-compatible value.
///
/// `Array` carries scalar-collection columns (an ordered or unordered
/// collection of simple values stored in one array-typed column). Array
/// elements are always plain scalars; the mapping layer never produces
/// nested arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<SqlValue>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Bool(_) => "BOOL",
            SqlValue::Int(_) => "INT",
            SqlValue::Real(_) => "REAL",
            SqlValue::Text(_) => "TEXT",
            SqlValue::Bytes(_) => "BYTES",
            SqlValue::Array(_) => "ARRAY",
        }
    }

    pub fn into_int(self) -> Result<i64, ConvertError> {
        match self {
            SqlValue::Int(v) => Ok(v),
            other => Err(ConvertError::value_mismatch("INT", &other)),
        }
    }

    pub fn into_opt_int(self) -> Result<Option<i64>, ConvertError> {
        match self {
            SqlValue::Null => Ok(None),
            other => other.into_int().map(Some),
        }
    }

    pub fn into_real(self) -> Result<f64, ConvertError> {
        match self {
            SqlValue::Real(v) => Ok(v),
            SqlValue::Int(v) => Ok(v as f64),
            other => Err(ConvertError::value_mismatch("REAL", &other)),
        }
    }

    pub fn into_bool(self) -> Result<bool, ConvertError> {
        match self {
            SqlValue::Bool(v) => Ok(v),
            SqlValue::Int(v) => Ok(v != 0),
            other => Err(ConvertError::value_mismatch("BOOL", &other)),
        }
    }

    pub fn into_text(self) -> Result<String, ConvertError> {
        match self {
            SqlValue::Text(v) => Ok(v),
            other => Err(ConvertError::value_mismatch("TEXT", &other)),
        }
    }

    pub fn into_opt_text(self) -> Result<Option<String>, ConvertError> {
        match self {
            SqlValue::Null => Ok(None),
            other => other.into_text().map(Some),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, ConvertError> {
        match self {
            SqlValue::Bytes(v) => Ok(v),
            other => Err(ConvertError::value_mismatch("BYTES", &other)),
        }
    }

    pub fn into_array(self) -> Result<Vec<SqlValue>, ConvertError> {
        match self {
            SqlValue::Array(v) => Ok(v),
            SqlValue::Null => Ok(Vec::new()),
            other => Err(ConvertError::value_mismatch("ARRAY", &other)),
        }
    }

    pub fn into_text_array(self) -> Result<Vec<String>, ConvertError> {
        self.into_array()?
            .into_iter()
            .map(SqlValue::into_text)
            .collect()
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// One table row: an ordered mapping of column name to value.
///
/// Insertion order is preserved so that generated statements bind values in
/// a deterministic column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlRow {
    columns: Vec<(String, SqlValue)>,
}

impl SqlRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Replaces the value if the column is already present.
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        if let Some(slot) = self.columns.iter_mut().find(|(c, _)| *c == column) {
            slot.1 = value;
        } else {
            self.columns.push((column, value));
        }
    }

    /// Builder-style [`SqlRow::put`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.put(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Remove a column, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<SqlValue> {
        let idx = self.columns.iter().position(|(c, _)| c == column)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|(c, _)| c == column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn into_iter(self) -> impl Iterator<Item = (String, SqlValue)> {
        self.columns.into_iter()
    }
}

impl FromIterator<(String, SqlValue)> for SqlRow {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
