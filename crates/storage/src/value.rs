//! Parameter and column values exchanged with the row store
//!
//! The store speaks a deliberately small type system: exactly the column
//! types the change feed tables use.

use chrono::{DateTime, FixedOffset};
use dicomfeed_core::{FeedError, FeedResult};
use std::fmt;

/// A single parameter or column value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// SQL NULL
    Null,
    /// 32-bit integer (INT)
    Int(i32),
    /// 64-bit integer (BIGINT)
    BigInt(i64),
    /// Unicode text (NVARCHAR / VARCHAR)
    Text(String),
    /// Timestamp with offset (DATETIMEOFFSET)
    DateTimeOffset(DateTime<FixedOffset>),
}

impl Value {
    /// Check if the value is NULL
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// SQL type name, used in decoding errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Int(_) => "INT",
            Value::BigInt(_) => "BIGINT",
            Value::Text(_) => "NVARCHAR",
            Value::DateTimeOffset(_) => "DATETIMEOFFSET",
        }
    }

    /// Integer value, widening INT to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// INT value
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Timestamp value
    pub fn as_datetime(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Value::DateTimeOffset(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::DateTimeOffset(dt) => write!(f, "'{}'", dt.to_rfc3339()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTimeOffset(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A result row: column names with their values, in select order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row
    pub fn new(columns: Vec<&'static str>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column count
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in select order
    #[inline]
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Whether the row carries `name`
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Get value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================
    //
    // A missing column or an unexpected type means the stored shape does not
    // match the reader's expectations: reported as corruption.

    fn require(&self, name: &str) -> FeedResult<&Value> {
        self.get_by_name(name)
            .ok_or_else(|| FeedError::corruption(format!("column '{name}' missing from row")))
    }

    fn mistyped(name: &str, expected: &str, found: &Value) -> FeedError {
        FeedError::corruption(format!(
            "column '{name}' expected {expected}, found {}",
            found.type_name()
        ))
    }

    /// Non-null integer column
    pub fn get_i64(&self, name: &str) -> FeedResult<i64> {
        let value = self.require(name)?;
        value
            .as_i64()
            .ok_or_else(|| Self::mistyped(name, "BIGINT", value))
    }

    /// Nullable integer column
    pub fn get_opt_i64(&self, name: &str) -> FeedResult<Option<i64>> {
        match self.require(name)? {
            Value::Null => Ok(None),
            value => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| Self::mistyped(name, "BIGINT", value)),
        }
    }

    /// Non-null INT column
    pub fn get_i32(&self, name: &str) -> FeedResult<i32> {
        let value = self.require(name)?;
        value
            .as_i32()
            .ok_or_else(|| Self::mistyped(name, "INT", value))
    }

    /// Non-null text column
    pub fn get_str(&self, name: &str) -> FeedResult<&str> {
        let value = self.require(name)?;
        value
            .as_str()
            .ok_or_else(|| Self::mistyped(name, "NVARCHAR", value))
    }

    /// Non-null timestamp column
    pub fn get_datetime(&self, name: &str) -> FeedResult<DateTime<FixedOffset>> {
        let value = self.require(name)?;
        value
            .as_datetime()
            .ok_or_else(|| Self::mistyped(name, "DATETIMEOFFSET", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new(
            vec!["Sequence", "Action", "PartitionName", "CurrentWatermark"],
            vec![
                Value::BigInt(5),
                Value::Int(2),
                Value::Text("Microsoft.Default".into()),
                Value::Null,
            ],
        )
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let row = sample_row();
        assert_eq!(row.get_by_name("sequence"), Some(&Value::BigInt(5)));
        assert!(row.has_column("PARTITIONNAME"));
        assert!(!row.has_column("Timestamp"));
    }

    #[test]
    fn test_typed_accessors() {
        let row = sample_row();
        assert_eq!(row.get_i64("Sequence").unwrap(), 5);
        assert_eq!(row.get_i32("Action").unwrap(), 2);
        assert_eq!(row.get_str("PartitionName").unwrap(), "Microsoft.Default");
        assert_eq!(row.get_opt_i64("CurrentWatermark").unwrap(), None);
    }

    #[test]
    fn test_int_widens_to_i64() {
        let row = sample_row();
        assert_eq!(row.get_i64("Action").unwrap(), 2);
    }

    #[test]
    fn test_missing_column_is_corruption() {
        let err = sample_row().get_i64("OriginalWatermark").unwrap_err();
        assert!(matches!(err, FeedError::Corruption(_)));
        assert!(err.to_string().contains("OriginalWatermark"));
    }

    #[test]
    fn test_wrong_type_is_corruption() {
        let err = sample_row().get_str("Sequence").unwrap_err();
        assert!(matches!(err, FeedError::Corruption(_)));
        assert!(err.to_string().contains("BIGINT"));
    }

    #[test]
    fn test_null_in_non_null_column_is_corruption() {
        let err = sample_row().get_i64("CurrentWatermark").unwrap_err();
        assert!(matches!(err, FeedError::Corruption(_)));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::BigInt(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Text("x".into()).to_string(), "'x'");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
