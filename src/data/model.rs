use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, as produced by the CSV / JSON / Parquet
/// decoders.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => Ok(()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_none(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null or the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// A finite number, or text that parses as one.
    pub fn as_finite_f64(&self) -> Option<f64> {
        let v = match self {
            Value::Integer(i) => *i as f64,
            Value::Float(v) => *v,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Bool(_) | Value::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Numeric coercion used for summing: booleans count as 0/1, blanks and
    /// anything unparseable count as zero.
    pub fn to_number_or_zero(&self) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(*b)),
            other => other.as_finite_f64().unwrap_or(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Row / Dataset
// ---------------------------------------------------------------------------

/// One record: column name → value, in source order.
pub type Row = IndexMap<String, Value>;

/// Stringify a row's value for a column. Missing and null cells become `""`.
pub fn cell_text(row: &Row, column: &str) -> String {
    row.get(column).map(Value::to_string).unwrap_or_default()
}

/// The full decoded dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Distinct column names in first-seen order.
    pub headers: Vec<String>,
    /// All rows.
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset, collecting headers in the order they are first seen
    /// across all rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::with_headers(Vec::new(), rows)
    }

    /// Build a dataset from a declared header list (e.g. a CSV header row or
    /// a Parquet schema). Duplicate names collapse to their first occurrence
    /// and row keys missing from the declaration are appended.
    pub fn with_headers(declared: Vec<String>, rows: Vec<Row>) -> Self {
        let mut headers: IndexSet<String> = declared.into_iter().collect();
        for row in &rows {
            for key in row.keys() {
                if !headers.contains(key) {
                    headers.insert(key.clone());
                }
            }
        }
        Dataset {
            headers: headers.into_iter().collect(),
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Build a [`Row`] from `(column, value)` pairs.
pub fn row<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
