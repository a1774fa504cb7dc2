use serde::Serialize;

use super::model::{Dataset, Value};

/// Rows examined per column.
pub const SAMPLE_ROWS: usize = 200;

/// Share of numeric-compatible cells a column needs (strictly more than).
pub const NUMERIC_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub name: String,
    pub kind: ColumnKind,
}

/// Column classification for one loaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetMeta {
    pub columns: Vec<ColumnMeta>,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl DatasetMeta {
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == column).map(|c| c.kind)
    }
}

/// Classify every header as numeric or categorical from the first
/// [`SAMPLE_ROWS`] rows.
///
/// Blank cells (missing, null, empty string) count toward the total but never
/// as numeric; a column with nothing to look at is categorical.
pub fn infer_columns(dataset: &Dataset) -> DatasetMeta {
    let sample = &dataset.rows[..dataset.rows.len().min(SAMPLE_ROWS)];
    let mut meta = DatasetMeta::default();

    for header in &dataset.headers {
        let mut numeric = 0usize;
        let mut total = 0usize;
        for row in sample {
            total += 1;
            if row.get(header).and_then(Value::as_finite_f64).is_some() {
                numeric += 1;
            }
        }

        let kind = if total > 0 && numeric as f64 / total as f64 > NUMERIC_THRESHOLD {
            meta.numeric.push(header.clone());
            ColumnKind::Numeric
        } else {
            meta.categorical.push(header.clone());
            ColumnKind::Categorical
        };
        meta.columns.push(ColumnMeta {
            name: header.clone(),
            kind,
        });
    }

    meta
}
