use serde::Serialize;

use super::filter::{View, normalize_query, row_matches};
use super::model::{Dataset, cell_text};

/// One page of the data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePage {
    pub headers: Vec<String>,
    /// Stringified cells in header order.
    pub rows: Vec<Vec<String>>,
    /// Rows matching the table query before paging.
    pub matching: usize,
}

impl TablePage {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// List the first `rows_per_page` view rows that match the table's own search
/// box (same matching rules as the global query).
pub fn table_page(dataset: &Dataset, view: &View, query: &str, rows_per_page: usize) -> TablePage {
    let needle = normalize_query(query);
    let matching: Vec<_> = view
        .rows(dataset)
        .filter(|r| needle.as_deref().map_or(true, |q| row_matches(r, q)))
        .collect();

    TablePage {
        headers: dataset.headers.clone(),
        rows: matching
            .iter()
            .take(rows_per_page)
            .map(|r| dataset.headers.iter().map(|h| cell_text(r, h)).collect())
            .collect(),
        matching: matching.len(),
    }
}
