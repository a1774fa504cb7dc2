use std::collections::{BTreeMap, BTreeSet};

use super::inference::DatasetMeta;
use super::model::{Dataset, Row, Value, cell_text};

/// At most this many categorical columns become filter groups.
pub const MAX_CATEGORICAL_GROUPS: usize = 5;
/// Fallback group count when no column is categorical.
pub const MAX_FALLBACK_GROUPS: usize = 3;

// ---------------------------------------------------------------------------
// Filter groups: which columns get a checkbox list, and its values
// ---------------------------------------------------------------------------

/// One filterable column and its distinct, non-empty, sorted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGroup {
    pub column: String,
    pub values: Vec<String>,
}

/// Choose the filter groups for a freshly loaded dataset: the first five
/// categorical columns, or the first three headers if none is categorical.
pub fn build_filter_groups(dataset: &Dataset, meta: &DatasetMeta) -> Vec<FilterGroup> {
    let columns: Vec<&String> = if meta.categorical.is_empty() {
        dataset.headers.iter().take(MAX_FALLBACK_GROUPS).collect()
    } else {
        meta.categorical.iter().take(MAX_CATEGORICAL_GROUPS).collect()
    };

    columns
        .into_iter()
        .map(|column| {
            let values: BTreeSet<String> = dataset
                .rows
                .iter()
                .map(|r| cell_text(r, column))
                .filter(|v| !v.is_empty())
                .collect();
            FilterGroup {
                column: column.clone(),
                values: values.into_iter().collect(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Filter state: checked values per column plus the free-text query
// ---------------------------------------------------------------------------

/// Per-column selection state (column → checked values) and the free-text
/// query applied across all columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub selected: BTreeMap<String, BTreeSet<String>>,
    pub query: String,
}

impl FilterState {
    /// Every value checked, empty query.
    pub fn all_selected(groups: &[FilterGroup]) -> Self {
        FilterState {
            selected: groups
                .iter()
                .map(|g| (g.column.clone(), g.values.iter().cloned().collect()))
                .collect(),
            query: String::new(),
        }
    }

    /// Toggle a single value in a column's checkbox list.
    pub fn toggle_value(&mut self, column: &str, value: &str) {
        let selected = self.selected.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    /// Flip a column between "all checked" and "none checked", based on
    /// whether it is currently fully checked.
    pub fn toggle_select_all(&mut self, group: &FilterGroup) {
        let selected = self.selected.entry(group.column.clone()).or_default();
        if is_fully_selected(group, selected) {
            selected.clear();
        } else {
            *selected = group.values.iter().cloned().collect();
        }
    }

    pub fn is_fully_selected(&self, group: &FilterGroup) -> bool {
        self.selected
            .get(&group.column)
            .is_some_and(|s| is_fully_selected(group, s))
    }
}

fn is_fully_selected(group: &FilterGroup, selected: &BTreeSet<String>) -> bool {
    group.values.iter().all(|v| selected.contains(v))
}

// ---------------------------------------------------------------------------
// View: the rows passing every filter
// ---------------------------------------------------------------------------

/// Indices into [`Dataset::rows`] of the rows passing the current filters,
/// in dataset order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub indices: Vec<usize>,
}

impl View {
    /// A view containing every row.
    pub fn all(dataset: &Dataset) -> Self {
        View {
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The view's rows, in order.
    pub fn rows<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Row> + 'a {
        self.indices.iter().filter_map(move |&i| dataset.rows.get(i))
    }
}

/// Normalise a free-text query: trimmed and lower-cased. `None` when there is
/// nothing left to match.
pub fn normalize_query(query: &str) -> Option<String> {
    let q = query.trim().to_lowercase();
    (!q.is_empty()).then_some(q)
}

/// Whether any non-null value of the row contains `needle` (already
/// lower-cased).
pub fn row_matches(row: &Row, needle: &str) -> bool {
    row.values()
        .filter(|v| !v.is_null())
        .any(|v| v.to_string().to_lowercase().contains(needle))
}

/// Compute the view for the given filter state.
///
/// Per filter group:
/// * all of the column's distinct values checked → the column does not filter
///   (this includes a column with no distinct values at all)
/// * otherwise only rows whose stringified value is checked pass; with
///   nothing checked the column excludes every row
///
/// The free-text query is ANDed on top.
pub fn compute_view(dataset: &Dataset, groups: &[FilterGroup], state: &FilterState) -> View {
    let empty = BTreeSet::new();
    let active: Vec<(&str, &BTreeSet<String>)> = groups
        .iter()
        .filter_map(|g| {
            let selected = state.selected.get(&g.column).unwrap_or(&empty);
            if selected.len() == g.values.len() && is_fully_selected(g, selected) {
                None
            } else {
                Some((g.column.as_str(), selected))
            }
        })
        .collect();
    let needle = normalize_query(&state.query);

    let indices = dataset
        .rows
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            active
                .iter()
                .all(|(col, selected)| selected.contains(&cell_text(r, col)))
        })
        .filter(|(_, r)| needle.as_deref().map_or(true, |q| row_matches(r, q)))
        .map(|(i, _)| i)
        .collect();

    View { indices }
}

/// Stringified distinct values of a column across a set of rows, first-seen
/// order, blanks skipped.
pub fn distinct_non_empty<'a>(rows: impl Iterator<Item = &'a Row>, column: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    rows.filter_map(|r| r.get(column))
        .filter(|v| !v.is_blank())
        .map(Value::to_string)
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::inference::infer_columns;
    use crate::data::model::row;

    fn sample() -> Dataset {
        Dataset::from_rows(vec![
            row([("Category", Value::from("Retail")), ("City", Value::from("Mumbai")), ("Revenue", Value::from(10))]),
            row([("Category", Value::from("Wholesale")), ("City", Value::from("Surat")), ("Revenue", Value::from(20))]),
            row([("Category", Value::from("Retail")), ("City", Value::Null), ("Revenue", Value::from(30))]),
            row([("Category", Value::from("Services")), ("City", Value::from("Chennai")), ("Revenue", Value::from(40))]),
        ])
    }

    fn groups_for(ds: &Dataset) -> Vec<FilterGroup> {
        build_filter_groups(ds, &infer_columns(ds))
    }

    #[test]
    fn groups_list_sorted_non_empty_values() {
        let ds = sample();
        let groups = groups_for(&ds);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].values, vec!["Retail", "Services", "Wholesale"]);
        assert_eq!(groups[1].values, vec!["Chennai", "Mumbai", "Surat"]);
    }

    #[test]
    fn falls_back_to_first_three_headers() {
        let ds = Dataset::from_rows(vec![row([
            ("a", Value::from(1)),
            ("b", Value::from(2)),
            ("c", Value::from(3)),
            ("d", Value::from(4)),
        ])]);
        let cols: Vec<_> = groups_for(&ds).into_iter().map(|g| g.column).collect();
        assert_eq!(cols, vec!["a", "b", "c"]);
    }

    #[test]
    fn caps_categorical_groups_at_five() {
        let ds = Dataset::from_rows(vec![row(
            (0..7).map(|i| (format!("c{i}"), Value::from("x"))),
        )]);
        assert_eq!(groups_for(&ds).len(), MAX_CATEGORICAL_GROUPS);
    }

    #[test]
    fn all_selected_is_identity() {
        let ds = sample();
        let groups = groups_for(&ds);
        let view = compute_view(&ds, &groups, &FilterState::all_selected(&groups));
        assert_eq!(view, View::all(&ds));
    }

    #[test]
    fn full_selection_keeps_rows_with_blank_values() {
        // The null City row is not a filter value, but a fully selected
        // column must not drop it.
        let ds = sample();
        let groups = groups_for(&ds);
        let view = compute_view(&ds, &groups, &FilterState::all_selected(&groups));
        assert!(view.indices.contains(&2));
    }

    #[test]
    fn deselecting_a_value_drops_its_rows() {
        let ds = sample();
        let groups = groups_for(&ds);
        let mut state = FilterState::all_selected(&groups);
        state.toggle_value("Category", "Retail");
        let view = compute_view(&ds, &groups, &state);
        assert_eq!(view.indices, vec![1, 3]);
    }

    #[test]
    fn partial_selection_drops_blank_values() {
        let ds = sample();
        let groups = groups_for(&ds);
        let mut state = FilterState::all_selected(&groups);
        state.toggle_value("City", "Surat");
        assert_eq!(compute_view(&ds, &groups, &state).indices, vec![0, 3]);
    }

    #[test]
    fn nothing_checked_excludes_every_row() {
        let ds = sample();
        let groups = groups_for(&ds);
        let mut state = FilterState::all_selected(&groups);
        state.toggle_select_all(&groups[0]);
        assert!(state.selected["Category"].is_empty());
        assert!(compute_view(&ds, &groups, &state).is_empty());
    }

    #[test]
    fn column_without_values_never_filters() {
        let ds = Dataset::from_rows(vec![
            row([("Empty", Value::Null), ("Name", Value::from("a"))]),
            row([("Empty", Value::from("")), ("Name", Value::from("b"))]),
        ]);
        let groups = groups_for(&ds);
        assert!(groups[0].values.is_empty());
        let mut state = FilterState::all_selected(&groups);
        state.toggle_select_all(&groups[0]);
        assert_eq!(compute_view(&ds, &groups, &state).len(), 2);
    }

    #[test]
    fn select_all_flips_on_full_state() {
        let ds = sample();
        let groups = groups_for(&ds);
        let mut state = FilterState::all_selected(&groups);

        state.toggle_value("Category", "Retail");
        assert!(!state.is_fully_selected(&groups[0]));
        state.toggle_select_all(&groups[0]);
        assert!(state.is_fully_selected(&groups[0]));
        state.toggle_select_all(&groups[0]);
        assert!(state.selected["Category"].is_empty());
    }

    #[test]
    fn query_is_case_insensitive_and_anded() {
        let ds = sample();
        let groups = groups_for(&ds);
        let mut state = FilterState::all_selected(&groups);
        state.query = "  rEtAiL ".into();
        assert_eq!(compute_view(&ds, &groups, &state).indices, vec![0, 2]);

        state.toggle_value("City", "Mumbai");
        assert_eq!(compute_view(&ds, &groups, &state).indices, Vec::<usize>::new());
    }

    #[test]
    fn query_matches_numbers_as_text() {
        let ds = sample();
        let groups = groups_for(&ds);
        let mut state = FilterState::all_selected(&groups);
        state.query = "40".into();
        assert_eq!(compute_view(&ds, &groups, &state).indices, vec![3]);
    }

    #[test]
    fn computing_a_view_leaves_the_dataset_alone() {
        let ds = sample();
        let before = ds.rows.clone();
        let groups = groups_for(&ds);
        let mut state = FilterState::all_selected(&groups);
        state.toggle_value("Category", "Retail");
        let _ = compute_view(&ds, &groups, &state);
        assert_eq!(ds.rows, before);
    }

    #[test]
    fn distinct_values_keep_first_seen_order() {
        let ds = sample();
        let vals = distinct_non_empty(ds.rows.iter(), "Category");
        assert_eq!(vals, vec!["Retail", "Wholesale", "Services"]);
    }
}
