use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::filter::View;
use super::inference::DatasetMeta;
use super::model::{Dataset, Value};
use crate::color::ranked_colors;

pub const DEFAULT_TOP_N: usize = 10;

/// Label used for rows whose group value is missing or null.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Which columns to aggregate and how many groups to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationParams {
    pub group_column: String,
    pub value_column: String,
    pub top_n: usize,
}

impl AggregationParams {
    /// Defaults for a dataset: group by the first categorical column (else
    /// the first header), sum the first numeric column (else the first header
    /// that differs from the group column, else the first header).
    ///
    /// Explicit overrides win when given.
    pub fn resolve(
        meta: &DatasetMeta,
        group_override: Option<&str>,
        value_override: Option<&str>,
        top_n: usize,
    ) -> Self {
        let first_header = meta.headers().next().unwrap_or_default().to_string();

        let group_column = group_override
            .map(str::to_string)
            .or_else(|| meta.categorical.first().cloned())
            .unwrap_or_else(|| first_header.clone());

        let value_column = value_override
            .map(str::to_string)
            .or_else(|| meta.numeric.first().cloned())
            .or_else(|| {
                meta.headers()
                    .find(|h| *h != group_column)
                    .map(str::to_string)
            })
            .unwrap_or(first_header);

        AggregationParams {
            group_column,
            value_column,
            top_n: top_n.max(1),
        }
    }
}

/// One ranked group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGroup {
    pub label: String,
    pub value: f64,
    pub color: String,
}

/// Groups sorted by summed value, descending, truncated to `top_n`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    pub groups: Vec<RankedGroup>,
}

impl AggregationResult {
    pub fn labels(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.label.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.groups.iter().map(|g| g.value).collect()
    }

    pub fn colors(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.color.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Sum `value_column` per `group_column` label over the view.
///
/// Labels keep first-seen order while accumulating; the final sort is stable
/// so equal sums stay in that order.
pub fn aggregate(dataset: &Dataset, view: &View, params: &AggregationParams) -> AggregationResult {
    let mut sums: IndexMap<String, f64> = IndexMap::new();

    for row in view.rows(dataset) {
        let label = match row.get(&params.group_column) {
            None | Some(Value::Null) => UNKNOWN_LABEL.to_string(),
            Some(v) => v.to_string(),
        };
        let value = row
            .get(&params.value_column)
            .map(Value::to_number_or_zero)
            .unwrap_or(0.0);
        *sums.entry(label).or_insert(0.0) += value;
    }

    let mut entries: Vec<(String, f64)> = sums.into_iter().collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.truncate(params.top_n.max(1));

    let colors = ranked_colors(entries.len());
    AggregationResult {
        groups: entries
            .into_iter()
            .zip(colors)
            .map(|((label, value), color)| RankedGroup { label, value, color })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::inference::infer_columns;
    use crate::data::model::row;

    fn params(top_n: usize) -> AggregationParams {
        AggregationParams {
            group_column: "g".into(),
            value_column: "v".into(),
            top_n,
        }
    }

    fn ds(pairs: &[(&str, Value)]) -> Dataset {
        Dataset::from_rows(
            pairs
                .iter()
                .map(|(g, v)| row([("g", Value::from(*g)), ("v", v.clone())]))
                .collect(),
        )
    }

    #[test]
    fn sums_and_ranks_descending() {
        let d = ds(&[("a", 1.into()), ("b", 5.into()), ("a", 7.into()), ("c", 2.into())]);
        let r = aggregate(&d, &View::all(&d), &params(10));
        assert_eq!(r.labels(), vec!["a", "b", "c"]);
        assert_eq!(r.values(), vec![8.0, 5.0, 2.0]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let d = ds(&[("x", 3.into()), ("y", 5.into()), ("z", 3.into()), ("w", 3.into())]);
        let r = aggregate(&d, &View::all(&d), &params(10));
        assert_eq!(r.labels(), vec!["y", "x", "z", "w"]);
    }

    #[test]
    fn truncates_to_top_n_and_clamps_zero() {
        let d = ds(&[("a", 1.into()), ("b", 2.into()), ("c", 3.into())]);
        assert_eq!(aggregate(&d, &View::all(&d), &params(2)).len(), 2);
        assert_eq!(aggregate(&d, &View::all(&d), &params(0)).len(), 1);
        assert_eq!(aggregate(&d, &View::all(&d), &params(50)).len(), 3);
    }

    #[test]
    fn non_numeric_values_count_as_zero() {
        let d = ds(&[("a", "oops".into()), ("a", "4".into()), ("b", Value::Null)]);
        let r = aggregate(&d, &View::all(&d), &params(10));
        assert_eq!(r.values(), vec![4.0, 0.0]);
    }

    #[test]
    fn missing_group_becomes_unknown() {
        let d = Dataset::from_rows(vec![
            row([("g", Value::Null), ("v", Value::from(2))]),
            row([("v", Value::from(3))]),
        ]);
        let r = aggregate(&d, &View::all(&d), &params(10));
        assert_eq!(r.labels(), vec![UNKNOWN_LABEL]);
        assert_eq!(r.values(), vec![5.0]);
    }

    #[test]
    fn colors_follow_rank() {
        let d = ds(&[("a", 1.into()), ("b", 2.into())]);
        let r = aggregate(&d, &View::all(&d), &params(10));
        assert_eq!(r.colors(), vec!["#2563eb", "#06b6d4"]);
        assert_eq!(r.groups[0].label, "b");
    }

    #[test]
    fn only_view_rows_are_counted() {
        let d = ds(&[("a", 1.into()), ("b", 2.into()), ("a", 4.into())]);
        let view = View { indices: vec![0, 1] };
        let r = aggregate(&d, &view, &params(10));
        assert_eq!(r.values(), vec![2.0, 1.0]);
    }

    #[test]
    fn default_columns() {
        let d = Dataset::from_rows(vec![row([
            ("Revenue", Value::from(1)),
            ("Category", Value::from("x")),
        ])]);
        let p = AggregationParams::resolve(&infer_columns(&d), None, None, 10);
        assert_eq!(p.group_column, "Category");
        assert_eq!(p.value_column, "Revenue");

        let numeric_only = Dataset::from_rows(vec![row([("a", Value::from(1)), ("b", Value::from(2))])]);
        let p = AggregationParams::resolve(&infer_columns(&numeric_only), None, None, 0);
        assert_eq!(p.group_column, "a");
        assert_eq!(p.value_column, "a");
        assert_eq!(p.top_n, 1);

        let text_only = Dataset::from_rows(vec![row([("a", Value::from("x")), ("b", Value::from("y"))])]);
        let p = AggregationParams::resolve(&infer_columns(&text_only), None, None, 10);
        assert_eq!(p.value_column, "b");
    }
}
