use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::ChartType;
use crate::data::aggregate::DEFAULT_TOP_N;

/// Everything a dashboard session can be configured with. Every field has a
/// default, so an empty JSON object is a valid config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub chart: ChartConfig,
    pub geocode: GeocodeConfig,
    pub search: SearchConfig,
    pub map: MapConfig,
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Overrides the default (first categorical) group column.
    pub group_column: Option<String>,
    /// Overrides the default (first numeric) value column.
    pub value_column: Option<String>,
    pub top_n: usize,
    pub chart_type: ChartType,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            group_column: None,
            value_column: None,
            top_n: DEFAULT_TOP_N,
            chart_type: ChartType::Bar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    pub endpoint: String,
    /// Appended to every place name, e.g. a country.
    pub locale_hint: String,
    /// Pause before each lookup.
    pub request_delay_ms: u64,
    /// Distinct place names resolved per batch.
    pub max_places: usize,
    pub user_agent: String,
}

impl GeocodeConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".into(),
            locale_hint: "India".into(),
            request_delay_ms: 650,
            max_places: 40,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before the global query recomputes the view.
    pub filter_debounce_ms: u64,
    /// Quiet period before the table query re-lists rows.
    pub table_debounce_ms: u64,
    pub rows_per_page: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            filter_debounce_ms: 300,
            table_debounce_ms: 200,
            rows_per_page: 25,
        }
    }
}

/// Tile layer and initial view handed to the map renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub tile_url: String,
    pub attribution: String,
    pub default_center: (f64, f64),
    pub default_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            attribution: "© OpenStreetMap".into(),
            default_center: (22.0, 79.0),
            default_zoom: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let cfg: DashboardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.geocode.request_delay(), Duration::from_millis(650));
        assert_eq!(cfg.geocode.max_places, 40);
        assert_eq!(cfg.chart.top_n, 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: DashboardConfig = serde_json::from_str(
            r#"{"chart": {"chart_type": "hbar", "top_n": 3}, "geocode": {"locale_hint": "Kenya"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.chart.chart_type, ChartType::HorizontalBar);
        assert_eq!(cfg.chart.top_n, 3);
        assert_eq!(cfg.geocode.locale_hint, "Kenya");
        assert_eq!(cfg.geocode.request_delay_ms, 650);
        assert_eq!(cfg.search.rows_per_page, 25);
    }
}
