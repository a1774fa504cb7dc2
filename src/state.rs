use std::collections::BTreeSet;
use std::path::Path;

use log::{debug, error, info};

use crate::chart::{ChartSpec, ChartType, build_chart};
use crate::config::{ChartConfig, GeocodeConfig};
use crate::data::aggregate::{AggregationParams, AggregationResult, aggregate};
use crate::data::filter::{FilterGroup, FilterState, View, build_filter_groups, compute_view};
use crate::data::inference::{DatasetMeta, infer_columns};
use crate::data::loader;
use crate::data::model::Dataset;
use crate::data::table::{TablePage, table_page};
use crate::error::{PipelineError, Result};
use crate::export::{self, Record};
use crate::geo::map::{GeocodeRequest, MapOutcome, MapPlan, MapStatus, pins_from_cache, plan_map};
use crate::geo::nominatim::NominatimGeocoder;
use crate::geo::resolver::{BatchToken, BatchTokens, GeocodeCache, GeocodeResolver, Geocoder, ResolveReport};

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// Hooks called after each kind of recompute. The state passed in is already
/// fully updated.
pub trait DashboardObserver {
    fn on_dataset_loaded(&self, _state: &AppState) {}
    fn on_filter_changed(&self, _state: &AppState) {}
    fn on_chart_params_changed(&self, _state: &AppState) {}
}

// ---------------------------------------------------------------------------
// Map tasks
// ---------------------------------------------------------------------------

/// What [`AppState::begin_map`] hands back.
pub enum MapTask {
    /// The map is final; already stored on the state.
    Ready(MapOutcome),
    /// Place names must be resolved first.
    Geocode(GeocodeJob),
}

/// A geocoding batch tagged with the view it was planned for.
pub struct GeocodeJob {
    pub request: GeocodeRequest,
    pub token: BatchToken,
}

impl GeocodeJob {
    pub async fn run<G: Geocoder>(&self, resolver: &GeocodeResolver<G>) -> ResolveReport {
        resolver.resolve(&self.request.places, &self.token).await
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The dashboard controller: owns the dataset and everything derived from it.
///
/// Dataset, column metadata and filter groups are replaced wholesale on every
/// load; view, aggregation and chart are recomputed from them whenever the
/// filters or chart parameters change.
pub struct AppState {
    /// Loaded dataset (None until a file or the demo is loaded).
    pub dataset: Option<Dataset>,

    /// Column classification for the loaded dataset.
    pub meta: DatasetMeta,

    /// Columns offered as checkbox filters.
    pub filter_groups: Vec<FilterGroup>,

    /// Checked values and the free-text query.
    pub filters: FilterState,

    /// Rows passing the current filters (cached).
    pub view: View,

    /// Chart type, top-N and column overrides.
    pub chart_config: ChartConfig,

    /// Ranked groups behind the current chart.
    pub aggregation: Option<AggregationResult>,

    /// Current chart; `None` means no chart is shown.
    pub chart: Option<ChartSpec>,

    /// Last accepted map for the current view.
    pub map: Option<MapOutcome>,

    /// Status / error message for the user.
    pub status_message: Option<String>,

    cache: GeocodeCache,
    tokens: BatchTokens,
    observers: Vec<Box<dyn DashboardObserver>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}

impl AppState {
    pub fn new(chart_config: ChartConfig) -> Self {
        Self {
            dataset: None,
            meta: DatasetMeta::default(),
            filter_groups: Vec::new(),
            filters: FilterState::default(),
            view: View::default(),
            chart_config,
            aggregation: None,
            chart: None,
            map: None,
            status_message: None,
            cache: GeocodeCache::default(),
            tokens: BatchTokens::default(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn DashboardObserver>) {
        self.observers.push(observer);
    }

    /// The geocode cache, for building a [`GeocodeResolver`] that shares it.
    pub fn geocode_cache(&self) -> &GeocodeCache {
        &self.cache
    }

    // -- Loading --

    /// Decode a file and install it. On failure the previous dataset stays.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let dataset = match loader::load_file(path) {
            Ok(ds) => ds,
            Err(e) => {
                error!("Failed to load {}: {e:#}", path.display());
                let err = PipelineError::Decode(format!("{e:#}"));
                self.status_message = Some(err.to_string());
                return Err(err);
            }
        };
        self.set_dataset(dataset)
    }

    pub fn load_demo(&mut self) -> Result<()> {
        self.set_dataset(crate::demo::demo_dataset())
    }

    /// Ingest a newly loaded dataset: classify columns, rebuild filter groups
    /// with everything checked, drop cached geocodes and recompute.
    pub fn set_dataset(&mut self, dataset: Dataset) -> Result<()> {
        if dataset.is_empty() {
            let err = PipelineError::EmptyDataset;
            self.status_message = Some(err.to_string());
            return Err(err);
        }

        self.meta = infer_columns(&dataset);
        self.filter_groups = build_filter_groups(&dataset, &self.meta);
        self.filters = FilterState::all_selected(&self.filter_groups);
        self.cache.clear();
        self.tokens.invalidate();
        self.map = None;
        self.status_message = None;

        info!(
            "Loaded {} rows with columns {:?} (numeric {:?})",
            dataset.len(),
            dataset.headers,
            self.meta.numeric
        );
        self.dataset = Some(dataset);

        self.recompute_view();
        self.rechart();
        for o in &self.observers {
            o.on_dataset_loaded(self);
        }
        Ok(())
    }

    // -- Filters --

    /// Recompute the view after a filter change.
    pub fn refilter(&mut self) {
        self.recompute_view();
        self.rechart();
        for o in &self.observers {
            o.on_filter_changed(self);
        }
    }

    /// Toggle one checkbox.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str) -> Result<()> {
        self.check_value(self.group(column)?, value)?;
        self.filters.toggle_value(column, value);
        self.refilter();
        Ok(())
    }

    /// The "Select All" link: flip a column between all and none checked.
    pub fn toggle_select_all(&mut self, column: &str) -> Result<()> {
        let group = self.group(column)?.clone();
        self.filters.toggle_select_all(&group);
        self.refilter();
        Ok(())
    }

    /// Replace a column's checked values outright.
    pub fn set_selected_values<I, S>(&mut self, column: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = self.group(column)?;
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        for value in &values {
            self.check_value(group, value)?;
        }
        self.filters.selected.insert(column.to_string(), values);
        self.refilter();
        Ok(())
    }

    pub fn set_query(&mut self, query: &str) {
        self.filters.query = query.to_string();
        self.refilter();
    }

    /// Check every value and clear the query.
    pub fn reset_filters(&mut self) {
        self.filters = FilterState::all_selected(&self.filter_groups);
        self.refilter();
    }

    fn check_value(&self, group: &FilterGroup, value: &str) -> Result<()> {
        if group.values.iter().any(|v| v == value) {
            Ok(())
        } else {
            Err(PipelineError::UnknownValue {
                column: group.column.clone(),
                value: value.to_string(),
            })
        }
    }

    fn group(&self, column: &str) -> Result<&FilterGroup> {
        self.filter_groups
            .iter()
            .find(|g| g.column == column)
            .ok_or_else(|| PipelineError::UnknownColumn(column.to_string()))
    }

    fn recompute_view(&mut self) {
        self.view = match &self.dataset {
            Some(ds) => compute_view(ds, &self.filter_groups, &self.filters),
            None => View::default(),
        };
        // Outstanding geocoding batches belong to the old view.
        self.tokens.invalidate();
        self.map = None;
        debug!("View recomputed: {} rows", self.view.len());
    }

    // -- Chart --

    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        self.chart_config.chart_type = chart_type;
        self.chart_params_changed();
    }

    /// Values below one are clamped to one.
    pub fn set_top_n(&mut self, top_n: usize) {
        self.chart_config.top_n = top_n.max(1);
        self.chart_params_changed();
    }

    pub fn set_group_column(&mut self, column: Option<&str>) -> Result<()> {
        self.check_column(column)?;
        self.chart_config.group_column = column.map(str::to_string);
        self.chart_params_changed();
        Ok(())
    }

    pub fn set_value_column(&mut self, column: Option<&str>) -> Result<()> {
        self.check_column(column)?;
        self.chart_config.value_column = column.map(str::to_string);
        self.chart_params_changed();
        Ok(())
    }

    fn check_column(&self, column: Option<&str>) -> Result<()> {
        match (column, &self.dataset) {
            (Some(c), Some(ds)) if !ds.has_column(c) => Err(PipelineError::UnknownColumn(c.to_string())),
            _ => Ok(()),
        }
    }

    fn chart_params_changed(&mut self) {
        self.rechart();
        for o in &self.observers {
            o.on_chart_params_changed(self);
        }
    }

    /// Group / value columns and top-N in effect. Overrides naming columns
    /// the dataset lacks fall back to the defaults.
    pub fn aggregation_params(&self) -> AggregationParams {
        AggregationParams::resolve(
            &self.meta,
            self.known_column(&self.chart_config.group_column),
            self.known_column(&self.chart_config.value_column),
            self.chart_config.top_n,
        )
    }

    fn known_column<'a>(&self, column: &'a Option<String>) -> Option<&'a str> {
        column.as_deref().filter(|c| self.meta.kind_of(c).is_some())
    }

    fn rechart(&mut self) {
        let params = self.aggregation_params();
        let (aggregation, chart) = match &self.dataset {
            Some(ds) if !self.view.is_empty() => {
                let agg = aggregate(ds, &self.view, &params);
                let chart = build_chart(
                    &agg,
                    self.chart_config.chart_type,
                    &params.group_column,
                    &params.value_column,
                );
                (Some(agg), chart)
            }
            _ => (None, None),
        };
        self.aggregation = aggregation;
        self.chart = chart;
    }

    // -- Table / exports --

    pub fn table_page(&self, query: &str, rows_per_page: usize) -> Option<TablePage> {
        let ds = self.dataset.as_ref()?;
        Some(table_page(ds, &self.view, query, rows_per_page))
    }

    fn dataset_for_export(&self) -> Result<&Dataset> {
        self.dataset.as_ref().ok_or(PipelineError::ExportPrecondition)
    }

    pub fn export_csv(&self) -> Result<String> {
        export::to_csv(self.dataset_for_export()?, &self.view)
    }

    pub fn export_json(&self) -> Result<String> {
        export::to_json(self.dataset_for_export()?, &self.view)
    }

    /// The view as ordered row mappings, for spreadsheet encoders.
    pub fn export_records(&self) -> Result<Vec<Record>> {
        export::view_records(self.dataset_for_export()?, &self.view)
    }

    // -- Map --

    /// Plan the map for the current view. Direct coordinates (and the
    /// "nothing to show" cases) are stored right away; otherwise the caller
    /// runs the returned job and hands its report to
    /// [`finish_map`](Self::finish_map).
    pub fn begin_map(&mut self, max_places: usize) -> MapTask {
        let plan = match &self.dataset {
            Some(ds) => plan_map(ds, &self.view, max_places),
            None => plan_map(&Dataset::default(), &View::default(), max_places),
        };
        match plan {
            MapPlan::Ready(outcome) => {
                self.map = Some(outcome.clone());
                MapTask::Ready(outcome)
            }
            MapPlan::Geocode(request) => {
                info!(
                    "Geocoding {} places from column '{}'",
                    request.places.len(),
                    request.place_column
                );
                self.map = Some(MapOutcome::with_status(MapStatus::Geocoding));
                MapTask::Geocode(GeocodeJob {
                    request,
                    token: self.tokens.token(),
                })
            }
        }
    }

    /// Place pins for a finished batch. A batch planned for an older view is
    /// discarded and `None` is returned.
    pub fn finish_map(&mut self, job: &GeocodeJob, report: &ResolveReport) -> Option<&MapOutcome> {
        if !job.token.is_current() || report.superseded {
            debug!("Discarding geocoding batch {}: view changed", job.token.generation());
            return None;
        }
        let ds = self.dataset.as_ref()?;
        let pins = pins_from_cache(ds, &self.view, &job.request.place_column, &self.cache);
        if !report.skipped.is_empty() {
            info!("{} places could not be geocoded", report.skipped.len());
        }
        self.map = Some(MapOutcome::from_pins(pins));
        self.map.as_ref()
    }

    /// A resolver on the HTTP geocoder that shares this session's cache.
    pub fn nominatim_resolver(&self, config: &GeocodeConfig) -> Result<GeocodeResolver<NominatimGeocoder>> {
        let geocoder = NominatimGeocoder::new(config)?;
        Ok(GeocodeResolver::new(geocoder, self.cache.clone(), config))
    }

    /// Plan, resolve and place in one go.
    pub async fn refresh_map<G: Geocoder>(&mut self, resolver: &GeocodeResolver<G>) -> Option<MapOutcome> {
        match self.begin_map(resolver.max_places()) {
            MapTask::Ready(outcome) => Some(outcome),
            MapTask::Geocode(job) => {
                let report = job.run(resolver).await;
                self.finish_map(&job, &report).cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::data::model::{Value, row};
    use crate::error::GeocodeError;
    use crate::geo::resolver::tests::TableGeocoder;

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.load_demo().unwrap();
        state
    }

    #[test]
    fn load_resets_filters_and_charts() {
        let state = loaded();
        assert_eq!(state.view.len(), 5);
        assert!(state.filters.query.is_empty());
        assert!(state.filter_groups.iter().all(|g| state.filters.is_fully_selected(g)));
        assert_eq!(state.aggregation_params().group_column, "Name");
        assert!(state.chart.is_some());
    }

    #[test]
    fn grouping_by_category() {
        let mut state = loaded();
        state.set_group_column(Some("Category")).unwrap();
        state.set_value_column(Some("Revenue")).unwrap();
        let agg = state.aggregation.as_ref().unwrap();
        assert_eq!(agg.labels(), vec!["Wholesale", "Retail", "Services"]);
        assert_eq!(agg.values(), vec![510000.0, 270000.0, 90000.0]);
    }

    #[test]
    fn default_value_column_is_the_first_numeric_one() {
        let state = loaded();
        assert_eq!(state.aggregation_params().value_column, "Latitude");
    }

    #[test]
    fn values_missing_from_a_group_are_rejected() {
        let mut state = AppState::default();
        state
            .set_dataset(Dataset::from_rows(vec![
                row([("Category", Value::from("Retail"))]),
                row([("Category", Value::Null)]),
                row([("Category", Value::from("Services"))]),
            ]))
            .unwrap();
        let before = state.filters.clone();

        let err = state.toggle_filter_value("Category", "Retial").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownValue { ref column, ref value } if column == "Category" && value == "Retial"
        ));
        assert_eq!(state.filters, before);
        assert_eq!(state.view.len(), 3);

        assert!(state.set_selected_values("Category", ["Retail", "Retial"]).is_err());
        assert_eq!(state.filters, before);

        state.set_selected_values("Category", ["Retail"]).unwrap();
        assert_eq!(state.view.len(), 1);
    }

    #[test]
    fn resolver_construction_failure_is_a_lookup_error() {
        let state = loaded();
        let config = GeocodeConfig {
            user_agent: "bad\nagent".into(),
            ..GeocodeConfig::default()
        };
        assert!(matches!(
            state.nominatim_resolver(&config),
            Err(PipelineError::Lookup(GeocodeError::Http(_)))
        ));
        assert!(state.nominatim_resolver(&GeocodeConfig::default()).is_ok());
    }

    #[test]
    fn empty_dataset_keeps_previous_state() {
        let mut state = loaded();
        let err = state.set_dataset(Dataset::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset));
        assert_eq!(state.dataset.as_ref().unwrap().len(), 5);
        assert_eq!(state.view.len(), 5);
    }

    #[test]
    fn decode_failure_keeps_previous_state() {
        let mut state = loaded();
        let err = state.load_file(Path::new("/definitely/missing.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert_eq!(state.view.len(), 5);
        assert!(state.status_message.is_some());
    }

    #[test]
    fn filtering_to_nothing_clears_the_chart() {
        let mut state = loaded();
        state.set_query("no such shop");
        assert!(state.view.is_empty());
        assert!(state.chart.is_none());
        assert!(matches!(state.export_csv(), Err(PipelineError::ExportPrecondition)));
    }

    #[test]
    fn reset_restores_everything() {
        let mut state = loaded();
        state.toggle_filter_value("Category", "Retail").unwrap();
        state.set_query("surat");
        state.reset_filters();
        assert_eq!(state.view.len(), 5);
        assert!(state.filters.query.is_empty());
    }

    #[test]
    fn unknown_filter_column_is_an_error() {
        let mut state = loaded();
        assert!(matches!(
            state.toggle_select_all("Revenue"),
            Err(PipelineError::UnknownColumn(_))
        ));
        assert!(state.set_group_column(Some("Nope")).is_err());
    }

    #[test]
    fn chart_params_drive_the_chart() {
        let mut state = loaded();
        state.set_top_n(0);
        assert_eq!(state.chart_config.top_n, 1);
        assert_eq!(state.aggregation.as_ref().unwrap().len(), 1);

        state.set_group_column(Some("City")).unwrap();
        state.set_top_n(10);
        assert_eq!(state.aggregation.as_ref().unwrap().len(), 5);

        state.set_chart_type(ChartType::Radar);
        assert_eq!(state.chart.as_ref().unwrap().chart_type, ChartType::Radar);
    }

    #[test]
    fn observers_hear_each_kind_of_change() {
        #[derive(Clone, Default)]
        struct Log(Rc<RefCell<Vec<String>>>);
        impl DashboardObserver for Log {
            fn on_dataset_loaded(&self, state: &AppState) {
                self.0.borrow_mut().push(format!("loaded {}", state.view.len()));
            }
            fn on_filter_changed(&self, state: &AppState) {
                self.0.borrow_mut().push(format!("filtered {}", state.view.len()));
            }
            fn on_chart_params_changed(&self, _state: &AppState) {
                self.0.borrow_mut().push("chart".into());
            }
        }

        let log = Log::default();
        let mut state = AppState::default();
        state.subscribe(Box::new(log.clone()));
        state.load_demo().unwrap();
        state.toggle_filter_value("Category", "Retail").unwrap();
        state.set_chart_type(ChartType::Pie);
        assert_eq!(*log.0.borrow(), vec!["loaded 5", "filtered 3", "chart"]);
    }

    #[test]
    fn direct_coordinates_map_immediately() {
        let mut state = loaded();
        let MapTask::Ready(outcome) = state.begin_map(40) else {
            panic!("demo data has coordinates");
        };
        assert_eq!(outcome.status, MapStatus::Pins(5));
        assert!(state.map.is_some());
    }

    fn cities() -> Dataset {
        Dataset::from_rows(
            ["Pune", "Goa", "Atlantis", "Pune"]
                .iter()
                .map(|c| row([("City", Value::from(*c)), ("Sales", Value::from(1))]))
                .collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn geocoded_pins_follow_the_view() {
        let mut state = AppState::default();
        state.set_dataset(cities()).unwrap();
        let resolver = GeocodeResolver::with_limits(
            TableGeocoder::with(&[("Pune", 18.5, 73.8), ("Goa", 15.3, 74.1)]),
            state.geocode_cache().clone(),
            Duration::from_millis(650),
            40,
        );

        let outcome = state.refresh_map(&resolver).await.unwrap();
        assert_eq!(outcome.status, MapStatus::Pins(3));
        assert_eq!(outcome.pins.iter().map(|p| p.row).collect::<Vec<_>>(), vec![0, 1, 3]);
    }

    #[test]
    fn geocoding_status_while_a_batch_is_outstanding() {
        let mut state = AppState::default();
        state.set_dataset(cities()).unwrap();
        assert!(matches!(state.begin_map(40), MapTask::Geocode(_)));
        let map = state.map.as_ref().unwrap();
        assert_eq!(map.status, MapStatus::Geocoding);
        assert_eq!(map.status.to_string(), "Geocoding (limited)...");
        assert!(map.pins.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_batches_are_discarded() {
        let mut state = AppState::default();
        state.set_dataset(cities()).unwrap();
        let resolver = GeocodeResolver::with_limits(
            TableGeocoder::with(&[("Pune", 18.5, 73.8)]),
            state.geocode_cache().clone(),
            Duration::ZERO,
            40,
        );

        let MapTask::Geocode(job) = state.begin_map(40) else {
            panic!("expected geocoding");
        };
        let report = job.run(&resolver).await;
        state.toggle_filter_value("City", "Goa").unwrap();

        assert!(state.finish_map(&job, &report).is_none());
        assert!(state.map.is_none());
        // Completed lookups stay cached for the next batch.
        assert!(state.geocode_cache().coordinate("Pune").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn reload_clears_the_cache() {
        let mut state = AppState::default();
        state.set_dataset(cities()).unwrap();
        let resolver = GeocodeResolver::with_limits(
            TableGeocoder::with(&[("Pune", 18.5, 73.8)]),
            state.geocode_cache().clone(),
            Duration::ZERO,
            40,
        );
        state.refresh_map(&resolver).await;
        assert!(!state.geocode_cache().is_empty());

        state.set_dataset(cities()).unwrap();
        assert!(state.geocode_cache().is_empty());
    }
}
