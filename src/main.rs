use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;

use sheetlens::AppState;
use sheetlens::chart::{ChartType, DEFAULT_CHART_NAME};
use sheetlens::config::DashboardConfig;
use sheetlens::debounce::Debouncer;
use sheetlens::export::{DEFAULT_CSV_NAME, DEFAULT_JSON_NAME};

/// Explore a CSV / JSON / Parquet file: filter, chart the top groups, map and export.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data file (.csv, .txt, .json, .parquet). The built-in demo is used when omitted.
    file: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chart type: bar, horizontal-bar, line, area, pie, donut, polar-bar, radar, bubble, scatter
    #[arg(short = 't', long)]
    chart_type: Option<ChartType>,

    /// Column to group by
    #[arg(short, long)]
    group: Option<String>,

    /// Column to sum
    #[arg(short, long)]
    value: Option<String>,

    /// Number of groups to keep
    #[arg(short = 'n', long)]
    top_n: Option<usize>,

    /// Uncheck one filter value, as COLUMN=VALUE (repeatable)
    #[arg(long, value_name = "COLUMN=VALUE")]
    deselect: Vec<String>,

    /// Free-text query applied across all columns
    #[arg(short, long)]
    query: Option<String>,

    /// Search box of the table listing
    #[arg(long, default_value = "")]
    table_query: String,

    /// Write the chart spec as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_CHART_NAME)]
    chart_out: Option<PathBuf>,

    /// Export the filtered rows as CSV
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_CSV_NAME)]
    export_csv: Option<PathBuf>,

    /// Export the filtered rows as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_JSON_NAME)]
    export_json: Option<PathBuf>,

    /// Build map pins, geocoding place names if there are no coordinate columns
    #[arg(long)]
    map: bool,

    /// Read queries from stdin, one per line (`table:<text>` for the table search),
    /// re-reporting after each quiet period
    #[arg(long)]
    interactive: bool,
}

fn parse_selection(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((column, value)) if !column.is_empty() => Ok((column, value)),
        _ => bail!("expected COLUMN=VALUE, got '{raw}'"),
    }
}

fn report(state: &AppState, table_query: &str, config: &DashboardConfig) -> serde_json::Value {
    json!({
        "rows": state.dataset.as_ref().map_or(0, |d| d.len()),
        "matching": state.view.len(),
        "columns": state.meta,
        "filters": state.filter_groups.iter().map(|g| json!({
            "column": g.column,
            "values": g.values,
            "checked": state.filters.selected.get(&g.column),
        })).collect::<Vec<_>>(),
        "groups": state.aggregation.as_ref().map(|a| &a.groups),
        "table": state.table_page(table_query, config.search.rows_per_page),
        "map": state.map,
        "map_view": config.map,
        "status": state.status_message,
    })
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// One stdin line: `table:<text>` searches the table listing, anything else
/// is the global query.
enum Input {
    Query(String),
    Table(String),
}

fn parse_input(line: String) -> Input {
    match line.strip_prefix("table:") {
        Some(rest) => Input::Table(rest.to_string()),
        None => Input::Query(line),
    }
}

async fn interactive(state: &mut AppState, cli: &Cli, config: &DashboardConfig) -> Result<()> {
    let (tx, mut rx) = unbounded_channel();
    let mut queries = Debouncer::new(Duration::from_millis(config.search.filter_debounce_ms), tx.clone());
    let mut table_queries = Debouncer::new(Duration::from_millis(config.search.table_debounce_ms), tx);
    let mut table_query = cli.table_query.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut apply = |state: &mut AppState, input: Input| {
        match input {
            Input::Query(query) => state.set_query(&query),
            Input::Table(query) => table_query = query,
        }
        println!("{}", report(state, &table_query, config));
    };

    loop {
        tokio::select! {
            line = lines.next_line() => match line?.map(parse_input) {
                Some(input @ Input::Query(_)) => queries.push(input),
                Some(input @ Input::Table(_)) => table_queries.push(input),
                None => break,
            },
            Some(input) = rx.recv() => apply(state, input),
        }
    }

    // Input closed: let whatever is still pending through.
    let settle = queries.wait().max(table_queries.wait()) * 2;
    while let Ok(Some(input)) = tokio::time::timeout(settle, rx.recv()).await {
        apply(state, input);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(chart_type) = cli.chart_type {
        config.chart.chart_type = chart_type;
    }
    if let Some(top_n) = cli.top_n {
        config.chart.top_n = top_n.max(1);
    }

    let mut state = AppState::new(config.chart.clone());
    match &cli.file {
        Some(path) => state.load_file(path)?,
        None => {
            info!("No file given, loading the demo dataset");
            state.load_demo()?;
        }
    }

    if cli.group.is_some() {
        state.set_group_column(cli.group.as_deref())?;
    }
    if cli.value.is_some() {
        state.set_value_column(cli.value.as_deref())?;
    }
    for raw in &cli.deselect {
        let (column, value) = parse_selection(raw)?;
        state.toggle_filter_value(column, value)?;
    }
    if let Some(query) = &cli.query {
        state.set_query(query);
    }

    if cli.map {
        let resolver = state.nominatim_resolver(&config.geocode)?;
        match state.refresh_map(&resolver).await {
            Some(outcome) => info!("Map: {}", outcome.status),
            None => warn!("Map batch was superseded"),
        }
    }

    if let Some(path) = &cli.chart_out {
        match &state.chart {
            Some(chart) => write_text(path, &serde_json::to_string_pretty(chart)?)?,
            None => warn!("No chart for an empty view; {} not written", path.display()),
        }
    }
    if let Some(path) = &cli.export_csv {
        write_text(path, &state.export_csv()?)?;
    }
    if let Some(path) = &cli.export_json {
        write_text(path, &state.export_json()?)?;
    }

    if cli.interactive {
        interactive(&mut state, &cli, &config).await
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&report(&state, &cli.table_query, &config))?
        );
        Ok(())
    }
}
