//! Chart spec builder.
//!
//! Turns a ranked [`AggregationResult`] into a Plotly-shaped `{data, layout}`
//! document for one of ten chart shapes. Rendering is left to whoever
//! consumes the JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::aggregate::AggregationResult;

/// Relative hole radius of a donut.
pub const DONUT_HOLE: f64 = 0.45;
/// Smallest bubble marker size.
pub const MIN_BUBBLE_SIZE: f64 = 6.0;
pub const SCATTER_MARKER_SIZE: f64 = 8.0;
/// File name used when a chart spec is saved without one.
pub const DEFAULT_CHART_NAME: &str = "chart.json";

// ---------------------------------------------------------------------------
// Chart type selector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    #[default]
    Bar,
    #[serde(alias = "hbar")]
    HorizontalBar,
    Line,
    Area,
    Pie,
    Donut,
    #[serde(alias = "polar")]
    PolarBar,
    Radar,
    Bubble,
    Scatter,
}

impl ChartType {
    pub const ALL: [ChartType; 10] = [
        ChartType::Bar,
        ChartType::HorizontalBar,
        ChartType::Line,
        ChartType::Area,
        ChartType::Pie,
        ChartType::Donut,
        ChartType::PolarBar,
        ChartType::Radar,
        ChartType::Bubble,
        ChartType::Scatter,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::HorizontalBar => "horizontal-bar",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Pie => "pie",
            ChartType::Donut => "donut",
            ChartType::PolarBar => "polar-bar",
            ChartType::Radar => "radar",
            ChartType::Bubble => "bubble",
            ChartType::Scatter => "scatter",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chart type '{0}'")]
pub struct UnknownChartType(pub String);

impl FromStr for ChartType {
    type Err = UnknownChartType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_lowercase();
        match id.as_str() {
            "hbar" => return Ok(ChartType::HorizontalBar),
            "polar" => return Ok(ChartType::PolarBar),
            _ => {}
        }
        ChartType::ALL
            .into_iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| UnknownChartType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Spec document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Bar,
    Scatter,
    Pie,
    Barpolar,
    Scatterpolar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fill {
    #[serde(rename = "tozeroy")]
    ToZeroY,
    #[serde(rename = "toself")]
    ToSelf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    #[serde(rename = "h")]
    Horizontal,
}

/// One axis' worth of data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Series {
    Labels(Vec<String>),
    Numbers(Vec<f64>),
    Ranks(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Single(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<MarkerColor>,
    /// Pie slice colours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
}

impl Trace {
    fn of(kind: TraceKind) -> Self {
        Trace {
            kind,
            mode: None,
            name: None,
            x: None,
            y: None,
            labels: None,
            values: None,
            r: None,
            theta: None,
            orientation: None,
            fill: None,
            hole: None,
            marker: None,
            line: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Margin {
    pub t: u32,
    pub l: u32,
    pub r: u32,
    pub b: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Legend {
    pub orientation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadialAxis {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Polar {
    pub radialaxis: RadialAxis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisTitle {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub margin: Margin,
    pub legend: Legend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar: Option<Polar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<AxisTitle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<AxisTitle>,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            margin: Margin { t: 40, l: 50, r: 30, b: 80 },
            legend: Legend { orientation: "h".into() },
            polar: None,
            xaxis: None,
            yaxis: None,
        }
    }
}

/// A complete chart: traces plus layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub data: Vec<Trace>,
    pub layout: Layout,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Marker size for a bubble: `sqrt(value) / 10`, never below
/// [`MIN_BUBBLE_SIZE`]. Negative values get the minimum.
pub fn bubble_size(value: f64) -> f64 {
    MIN_BUBBLE_SIZE.max(value.sqrt() / 10.0)
}

/// Build the chart for a ranked aggregation.
///
/// Returns `None` when there is nothing to draw, which callers treat as
/// "clear the chart".
pub fn build_chart(
    result: &AggregationResult,
    chart_type: ChartType,
    group_column: &str,
    value_column: &str,
) -> Option<ChartSpec> {
    if result.is_empty() {
        return None;
    }

    let labels = result.labels();
    let values = result.values();
    let colors = result.colors();
    let first_color = colors.first().cloned().unwrap_or_default();
    let ranks: Vec<usize> = (1..=labels.len()).collect();

    let mut layout = Layout::default();
    let polar = || Some(Polar { radialaxis: RadialAxis { visible: true } });
    let titled = |layout: &mut Layout| {
        layout.xaxis = Some(AxisTitle { title: group_column.to_string() });
        layout.yaxis = Some(AxisTitle { title: value_column.to_string() });
    };

    let data = match chart_type {
        ChartType::Bar => vec![Trace {
            x: Some(Series::Labels(labels)),
            y: Some(Series::Numbers(values)),
            marker: Some(Marker { color: Some(MarkerColor::PerPoint(colors)), ..Marker::default() }),
            ..Trace::of(TraceKind::Bar)
        }],
        ChartType::HorizontalBar => vec![Trace {
            x: Some(Series::Numbers(values)),
            y: Some(Series::Labels(labels)),
            orientation: Some(Orientation::Horizontal),
            marker: Some(Marker { color: Some(MarkerColor::PerPoint(colors)), ..Marker::default() }),
            ..Trace::of(TraceKind::Bar)
        }],
        ChartType::Line => vec![Trace {
            mode: Some(Mode::LinesMarkers),
            x: Some(Series::Labels(labels)),
            y: Some(Series::Numbers(values)),
            line: Some(LineStyle { color: first_color }),
            ..Trace::of(TraceKind::Scatter)
        }],
        ChartType::Area => vec![Trace {
            mode: Some(Mode::Lines),
            x: Some(Series::Labels(labels)),
            y: Some(Series::Numbers(values)),
            fill: Some(Fill::ToZeroY),
            line: Some(LineStyle { color: first_color.clone() }),
            marker: Some(Marker { color: Some(MarkerColor::Single(first_color)), ..Marker::default() }),
            ..Trace::of(TraceKind::Scatter)
        }],
        ChartType::Pie | ChartType::Donut => vec![Trace {
            labels: Some(labels),
            values: Some(values),
            hole: (chart_type == ChartType::Donut).then_some(DONUT_HOLE),
            marker: Some(Marker { colors: Some(colors), ..Marker::default() }),
            ..Trace::of(TraceKind::Pie)
        }],
        ChartType::PolarBar => {
            layout.polar = polar();
            vec![Trace {
                r: Some(values),
                theta: Some(labels),
                marker: Some(Marker { color: Some(MarkerColor::PerPoint(colors)), ..Marker::default() }),
                ..Trace::of(TraceKind::Barpolar)
            }]
        }
        ChartType::Radar => {
            layout.polar = polar();
            vec![Trace {
                r: Some(close_ring(values)),
                theta: Some(close_ring(labels)),
                fill: Some(Fill::ToSelf),
                marker: Some(Marker { color: Some(MarkerColor::Single(first_color)), ..Marker::default() }),
                ..Trace::of(TraceKind::Scatterpolar)
            }]
        }
        ChartType::Bubble => {
            titled(&mut layout);
            result
                .groups
                .iter()
                .enumerate()
                .map(|(i, g)| Trace {
                    mode: Some(Mode::Markers),
                    name: Some(g.label.clone()),
                    x: Some(Series::Ranks(vec![i + 1])),
                    y: Some(Series::Numbers(vec![g.value])),
                    marker: Some(Marker {
                        color: Some(MarkerColor::Single(g.color.clone())),
                        size: Some(bubble_size(g.value)),
                        ..Marker::default()
                    }),
                    ..Trace::of(TraceKind::Scatter)
                })
                .collect()
        }
        ChartType::Scatter => {
            titled(&mut layout);
            vec![Trace {
                mode: Some(Mode::Markers),
                x: Some(Series::Ranks(ranks)),
                y: Some(Series::Numbers(values)),
                marker: Some(Marker {
                    color: Some(MarkerColor::Single(first_color)),
                    size: Some(SCATTER_MARKER_SIZE),
                    ..Marker::default()
                }),
                ..Trace::of(TraceKind::Scatter)
            }]
        }
    };

    Some(ChartSpec {
        chart_type,
        data,
        layout,
    })
}

/// Append the first element so a polygon closes on itself.
fn close_ring<T: Clone>(mut items: Vec<T>) -> Vec<T> {
    if let Some(first) = items.first().cloned() {
        items.push(first);
    }
    items
}
