use std::fmt;

use serde::{Serialize, Serializer};

use super::columns::{find_coordinate_columns, find_place_column};
use super::resolver::{Coordinate, GeocodeCache};
use crate::data::filter::{View, distinct_non_empty};
use crate::data::model::{Dataset, Row, Value, cell_text};

/// Bounds padding, as a fraction of the span on each side.
pub const BOUNDS_PADDING: f64 = 0.15;

/// A marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pin {
    pub lat: f64,
    pub lon: f64,
    /// Index of the source row in the dataset.
    pub row: usize,
    /// `label: value` listing of the row, in the row's own key order.
    pub popup: Vec<(String, String)>,
}

impl Pin {
    fn new(coord: Coordinate, index: usize, row: &Row) -> Self {
        Pin {
            lat: coord.lat,
            lon: coord.lon,
            row: index,
            popup: row.iter().map(|(k, v)| (k.clone(), v.to_string())).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStatus {
    NoPins,
    NoLocationField,
    Geocoding,
    Pins(usize),
}

impl fmt::Display for MapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapStatus::NoPins => write!(f, "No pins"),
            MapStatus::NoLocationField => write!(f, "No location field"),
            MapStatus::Geocoding => write!(f, "Geocoding (limited)..."),
            MapStatus::Pins(n) => write!(f, "{n} pins"),
        }
    }
}

impl Serialize for MapStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// South-west / north-east corners enclosing all pins, padded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapBounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl MapBounds {
    /// Bounding box of the pins, grown by [`BOUNDS_PADDING`] of its span on
    /// every side. `None` without pins.
    pub fn around(pins: &[Pin]) -> Option<Self> {
        let first = pins.first()?;
        let (mut south, mut north) = (first.lat, first.lat);
        let (mut west, mut east) = (first.lon, first.lon);
        for p in pins {
            south = south.min(p.lat);
            north = north.max(p.lat);
            west = west.min(p.lon);
            east = east.max(p.lon);
        }
        let lat_pad = (north - south) * BOUNDS_PADDING;
        let lon_pad = (east - west) * BOUNDS_PADDING;
        Some(MapBounds {
            south_west: Coordinate { lat: south - lat_pad, lon: west - lon_pad },
            north_east: Coordinate { lat: north + lat_pad, lon: east + lon_pad },
        })
    }
}

/// What the map shows for one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapOutcome {
    pub status: MapStatus,
    pub pins: Vec<Pin>,
    pub bounds: Option<MapBounds>,
}

impl MapOutcome {
    pub fn with_status(status: MapStatus) -> Self {
        MapOutcome {
            status,
            pins: Vec::new(),
            bounds: None,
        }
    }

    pub fn from_pins(pins: Vec<Pin>) -> Self {
        MapOutcome {
            status: MapStatus::Pins(pins.len()),
            bounds: MapBounds::around(&pins),
            pins,
        }
    }
}

/// Place names that still need resolving before the map can be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    pub place_column: String,
    /// Distinct non-empty place names from the view, first-seen order, capped.
    pub places: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapPlan {
    /// Nothing to resolve: the outcome is final.
    Ready(MapOutcome),
    Geocode(GeocodeRequest),
}

/// Decide how to place the view on the map.
///
/// * coordinate columns present → plot every row whose pair parses finite
/// * else a place column → geocode its first `max_places` distinct values
/// * else → "No location field"
pub fn plan_map(dataset: &Dataset, view: &View, max_places: usize) -> MapPlan {
    if view.is_empty() {
        return MapPlan::Ready(MapOutcome::with_status(MapStatus::NoPins));
    }

    if let Some(cols) = find_coordinate_columns(&dataset.headers) {
        let pins = view
            .indices
            .iter()
            .filter_map(|&i| {
                let row = dataset.rows.get(i)?;
                let lat = row.get(cols.lat).and_then(Value::as_finite_f64)?;
                let lon = row.get(cols.lon).and_then(Value::as_finite_f64)?;
                Some(Pin::new(Coordinate::finite(lat, lon)?, i, row))
            })
            .collect();
        return MapPlan::Ready(MapOutcome::from_pins(pins));
    }

    let Some(place_column) = find_place_column(&dataset.headers) else {
        return MapPlan::Ready(MapOutcome::with_status(MapStatus::NoLocationField));
    };

    let mut places = distinct_non_empty(view.rows(dataset), place_column);
    places.truncate(max_places);
    MapPlan::Geocode(GeocodeRequest {
        place_column: place_column.to_string(),
        places,
    })
}

/// Pins for every view row whose place value has a cached coordinate. Rows
/// whose place did not resolve are left off.
pub fn pins_from_cache(dataset: &Dataset, view: &View, place_column: &str, cache: &GeocodeCache) -> Vec<Pin> {
    view.indices
        .iter()
        .filter_map(|&i| {
            let row = dataset.rows.get(i)?;
            let coord = cache.coordinate(&cell_text(row, place_column))?;
            Some(Pin::new(coord, i, row))
        })
        .collect()
}
