//! Column-name heuristics for map data.
//!
//! Detection looks only at header names, never at cell contents. Each pattern
//! is a case-insensitive substring match and the first matching header (in
//! header order) wins, so `"Latitude"`, `"lat"` and `"store_lat"` all count as
//! a latitude column.

pub const LATITUDE_PATTERNS: [&str; 2] = ["lat", "latitude"];
pub const LONGITUDE_PATTERNS: [&str; 3] = ["lon", "lng", "longitude"];
pub const PLACE_PATTERNS: [&str; 6] = ["city", "town", "state", "district", "place", "location"];

/// The pair of columns holding coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateColumns<'a> {
    pub lat: &'a str,
    pub lon: &'a str,
}

fn matches_any(header: &str, patterns: &[&str]) -> bool {
    let lower = header.to_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

fn first_match<'a>(headers: &'a [String], patterns: &[&str], skip: Option<&str>) -> Option<&'a str> {
    headers
        .iter()
        .map(String::as_str)
        .filter(|h| Some(*h) != skip)
        .find(|h| matches_any(h, patterns))
}

/// Latitude and longitude columns, if both exist and are distinct.
pub fn find_coordinate_columns(headers: &[String]) -> Option<CoordinateColumns<'_>> {
    let lat = first_match(headers, &LATITUDE_PATTERNS, None)?;
    let lon = first_match(headers, &LONGITUDE_PATTERNS, Some(lat))?;
    Some(CoordinateColumns { lat, lon })
}

/// A column naming a place that can be geocoded.
pub fn find_place_column(headers: &[String]) -> Option<&str> {
    first_match(headers, &PLACE_PATTERNS, None)
}
