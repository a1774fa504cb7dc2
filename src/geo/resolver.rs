use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::GeocodeConfig;
use crate::error::GeocodeError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Both halves finite.
    pub fn finite(lat: f64, lon: f64) -> Option<Self> {
        (lat.is_finite() && lon.is_finite()).then_some(Coordinate { lat, lon })
    }
}

// ---------------------------------------------------------------------------
// Lookup service
// ---------------------------------------------------------------------------

/// Resolves one place name to a coordinate.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, place: &str) -> Result<Coordinate, GeocodeError>;
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheEntry {
    Resolved(Coordinate),
    /// Looked up and failed; not retried until the cache is cleared.
    Unresolved,
}

/// Place name → lookup outcome, shared between the controller and the
/// resolver. Cleared whenever a new dataset is loaded.
#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl GeocodeCache {
    pub fn get(&self, place: &str) -> Option<CacheEntry> {
        self.entries.lock().get(place).copied()
    }

    /// The coordinate for a place, if it resolved.
    pub fn coordinate(&self, place: &str) -> Option<Coordinate> {
        match self.get(place)? {
            CacheEntry::Resolved(c) => Some(c),
            CacheEntry::Unresolved => None,
        }
    }

    pub fn insert(&self, place: impl Into<String>, entry: CacheEntry) {
        self.entries.lock().insert(place.into(), entry);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Batch tokens
// ---------------------------------------------------------------------------

/// Generation counter owned by the controller. Every dataset load and every
/// filter change bumps it, which supersedes all outstanding batches.
#[derive(Debug, Clone, Default)]
pub struct BatchTokens {
    current: Arc<AtomicU64>,
}

impl BatchTokens {
    /// A token tied to the current generation.
    pub fn token(&self) -> BatchToken {
        BatchToken {
            generation: self.current.load(Ordering::SeqCst),
            current: Arc::clone(&self.current),
        }
    }

    /// Supersede every token issued so far.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tags one geocoding batch with the view generation it was computed for.
#[derive(Debug, Clone)]
pub struct BatchToken {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl BatchToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once the controller has moved on to a newer view.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// What one batch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Places looked up successfully in this batch.
    pub resolved: Vec<String>,
    /// Places looked up in this batch that failed.
    pub skipped: Vec<String>,
    /// Places already in the cache (resolved or not).
    pub cached: usize,
    /// The batch stopped early because its token went stale.
    pub superseded: bool,
}

/// Sequential, rate-limited place-name resolution with a session cache.
///
/// Lookups run one at a time with a fixed pause before each request. A failed
/// lookup is logged, cached as unresolved, and the batch moves on.
pub struct GeocodeResolver<G> {
    geocoder: G,
    cache: GeocodeCache,
    delay: Duration,
    max_places: usize,
}

impl<G: Geocoder> GeocodeResolver<G> {
    pub fn new(geocoder: G, cache: GeocodeCache, config: &GeocodeConfig) -> Self {
        Self::with_limits(geocoder, cache, config.request_delay(), config.max_places)
    }

    pub fn with_limits(geocoder: G, cache: GeocodeCache, delay: Duration, max_places: usize) -> Self {
        Self {
            geocoder,
            cache,
            delay,
            max_places,
        }
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    pub fn max_places(&self) -> usize {
        self.max_places
    }

    /// Resolve up to `max_places` of `places`, in order.
    pub async fn resolve(&self, places: &[String], token: &BatchToken) -> ResolveReport {
        let mut report = ResolveReport::default();

        for place in places.iter().take(self.max_places) {
            if self.cache.get(place).is_some() {
                report.cached += 1;
                continue;
            }
            if !token.is_current() {
                report.superseded = true;
                break;
            }

            tokio::time::sleep(self.delay).await;
            if !token.is_current() {
                report.superseded = true;
                break;
            }

            match self.geocoder.lookup(place).await {
                Ok(coord) => {
                    debug!("Geocoded '{place}' → ({}, {})", coord.lat, coord.lon);
                    self.cache.insert(place.clone(), CacheEntry::Resolved(coord));
                    report.resolved.push(place.clone());
                }
                Err(e) => {
                    warn!("Skipping '{place}': {e}");
                    self.cache.insert(place.clone(), CacheEntry::Unresolved);
                    report.skipped.push(place.clone());
                }
            }
        }

        if report.superseded {
            debug!(
                "Geocoding batch {} superseded after {} lookups",
                token.generation(),
                report.resolved.len() + report.skipped.len()
            );
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Answers from a fixed table and records every query.
    #[derive(Default)]
    pub(crate) struct TableGeocoder {
        pub known: HashMap<String, Coordinate>,
        pub queried: Mutex<Vec<String>>,
    }

    impl TableGeocoder {
        pub(crate) fn with(places: &[(&str, f64, f64)]) -> Self {
            TableGeocoder {
                known: places
                    .iter()
                    .map(|(p, lat, lon)| (p.to_string(), Coordinate { lat: *lat, lon: *lon }))
                    .collect(),
                queried: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl Geocoder for TableGeocoder {
        async fn lookup(&self, place: &str) -> Result<Coordinate, GeocodeError> {
            self.queried.lock().push(place.to_string());
            self.known
                .get(place)
                .copied()
                .ok_or_else(|| GeocodeError::NoMatch(place.to_string()))
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_sequentially_with_delay() {
        let geocoder = TableGeocoder::with(&[("Pune", 18.5, 73.8), ("Goa", 15.3, 74.1)]);
        let resolver = GeocodeResolver::with_limits(geocoder, GeocodeCache::default(), Duration::from_millis(650), 40);
        let tokens = BatchTokens::default();

        let start = tokio::time::Instant::now();
        let report = resolver.resolve(&names(&["Pune", "Goa"]), &tokens.token()).await;

        assert_eq!(report.resolved, names(&["Pune", "Goa"]));
        assert!(start.elapsed() >= Duration::from_millis(1300));
        assert_eq!(resolver.cache().coordinate("Goa"), Some(Coordinate { lat: 15.3, lon: 74.1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_skipped_not_fatal() {
        let geocoder = TableGeocoder::with(&[("Pune", 18.5, 73.8)]);
        let resolver = GeocodeResolver::with_limits(geocoder, GeocodeCache::default(), Duration::ZERO, 40);
        let report = resolver
            .resolve(&names(&["Atlantis", "Pune"]), &BatchTokens::default().token())
            .await;

        assert_eq!(report.skipped, names(&["Atlantis"]));
        assert_eq!(report.resolved, names(&["Pune"]));
        assert_eq!(resolver.cache().get("Atlantis"), Some(CacheEntry::Unresolved));
    }

    #[tokio::test(start_paused = true)]
    async fn cached_places_are_not_queried_again() {
        let cache = GeocodeCache::default();
        cache.insert("Pune", CacheEntry::Resolved(Coordinate { lat: 1.0, lon: 2.0 }));
        cache.insert("Atlantis", CacheEntry::Unresolved);
        let resolver = GeocodeResolver::with_limits(TableGeocoder::default(), cache, Duration::ZERO, 40);

        let report = resolver
            .resolve(&names(&["Pune", "Atlantis"]), &BatchTokens::default().token())
            .await;
        assert_eq!(report.cached, 2);
        assert!(resolver.geocoder.queried.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn caps_the_batch() {
        let resolver =
            GeocodeResolver::with_limits(TableGeocoder::default(), GeocodeCache::default(), Duration::ZERO, 2);
        resolver
            .resolve(&names(&["a", "b", "c"]), &BatchTokens::default().token())
            .await;
        assert_eq!(*resolver.geocoder.queried.lock(), names(&["a", "b"]));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_token_stops_the_batch() {
        let resolver =
            GeocodeResolver::with_limits(TableGeocoder::default(), GeocodeCache::default(), Duration::ZERO, 40);
        let tokens = BatchTokens::default();
        let token = tokens.token();
        tokens.invalidate();

        let report = resolver.resolve(&names(&["a", "b"]), &token).await;
        assert!(report.superseded);
        assert!(resolver.geocoder.queried.lock().is_empty());
    }

    #[test]
    fn tokens_track_generation() {
        let tokens = BatchTokens::default();
        let first = tokens.token();
        assert!(first.is_current());
        tokens.invalidate();
        assert!(!first.is_current());
        assert!(tokens.token().is_current());
        assert_eq!(tokens.token().generation(), first.generation() + 1);
    }

    #[test]
    fn coordinates_must_be_finite() {
        assert!(Coordinate::finite(f64::NAN, 1.0).is_none());
        assert!(Coordinate::finite(1.0, f64::INFINITY).is_none());
        assert!(Coordinate::finite(1.0, 2.0).is_some());
    }
}
