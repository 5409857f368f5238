//! In-process fakes for the upstream services, used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::store::normalize_county_name;
use crate::upstream::{validate_coordinates, BanFeed, FeedError, GeoError, GeoResolver};

/// Feed that returns a fixed list and counts fetches.
pub struct StaticFeed {
    reply: Mutex<Result<Vec<String>, FeedError>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl StaticFeed {
    pub fn new(counties: &[&str]) -> Self {
        Self {
            reply: Mutex::new(Ok(counties.iter().map(|c| c.to_string()).collect())),
            delay: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_counties(&self, counties: &[&str]) {
        *self.reply.lock().unwrap() = Ok(counties.iter().map(|c| c.to_string()).collect());
    }

    pub fn fail_with(&self, err: FeedError) {
        *self.reply.lock().unwrap() = Err(err);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BanFeed for StaticFeed {
    async fn fetch(&self) -> Result<Vec<String>, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.lock().unwrap().clone()
    }
}

/// Geocoder backed by lookup tables.
#[derive(Default)]
pub struct StaticGeo {
    places: HashMap<String, (f64, f64)>,
    counties: Vec<((f64, f64), String)>,
}

impl StaticGeo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps an exact coordinate pair to a county name as a geocoder would report it.
    pub fn with_county(mut self, lat: f64, lng: f64, county: &str) -> Self {
        self.counties.push(((lat, lng), county.to_string()));
        self
    }

    /// Maps an address to coordinates.
    pub fn with_place(mut self, query: &str, lat: f64, lng: f64) -> Self {
        self.places.insert(query.to_string(), (lat, lng));
        self
    }
}

#[async_trait]
impl GeoResolver for StaticGeo {
    async fn resolve_by_coordinates(&self, lat: f64, lng: f64) -> Result<String, GeoError> {
        validate_coordinates(lat, lng)?;
        self.counties
            .iter()
            .find(|((la, ln), _)| *la == lat && *ln == lng)
            .map(|(_, county)| normalize_county_name(county))
            .ok_or_else(|| GeoError::NotFound(format!("no county found at {}, {}", lat, lng)))
    }

    async fn resolve_by_address(&self, query: &str) -> Result<String, GeoError> {
        let (lat, lng) = self
            .places
            .get(query)
            .copied()
            .ok_or_else(|| GeoError::NotFound(format!("no place found for {:?}", query)))?;
        self.resolve_by_coordinates(lat, lng).await
    }
}
