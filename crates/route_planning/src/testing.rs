//! In-process stand-ins for the external services, for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use model::location::{Coordinates, GeocodedAddress};
use model::supplier::Supplier;
use utility::geo;
use utility::id::Id;

use crate::cache::normalize_address;
use crate::directory::{DirectoryResult, SupplierDirectory};
use crate::haversine::HaversineMatrixProvider;
use crate::provider::{
    GeocodingProvider, MatrixCell, MatrixProvider, ProviderError, TextGenerationProvider,
};

/// Point `north_m` meters north and `east_m` meters east of `origin`.
pub fn offset(origin: Coordinates, north_m: f64, east_m: f64) -> Coordinates {
    let (latitude, longitude) =
        geo::offset_meters(origin.latitude, origin.longitude, north_m, east_m);
    Coordinates::new(latitude, longitude)
}

pub fn geocoded(coordinates: Coordinates, formatted_address: &str) -> GeocodedAddress {
    GeocodedAddress {
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
        formatted_address: formatted_address.to_owned(),
        place_id: None,
        location_type: Some("APPROXIMATE".to_owned()),
    }
}

/// Geocoder backed by a fixed table of addresses.
#[derive(Default)]
pub struct StaticGeocodingProvider {
    known: HashMap<String, GeocodedAddress>,
    unavailable: HashSet<String>,
    /// Addresses that fail this many times before succeeding.
    flaky: HashMap<String, usize>,
    attempts: std::sync::Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticGeocodingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str, coordinates: Coordinates) -> Self {
        self.known.insert(
            normalize_address(address),
            geocoded(coordinates, address.trim()),
        );
        self
    }

    pub fn with_unavailable(mut self, address: &str) -> Self {
        self.unavailable.insert(normalize_address(address));
        self
    }

    pub fn with_flaky(mut self, address: &str, coordinates: Coordinates, failures: usize) -> Self {
        self.flaky.insert(normalize_address(address), failures);
        self.with_address(address, coordinates)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingProvider for StaticGeocodingProvider {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let key = normalize_address(address);
        if self.unavailable.contains(&key) {
            return Err(ProviderError::Unavailable("scripted outage".to_owned()));
        }
        if let Some(failures) = self.flaky.get(&key) {
            let mut attempts = self
                .attempts
                .lock()
                .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
            let attempt = attempts.entry(key.clone()).or_default();
            *attempt += 1;
            if *attempt <= *failures {
                return Err(ProviderError::Unavailable("scripted hiccup".to_owned()));
            }
        }
        Ok(self.known.get(&key).cloned())
    }
}

/// Haversine matrix that fails every chunk with an origin at `poisoned`.
pub struct FailingMatrixProvider {
    inner: HaversineMatrixProvider,
    poisoned: Coordinates,
    calls: AtomicUsize,
}

impl FailingMatrixProvider {
    pub fn new(poisoned: Coordinates) -> Self {
        Self {
            inner: HaversineMatrixProvider::default(),
            poisoned,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatrixProvider for FailingMatrixProvider {
    async fn matrix(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if origins.contains(&self.poisoned) {
            return Err(ProviderError::Unavailable("scripted outage".to_owned()));
        }
        self.inner.matrix(origins, destinations).await
    }
}

/// Counts calls and records the largest chunk it was asked for.
#[derive(Default)]
pub struct RecordingMatrixProvider {
    inner: HaversineMatrixProvider,
    calls: AtomicUsize,
    largest_chunk: AtomicUsize,
}

impl RecordingMatrixProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn largest_chunk(&self) -> usize {
        self.largest_chunk.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatrixProvider for RecordingMatrixProvider {
    async fn matrix(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.largest_chunk
            .fetch_max(origins.len() * destinations.len(), Ordering::SeqCst);
        self.inner.matrix(origins, destinations).await
    }
}

pub enum TextBehavior {
    Reply(String),
    Fail,
    Hang,
}

pub struct ScriptedTextGenerator {
    behavior: TextBehavior,
    calls: AtomicUsize,
}

impl ScriptedTextGenerator {
    pub fn new(behavior: TextBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerationProvider for ScriptedTextGenerator {
    async fn generate(&self, _system_prompt: &str, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            TextBehavior::Reply(text) => Ok(text.clone()),
            TextBehavior::Fail => Err(ProviderError::Unavailable("scripted outage".to_owned())),
            TextBehavior::Hang => {
                std::future::pending::<()>().await;
                Err(ProviderError::Unavailable("unreachable".to_owned()))
            }
        }
    }
}

/// Supplier directory held in memory.
#[derive(Default)]
pub struct InMemorySupplierDirectory {
    suppliers: HashMap<Id<Supplier>, Supplier>,
    lookups: AtomicUsize,
}

impl InMemorySupplierDirectory {
    pub fn with_supplier(mut self, id: &str, supplier: Supplier) -> Self {
        self.suppliers.insert(Id::from(id), supplier);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SupplierDirectory for InMemorySupplierDirectory {
    async fn supplier(&self, id: &Id<Supplier>) -> DirectoryResult<Option<Supplier>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.suppliers.get(id).cloned())
    }
}
