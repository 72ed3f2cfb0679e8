use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use model::location::{GeocodedAddress, Location};
use utility::geo;

use crate::cache::AddressCache;
use crate::limiter::RateLimiter;
use crate::provider::GeocodingProvider;
use crate::{GeocodingError, PlanningResult, ValidationError};

#[derive(Debug, Clone)]
pub struct GeocoderOptions {
    /// Minimum spacing between two provider calls, shared by all requests.
    pub min_interval: Duration,
    /// Lookups in flight at once during a batch.
    pub max_concurrency: usize,
    pub timeout: Duration,
    /// Attempts per address for transient provider failures.
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for GeocoderOptions {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(100),
            max_concurrency: 5,
            timeout: Duration::from_secs(10),
            max_attempts: 2,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Outcome for one address of a batch, in input position.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchGeocodeResult {
    pub address: String,
    pub outcome: PlanningResult<GeocodedAddress>,
}

impl BatchGeocodeResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Turns free-text addresses into coordinates.
///
/// Cloning is cheap and clones share the cache and the rate limit.
#[derive(Clone)]
pub struct Geocoder {
    provider: Arc<dyn GeocodingProvider>,
    cache: Arc<AddressCache>,
    limiter: Arc<RateLimiter>,
    options: GeocoderOptions,
}

impl Geocoder {
    pub fn new(
        provider: Arc<dyn GeocodingProvider>,
        cache: Arc<AddressCache>,
        options: GeocoderOptions,
    ) -> Self {
        Self {
            provider,
            cache,
            limiter: Arc::new(RateLimiter::new(options.min_interval)),
            options,
        }
    }

    pub fn options(&self) -> &GeocoderOptions {
        &self.options
    }

    pub fn cache(&self) -> &AddressCache {
        &self.cache
    }

    pub async fn geocode(&self, address: &str) -> PlanningResult<GeocodedAddress> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ValidationError::EmptyAddress.into());
        }

        if let Some((latitude, longitude)) = geo::parse_coordinate_pair(address) {
            return Ok(GeocodedAddress {
                latitude,
                longitude,
                formatted_address: address.to_owned(),
                place_id: None,
                location_type: None,
            });
        }

        if let Some(cached) = self.cache.get(address).await {
            log::debug!("Geocode cache hit for '{address}'");
            return Ok(cached);
        }

        let found = self.lookup(address).await?;
        self.cache.insert(address, found.clone()).await;
        Ok(found)
    }

    async fn lookup(&self, address: &str) -> Result<GeocodedAddress, GeocodingError> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.limiter.acquire().await;

            let reason = match tokio::time::timeout(
                self.options.timeout,
                self.provider.geocode(address),
            )
            .await
            {
                Ok(Ok(Some(found))) if found.coordinates().is_valid() => {
                    log::debug!(
                        "Geocoded '{address}' to {},{}",
                        found.latitude,
                        found.longitude
                    );
                    return Ok(found);
                }
                Ok(Ok(Some(found))) => {
                    log::warn!(
                        "Geocoder returned out of range coordinates {},{} for '{address}'",
                        found.latitude,
                        found.longitude
                    );
                    return Err(GeocodingError::NotFound {
                        address: address.to_owned(),
                    });
                }
                Ok(Ok(None)) => {
                    log::info!("No geocoding result for '{address}'");
                    return Err(GeocodingError::NotFound {
                        address: address.to_owned(),
                    });
                }
                Ok(Err(e)) if !e.is_retryable() => {
                    log::error!("Geocoding '{address}' failed: {e}");
                    return Err(GeocodingError::ProviderUnavailable {
                        address: address.to_owned(),
                        reason: e.to_string(),
                    });
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("timed out after {:?}", self.options.timeout),
            };

            if attempt >= max_attempts {
                log::error!("Geocoding '{address}' failed after {attempt} attempts: {reason}");
                return Err(GeocodingError::ProviderUnavailable {
                    address: address.to_owned(),
                    reason,
                });
            }
            log::warn!("Geocoding '{address}' failed (attempt {attempt}/{max_attempts}): {reason}");
            tokio::time::sleep(self.options.retry_delay).await;
        }
    }

    /// Geocodes every address. Results come back in input order and one
    /// failing address never fails the others.
    pub async fn geocode_batch(&self, addresses: &[String]) -> Vec<BatchGeocodeResult> {
        let results = stream::iter(addresses.iter().cloned())
            .map(|address| async move {
                let outcome = self.geocode(&address).await;
                BatchGeocodeResult { address, outcome }
            })
            .buffered(self.options.max_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let succeeded = results.iter().filter(|result| result.is_success()).count();
        log::info!("Batch geocoded {succeeded}/{} addresses", results.len());
        results
    }

    /// Fills in the coordinates of `location` from its raw address, unless it
    /// already has valid ones.
    pub async fn resolve(&self, mut location: Location) -> PlanningResult<Location> {
        if location.resolved() {
            return Ok(location);
        }
        let address = location.raw_address.clone().unwrap_or_default();
        let found = self.geocode(&address).await?;
        location.resolve_with(&found);
        Ok(location)
    }
}
