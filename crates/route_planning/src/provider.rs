//! Seams to the external services a route computation depends on.

use std::error;
use std::fmt;

use async_trait::async_trait;
use model::location::{Coordinates, GeocodedAddress};

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// No credentials were configured for the service.
    NotConfigured,
    RateLimited,
    Unavailable(String),
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether trying the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::Unavailable(_))
    }
}

impl error::Error for ProviderError {}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProviderError::NotConfigured => write!(f, "Provider is not configured."),
            ProviderError::RateLimited => write!(f, "Rate limit reached."),
            ProviderError::Unavailable(e) => write!(f, "Provider unavailable: {e}"),
            ProviderError::InvalidResponse(e) => write!(f, "Invalid provider response: {e}"),
        }
    }
}

#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Best match for `address`, or `None` when the provider knows no such
    /// place.
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, ProviderError>;
}

/// One cell of a provider matrix response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixCell {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

#[async_trait]
pub trait MatrixProvider: Send + Sync {
    /// Travel cost from every origin to every destination, one row per
    /// origin. Elements the provider could not route are `None`.
    async fn matrix(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, ProviderError>;
}

#[async_trait]
pub trait TextGenerationProvider: Send + Sync {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Geocoding provider used when no mapping service credentials exist. Every
/// lookup fails with [`ProviderError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGeocodingProvider;

#[async_trait]
impl GeocodingProvider for UnconfiguredGeocodingProvider {
    async fn geocode(&self, _address: &str) -> Result<Option<GeocodedAddress>, ProviderError> {
        Err(ProviderError::NotConfigured)
    }
}
