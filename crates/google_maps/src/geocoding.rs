use async_trait::async_trait;
use model::location::GeocodedAddress;
use route_planning::provider::{GeocodingProvider, ProviderError};
use serde::Deserialize;

use crate::client::GoogleMapsClient;
use crate::{check_status, ApiError};

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub geometry: Geometry,
    pub place_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
    pub location_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl GeocodeResponse {
    /// First match, `None` for `ZERO_RESULTS`.
    pub fn best_match(self) -> Result<Option<GeocodedAddress>, ApiError> {
        check_status(&self.status, self.error_message)?;
        Ok(self.results.into_iter().next().map(|result| GeocodedAddress {
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
            formatted_address: result.formatted_address,
            place_id: result.place_id,
            location_type: result.geometry.location_type,
        }))
    }
}

impl GoogleMapsClient {
    pub async fn geocode_address(
        &self,
        address: &str,
    ) -> Result<Option<GeocodedAddress>, ApiError> {
        self.get::<GeocodeResponse>("geocode/json", &[("address", address)])
            .await?
            .best_match()
    }
}

#[async_trait]
impl GeocodingProvider for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, ProviderError> {
        Ok(self.geocode_address(address).await?)
    }
}
