use std::env;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::ApiError;

pub const GOOGLE_MAPS_API_URL: &str = "https://maps.googleapis.com/maps/api";

#[derive(Clone, Debug)]
pub struct GoogleMapsCredentials {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GoogleMapsCredentials {
    /// `None` when `GOOGLE_MAPS_API_KEY` is not set.
    pub fn env() -> Option<Self> {
        let api_key = env::var("GOOGLE_MAPS_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let base_url =
            env::var("GOOGLE_MAPS_BASE_URL").unwrap_or_else(|_| GOOGLE_MAPS_API_URL.to_owned());

        Some(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs(10),
        })
    }
}

/// Thin client for the Maps web services. Results are localized to Thai.
pub struct GoogleMapsClient {
    pub credentials: GoogleMapsCredentials,
    http: reqwest::Client,
}

impl GoogleMapsClient {
    pub fn new(credentials: &GoogleMapsCredentials) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(credentials.timeout)
            .build()?;
        Ok(Self {
            credentials: credentials.clone(),
            http,
        })
    }

    /// Fetch `endpoint` (e.g. `geocode/json`) with the given query.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/{endpoint}", self.credentials.base_url);
        log::debug!("Requesting Endpoint '{endpoint}'.");

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[
                ("key", self.credentials.api_key.as_str()),
                ("language", "th"),
                ("region", "th"),
            ])
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(serde_json::from_str(&response.text().await?)?),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimitReached),
            other => Err(ApiError::InvalidResponse {
                status_code: other,
                url,
                response: response.text().await.ok(),
            }),
        }
    }
}
