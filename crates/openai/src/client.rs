use std::env;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::ApiError;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Clone, Debug)]
pub struct OpenAiCredentials {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiCredentials {
    /// `None` when `OPENAI_API_KEY` is not set.
    pub fn env() -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_API_URL.to_owned());
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());

        Some(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model,
            timeout: Duration::from_secs(15),
        })
    }
}

pub struct OpenAiClient {
    pub credentials: OpenAiCredentials,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(credentials: &OpenAiCredentials) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(credentials.timeout)
            .build()?;
        Ok(Self {
            credentials: credentials.clone(),
            http,
        })
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}/{endpoint}", self.credentials.base_url);
        log::debug!("Requesting Endpoint '{endpoint}'.");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.credentials.api_key)
            .json(body)
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
