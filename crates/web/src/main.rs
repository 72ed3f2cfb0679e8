use std::sync::Arc;

use database::{database_url_from_env, PgDatabase};
use google_maps::client::{GoogleMapsClient, GoogleMapsCredentials};
use openai::client::{OpenAiClient, OpenAiCredentials};
use route_planning::{
    cache::AddressCache,
    directory::SupplierDirectory,
    explainer::Explainer,
    geocoder::Geocoder,
    haversine::HaversineMatrixProvider,
    matrix::MatrixBuilder,
    optimizer::RouteOptimizer,
    provider::{
        GeocodingProvider, MatrixProvider, TextGenerationProvider,
        UnconfiguredGeocodingProvider,
    },
};
use tracing_subscriber::EnvFilter;
use web::{
    config::{PlanningConfig, ServerConfig},
    start_web_server, WebState,
};

#[tokio::main]
async fn main() {
    env_logger::init();

    // request spans from the http layer
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        log::warn!("Could not install the tracing subscriber: {e}");
    }

    let server_config = ServerConfig::from_env();
    let planning = PlanningConfig::from_env();

    // mapping provider
    let (geocoding, matrix): (Arc<dyn GeocodingProvider>, Arc<dyn MatrixProvider>) =
        match GoogleMapsCredentials::env() {
            Some(credentials) => {
                let client = Arc::new(
                    GoogleMapsClient::new(&credentials)
                        .expect("could not create the Google Maps client."),
                );
                let geocoding: Arc<dyn GeocodingProvider> = client.clone();
                let matrix: Arc<dyn MatrixProvider> = client;
                (geocoding, matrix)
            }
            None => {
                log::warn!(
                    "GOOGLE_MAPS_API_KEY is not set. Addresses can not be geocoded and \
                     travel costs are straight-line estimates."
                );
                let speed_kmh = planning.optimizer.average_speed_kmh;
                let geocoding: Arc<dyn GeocodingProvider> =
                    Arc::new(UnconfiguredGeocodingProvider);
                let matrix: Arc<dyn MatrixProvider> =
                    Arc::new(HaversineMatrixProvider::new(speed_kmh));
                (geocoding, matrix)
            }
        };

    // text generation
    let text_generation: Option<Arc<dyn TextGenerationProvider>> =
        match OpenAiCredentials::env() {
            Some(credentials) => Some(Arc::new(
                OpenAiClient::new(&credentials).expect("could not create the OpenAI client."),
            )),
            None => {
                log::warn!("OPENAI_API_KEY is not set, route analysis uses the built-in summary.");
                None
            }
        };

    // database
    let directory: Option<Arc<dyn SupplierDirectory>> = match database_url_from_env() {
        Some(url) => match PgDatabase::connect(&url).await {
            Ok(database) => Some(Arc::new(database)),
            Err(e) => {
                log::error!("Could not connect to the supplier database: {e}");
                None
            }
        },
        None => {
            log::info!("No database configured, suppliers must carry their own location.");
            None
        }
    };

    let cache = Arc::new(AddressCache::new(planning.cache_ttl));
    let geocoder = Geocoder::new(geocoding, cache, planning.geocoder);
    let optimizer = RouteOptimizer::new(
        geocoder,
        MatrixBuilder::new(matrix, planning.matrix),
        directory,
        planning.optimizer,
    );
    let explainer = Explainer::new(text_generation, planning.explainer);

    // web server
    if let Err(e) = start_web_server(&server_config, WebState::new(optimizer, explainer)).await {
        log::error!("Web server stopped: {e}");
    }
}
