pub use crate::common::RouteResult;

use axum::{extract::FromRef, http::Request, routing::on, Router};
use config::ServerConfig;
use route_planning::{explainer::Explainer, geocoder::Geocoder, optimizer::RouteOptimizer};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::common::{route_not_found, METHOD_FILTER_ALL};

pub mod api;
pub mod common;
pub mod config;

#[derive(Clone, FromRef)]
pub struct WebState {
    pub optimizer: RouteOptimizer,
    /// Shares its cache and rate limit with the optimizer's geocoder.
    pub geocoder: Geocoder,
    pub explainer: Explainer,
}

impl WebState {
    pub fn new(optimizer: RouteOptimizer, explainer: Explainer) -> Self {
        Self {
            geocoder: optimizer.geocoder().clone(),
            optimizer,
            explainer,
        }
    }
}

pub fn app(state: WebState) -> Router {
    Router::new()
        .nest_service("/api", api::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}

pub async fn start_web_server(config: &ServerConfig, state: WebState) -> std::io::Result<()> {
    let listener = TcpListener::bind((config.bind_address.as_str(), config.port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state).into_make_service()).await?;

    Ok(())
}
