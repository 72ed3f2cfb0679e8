use axum::{
    routing::{get, on},
    Router,
};

pub mod route;
pub mod suppliers;

use crate::{
    common::{route_not_found, Envelope, METHOD_FILTER_ALL},
    WebState,
};

pub fn routes(state: WebState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .nest_service("/route", route::routes(state.clone()))
        .nest_service("/suppliers", suppliers::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn ping() -> axum::Json<Envelope<()>> {
    Envelope {
        success: true,
        data: None,
        message: "pong!".to_owned(),
    }
    .json()
}
