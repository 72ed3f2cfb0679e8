use axum::{
    extract::{OriginalUri, State},
    http::Method,
    routing::{get, on, post},
    Router,
};
use route_planning::validation::{validate_location, LocationValidation};
use serde::Deserialize;

use crate::{
    common::{
        route_not_found, schema_no_example, ApiJson, Envelope, EnvelopeResult,
        RouteErrorResponse, METHOD_FILTER_ALL,
    },
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/validate-location", post(validate))
        .route(
            "/validate-location/schema",
            get(schema_no_example::<LocationValidation>),
        )
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Deserialize)]
pub struct ValidateLocationRequest {
    pub location: Option<String>,
}

/// `success` mirrors whether the address is usable. The details, including
/// the reason it is not, are in `data`.
async fn validate(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { geocoder, .. }): State<WebState>,
    ApiJson(request): ApiJson<ValidateLocationRequest>,
) -> EnvelopeResult<LocationValidation> {
    let Some(location) = request.location else {
        return Err(RouteErrorResponse::bad_request("กรุณาระบุที่อยู่ (location)")
            .with_method(&Method::POST)
            .with_uri(original_uri.path()));
    };

    let validation = validate_location(&geocoder, &location).await;
    let message = match (&validation.error, validation.is_valid) {
        (_, true) => "ที่อยู่ถูกต้อง".to_owned(),
        (Some(error), false) => error.clone(),
        (None, false) => "ที่อยู่ไม่ถูกต้อง".to_owned(),
    };

    Ok(Envelope {
        success: validation.is_valid,
        data: Some(validation),
        message,
    }
    .json())
}
