use axum::{
    extract::{OriginalUri, State},
    http::Method,
    routing::{get, on, post},
    Router,
};
use model::{
    location::GeocodedAddress, order::OrderContext, plan::RoutePlan,
    supplier::SelectedSupplier,
};
use route_planning::geocoder::BatchGeocodeResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    common::{
        route_not_found, schema_no_example, ApiJson, Envelope, EnvelopeResult,
        RouteErrorResponse, METHOD_FILTER_ALL,
    },
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/optimize", post(optimize))
        .route("/optimize/schema", get(schema_no_example::<RoutePlan>))
        .route("/geocode", post(geocode))
        .route("/geocode-batch", post(geocode_batch))
        .route("/geocode-batch/schema", get(schema_no_example::<BatchGeocodeDto>))
        .route("/analyze", post(analyze))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

// - /route/optimize -

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub project_location: Option<String>,
    /// Checked to be an array before the suppliers are read from it.
    pub selected_suppliers: Option<Value>,
}

impl OptimizeRequest {
    fn into_parts(self) -> Result<(String, Vec<SelectedSupplier>), RouteErrorResponse> {
        let missing = || {
            RouteErrorResponse::bad_request(
                "กรุณาระบุข้อมูลให้ครบถ้วน: projectLocation และ selectedSuppliers (array)",
            )
        };
        let (Some(project_location), Some(suppliers @ Value::Array(_))) =
            (self.project_location, self.selected_suppliers)
        else {
            return Err(missing());
        };
        let suppliers = serde_json::from_value(suppliers).map_err(|why| {
            RouteErrorResponse::bad_request("ข้อมูลร้านค้าที่เลือกไม่ถูกต้อง")
                .with_detailed_information(why.to_string())
        })?;
        Ok((project_location, suppliers))
    }
}

async fn optimize(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { optimizer, .. }): State<WebState>,
    ApiJson(request): ApiJson<OptimizeRequest>,
) -> EnvelopeResult<RoutePlan> {
    let (project_location, suppliers) = request
        .into_parts()
        .map_err(|why| why.with_method(&Method::POST).with_uri(original_uri.path()))?;

    optimizer
        .optimize(&project_location, &suppliers)
        .await
        .map(|plan| Envelope::ok(plan, "คำนวณเส้นทางสำเร็จ").json())
        .map_err(|why| {
            RouteErrorResponse::from_planning(
                why,
                &Method::POST,
                original_uri.path(),
                "เกิดข้อผิดพลาดในการคำนวณเส้นทาง",
            )
        })
}

// - /route/geocode -

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: Option<String>,
}

async fn geocode(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { geocoder, .. }): State<WebState>,
    ApiJson(request): ApiJson<GeocodeRequest>,
) -> EnvelopeResult<GeocodedAddress> {
    let Some(address) = request.address else {
        return Err(RouteErrorResponse::bad_request("กรุณาระบุที่อยู่ (address)")
            .with_method(&Method::POST)
            .with_uri(original_uri.path()));
    };

    geocoder
        .geocode(&address)
        .await
        .map(|found| Envelope::ok(found, "Geocode สำเร็จ").json())
        .map_err(|why| {
            RouteErrorResponse::from_planning(
                why,
                &Method::POST,
                original_uri.path(),
                "เกิดข้อผิดพลาดในการ geocode",
            )
        })
}

// - /route/geocode-batch -

#[derive(Debug, Deserialize)]
pub struct GeocodeBatchRequest {
    pub addresses: Option<Vec<String>>,
}

/// Outcome for one address of a batch.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchGeocodeDto {
    pub address: String,
    pub success: bool,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub formatted_address: Option<String>,
    pub place_id: Option<String>,
    pub error: Option<String>,
}

impl From<BatchGeocodeResult> for BatchGeocodeDto {
    fn from(result: BatchGeocodeResult) -> Self {
        match result.outcome {
            Ok(found) => Self {
                address: result.address,
                success: true,
                lat: Some(found.latitude),
                lng: Some(found.longitude),
                formatted_address: Some(found.formatted_address),
                place_id: found.place_id,
                error: None,
            },
            Err(why) => Self {
                address: result.address,
                success: false,
                lat: None,
                lng: None,
                formatted_address: None,
                place_id: None,
                error: Some(why.user_message()),
            },
        }
    }
}

async fn geocode_batch(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { geocoder, .. }): State<WebState>,
    ApiJson(request): ApiJson<GeocodeBatchRequest>,
) -> EnvelopeResult<Vec<BatchGeocodeDto>> {
    let addresses = request
        .addresses
        .filter(|addresses| !addresses.is_empty())
        .ok_or_else(|| {
            RouteErrorResponse::bad_request("กรุณาระบุรายการที่อยู่ (addresses)")
                .with_method(&Method::POST)
                .with_uri(original_uri.path())
        })?;

    let results = geocoder
        .geocode_batch(&addresses)
        .await
        .into_iter()
        .map(BatchGeocodeDto::from)
        .collect::<Vec<_>>();
    let succeeded = results.iter().filter(|result| result.success).count();
    let message = format!("Geocode สำเร็จ {succeeded}/{} ที่อยู่", results.len());

    Ok(Envelope::ok(results, message).json())
}

// - /route/analyze -

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub route_data: Option<RoutePlan>,
    pub order_data: Option<OrderContext>,
}

async fn analyze(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { explainer, .. }): State<WebState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> EnvelopeResult<String> {
    let (Some(plan), Some(order)) = (request.route_data, request.order_data) else {
        return Err(RouteErrorResponse::bad_request(
            "กรุณาระบุข้อมูลให้ครบถ้วน: routeData และ orderData",
        )
        .with_method(&Method::POST)
        .with_uri(original_uri.path()));
    };

    let explanation = explainer.explain(&plan, &order).await;
    Ok(Envelope::ok(explanation, "วิเคราะห์เส้นทางสำเร็จ").json())
}
