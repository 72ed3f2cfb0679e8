use axum::{
    extract::{rejection::JsonRejection, FromRequest, OriginalUri, Request},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::MethodFilter,
    Json,
};
use route_planning::{GeocodingError, PlanningError};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

pub type RouteResult<O> = Result<O, RouteErrorResponse>;
pub type EnvelopeResult<T> = RouteResult<Json<Envelope<T>>>;

/// A `MethodFilter` that matches all http methods.
pub(crate) const METHOD_FILTER_ALL: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

/// The shape of every response body: `{ success, data, message }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
        }
    }

    pub fn json(self) -> Json<Self> {
        Json(self)
    }
}

/// `Json` that answers malformed bodies with the error envelope instead of
/// axum's plain text rejection.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(RouteErrorResponse))]
pub struct ApiJson<T>(pub T);

// - Services returning commonly used responses -

pub(crate) async fn schema_no_example<T: JsonSchema + Serialize>() -> impl IntoResponse {
    Json(schema_for!(T))
}

pub(crate) async fn route_not_found(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_found(req.method(), original_uri.path())
}

// - Commonly used responeses -

#[derive(Debug, Clone)]
pub struct RouteErrorResponse {
    pub status_code: StatusCode,
    pub http_method: Option<String>,
    pub requested_uri: Option<String>,
    pub message: String,
    /// Logged, never sent to the client.
    pub detailed_information: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            http_method: None,
            requested_uri: None,
            message: String::new(),
            detailed_information: None,
        }
        .with_default_message()
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST).with_message(message)
    }

    pub fn not_found(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_default_message(self) -> Self {
        let message = match self.status_code {
            StatusCode::BAD_REQUEST => "คำขอไม่ถูกต้อง",
            StatusCode::NOT_FOUND => "ไม่พบ API endpoint ที่ต้องการ",
            StatusCode::UNPROCESSABLE_ENTITY => "ไม่สามารถประมวลผลคำขอได้",
            StatusCode::BAD_GATEWAY => "บริการภายนอกไม่พร้อมใช้งาน",
            _ => "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์",
        };
        self.with_message(message)
    }

    pub fn with_detailed_information(mut self, message: impl Into<String>) -> Self {
        self.detailed_information = Some(message.into());
        self
    }

    /// Builds the error for a failed call to `uri`, prefixing the user
    /// message with what the endpoint was trying to do.
    pub fn from_planning(why: PlanningError, method: &Method, uri: &str, action: &str) -> Self {
        let response = Self::from(why).with_method(method).with_uri(uri);
        if response.status_code.is_server_error() {
            let message = format!("{action}: {}", response.message);
            response.with_message(message)
        } else {
            response
        }
    }
}

impl From<PlanningError> for RouteErrorResponse {
    fn from(value: PlanningError) -> Self {
        let status_code = match &value {
            PlanningError::Validation(_) => StatusCode::BAD_REQUEST,
            PlanningError::Geocoding(GeocodingError::NotFound { .. }) => StatusCode::NOT_FOUND,
            PlanningError::Geocoding(GeocodingError::ProviderUnavailable { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            PlanningError::NoResolvableSuppliers { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PlanningError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status_code)
            .with_message(value.user_message())
            .with_detailed_information(value.to_string())
    }
}

impl From<JsonRejection> for RouteErrorResponse {
    fn from(value: JsonRejection) -> Self {
        Self::bad_request("รูปแบบข้อมูล JSON ไม่ถูกต้อง").with_detailed_information(value.body_text())
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let method = self.http_method.as_deref().unwrap_or("-");
        let uri = self.requested_uri.as_deref().unwrap_or("-");
        let details = self.detailed_information.as_deref().unwrap_or(&self.message);
        if self.status_code.is_server_error() {
            log::error!("{method} {uri} failed with {}: {details}", self.status_code);
        } else {
            log::info!("{method} {uri} rejected with {}: {details}", self.status_code);
        }

        let envelope = Envelope::<()> {
            success: false,
            data: None,
            message: self.message,
        };
        (self.status_code, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use model::plan::DroppedSupplier;
    use route_planning::ValidationError;

    use super::*;

    #[test]
    fn maps_planning_errors_to_status_codes() {
        let cases = [
            (
                PlanningError::Validation(ValidationError::EmptyStopList),
                StatusCode::BAD_REQUEST,
            ),
            (
                PlanningError::Geocoding(GeocodingError::NotFound {
                    address: "ที่ไหนสักแห่ง".to_owned(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                PlanningError::Geocoding(GeocodingError::ProviderUnavailable {
                    address: "ปทุมธานี".to_owned(),
                    reason: "timed out".to_owned(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PlanningError::NoResolvableSuppliers {
                    failed: vec![DroppedSupplier {
                        id: None,
                        name: "ร้าน A".to_owned(),
                        location: None,
                        error: "ไม่พบ".to_owned(),
                    }],
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PlanningError::Internal("boom".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let message = error.user_message();
            let response = RouteErrorResponse::from(error);
            assert_eq!(response.status_code, expected);
            assert_eq!(response.message, message);
        }
    }

    #[test]
    fn server_errors_name_the_failed_action() {
        let response = RouteErrorResponse::from_planning(
            PlanningError::Internal("matrix went missing".to_owned()),
            &Method::POST,
            "/api/route/optimize",
            "เกิดข้อผิดพลาดในการคำนวณเส้นทาง",
        );
        assert_eq!(
            response.message,
            "เกิดข้อผิดพลาดในการคำนวณเส้นทาง: เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์"
        );
        assert_eq!(response.requested_uri.as_deref(), Some("/api/route/optimize"));
    }

    #[test]
    fn client_errors_keep_their_message() {
        let response = RouteErrorResponse::from_planning(
            PlanningError::Validation(ValidationError::EmptyAddress),
            &Method::POST,
            "/api/route/geocode",
            "เกิดข้อผิดพลาดในการ geocode",
        );
        assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(response.message, "กรุณาระบุที่อยู่");
    }
}
