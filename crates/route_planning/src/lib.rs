use std::error;
use std::fmt;

use model::plan::DroppedSupplier;

pub mod cache;
pub mod directions;
pub mod directory;
pub mod explainer;
pub mod geocoder;
pub mod haversine;
pub mod limiter;
pub mod matrix;
pub mod optimizer;
pub mod provider;
pub mod sequencer;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub type PlanningResult<T> = Result<T, PlanningError>;

/// Input that can not be planned with, regardless of provider state.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyStopList,
    MissingProjectLocation,
    EmptyAddress,
    UnresolvedLocation { index: usize },
    TooFewLocations { count: usize },
}

impl error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::EmptyStopList => write!(f, "No suppliers to visit."),
            ValidationError::MissingProjectLocation => write!(f, "Project location is missing."),
            ValidationError::EmptyAddress => write!(f, "Address is empty."),
            ValidationError::UnresolvedLocation { index } => {
                write!(f, "Location {index} has no coordinates.")
            }
            ValidationError::TooFewLocations { count } => {
                write!(f, "At least 2 locations are needed, got {count}.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodingError {
    NotFound { address: String },
    ProviderUnavailable { address: String, reason: String },
}

impl error::Error for GeocodingError {}

impl fmt::Display for GeocodingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeocodingError::NotFound { address } => write!(f, "Address not found: {address}"),
            GeocodingError::ProviderUnavailable { address, reason } => {
                write!(f, "Geocoding provider unavailable for '{address}': {reason}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanningError {
    Validation(ValidationError),
    Geocoding(GeocodingError),
    NoResolvableSuppliers { failed: Vec<DroppedSupplier> },
    Internal(String),
}

impl error::Error for PlanningError {}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlanningError::Validation(e) => write!(f, "Validation error: {e}"),
            PlanningError::Geocoding(e) => write!(f, "Geocoding error: {e}"),
            PlanningError::NoResolvableSuppliers { failed } => {
                write!(f, "None of the {} suppliers could be located.", failed.len())
            }
            PlanningError::Internal(e) => write!(f, "Internal error: {e}"),
        }
    }
}

impl PlanningError {
    /// Message shown to end users of the Thai frontend.
    pub fn user_message(&self) -> String {
        match self {
            PlanningError::Validation(ValidationError::EmptyStopList) => {
                "ไม่มีร้านค้าที่ต้องเดินทางไป".to_owned()
            }
            PlanningError::Validation(ValidationError::MissingProjectLocation) => {
                "กรุณาระบุสถานที่โปรเจกต์".to_owned()
            }
            PlanningError::Validation(ValidationError::EmptyAddress) => {
                "กรุณาระบุที่อยู่".to_owned()
            }
            PlanningError::Validation(ValidationError::UnresolvedLocation { index }) => {
                format!("ไม่พบพิกัดของตำแหน่งที่ {index}")
            }
            PlanningError::Validation(ValidationError::TooFewLocations { .. }) => {
                "ต้องมีอย่างน้อย 2 ตำแหน่งในการคำนวณเส้นทาง".to_owned()
            }
            PlanningError::Geocoding(GeocodingError::NotFound { address }) => {
                format!("ไม่พบตำแหน่งของที่อยู่: {address}")
            }
            PlanningError::Geocoding(GeocodingError::ProviderUnavailable { .. }) => {
                "บริการค้นหาตำแหน่งไม่พร้อมใช้งานในขณะนี้".to_owned()
            }
            PlanningError::NoResolvableSuppliers { .. } => {
                "ไม่สามารถระบุตำแหน่งของร้านค้าใดได้เลย".to_owned()
            }
            PlanningError::Internal(_) => "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์".to_owned(),
        }
    }
}

impl From<ValidationError> for PlanningError {
    fn from(e: ValidationError) -> Self {
        PlanningError::Validation(e)
    }
}

impl From<GeocodingError> for PlanningError {
    fn from(e: GeocodingError) -> Self {
        PlanningError::Geocoding(e)
    }
}

/// Rounds to two decimals, the precision used for kilometers and baht.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
