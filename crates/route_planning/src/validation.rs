use model::location::Coordinates;
use schemars::JsonSchema;
use serde::Serialize;

use crate::geocoder::Geocoder;

/// Whether a supplier address can be used for route planning.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationValidation {
    pub is_valid: bool,
    pub coords: Option<Coordinates>,
    pub formatted_address: Option<String>,
    pub place_id: Option<String>,
    pub error: Option<String>,
}

impl LocationValidation {
    fn invalid(error: String) -> Self {
        Self {
            is_valid: false,
            coords: None,
            formatted_address: None,
            place_id: None,
            error: Some(error),
        }
    }
}

/// Geocodes `location` and reports the outcome. Never fails: problems are
/// described in Thai in `error`.
pub async fn validate_location(geocoder: &Geocoder, location: &str) -> LocationValidation {
    if location.trim().is_empty() {
        return LocationValidation::invalid("ที่อยู่ไม่สามารถว่างได้".to_owned());
    }

    match geocoder.geocode(location).await {
        Ok(found) => LocationValidation {
            is_valid: true,
            coords: Some(found.coordinates()),
            formatted_address: Some(found.formatted_address),
            place_id: found.place_id,
            error: None,
        },
        Err(e) => {
            log::info!("Location '{}' did not validate: {e}", location.trim());
            LocationValidation::invalid(format!(
                "ไม่สามารถหาพิกัดที่อยู่ได้: {}. กรุณาระบุที่อยู่ให้ชัดเจนขึ้น \
                 (เช่น เพิ่มเลขที่ ถนน ตำบล อำเภอ จังหวัด)",
                e.user_message()
            ))
        }
    }
}
