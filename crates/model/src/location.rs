use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        geo::is_valid_coordinate(self.latitude, self.longitude)
    }

    pub fn distance_meters_to(&self, other: &Coordinates) -> f64 {
        geo::haversine_distance_meters(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// The provider's best match for an address.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedAddress {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    pub formatted_address: String,
    pub place_id: Option<String>,
    pub location_type: Option<String>,
}

impl GeocodedAddress {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// An address or coordinate pair, either the project origin or a supplier.
///
/// A location starts out holding only the text the user typed and is filled
/// in by the geocoder. It is resolved once both coordinates are present and
/// within range.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub raw_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub formatted_address: Option<String>,
}

impl Location {
    /// Text typed as `"<lat>,<lng>"` is taken as already resolved.
    pub fn from_address<S: Into<String>>(address: S) -> Self {
        let address: String = address.into();
        match geo::parse_coordinate_pair(&address) {
            Some((latitude, longitude)) => Self {
                formatted_address: Some(address.trim().to_owned()),
                raw_address: Some(address),
                latitude: Some(latitude),
                longitude: Some(longitude),
            },
            None => Self {
                raw_address: Some(address),
                ..Default::default()
            },
        }
    }

    pub fn from_coordinates(coordinates: Coordinates) -> Self {
        Self {
            raw_address: None,
            latitude: Some(coordinates.latitude),
            longitude: Some(coordinates.longitude),
            formatted_address: None,
        }
    }

    pub fn resolved(&self) -> bool {
        self.coordinates().is_some()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude))
                if geo::is_valid_coordinate(latitude, longitude) =>
            {
                Some(Coordinates::new(latitude, longitude))
            }
            _ => None,
        }
    }

    pub fn resolve_with(&mut self, geocoded: &GeocodedAddress) {
        self.latitude = Some(geocoded.latitude);
        self.longitude = Some(geocoded.longitude);
        self.formatted_address = Some(geocoded.formatted_address.clone());
    }

    /// Best human readable description of this location.
    pub fn label(&self) -> String {
        if let Some(formatted) = &self.formatted_address {
            return formatted.clone();
        }
        if let Some(raw) = self.raw_address.as_ref().filter(|raw| !raw.trim().is_empty()) {
            return raw.trim().to_owned();
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => format!("{latitude:.6},{longitude:.6}"),
            _ => String::new(),
        }
    }
}
