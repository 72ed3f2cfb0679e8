use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utility::{
    id::{HasId, Id},
    serde::id_string_or_number,
};

use crate::location::{Coordinates, Location};

/// A supplier as stored in the `suppliers` table.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl HasId for Supplier {
    type IdType = String;
}

impl Supplier {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
            ..Default::default()
        }
        .coordinates()
    }
}

/// A supplier picked by the user for a project, as sent by the frontend.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSupplier {
    #[serde(default, deserialize_with = "id_string_or_number::deserialize_option")]
    pub id: Option<Id<Supplier>>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub items: Vec<Value>,
    pub total_value: Option<f64>,
}

impl SelectedSupplier {
    pub fn address(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|location| !location.is_empty())
    }

    /// Name to show for this supplier, falling back to its id or address.
    pub fn display_name(&self) -> String {
        self.name
            .as_ref()
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .or_else(|| self.id.as_ref().map(|id| id.to_string()))
            .or_else(|| self.address().map(str::to_owned))
            .unwrap_or_default()
    }

    /// Location as far as it can be known without any lookup.
    pub fn initial_location(&self) -> Location {
        let explicit = Location {
            latitude: self.latitude,
            longitude: self.longitude,
            ..Default::default()
        };
        match (explicit.coordinates(), self.address()) {
            (Some(coordinates), address) => Location {
                raw_address: address.map(str::to_owned),
                ..Location::from_coordinates(coordinates)
            },
            (None, Some(address)) => Location::from_address(address),
            (None, None) => Location::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_frontend_payload() {
        let supplier: SelectedSupplier = serde_json::from_str(
            r#"{
                "id": 17,
                "name": "สวนคุณสมชาย",
                "location": "  อ.เมือง จ.นนทบุรี ",
                "items": [{"plantName": "ต้นยางอินเดีย", "quantity": 3}],
                "totalValue": 1350.5
            }"#,
        )
        .unwrap();
        assert_eq!(supplier.id, Some(Id::from("17")));
        assert_eq!(supplier.address(), Some("อ.เมือง จ.นนทบุรี"));
        assert_eq!(supplier.items.len(), 1);
        assert!(!supplier.initial_location().resolved());
    }

    #[test]
    fn explicit_coordinates_win_over_address() {
        let supplier = SelectedSupplier {
            location: Some("Nonthaburi".to_owned()),
            latitude: Some(13.86),
            longitude: Some(100.51),
            ..Default::default()
        };
        let location = supplier.initial_location();
        assert!(location.resolved());
        assert_eq!(location.raw_address.as_deref(), Some("Nonthaburi"));
    }

    #[test]
    fn display_name_falls_back() {
        let supplier = SelectedSupplier {
            id: Some(Id::from("sup_9")),
            name: Some("  ".to_owned()),
            ..Default::default()
        };
        assert_eq!(supplier.display_name(), "sup_9");
    }
}
