use model::supplier::Supplier;
use sqlx::prelude::FromRow;
use utility::id::Id;

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct SupplierRow {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl DatabaseRow for SupplierRow {
    type Model = Supplier;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Self::Model {
        Supplier {
            name: self.name,
            location: self.location.filter(|location| !location.trim().is_empty()),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_location_is_dropped() {
        let row = SupplierRow {
            id: "12".to_owned(),
            name: "สวนคุณสมชาย".to_owned(),
            location: Some("  ".to_owned()),
            latitude: Some(13.86),
            longitude: Some(100.51),
        };
        assert_eq!(row.get_id(), Id::from("12"));

        let supplier = row.to_model();
        assert_eq!(supplier.location, None);
        assert!(supplier.coordinates().is_some());
    }

    #[test]
    fn row_without_coordinates_keeps_the_address() {
        let supplier = SupplierRow {
            id: "13".to_owned(),
            name: "สวนป้าแดง".to_owned(),
            location: Some("ปากเกร็ด นนทบุรี".to_owned()),
            latitude: None,
            longitude: None,
        }
        .to_model();
        assert_eq!(supplier.location.as_deref(), Some("ปากเกร็ด นนทบุรี"));
        assert!(supplier.coordinates().is_none());
    }
}
