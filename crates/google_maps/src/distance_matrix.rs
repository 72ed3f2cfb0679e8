use async_trait::async_trait;
use itertools::Itertools;
use model::location::Coordinates;
use route_planning::provider::{MatrixCell, MatrixProvider, ProviderError};
use serde::Deserialize;

use crate::client::GoogleMapsClient;
use crate::{check_status, ApiError};

#[derive(Debug, Clone, Deserialize)]
pub struct DistanceMatrixResponse {
    pub status: String,
    #[serde(default)]
    pub rows: Vec<Row>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    pub status: String,
    pub distance: Option<Value>,
    pub duration: Option<Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Value {
    pub value: f64,
}

impl Element {
    fn cell(&self) -> Option<MatrixCell> {
        match (self.status.as_str(), self.distance, self.duration) {
            ("OK", Some(distance), duration) => Some(MatrixCell {
                distance_meters: distance.value,
                duration_seconds: duration.map(|d| d.value).unwrap_or(f64::NAN),
            }),
            _ => None,
        }
    }
}

impl DistanceMatrixResponse {
    /// Rows of cells; elements that are not `OK` are `None`.
    pub fn into_cells(self) -> Result<Vec<Vec<Option<MatrixCell>>>, ApiError> {
        check_status(&self.status, self.error_message)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.elements.iter().map(Element::cell).collect())
            .collect())
    }
}

fn join(points: &[Coordinates]) -> String {
    points
        .iter()
        .map(|point| format!("{},{}", point.latitude, point.longitude))
        .join("|")
}

impl GoogleMapsClient {
    pub async fn distance_matrix(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, ApiError> {
        let origins = join(origins);
        let destinations = join(destinations);
        self.get::<DistanceMatrixResponse>(
            "distancematrix/json",
            &[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("mode", "driving"),
            ],
        )
        .await?
        .into_cells()
    }
}

#[async_trait]
impl MatrixProvider for GoogleMapsClient {
    async fn matrix(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, ProviderError> {
        Ok(self.distance_matrix(origins, destinations).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_elements_are_missing() {
        let response: DistanceMatrixResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "rows": [
                    {"elements": [
                        {"status": "OK", "distance": {"text": "0 m", "value": 0}, "duration": {"text": "1 min", "value": 0}},
                        {"status": "OK", "distance": {"text": "12.3 km", "value": 12345}, "duration": {"text": "20 mins", "value": 1200}}
                    ]},
                    {"elements": [
                        {"status": "ZERO_RESULTS"},
                        {"status": "OK", "distance": {"text": "0 m", "value": 0}, "duration": {"text": "1 min", "value": 0}}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let cells = response.into_cells().unwrap();
        assert_eq!(
            cells[0][1],
            Some(MatrixCell {
                distance_meters: 12345.0,
                duration_seconds: 1200.0
            })
        );
        assert_eq!(cells[1][0], None);
    }

    #[test]
    fn rejected_request_is_an_error() {
        let response: DistanceMatrixResponse = serde_json::from_str(
            r#"{"status": "MAX_ELEMENTS_EXCEEDED", "rows": []}"#,
        )
        .unwrap();
        assert!(matches!(
            response.into_cells(),
            Err(ApiError::Status { .. })
        ));
    }

    #[test]
    fn joins_coordinates_with_pipes() {
        let points = [Coordinates::new(13.7, 100.5), Coordinates::new(13.8, 100.6)];
        assert_eq!(join(&points), "13.7,100.5|13.8,100.6");
    }
}
