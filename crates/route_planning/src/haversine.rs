//! Straight-line matrix provider, used when no routing service is configured.

use async_trait::async_trait;
use model::location::Coordinates;

use crate::provider::{MatrixCell, MatrixProvider, ProviderError};

/// Average driving speed used to turn distances into durations.
pub const DEFAULT_SPEED_KMH: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct HaversineMatrixProvider {
    pub speed_kmh: f64,
}

impl Default for HaversineMatrixProvider {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrixProvider {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    fn cell(&self, from: &Coordinates, to: &Coordinates) -> MatrixCell {
        let distance_meters = from.distance_meters_to(to);
        MatrixCell {
            distance_meters,
            duration_seconds: distance_meters / 1000.0 / self.speed_kmh * 3600.0,
        }
    }
}

#[async_trait]
impl MatrixProvider for HaversineMatrixProvider {
    async fn matrix(
        &self,
        origins: &[Coordinates],
        destinations: &[Coordinates],
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, ProviderError> {
        Ok(origins
            .iter()
            .map(|from| {
                destinations
                    .iter()
                    .map(|to| Some(self.cell(from, to)))
                    .collect()
            })
            .collect())
    }
}
