use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use model::location::{Coordinates, Location};
use model::matrix::DistanceMatrix;

use crate::provider::{MatrixCell, MatrixProvider};
use crate::{PlanningResult, ValidationError};

#[derive(Debug, Clone)]
pub struct MatrixOptions {
    pub max_origins: usize,
    pub max_destinations: usize,
    /// Origins times destinations allowed in one provider request.
    pub max_elements: usize,
    /// Chunk requests in flight at once.
    pub max_concurrency: usize,
    pub timeout: Duration,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            max_origins: 25,
            max_destinations: 25,
            max_elements: 100,
            max_concurrency: 4,
            timeout: Duration::from_secs(10),
        }
    }
}

/// One provider request: a block of origins against a block of destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixChunk {
    pub origins: Range<usize>,
    pub destinations: Range<usize>,
}

impl MatrixChunk {
    pub fn elements(&self) -> usize {
        self.origins.len() * self.destinations.len()
    }
}

/// Splits an `size`×`size` matrix into blocks within the provider limits.
pub fn plan_chunks(size: usize, options: &MatrixOptions) -> Vec<MatrixChunk> {
    let columns = size
        .min(options.max_destinations)
        .min(options.max_elements)
        .max(1);
    let rows = size
        .min(options.max_origins)
        .min(options.max_elements / columns)
        .max(1);

    let blocks = |step: usize| {
        (0..size)
            .step_by(step)
            .map(move |start| start..(start + step).min(size))
    };

    blocks(rows)
        .flat_map(|origins| {
            blocks(columns).map(move |destinations| MatrixChunk {
                origins: origins.clone(),
                destinations,
            })
        })
        .collect()
}

/// Builds the full travel cost matrix between resolved locations.
#[derive(Clone)]
pub struct MatrixBuilder {
    provider: Arc<dyn MatrixProvider>,
    options: MatrixOptions,
}

impl MatrixBuilder {
    pub fn new(provider: Arc<dyn MatrixProvider>, options: MatrixOptions) -> Self {
        Self { provider, options }
    }

    /// Cells a provider request could not compute end up unknown; only input
    /// problems are errors.
    pub async fn build_matrix(&self, locations: &[Location]) -> PlanningResult<DistanceMatrix> {
        if locations.len() < 2 {
            return Err(ValidationError::TooFewLocations {
                count: locations.len(),
            }
            .into());
        }
        let coordinates = locations
            .iter()
            .enumerate()
            .map(|(index, location)| {
                location
                    .coordinates()
                    .ok_or(ValidationError::UnresolvedLocation { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let size = coordinates.len();
        let chunks = plan_chunks(size, &self.options);
        log::debug!(
            "Requesting {size}x{size} matrix in {} chunk(s)",
            chunks.len()
        );

        let coordinates = &coordinates;
        let responses = stream::iter(chunks)
            .map(|chunk| async move {
                let response = self.request(coordinates, &chunk).await;
                (chunk, response)
            })
            .buffer_unordered(self.options.max_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut matrix = DistanceMatrix::unknown(size);
        for (chunk, response) in responses {
            match response {
                Ok(rows) => fill_chunk(&mut matrix, &chunk, rows),
                Err(reason) => log::warn!(
                    "Matrix chunk origins {:?} x destinations {:?} failed: {reason}",
                    chunk.origins,
                    chunk.destinations
                ),
            }
        }

        let unknown = matrix.unknown_cells();
        if unknown > 0 {
            log::warn!("Matrix has {unknown} unknown cell(s) out of {}", size * (size - 1));
        }
        Ok(matrix)
    }

    async fn request(
        &self,
        coordinates: &[Coordinates],
        chunk: &MatrixChunk,
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, String> {
        let origins = &coordinates[chunk.origins.clone()];
        let destinations = &coordinates[chunk.destinations.clone()];
        match tokio::time::timeout(
            self.options.timeout,
            self.provider.matrix(origins, destinations),
        )
        .await
        {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.options.timeout)),
        }
    }
}

fn fill_chunk(
    matrix: &mut DistanceMatrix,
    chunk: &MatrixChunk,
    rows: Vec<Vec<Option<MatrixCell>>>,
) {
    let mut failed = 0;
    for (row, from) in chunk.origins.clone().enumerate() {
        for (column, to) in chunk.destinations.clone().enumerate() {
            if from == to {
                continue;
            }
            match rows.get(row).and_then(|cells| cells.get(column)).copied().flatten() {
                Some(cell) => matrix.set(from, to, cell.distance_meters, cell.duration_seconds),
                None => failed += 1,
            }
        }
    }
    if failed > 0 {
        log::warn!(
            "{failed} element(s) of matrix chunk origins {:?} x destinations {:?} have no route",
            chunk.origins,
            chunk.destinations
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineMatrixProvider;
    use crate::testing::{offset, FailingMatrixProvider, RecordingMatrixProvider};
    use crate::PlanningError;
    use rstest::rstest;

    const ORIGIN: Coordinates = Coordinates {
        latitude: 13.7563,
        longitude: 100.5018,
    };

    fn locations(count: usize) -> Vec<Location> {
        (0..count)
            .map(|i| {
                let east = 500.0 * (i % 3) as f64;
                Location::from_coordinates(offset(ORIGIN, 1000.0 * i as f64, east))
            })
            .collect()
    }

    #[rstest]
    #[case(2, 1)]
    #[case(10, 1)]
    #[case(11, 2)]
    #[case(25, 7)]
    #[case(26, 14)]
    fn chunks_cover_the_matrix_within_limits(#[case] size: usize, #[case] expected: usize) {
        let options = MatrixOptions::default();
        let chunks = plan_chunks(size, &options);
        assert_eq!(chunks.len(), expected);

        let mut covered = vec![0; size * size];
        for chunk in &chunks {
            assert!(chunk.elements() <= options.max_elements);
            assert!(chunk.origins.len() <= options.max_origins);
            assert!(chunk.destinations.len() <= options.max_destinations);
            for from in chunk.origins.clone() {
                for to in chunk.destinations.clone() {
                    covered[from * size + to] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&count| count == 1));
    }

    #[tokio::test]
    async fn needs_two_locations() {
        let builder = MatrixBuilder::new(
            Arc::new(HaversineMatrixProvider::default()),
            MatrixOptions::default(),
        );
        let result = builder.build_matrix(&locations(1)).await;
        assert_eq!(
            result,
            Err(PlanningError::Validation(ValidationError::TooFewLocations { count: 1 }))
        );
    }

    #[tokio::test]
    async fn rejects_unresolved_locations() {
        let builder = MatrixBuilder::new(
            Arc::new(HaversineMatrixProvider::default()),
            MatrixOptions::default(),
        );
        let mut input = locations(3);
        input[2] = Location::from_address("ที่ไหนสักแห่ง");
        let result = builder.build_matrix(&input).await;
        assert_eq!(
            result,
            Err(PlanningError::Validation(ValidationError::UnresolvedLocation { index: 2 }))
        );
    }

    #[tokio::test]
    async fn large_matrix_is_assembled_from_chunks() {
        let provider = Arc::new(RecordingMatrixProvider::default());
        let builder = MatrixBuilder::new(provider.clone(), MatrixOptions::default());
        let input = locations(12);
        let matrix = builder.build_matrix(&input).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert!(provider.largest_chunk() <= 100);
        assert_eq!(matrix.unknown_cells(), 0);

        let direct = input[3]
            .coordinates()
            .unwrap()
            .distance_meters_to(&input[11].coordinates().unwrap());
        assert!((matrix.distance(3, 11) - direct).abs() < 1e-6);
    }

    #[tokio::test]
    async fn failed_chunk_leaves_cells_unknown() {
        let input = locations(12);
        let poisoned = input[0].coordinates().unwrap();
        let provider = Arc::new(FailingMatrixProvider::new(poisoned));
        let builder = MatrixBuilder::new(provider.clone(), MatrixOptions::default());

        let matrix = builder.build_matrix(&input).await.unwrap();
        // the chunk holding origins 0..8 is lost
        assert!(!matrix.is_known(0, 1));
        assert!(!matrix.is_known(7, 11));
        assert!(matrix.is_known(8, 0));
        assert!(matrix.is_known(11, 10));
        assert_eq!(matrix.unknown_cells(), 8 * 11);
    }
}
