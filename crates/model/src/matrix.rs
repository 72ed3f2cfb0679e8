/// Pairwise travel cost between all locations of one route computation.
///
/// Cells are stored row-major: `index = from * size + to`. The matrix is not
/// assumed to be symmetric. Cells the provider could not compute hold
/// [`DistanceMatrix::UNKNOWN`].
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    distances: Vec<f64>,
    durations: Vec<f64>,
}

impl DistanceMatrix {
    pub const UNKNOWN: f64 = f64::INFINITY;

    /// A matrix where every off-diagonal cell is unknown.
    pub fn unknown(size: usize) -> Self {
        let mut distances = vec![Self::UNKNOWN; size * size];
        let mut durations = vec![Self::UNKNOWN; size * size];
        for i in 0..size {
            distances[i * size + i] = 0.0;
            durations[i * size + i] = 0.0;
        }
        Self {
            size,
            distances,
            durations,
        }
    }

    /// Builds a matrix from nested rows. Missing or non-finite cells become
    /// unknown; the size is taken from the number of distance rows.
    pub fn from_rows(distances: Vec<Vec<f64>>, durations: Vec<Vec<f64>>) -> Self {
        let mut matrix = Self::unknown(distances.len());
        for (from, row) in distances.iter().enumerate() {
            for (to, distance) in row.iter().enumerate().take(matrix.size) {
                if from == to {
                    continue;
                }
                let duration = durations
                    .get(from)
                    .and_then(|row| row.get(to))
                    .copied()
                    .unwrap_or(Self::UNKNOWN);
                matrix.set(from, to, *distance, duration);
            }
        }
        matrix
    }

    #[inline(always)]
    fn index(&self, from: usize, to: usize) -> usize {
        from * self.size + to
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance in meters.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[self.index(from, to)]
    }

    /// Duration in seconds.
    pub fn duration(&self, from: usize, to: usize) -> f64 {
        self.durations[self.index(from, to)]
    }

    pub fn is_known(&self, from: usize, to: usize) -> bool {
        self.distance(from, to).is_finite()
    }

    /// Stores one cell. A non-finite or negative distance marks the cell as
    /// unknown; a duration alone can not make a cell known.
    pub fn set(&mut self, from: usize, to: usize, distance: f64, duration: f64) {
        let index = self.index(from, to);
        if distance.is_finite() && distance >= 0.0 {
            self.distances[index] = distance;
            self.durations[index] = if duration.is_finite() && duration >= 0.0 {
                duration
            } else {
                0.0
            };
        } else {
            self.distances[index] = Self::UNKNOWN;
            self.durations[index] = Self::UNKNOWN;
        }
    }

    pub fn mark_unknown(&mut self, from: usize, to: usize) {
        if from != to {
            let index = self.index(from, to);
            self.distances[index] = Self::UNKNOWN;
            self.durations[index] = Self::UNKNOWN;
        }
    }

    /// Number of off-diagonal cells without a cost.
    pub fn unknown_cells(&self) -> usize {
        (0..self.size)
            .flat_map(|from| (0..self.size).map(move |to| (from, to)))
            .filter(|&(from, to)| from != to && !self.is_known(from, to))
            .count()
    }

    /// True when no edge into or out of `index` has a known cost.
    pub fn is_isolated(&self, index: usize) -> bool {
        self.size > 1
            && (0..self.size)
                .filter(|&other| other != index)
                .all(|other| !self.is_known(index, other) && !self.is_known(other, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_matrix_has_zero_diagonal() {
        let matrix = DistanceMatrix::unknown(3);
        for i in 0..3 {
            assert_eq!(matrix.distance(i, i), 0.0);
        }
        assert_eq!(matrix.unknown_cells(), 6);
    }

    #[test]
    fn from_rows_keeps_direction() {
        let matrix = DistanceMatrix::from_rows(
            vec![vec![0.0, 100.0], vec![250.0, 0.0]],
            vec![vec![0.0, 10.0], vec![25.0, 0.0]],
        );
        assert_eq!(matrix.distance(0, 1), 100.0);
        assert_eq!(matrix.distance(1, 0), 250.0);
        assert_eq!(matrix.duration(1, 0), 25.0);
        assert_eq!(matrix.unknown_cells(), 0);
    }

    #[test]
    fn short_rows_are_unknown() {
        let matrix = DistanceMatrix::from_rows(
            vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.0], vec![2.0, 1.0, 0.0]],
            vec![],
        );
        assert!(!matrix.is_known(1, 2));
        assert!(matrix.is_known(0, 2));
        assert_eq!(matrix.duration(0, 2), 0.0);
    }

    #[test]
    fn detects_isolated_locations() {
        let mut matrix = DistanceMatrix::unknown(3);
        matrix.set(0, 1, 10.0, 1.0);
        matrix.set(1, 0, 10.0, 1.0);
        assert!(!matrix.is_isolated(0));
        assert!(matrix.is_isolated(2));

        matrix.set(2, 0, 5.0, 1.0);
        assert!(!matrix.is_isolated(2));
    }
}
