//! Visiting order for a single vehicle starting at the project location.
//!
//! Index 0 of the matrix is always the origin. The order is built greedily
//! (nearest neighbour) and then improved with 2-opt segment reversals. Both
//! phases break ties by lower index so the same matrix always yields the same
//! order.

use model::matrix::DistanceMatrix;

use crate::{PlanningResult, ValidationError};

/// Minimum improvement for a 2-opt move to count, so float noise can not
/// make the search flip back and forth.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct SequencerOptions {
    pub two_opt: bool,
    /// Upper bound on improvement passes.
    pub two_opt_iterations: usize,
    /// Close the tour with a leg back to the origin.
    pub return_to_origin: bool,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            two_opt: true,
            two_opt_iterations: 100,
            return_to_origin: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// Matrix indices in visiting order, starting with 0.
    pub order: Vec<usize>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    /// Legs (including the closing one) without a known cost.
    pub unknown_legs: usize,
    /// True only when the order is provably the best one.
    pub optimal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TourCost {
    unknown_legs: usize,
    distance: f64,
}

impl TourCost {
    /// Fewer unknown legs always wins, then shorter distance.
    fn better_than(&self, other: &TourCost) -> bool {
        self.unknown_legs < other.unknown_legs
            || (self.unknown_legs == other.unknown_legs && self.distance < other.distance - EPSILON)
    }
}

fn legs<'a>(order: &'a [usize], closed: bool) -> impl Iterator<Item = (usize, usize)> + 'a {
    let closing = match (closed, order.first(), order.last()) {
        (true, Some(&first), Some(&last)) if order.len() > 1 => Some((last, first)),
        _ => None,
    };
    order.windows(2).map(|leg| (leg[0], leg[1])).chain(closing)
}

fn tour_cost(matrix: &DistanceMatrix, order: &[usize], closed: bool) -> TourCost {
    legs(order, closed).fold(
        TourCost {
            unknown_legs: 0,
            distance: 0.0,
        },
        |mut cost, (from, to)| {
            if matrix.is_known(from, to) {
                cost.distance += matrix.distance(from, to);
            } else {
                cost.unknown_legs += 1;
            }
            cost
        },
    )
}

/// Visits the closest unvisited location next. Locations without any known
/// edge are left out of the greedy walk and appended in input order.
fn nearest_neighbour(matrix: &DistanceMatrix) -> Vec<usize> {
    let size = matrix.size();
    let (isolated, mut remaining): (Vec<usize>, Vec<usize>) =
        (1..size).partition(|&index| matrix.is_isolated(index));

    let mut order = Vec::with_capacity(size);
    order.push(0);
    let mut current = 0;
    while !remaining.is_empty() {
        let mut best = 0;
        for position in 1..remaining.len() {
            if matrix.distance(current, remaining[position])
                < matrix.distance(current, remaining[best])
            {
                best = position;
            }
        }
        current = remaining.remove(best);
        order.push(current);
    }

    order.extend(isolated);
    order
}

/// Applies the first improving segment reversal among the first `movable`
/// positions. Returns whether the order changed.
fn two_opt_improve(
    matrix: &DistanceMatrix,
    order: &mut [usize],
    movable: usize,
    closed: bool,
) -> bool {
    if movable < 3 {
        return false;
    }
    let current = tour_cost(matrix, order, closed);

    for i in 0..movable - 1 {
        for j in i + 2..movable {
            order[i + 1..=j].reverse();
            if tour_cost(matrix, order, closed).better_than(&current) {
                return true;
            }
            order[i + 1..=j].reverse();
        }
    }
    false
}

pub fn sequence(matrix: &DistanceMatrix, options: &SequencerOptions) -> PlanningResult<Sequence> {
    let size = matrix.size();
    if size < 2 {
        return Err(ValidationError::EmptyStopList.into());
    }

    let mut order = nearest_neighbour(matrix);
    let movable = size - (1..size).filter(|&index| matrix.is_isolated(index)).count();

    let mut passes = 0;
    if options.two_opt {
        while passes < options.two_opt_iterations
            && two_opt_improve(matrix, &mut order, movable, options.return_to_origin)
        {
            passes += 1;
        }
    }

    let cost = tour_cost(matrix, &order, options.return_to_origin);
    let total_duration_seconds = legs(&order, options.return_to_origin)
        .filter(|&(from, to)| matrix.is_known(from, to))
        .map(|(from, to)| matrix.duration(from, to))
        .sum();

    let suppliers = size - 1;
    let optimal =
        cost.unknown_legs == 0 && (suppliers == 1 || (suppliers == 2 && options.two_opt));

    log::debug!(
        "Sequenced {suppliers} stop(s) in {passes} improvement pass(es): {:.0} m, {} unknown leg(s)",
        cost.distance,
        cost.unknown_legs
    );

    Ok(Sequence {
        order,
        total_distance_meters: cost.distance,
        total_duration_seconds,
        unknown_legs: cost.unknown_legs,
        optimal,
    })
}
