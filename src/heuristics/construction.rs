use crate::instance::CostMatrix;
use crate::rng::ParkMiller;
use crate::solution::Tour;

pub trait ConstructionHeuristic {
    fn construct(&self, matrix: &CostMatrix, gen: &mut ParkMiller) -> Tour;
    fn name(&self) -> &str;
}

/// Uniformly random tour
///
/// Draws the first vertex among all `n`, then each following vertex
/// uniformly among those not yet placed, accumulating the length as edges
/// are fixed.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTour;

impl RandomTour {
    pub fn new() -> Self {
        RandomTour
    }
}

impl ConstructionHeuristic for RandomTour {
    fn construct(&self, matrix: &CostMatrix, gen: &mut ParkMiller) -> Tour {
        let n = matrix.dimension();
        let mut candidates: Vec<usize> = (0..n).collect();
        let mut order = Vec::with_capacity(n);

        let first = gen.next(n);
        order.push(first);
        candidates[first] = n - 1;
        let mut remaining = n - 1;
        let mut cost = 0;

        for i in 1..n {
            let j = gen.next(remaining);
            order.push(candidates[j]);
            remaining -= 1;
            candidates[j] = candidates[remaining];
            cost += matrix.cost(order[i - 1], order[i]);
        }
        cost += matrix.cost(order[n - 1], order[0]);

        Tour { order, cost }
    }

    fn name(&self) -> &str {
        "Random"
    }
}
