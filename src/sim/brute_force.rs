use crate::bird::Bird;
use super::{NeighborSearch, into_ordered};

pub struct BruteForceNeighborSearch;

impl NeighborSearch for BruteForceNeighborSearch {
    fn rebuild(&mut self, _birds: &[Bird]) {
        // Nothing to rebuild for brute force.
    }

    fn neighbors(&self, birds: &[Bird], radius: f32, index: usize) -> Vec<usize> {
        let r2 = radius * radius;
        let me = birds[index].pos;

        let candidates = birds
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != index)
            .map(|(j, other)| (other.pos.distance_squared(me), j))
            .filter(|&(dist2, _)| dist2 < r2)
            .collect();

        into_ordered(candidates)
    }

    fn name(&self) -> &'static str {
        "BruteForce"
    }
}
