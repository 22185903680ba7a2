use crate::bird::Bird;

/// A pluggable neighbor query that can be swapped without touching the flight logic.
pub trait NeighborSearch: Send + Sync {
    /// Rebuild internal structures based on the current bird positions.
    fn rebuild(&mut self, birds: &[Bird]);

    /// Indices of every other bird strictly within `radius` of `index`,
    /// nearest first, ties broken by index.
    fn neighbors(&self, birds: &[Bird], radius: f32, index: usize) -> Vec<usize>;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;
}

mod brute_force;
mod engine;
mod spatial_hashing;
pub mod utils;

pub use brute_force::BruteForceNeighborSearch;
pub use engine::Simulation;
pub use spatial_hashing::SpatialHashNeighborSearch;

/// Sorts `(dist2, index)` candidates nearest first and drops the distances.
fn into_ordered(mut candidates: Vec<(f32, usize)>) -> Vec<usize> {
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    candidates.into_iter().map(|(_, idx)| idx).collect()
}
