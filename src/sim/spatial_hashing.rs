use std::collections::HashMap;

use macroquad::prelude::Vec2;
use crate::bird::Bird;
use super::{NeighborSearch, into_ordered};

/// Spatial hashing–based neighbor search.
///
/// `cell_size` should be on the order of the query radius; larger radii
/// simply scan more rings of cells.
pub struct SpatialHashNeighborSearch {
    pub cell_size: f32,
    grid: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHashNeighborSearch {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            grid: HashMap::new(),
        }
    }

    #[inline]
    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x / self.cell_size).floor() as i32;
        let cy = (pos.y / self.cell_size).floor() as i32;
        (cx, cy)
    }
}

impl NeighborSearch for SpatialHashNeighborSearch {
    fn rebuild(&mut self, birds: &[Bird]) {
        self.grid.clear();

        for (i, bird) in birds.iter().enumerate() {
            let cell = self.cell_of(bird.pos);
            self.grid.entry(cell).or_default().push(i);
        }
    }

    fn neighbors(&self, birds: &[Bird], radius: f32, index: usize) -> Vec<usize> {
        let r2 = radius * radius;
        let pos_i = birds[index].pos;
        let (cx, cy) = self.cell_of(pos_i);

        // If cell_size >= radius, one ring of cells is enough.
        let reach = (radius / self.cell_size).ceil() as i32;

        let mut candidates: Vec<(f32, usize)> = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                let Some(indices) = self.grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &j in indices {
                    if j == index {
                        continue;
                    }
                    let dist2 = birds[j].pos.distance_squared(pos_i);
                    if dist2 < r2 {
                        candidates.push((dist2, j));
                    }
                }
            }
        }

        into_ordered(candidates)
    }

    fn name(&self) -> &'static str {
        "SpatialHash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bird::BirdTraits;
    use crate::sim::BruteForceNeighborSearch;

    fn bird_at(x: f32, y: f32) -> Bird {
        let traits = BirdTraits { wingspan: 1.0, mass: 0.4, max_speed: 12.0, glide_ratio: 13.0 };
        Bird::with_traits(Vec2::new(x, y), Vec2::X, 100.0, traits)
    }

    #[test]
    fn finds_neighbours_across_cell_borders() {
        let birds = vec![bird_at(49.0, 49.0), bird_at(51.0, 51.0), bird_at(120.0, 49.0), bird_at(49.0, 49.0)];
        let mut grid = SpatialHashNeighborSearch::new(50.0);
        grid.rebuild(&birds);
        assert_eq!(grid.neighbors(&birds, 50.0, 0), vec![3, 1]);
        assert_eq!(grid.neighbors(&birds, 50.0, 2), Vec::<usize>::new());
    }

    #[test]
    fn agrees_with_brute_force_on_a_cluster() {
        let birds: Vec<Bird> = (0..60)
            .map(|i| {
                let f = i as f32;
                bird_at(200.0 + (f * 37.0) % 160.0, 150.0 + (f * 53.0) % 140.0)
            })
            .collect();
        let mut grid = SpatialHashNeighborSearch::new(25.0);
        let mut brute = BruteForceNeighborSearch;
        grid.rebuild(&birds);
        brute.rebuild(&birds);
        for i in 0..birds.len() {
            assert_eq!(grid.neighbors(&birds, 50.0, i), brute.neighbors(&birds, 50.0, i));
        }
    }
}
