//! Procedural farmland heightmap: layered gradient noise with flattened
//! fields and scattered trees on level ground.

use macroquad::prelude::Vec2;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const GRADIENT_TABLE: usize = 100;
const GRADIENT_WRAP: i64 = 99;

/// (scale, amplitude) pairs summed into the final height.
const OCTAVES: [(f32, f32); 3] = [(50.0, 15.0), (20.0, 5.0), (5.0, 2.0)];
const FIELD_SCALE: f32 = 30.0;
const FIELD_THRESHOLD: f32 = 0.3;
const FIELD_FLATTEN: f32 = 0.2;
const TREE_COUNT: usize = 50;
const TREE_MAX_HEIGHT: f32 = 10.0;

/// Table of random unit gradients sampled by lattice coordinate.
struct GradientField {
    gradients: Vec<Vec2>,
}

impl GradientField {
    fn new(rng: &mut impl Rng) -> Self {
        let gradients = (0..GRADIENT_TABLE * GRADIENT_TABLE)
            .map(|_| Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU)))
            .collect();
        Self { gradients }
    }

    fn at(&self, ix: i64, iy: i64) -> Vec2 {
        let x = ix.rem_euclid(GRADIENT_WRAP) as usize;
        let y = iy.rem_euclid(GRADIENT_WRAP) as usize;
        self.gradients[x * GRADIENT_TABLE + y]
    }

    /// Gradient noise at `p / scale`, bilinearly blended between the four
    /// surrounding lattice corners.
    fn noise(&self, p: Vec2, scale: f32) -> f32 {
        let p = p / scale;
        let x0 = p.x.floor();
        let y0 = p.y.floor();
        let (sx, sy) = (p.x - x0, p.y - y0);
        let (ix, iy) = (x0 as i64, y0 as i64);

        let corner = |cx: i64, cy: i64| {
            let offset = Vec2::new(p.x - cx as f32, p.y - cy as f32);
            self.at(cx, cy).dot(offset)
        };

        let top = lerp(corner(ix, iy), corner(ix + 1, iy), sx);
        let bottom = lerp(corner(ix, iy + 1), corner(ix + 1, iy + 1), sx);
        lerp(top, bottom, sy)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

pub struct TerrainGenerator {
    pub size: f32,
    pub resolution: usize,
    /// Row-major `resolution x resolution` heights; row = y, column = x.
    pub heights: Vec<f32>,
    pub trees: Vec<[f32; 3]>,
}

impl TerrainGenerator {
    pub fn new(size: f32, resolution: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let field = GradientField::new(&mut rng);

        let mut heights = Vec::with_capacity(resolution * resolution);
        for row in 0..resolution {
            for col in 0..resolution {
                let p = Vec2::new(axis(size, resolution, col), axis(size, resolution, row));
                let mut z: f32 = OCTAVES
                    .iter()
                    .map(|&(scale, amplitude)| field.noise(p, scale) * amplitude)
                    .sum();
                if field.noise(p, FIELD_SCALE).abs() < FIELD_THRESHOLD {
                    z *= FIELD_FLATTEN;
                }
                heights.push(z);
            }
        }

        let mut terrain = Self { size, resolution, heights, trees: Vec::new() };
        terrain.trees = terrain.place_trees(&mut rng);
        terrain
    }

    pub fn point(&self, row: usize, col: usize) -> [f32; 3] {
        [
            axis(self.size, self.resolution, col),
            axis(self.size, self.resolution, row),
            self.heights[row * self.resolution + col],
        ]
    }

    fn place_trees(&self, rng: &mut impl Rng) -> Vec<[f32; 3]> {
        let level: Vec<[f32; 3]> = (0..self.resolution)
            .flat_map(|row| (0..self.resolution).map(move |col| (row, col)))
            .map(|(row, col)| self.point(row, col))
            .filter(|p| p[2].abs() < TREE_MAX_HEIGHT)
            .collect();

        if level.len() <= TREE_COUNT {
            return level;
        }
        index::sample(rng, level.len(), TREE_COUNT)
            .into_iter()
            .map(|i| level[i])
            .collect()
    }

    pub fn summary(&self) -> TerrainSummary {
        let min = self.heights.iter().copied().fold(f32::INFINITY, f32::min);
        let max = self.heights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let cells = self.heights.len().max(1) as f32;
        let mean = self.heights.iter().sum::<f32>() / cells;
        let level = self.heights.iter().filter(|z| z.abs() < TREE_MAX_HEIGHT).count();

        TerrainSummary {
            size: self.size,
            resolution: self.resolution,
            min_height: if self.heights.is_empty() { 0.0 } else { min },
            max_height: if self.heights.is_empty() { 0.0 } else { max },
            mean_height: mean,
            level_fraction: level as f32 / cells,
            trees: self.trees.clone(),
        }
    }
}

/// Coordinate of grid line `i` on `[-size/2, size/2]`.
fn axis(size: f32, resolution: usize, i: usize) -> f32 {
    if resolution < 2 {
        return -size / 2.0;
    }
    -size / 2.0 + size * i as f32 / (resolution - 1) as f32
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TerrainSummary {
    pub size: f32,
    pub resolution: usize,
    pub min_height: f32,
    pub max_height: f32,
    pub mean_height: f32,
    pub level_fraction: f32,
    pub trees: Vec<[f32; 3]>,
}
