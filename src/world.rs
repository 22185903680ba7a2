use macroquad::prelude::Vec2;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::SimError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    pub w: f32,
    pub h: f32,
}

impl WorldBounds {
    pub fn new(w: f32, h: f32) -> Result<Self, SimError> {
        if !(w > 0.0 && h > 0.0) {
            return Err(SimError::InvalidBounds { w, h });
        }
        Ok(Self { w, h })
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.w * 0.5, self.h * 0.5)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.w && p.y >= 0.0 && p.y <= self.h
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.w), p.y.clamp(0.0, self.h))
    }
}

/// Steady wind plus an optional Gaussian gust drawn once per frame.
#[derive(Clone, Debug)]
pub struct WindModel {
    pub steady: Vec2,
    gust: Option<Normal<f32>>,
}

impl WindModel {
    pub fn calm() -> Self {
        Self { steady: Vec2::ZERO, gust: None }
    }

    pub fn new(steady: Vec2, gust_stddev: f32) -> Result<Self, SimError> {
        let gust = if gust_stddev > 0.0 {
            Some(Normal::new(0.0, gust_stddev).map_err(|_| SimError::InvalidGust(gust_stddev))?)
        } else if gust_stddev == 0.0 {
            None
        } else {
            return Err(SimError::InvalidGust(gust_stddev));
        };
        Ok(Self { steady, gust })
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Vec2 {
        match &self.gust {
            Some(normal) => self.steady + Vec2::new(normal.sample(rng), normal.sample(rng)),
            None => self.steady,
        }
    }
}

/// Everything a bird reacts to that is not another bird.
#[derive(Clone, Debug)]
pub struct Environment {
    pub bounds: WorldBounds,
    pub perches: Vec<Vec2>,
    pub thermals: Vec<Vec2>,
    pub wind: WindModel,
}

pub const DEFAULT_PERCHES: [(f32, f32); 3] = [(100.0, 100.0), (700.0, 500.0), (300.0, 700.0)];

impl Environment {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            perches: DEFAULT_PERCHES.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            thermals: Vec::new(),
            wind: WindModel::calm(),
        }
    }

    pub fn add_thermal(&mut self, at: Vec2) {
        self.thermals.push(at);
    }

    pub fn add_perch(&mut self, at: Vec2) {
        self.perches.push(at);
    }

    /// Drops a thermal at a random spot at least 100 units from the edges.
    pub fn add_random_thermal(&mut self, rng: &mut impl Rng) -> Vec2 {
        let at = Vec2::new(
            inset_range(self.bounds.w, rng),
            inset_range(self.bounds.h, rng),
        );
        self.add_thermal(at);
        at
    }

    pub fn near_thermal(&self, pos: Vec2, radius: f32) -> bool {
        any_within(&self.thermals, pos, radius)
    }

    pub fn near_perch(&self, pos: Vec2, radius: f32) -> bool {
        any_within(&self.perches, pos, radius)
    }

    pub fn sample_wind(&self, rng: &mut impl Rng) -> Vec2 {
        self.wind.sample(rng)
    }
}

fn any_within(points: &[Vec2], pos: Vec2, radius: f32) -> bool {
    let r2 = radius * radius;
    points.iter().any(|p| p.distance_squared(pos) < r2)
}

/// Uniform coordinate in `[100, extent - 100]`, falling back to the whole
/// axis for worlds narrower than 200.
pub(crate) fn inset_range(extent: f32, rng: &mut impl Rng) -> f32 {
    const INSET: f32 = 100.0;
    if extent > 2.0 * INSET {
        rng.random_range(INSET..=extent - INSET)
    } else {
        rng.random_range(0.0..=extent)
    }
}
