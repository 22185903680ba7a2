use macroquad::prelude::Vec2;
use rand::Rng;

use crate::behavior::FlightParams;
use crate::bird::Bird;
use crate::world::{WorldBounds, inset_range};

const SPAWN_SPEED: f32 = 2.0;

pub struct Flock {
    pub birds: Vec<Bird>,
    pub params: FlightParams,
    pub drift: Option<SwarmDrift>,
}

fn random_velocity(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(-SPAWN_SPEED..=SPAWN_SPEED),
        rng.random_range(-SPAWN_SPEED..=SPAWN_SPEED),
    )
}

impl Flock {
    pub fn new(birds: Vec<Bird>, params: FlightParams) -> Self {
        Self { birds, params, drift: None }
    }

    /// Birds dropped uniformly inside the world, 100 units clear of the edges.
    pub fn scattered(num: usize, bounds: &WorldBounds, params: FlightParams, rng: &mut impl Rng) -> Self {
        let mut flock = Self::new(Vec::with_capacity(num), params);
        for _ in 0..num {
            flock.add_bird(bounds, rng);
        }
        flock
    }

    /// Birds evenly spaced by angle on a loose ring around the world centre.
    pub fn ring(num: usize, bounds: &WorldBounds, params: FlightParams, rng: &mut impl Rng) -> Self {
        let center = bounds.center();
        let mut birds = Vec::with_capacity(num);

        for i in 0..num {
            let angle = (i as f32 / num as f32) * std::f32::consts::TAU;
            let radius = rng.random_range(50.0..=150.0);
            let pos = bounds.clamp(center + Vec2::from_angle(angle) * radius);
            let vel = random_velocity(rng);
            birds.push(Bird::spawn(pos, vel, rng));
        }

        Self::new(birds, params)
    }

    pub fn with_drift(mut self, drift: SwarmDrift) -> Self {
        self.drift = Some(drift);
        self
    }

    pub fn add_bird(&mut self, bounds: &WorldBounds, rng: &mut impl Rng) -> usize {
        let pos = Vec2::new(inset_range(bounds.w, rng), inset_range(bounds.h, rng));
        let vel = random_velocity(rng);
        self.birds.push(Bird::spawn(pos, vel, rng));
        self.birds.len() - 1
    }

    pub fn len(&self) -> usize {
        self.birds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.birds.is_empty()
    }

    pub fn mean_energy(&self) -> Option<f32> {
        if self.birds.is_empty() {
            return None;
        }
        Some(self.birds.iter().map(|b| b.energy).sum::<f32>() / self.birds.len() as f32)
    }

    pub fn centroid(&self) -> Option<Vec2> {
        if self.birds.is_empty() {
            return None;
        }
        Some(self.birds.iter().map(|b| b.pos).sum::<Vec2>() / self.birds.len() as f32)
    }
}

/// Flock-wide random walk layered on top of individual flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwarmDrift {
    pub velocity: Vec2,
    pub jitter: f32,
    pub max_speed: f32,
    pub influence: f32,
}

impl Default for SwarmDrift {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            jitter: 0.1,
            max_speed: 2.0,
            influence: 0.1,
        }
    }
}

impl SwarmDrift {
    pub fn advance(&mut self, rng: &mut impl Rng) {
        if self.jitter > 0.0 {
            self.velocity += Vec2::new(
                rng.random_range(-self.jitter..=self.jitter),
                rng.random_range(-self.jitter..=self.jitter),
            );
        }
        self.velocity = self.velocity.clamp_length_max(self.max_speed);
    }

    pub fn apply(&self, birds: &mut [Bird]) {
        let push = self.velocity * self.influence;
        for bird in birds.iter_mut() {
            bird.vel += push;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bird::BirdState;
    use rand::{SeedableRng, rngs::StdRng};

    const BOUNDS: WorldBounds = WorldBounds { w: 800.0, h: 600.0 };

    #[test]
    fn scattered_flock_spawns_inside_inset() {
        let mut rng = StdRng::seed_from_u64(11);
        let flock = Flock::scattered(40, &BOUNDS, FlightParams::default(), &mut rng);
        assert_eq!(flock.len(), 40);
        for b in &flock.birds {
            assert!((100.0..=700.0).contains(&b.pos.x));
            assert!((100.0..=500.0).contains(&b.pos.y));
            assert!(b.vel.x.abs() <= 2.0 && b.vel.y.abs() <= 2.0);
            assert!((50.0..=200.0).contains(&b.altitude));
            assert_eq!(b.state, BirdState::Cruising);
        }
    }

    #[test]
    fn ring_flock_surrounds_centre() {
        let mut rng = StdRng::seed_from_u64(12);
        let flock = Flock::ring(12, &BOUNDS, FlightParams::default(), &mut rng);
        let center = BOUNDS.center();
        for b in &flock.birds {
            let r = b.pos.distance(center);
            assert!((49.9..=150.1).contains(&r), "radius {r}");
        }
        assert!(flock.centroid().unwrap().distance(center) < 150.0);
    }

    #[test]
    fn empty_flock_has_no_statistics() {
        let flock = Flock::new(Vec::new(), FlightParams::default());
        assert!(flock.is_empty());
        assert!(flock.mean_energy().is_none());
        assert!(flock.centroid().is_none());
    }

    #[test]
    fn drift_speed_is_capped() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut drift = SwarmDrift { jitter: 5.0, ..SwarmDrift::default() };
        for _ in 0..50 {
            drift.advance(&mut rng);
            assert!(drift.velocity.length() <= drift.max_speed + 1e-4);
        }

        let mut birds = vec![Bird::spawn(Vec2::new(10.0, 10.0), Vec2::ZERO, &mut rng)];
        drift.apply(&mut birds);
        assert!((birds[0].vel - drift.velocity * 0.1).length() < 1e-6);
    }
}
