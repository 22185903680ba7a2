//! The pursuing drone: a shared kinematic body and the controllers that fly it.

use macroquad::prelude::Vec2;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::bird::{Bird, MAX_ENERGY};

mod greedy;
mod learning;

pub use greedy::GreedyController;
pub use learning::{LearningController, LearningParams, LearningPhase, LearningStatus};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UavParams {
    pub max_speed: f32,
    pub search_radius: f32,
    pub energy_consumption_rate: f32,
    pub patrol_radius: f32,
    pub patrol_speed_factor: f32,
    /// Weight of a candidate's remaining energy in its score, so tired birds rank first.
    pub energy_weight: f32,
}

impl Default for UavParams {
    fn default() -> Self {
        Self {
            max_speed: 8.0,
            search_radius: 150.0,
            energy_consumption_rate: 0.05,
            patrol_radius: 100.0,
            patrol_speed_factor: 0.5,
            energy_weight: 0.5,
        }
    }
}

impl UavParams {
    pub fn check(&self) -> Result<(), String> {
        if self.max_speed <= 0.0 {
            return Err("uav max_speed must be positive".into());
        }
        if self.search_radius <= 0.0 {
            return Err("uav search_radius must be positive".into());
        }
        if self.energy_consumption_rate < 0.0 {
            return Err("uav energy_consumption_rate must be non-negative".into());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UavBody {
    pub pos: Vec2,
    pub vel: Vec2,
    pub energy: f32,
    pub patrol_center: Vec2,
    pub params: UavParams,
}

impl UavBody {
    pub fn new(pos: Vec2, patrol_center: Vec2, params: UavParams) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            energy: MAX_ENERGY,
            patrol_center,
            params,
        }
    }

    pub fn consume_energy(&mut self) {
        self.energy = (self.energy - self.params.energy_consumption_rate).max(0.0);
    }

    pub fn distance_to(&self, bird: &Bird) -> f32 {
        self.pos.distance(bird.pos)
    }

    /// Pursuit speed, scaled down as the battery drains.
    pub fn cruise_speed(&self) -> f32 {
        self.params.max_speed.min(self.params.max_speed * (self.energy / MAX_ENERGY))
    }

    /// Whether the current target must be re-chosen this frame.
    pub fn needs_target(&self, target: Option<usize>, birds: &[Bird]) -> bool {
        match target.and_then(|i| birds.get(i)) {
            Some(bird) => self.distance_to(bird) > self.params.search_radius,
            None => true,
        }
    }

    /// Picks the candidate with the lowest score among airborne birds inside
    /// the search radius. `adjust` receives the base score and may reshape it.
    pub fn select_target(
        &self,
        birds: &[Bird],
        mut adjust: impl FnMut(f32) -> f32,
    ) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;

        for (i, bird) in birds.iter().enumerate() {
            if !bird.state.is_airborne() {
                continue;
            }
            let distance = self.distance_to(bird);
            if distance > self.params.search_radius {
                continue;
            }
            let score = adjust(distance + bird.energy * self.params.energy_weight);
            if best.is_none_or(|(_, s)| score < s) {
                best = Some((i, score));
            }
        }

        best.map(|(i, _)| i)
    }

    /// Heads straight at `goal`, or hovers if already on it.
    pub fn head_towards(&mut self, goal: Vec2, speed: f32) {
        self.vel = (goal - self.pos).normalize_or_zero() * speed;
    }

    /// Loops around the patrol centre at reduced speed.
    pub fn patrol(&mut self) {
        let angle = (self.pos.x + self.pos.y) * 0.01;
        let goal = self.patrol_center + Vec2::from_angle(angle) * self.params.patrol_radius;
        let speed = self.params.max_speed * self.params.patrol_speed_factor;
        self.head_towards(goal, speed);
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UavStatus {
    pub controller: &'static str,
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub energy: f32,
    pub has_target: bool,
    pub target: Option<usize>,
    pub search_radius: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning: Option<LearningStatus>,
}

impl UavStatus {
    pub fn of(controller: &'static str, body: &UavBody, target: Option<usize>) -> Self {
        Self {
            controller,
            position: body.pos.to_array(),
            velocity: body.vel.to_array(),
            energy: body.energy,
            has_target: target.is_some(),
            target,
            search_radius: body.params.search_radius,
            learning: None,
        }
    }
}

/// Drives a [`UavBody`] one frame at a time against the current flock.
pub trait PursuitController: Send {
    fn update(&mut self, birds: &[Bird], rng: &mut StdRng);

    fn body(&self) -> &UavBody;

    fn target(&self) -> Option<usize>;

    fn status(&self) -> UavStatus;

    fn name(&self) -> &'static str;
}
