use std::fmt;

use macroquad::prelude::Vec2;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bird::Bird;
use super::{PursuitController, UavBody, UavStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningPhase {
    Exploration,
    Learning,
    Optimization,
}

impl fmt::Display for LearningPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LearningPhase::Exploration => "EXPLORATION",
            LearningPhase::Learning => "LEARNING",
            LearningPhase::Optimization => "OPTIMIZATION",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningParams {
    pub learning_rate: f32,
    pub initial_accuracy: f32,
    pub exploration_frames: u64,
    pub learning_frames: u64,
    pub score_noise: f32,
    pub heading_noise: f32,
    pub learning_bonus: f32,
    pub optimization_bonus: f32,
    pub accuracy_bonus: f32,
    pub learning_lookahead: f32,
    pub optimization_lookahead: f32,
    pub optimization_blend: f32,
    pub optimization_boost: f32,
    pub close_radius: f32,
    pub capture_radius: f32,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            initial_accuracy: 0.5,
            exploration_frames: 300,
            learning_frames: 300,
            score_noise: 50.0,
            heading_noise: 0.3,
            learning_bonus: 20.0,
            optimization_bonus: 50.0,
            accuracy_bonus: 30.0,
            learning_lookahead: 5.0,
            optimization_lookahead: 8.0,
            optimization_blend: 0.8,
            optimization_boost: 0.3,
            close_radius: 30.0,
            capture_radius: 15.0,
        }
    }
}

impl LearningParams {
    pub fn phase_at(&self, frame: u64) -> LearningPhase {
        if frame < self.exploration_frames {
            LearningPhase::Exploration
        } else if frame < self.exploration_frames + self.learning_frames {
            LearningPhase::Learning
        } else {
            LearningPhase::Optimization
        }
    }

    pub fn check(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err("learning_rate must lie in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.initial_accuracy) {
            return Err("initial_accuracy must lie in [0, 1]".into());
        }
        if self.capture_radius > self.close_radius {
            return Err("capture_radius must not exceed close_radius".into());
        }
        if self.score_noise < 0.0 || self.heading_noise < 0.0 {
            return Err("noise amplitudes must be non-negative".into());
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LearningStatus {
    pub phase: LearningPhase,
    pub adaptation_level: f32,
    pub prediction_accuracy: f32,
    pub successful_captures: u64,
    pub total_attempts: u64,
}

/// Greedy pursuit that anneals from noisy exploration to lead pursuit.
///
/// Progress is tracked by two scalars in `[0, 1]`: `adaptation_level` rises
/// while the drone stays close to its target and decays otherwise, and
/// `prediction_accuracy` creeps up once exploration ends. Both bias target
/// scoring and how far ahead of the target the drone aims.
pub struct LearningController {
    body: UavBody,
    target: Option<usize>,
    params: LearningParams,
    phase: LearningPhase,
    phase_timer: u64,
    adaptation_level: f32,
    prediction_accuracy: f32,
    successful_captures: u64,
    total_attempts: u64,
}

impl LearningController {
    pub fn new(body: UavBody, params: LearningParams) -> Self {
        Self {
            body,
            target: None,
            params,
            phase: LearningPhase::Exploration,
            phase_timer: 0,
            adaptation_level: 0.0,
            prediction_accuracy: params.initial_accuracy,
            successful_captures: 0,
            total_attempts: 0,
        }
    }

    pub fn phase(&self) -> LearningPhase {
        self.phase
    }

    pub fn learning_status(&self) -> LearningStatus {
        LearningStatus {
            phase: self.phase,
            adaptation_level: self.adaptation_level,
            prediction_accuracy: self.prediction_accuracy,
            successful_captures: self.successful_captures,
            total_attempts: self.total_attempts,
        }
    }

    fn update_phase(&mut self) {
        self.phase_timer += 1;
        let next = self.params.phase_at(self.phase_timer);
        if next != self.phase {
            debug!(from = %self.phase, to = %next, frame = self.phase_timer, "learning phase advanced");
            self.phase = next;
        }
    }

    fn choose_target(&mut self, birds: &[Bird], rng: &mut StdRng) {
        let p = self.params;
        let phase = self.phase;
        let adaptation = self.adaptation_level;
        let accuracy = self.prediction_accuracy;

        let next = self.body.select_target(birds, |base| match phase {
            LearningPhase::Exploration => base + symmetric(rng, p.score_noise),
            LearningPhase::Learning => base - adaptation * p.learning_bonus,
            LearningPhase::Optimization => {
                base - adaptation * p.optimization_bonus - accuracy * p.accuracy_bonus
            }
        });

        if next != self.target {
            debug!(from = ?self.target, to = ?next, phase = %phase, "learning target changed");
        }
        self.target = next;
    }

    /// Unit direction from the drone to `bird` led by `lookahead` frames.
    fn lead_direction(&self, bird: &Bird, lookahead: f32) -> Option<Vec2> {
        let predicted = bird.pos + bird.vel * lookahead;
        (predicted - self.body.pos).try_normalize()
    }

    fn pursue(&mut self, bird: &Bird, rng: &mut StdRng) {
        let p = self.params;
        let mut dir = (bird.pos - self.body.pos).normalize_or_zero();
        let mut speed = self.body.cruise_speed();

        match self.phase {
            LearningPhase::Exploration => {
                dir += Vec2::new(symmetric(rng, p.heading_noise), symmetric(rng, p.heading_noise));
            }
            LearningPhase::Learning => {
                if let Some(lead) = self.lead_direction(bird, p.learning_lookahead) {
                    dir = dir.lerp(lead, self.adaptation_level);
                }
            }
            LearningPhase::Optimization => {
                if let Some(lead) = self.lead_direction(bird, p.optimization_lookahead) {
                    dir = dir.lerp(lead, p.optimization_blend);
                }
                speed *= 1.0 + self.adaptation_level * p.optimization_boost;
            }
        }

        self.body.vel = dir * speed;
    }

    fn learn(&mut self, birds: &[Bird]) {
        let Some(bird) = self.target.and_then(|i| birds.get(i)) else {
            return;
        };
        let p = self.params;
        let distance = self.body.distance_to(bird);

        if distance < p.close_radius {
            self.adaptation_level = (self.adaptation_level + p.learning_rate).min(1.0);
            if distance < p.capture_radius {
                self.successful_captures += 1;
            }
        } else {
            self.adaptation_level = (self.adaptation_level - p.learning_rate * 0.1).max(0.0);
        }

        if self.phase != LearningPhase::Exploration {
            self.prediction_accuracy =
                (self.prediction_accuracy + p.learning_rate * 0.5).min(1.0);
        }

        self.total_attempts += 1;
    }
}

fn symmetric(rng: &mut impl Rng, amplitude: f32) -> f32 {
    if amplitude > 0.0 {
        rng.random_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}

impl PursuitController for LearningController {
    fn update(&mut self, birds: &[Bird], rng: &mut StdRng) {
        self.body.consume_energy();
        self.update_phase();

        if self.body.needs_target(self.target, birds) {
            self.choose_target(birds, rng);
        }

        match self.target.and_then(|i| birds.get(i)) {
            Some(bird) => self.pursue(bird, rng),
            None => self.body.patrol(),
        }

        self.body.advance();
        self.learn(birds);
    }

    fn body(&self) -> &UavBody {
        &self.body
    }

    fn target(&self) -> Option<usize> {
        self.target
    }

    fn status(&self) -> UavStatus {
        UavStatus {
            learning: Some(self.learning_status()),
            ..UavStatus::of(self.name(), &self.body, self.target)
        }
    }

    fn name(&self) -> &'static str {
        "learning"
    }
}
