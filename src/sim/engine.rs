use macroquad::prelude::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::bird::{Bird, Steering};
use crate::config::{ControllerKind, Formation, NeighborStrategy, ScenarioConfig};
use crate::error::SimError;
use crate::flock::{Flock, SwarmDrift};
use crate::report::{FrameReport, RunSummary, StateCounts};
use crate::sim::utils::steering;
use crate::uav::{GreedyController, LearningController, PursuitController, UavBody};
use crate::world::{Environment, WindModel, WorldBounds};
use super::{BruteForceNeighborSearch, NeighborSearch, SpatialHashNeighborSearch};

const DEFAULT_CAPTURE_RADIUS: f32 = 15.0;

pub struct Simulation {
    flock: Flock,
    env: Environment,
    uav: Box<dyn PursuitController>,
    neighbors: Box<dyn NeighborSearch>,
    rng: StdRng,
    frame: u64,
    last_wind: Vec2,
    capture_radius: f32,
}

impl Simulation {
    pub fn new(
        flock: Flock,
        env: Environment,
        uav: Box<dyn PursuitController>,
        neighbors: Box<dyn NeighborSearch>,
        rng: StdRng,
    ) -> Self {
        Self {
            flock,
            env,
            uav,
            neighbors,
            rng,
            frame: 0,
            last_wind: Vec2::ZERO,
            capture_radius: DEFAULT_CAPTURE_RADIUS,
        }
    }

    /// Builds the whole scenario, drawing every random initial condition from
    /// a single generator seeded with `config.run.seed`.
    pub fn from_config(config: &ScenarioConfig) -> Result<Self, SimError> {
        config.validate()?;

        let bounds = WorldBounds::new(config.world.width, config.world.height)?;
        let mut rng = StdRng::seed_from_u64(config.run.seed);

        let mut env = Environment::new(bounds);
        if let Some(perches) = &config.world.perches {
            env.perches = perches.iter().copied().map(Vec2::from_array).collect();
        }
        for &at in &config.world.thermals {
            env.add_thermal(Vec2::from_array(at));
        }
        for _ in 0..config.world.random_thermals {
            env.add_random_thermal(&mut rng);
        }
        env.wind = WindModel::new(
            Vec2::new(config.wind.x, config.wind.y),
            config.wind.gust_stddev,
        )?;

        let params = config.flock.params;
        let mut flock = match config.flock.formation {
            Formation::Scattered => Flock::scattered(config.flock.birds, &bounds, params, &mut rng),
            Formation::Ring => Flock::ring(config.flock.birds, &bounds, params, &mut rng),
        };
        if config.flock.swarm_drift {
            flock = flock.with_drift(SwarmDrift::default());
        }

        let start = config.uav.start.map(Vec2::from_array).unwrap_or(bounds.center());
        let body = UavBody::new(start, bounds.center(), config.uav.params);
        let uav: Box<dyn PursuitController> = match config.uav.controller {
            ControllerKind::Greedy => Box::new(GreedyController::new(body)),
            ControllerKind::Learning => Box::new(LearningController::new(body, config.uav.learning)),
        };

        let neighbors: Box<dyn NeighborSearch> = match config.flock.neighbors {
            NeighborStrategy::BruteForce => Box::new(BruteForceNeighborSearch),
            NeighborStrategy::SpatialHash => {
                Box::new(SpatialHashNeighborSearch::new(params.query_radius()))
            }
        };

        let mut sim = Self::new(flock, env, uav, neighbors, rng);
        sim.capture_radius = config.run.capture_radius;
        Ok(sim)
    }

    pub fn with_capture_radius(mut self, radius: f32) -> Self {
        self.capture_radius = radius;
        self
    }

    pub fn algo_name(&self) -> &'static str {
        self.neighbors.name()
    }

    pub fn birds(&self) -> &[Bird] {
        &self.flock.birds
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn uav(&self) -> &dyn PursuitController {
        self.uav.as_ref()
    }

    /// Spawns one more bird; existing indices stay valid.
    pub fn add_bird(&mut self) -> usize {
        let index = self.flock.add_bird(&self.env.bounds, &mut self.rng);
        info!(index, total = self.flock.len(), "bird added");
        index
    }

    pub fn add_thermal(&mut self) -> Vec2 {
        let at = self.env.add_random_thermal(&mut self.rng);
        info!(x = at.x, y = at.y, "thermal added");
        at
    }

    /// Advances birds and drone by one frame.
    ///
    /// Flocking forces are gathered in parallel from the positions at the
    /// start of the frame; state machines and the drone then run
    /// sequentially against the shared generator so runs stay reproducible.
    pub fn step(&mut self) -> FrameReport {
        let wind = self.env.sample_wind(&mut self.rng);
        let params = self.flock.params;
        let radius = params.query_radius();
        let n = self.flock.birds.len();

        let mut forces = vec![Steering::default(); n];
        {
            let birds_snapshot = &self.flock.birds;
            self.neighbors.rebuild(birds_snapshot);
            let neighbors = &self.neighbors;
            let bounds = &self.env.bounds;
            forces
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, force)| {
                    let near = neighbors.neighbors(birds_snapshot, radius, i);
                    *force = steering(i, birds_snapshot, &near, bounds, &params);
                });
        }

        if let Some(drift) = self.flock.drift.as_mut() {
            drift.advance(&mut self.rng);
        }

        let rng = &mut self.rng;
        for (idx, bird) in self.flock.birds.iter_mut().enumerate() {
            if let Some(t) = bird.update(&forces[idx], &self.env, wind, &params, rng) {
                debug!(bird = idx, from = %t.from, to = %t.to, energy = bird.energy, "bird changed state");
            }
        }

        if let Some(drift) = &self.flock.drift {
            drift.apply(&mut self.flock.birds);
        }

        self.uav.update(&self.flock.birds, &mut self.rng);

        self.frame += 1;
        self.last_wind = wind;
        let report = self.report();
        trace!(frame = report.frame, target = ?report.uav.target, "frame stepped");
        report
    }

    pub fn report(&self) -> FrameReport {
        let uav = self.uav.status();
        let target_distance = self
            .uav
            .target()
            .and_then(|i| self.flock.birds.get(i))
            .map(|bird| self.uav.body().distance_to(bird));

        FrameReport {
            frame: self.frame,
            birds: self.flock.len(),
            states: StateCounts::tally(&self.flock.birds),
            mean_bird_energy: self.flock.mean_energy(),
            wind: self.last_wind.to_array(),
            uav,
            target_distance,
        }
    }

    /// Steps `frames` times, handing each report to `observer`.
    pub fn run(&mut self, frames: u64, mut observer: impl FnMut(&FrameReport)) -> RunSummary {
        info!(
            frames,
            birds = self.flock.len(),
            controller = self.uav.name(),
            neighbor_search = self.algo_name(),
            "simulation started"
        );

        let start = Instant::now();
        let mut step_time = Duration::ZERO;
        let mut capture_frames = 0;
        let mut frames_with_target = 0;
        let mut closest_approach: Option<f32> = None;
        let mut last = None;

        for _ in 0..frames {
            let t0 = Instant::now();
            let report = self.step();
            step_time += t0.elapsed();

            if let Some(d) = report.target_distance {
                frames_with_target += 1;
                closest_approach = Some(closest_approach.map_or(d, |c| c.min(d)));
                if d < self.capture_radius {
                    capture_frames += 1;
                }
            }

            observer(&report);
            last = Some(report);
        }

        let elapsed = start.elapsed();
        let avg_step_ms = if frames == 0 {
            0.0
        } else {
            step_time.as_secs_f64() * 1000.0 / frames as f64
        };

        info!(
            frames,
            capture_frames,
            frames_with_target,
            avg_step_ms,
            "simulation finished"
        );

        RunSummary {
            frames,
            neighbor_search: self.algo_name(),
            capture_frames,
            closest_approach,
            frames_with_target,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            avg_step_ms,
            last,
        }
    }
}
