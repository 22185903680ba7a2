use std::fmt;

use macroquad::prelude::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::behavior::FlightParams;
use crate::world::Environment;

pub const MAX_ENERGY: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BirdState {
    Cruising,
    Soaring,
    Gliding,
    Perched,
    TakingOff,
}

impl BirdState {
    pub const ALL: [BirdState; 5] = [
        BirdState::Cruising,
        BirdState::Soaring,
        BirdState::Gliding,
        BirdState::Perched,
        BirdState::TakingOff,
    ];

    pub fn is_airborne(self) -> bool {
        self != BirdState::Perched
    }
}

impl fmt::Display for BirdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BirdState::Cruising => "CRUISING",
            BirdState::Soaring => "SOARING",
            BirdState::Gliding => "GLIDING",
            BirdState::Perched => "PERCHED",
            BirdState::TakingOff => "TAKING_OFF",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyBand {
    High,
    Medium,
    Low,
    Critical,
}

impl EnergyBand {
    pub fn of(energy: f32) -> Self {
        if energy > 80.0 {
            EnergyBand::High
        } else if energy > 50.0 {
            EnergyBand::Medium
        } else if energy > 20.0 {
            EnergyBand::Low
        } else {
            EnergyBand::Critical
        }
    }

    /// RGB display colour: green, yellow, orange, red.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            EnergyBand::High => [0, 255, 0],
            EnergyBand::Medium => [255, 255, 0],
            EnergyBand::Low => [255, 128, 0],
            EnergyBand::Critical => [255, 0, 0],
        }
    }
}

/// Per-bird physical characteristics, drawn once at spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BirdTraits {
    pub wingspan: f32,
    pub mass: f32,
    pub max_speed: f32,
    pub glide_ratio: f32,
}

impl BirdTraits {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            wingspan: rng.random_range(1.0..=1.5),
            mass: rng.random_range(0.3..=0.5),
            max_speed: rng.random_range(10.0..=15.0),
            glide_ratio: rng.random_range(12.0..=15.0),
        }
    }
}

/// Raw flocking inputs for one bird, gathered from the frame snapshot.
/// Weighting happens in [`Bird::update`] so it sees the bird's current energy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Steering {
    pub separation: Vec2,
    pub alignment: Vec2,
    pub cohesion: Vec2,
    pub bounds: Vec2,
}

impl Steering {
    pub fn combine(&self, energy: f32, params: &FlightParams) -> Vec2 {
        let energy_factor = energy / MAX_ENERGY;
        self.separation * params.weight_separation
            + self.alignment * energy_factor
            + self.cohesion * energy_factor
            + self.bounds * params.weight_bounds
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub from: BirdState,
    pub to: BirdState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bird {
    pub pos: Vec2,
    pub vel: Vec2,
    pub altitude: f32,
    pub heading: f32,
    pub traits: BirdTraits,
    pub energy: f32,
    pub state: BirdState,
    pub state_duration: u32,
    pub perch_timer: i32,
}

impl Bird {
    pub fn spawn(pos: Vec2, vel: Vec2, rng: &mut impl Rng) -> Self {
        let altitude = rng.random_range(50..=200) as f32;
        let traits = BirdTraits::random(rng);
        Self::with_traits(pos, vel, altitude, traits)
    }

    pub fn with_traits(pos: Vec2, vel: Vec2, altitude: f32, traits: BirdTraits) -> Self {
        Self {
            pos,
            vel,
            altitude,
            heading: vel.y.atan2(vel.x),
            traits,
            energy: MAX_ENERGY,
            state: BirdState::Cruising,
            state_duration: 0,
            perch_timer: 0,
        }
    }

    pub fn energy_band(&self) -> EnergyBand {
        EnergyBand::of(self.energy)
    }

    pub fn color(&self) -> [u8; 3] {
        self.energy_band().rgb()
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Advances the bird by one frame. Returns the state change, if any.
    pub fn update(
        &mut self,
        steering: &Steering,
        env: &Environment,
        wind: Vec2,
        params: &FlightParams,
        rng: &mut impl Rng,
    ) -> Option<Transition> {
        self.state_duration += 1;

        self.update_energy(params);
        let transition = self.update_state(env, params, rng);

        match self.state {
            BirdState::Perched => self.perch(),
            BirdState::Soaring => self.soar(params),
            BirdState::Gliding => self.glide(params),
            BirdState::TakingOff => self.take_off(params),
            BirdState::Cruising => self.cruise(steering, params),
        }

        self.vel += wind * params.wind_factor;

        if self.state.is_airborne() {
            self.pos = env.bounds.clamp(self.pos + self.vel);
            if self.vel.length_squared() > 1e-6 {
                self.heading = self.vel.y.atan2(self.vel.x);
            }
        }

        transition
    }

    fn update_energy(&mut self, params: &FlightParams) {
        let delta = match self.state {
            BirdState::Perched => params.rest_energy_gain,
            BirdState::Soaring => params.soaring_energy_gain,
            BirdState::Gliding => -params.energy_consumption_rate * params.gliding_consumption_factor,
            BirdState::Cruising | BirdState::TakingOff => -params.energy_consumption_rate,
        };
        self.energy = (self.energy + delta).clamp(0.0, MAX_ENERGY);
    }

    fn update_state(
        &mut self,
        env: &Environment,
        params: &FlightParams,
        rng: &mut impl Rng,
    ) -> Option<Transition> {
        let next = match self.state {
            BirdState::Perched => {
                if self.perch_timer <= 0 && self.energy > params.takeoff_energy_threshold {
                    Some(BirdState::TakingOff)
                } else {
                    None
                }
            }
            BirdState::TakingOff => {
                if self.state_duration > params.takeoff_frames {
                    Some(BirdState::Cruising)
                } else {
                    None
                }
            }
            BirdState::Cruising | BirdState::Soaring | BirdState::Gliding => {
                // First matching rule wins; probabilities are only drawn when
                // their precondition holds.
                if self.energy < params.perch_energy_threshold
                    && env.near_perch(self.pos, params.perch_radius)
                {
                    self.perch_timer = rng
                        .random_range(params.perch_frames_min..=params.perch_frames_max)
                        as i32;
                    self.vel = Vec2::ZERO;
                    Some(BirdState::Perched)
                } else if env.near_thermal(self.pos, params.thermal_radius)
                    && rng.random_bool(params.soar_probability)
                {
                    Some(BirdState::Soaring)
                } else if self.altitude > params.glide_min_altitude
                    && rng.random_bool(params.glide_probability)
                {
                    Some(BirdState::Gliding)
                } else if matches!(self.state, BirdState::Soaring | BirdState::Gliding)
                    && self.state_duration
                        > rng.random_range(params.lingering_frames_min..=params.lingering_frames_max)
                {
                    Some(BirdState::Cruising)
                } else {
                    None
                }
            }
        };

        let to = next.filter(|&s| s != self.state)?;
        let from = self.state;
        self.state = to;
        self.state_duration = 0;
        Some(Transition { from, to })
    }

    fn perch(&mut self) {
        self.perch_timer -= 1;
        self.vel = Vec2::ZERO;
        self.altitude = 0.0;
    }

    fn soar(&mut self, params: &FlightParams) {
        self.altitude = (self.altitude + params.soaring_climb).min(params.soaring_ceiling);
        let angle = self.state_duration as f32 * params.soaring_turn_rate;
        self.vel = Vec2::from_angle(angle) * params.soaring_speed;
    }

    fn glide(&mut self, params: &FlightParams) {
        self.altitude = (self.altitude - params.min_speed / self.traits.glide_ratio)
            .max(params.gliding_floor);
        let speed = params.min_speed.max(self.speed() * params.gliding_decay);
        self.vel = Vec2::from_angle(self.heading) * speed;
    }

    fn take_off(&mut self, params: &FlightParams) {
        self.altitude = (self.altitude + params.takeoff_climb).min(params.takeoff_ceiling);
        let speed =
            self.traits.max_speed * (self.state_duration as f32 / params.takeoff_frames as f32);
        self.vel = Vec2::from_angle(self.heading) * speed;
    }

    fn cruise(&mut self, steering: &Steering, params: &FlightParams) {
        self.vel += steering.combine(self.energy, params);

        let speed = self.speed();
        let max_speed = self.traits.max_speed * (self.energy / MAX_ENERGY);
        if speed > max_speed {
            self.vel = self.vel / speed * max_speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldBounds;
    use rand::{SeedableRng, rngs::StdRng};

    fn traits() -> BirdTraits {
        BirdTraits { wingspan: 1.2, mass: 0.4, max_speed: 12.0, glide_ratio: 12.5 }
    }

    fn env() -> Environment {
        Environment::new(WorldBounds { w: 800.0, h: 600.0 })
    }

    fn still_params() -> FlightParams {
        FlightParams {
            soar_probability: 0.0,
            glide_probability: 0.0,
            ..FlightParams::default()
        }
    }

    #[test]
    fn energy_bands_follow_thresholds() {
        assert_eq!(EnergyBand::of(100.0), EnergyBand::High);
        assert_eq!(EnergyBand::of(80.0), EnergyBand::Medium);
        assert_eq!(EnergyBand::of(50.0), EnergyBand::Low);
        assert_eq!(EnergyBand::of(20.0), EnergyBand::Critical);
        assert_eq!(EnergyBand::Critical.rgb(), [255, 0, 0]);
    }

    #[test]
    fn color_tracks_energy_band() {
        let mut bird = Bird::with_traits(Vec2::new(400.0, 300.0), Vec2::new(1.0, 0.0), 80.0, traits());
        for (energy, rgb) in [
            (90.0, [0, 255, 0]),
            (60.0, [255, 255, 0]),
            (30.0, [255, 128, 0]),
            (10.0, [255, 0, 0]),
        ] {
            bird.energy = energy;
            assert_eq!(bird.color(), rgb, "energy {energy}");
        }
    }

    #[test]
    fn cruising_drains_energy_and_moves() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = still_params();
        let mut bird = Bird::with_traits(Vec2::new(400.0, 300.0), Vec2::new(2.0, 0.0), 80.0, traits());
        let t = bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert!(t.is_none());
        assert!((bird.energy - 99.9).abs() < 1e-4);
        assert_eq!(bird.pos, Vec2::new(402.0, 300.0));
        assert_eq!(bird.state_duration, 1);
    }

    #[test]
    fn tired_bird_near_perch_lands_and_rests() {
        let mut rng = StdRng::seed_from_u64(2);
        let params = still_params();
        let mut bird = Bird::with_traits(Vec2::new(105.0, 100.0), Vec2::new(3.0, 1.0), 80.0, traits());
        bird.energy = 10.0;

        let t = bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert_eq!(t, Some(Transition { from: BirdState::Cruising, to: BirdState::Perched }));
        assert_eq!(bird.vel, Vec2::ZERO);
        assert_eq!(bird.altitude, 0.0);
        assert_eq!(bird.pos, Vec2::new(105.0, 100.0));
        assert!((99..=199).contains(&bird.perch_timer));

        let before = bird.energy;
        bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert!((bird.energy - before - params.rest_energy_gain).abs() < 1e-4);
        assert_eq!(bird.pos, Vec2::new(105.0, 100.0));
    }

    #[test]
    fn perched_bird_takes_off_once_rested_and_timer_expired() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = still_params();
        let mut bird = Bird::with_traits(Vec2::new(105.0, 100.0), Vec2::new(1.0, 0.0), 0.0, traits());
        bird.state = BirdState::Perched;
        bird.perch_timer = 0;
        bird.energy = 69.0;

        bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert_eq!(bird.state, BirdState::Perched);

        bird.energy = 75.0;
        let t = bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert_eq!(t.map(|t| t.to), Some(BirdState::TakingOff));
        assert_eq!(bird.state_duration, 0);
        assert_eq!(bird.altitude, 3.0);
    }

    #[test]
    fn takeoff_ramps_up_then_cruises() {
        let mut rng = StdRng::seed_from_u64(4);
        let params = still_params();
        let mut bird = Bird::with_traits(Vec2::new(400.0, 300.0), Vec2::new(1.0, 0.0), 20.0, traits());
        bird.state = BirdState::TakingOff;

        bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert!((bird.speed() - 12.0 / 30.0).abs() < 1e-4);

        for _ in 0..30 {
            bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        }
        assert_eq!(bird.state, BirdState::Cruising);
        assert_eq!(bird.altitude, params.takeoff_ceiling);
    }

    #[test]
    fn thermal_always_triggers_soaring_with_certain_probability() {
        let mut rng = StdRng::seed_from_u64(5);
        let params = FlightParams { soar_probability: 1.0, glide_probability: 0.0, ..FlightParams::default() };
        let mut env = env();
        env.add_thermal(Vec2::new(400.0, 300.0));
        let mut bird = Bird::with_traits(Vec2::new(410.0, 300.0), Vec2::new(1.0, 0.0), 90.0, traits());

        let t = bird.update(&Steering::default(), &env, Vec2::ZERO, &params, &mut rng);
        assert_eq!(t.map(|t| t.to), Some(BirdState::Soaring));
        assert_eq!(bird.altitude, 92.0);
        assert!((bird.speed() - params.soaring_speed).abs() < 1e-4);
    }

    #[test]
    fn gliding_descends_but_never_below_floor() {
        let mut rng = StdRng::seed_from_u64(6);
        let params = still_params();
        let mut bird = Bird::with_traits(Vec2::new(400.0, 300.0), Vec2::new(0.0, 1.0), 50.2, traits());
        bird.state = BirdState::Gliding;

        bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert_eq!(bird.altitude, params.gliding_floor);
        assert!(bird.speed() >= params.min_speed - 1e-4);
    }

    #[test]
    fn cruising_speed_is_capped_by_energy() {
        let mut rng = StdRng::seed_from_u64(7);
        let params = still_params();
        let mut bird = Bird::with_traits(Vec2::new(400.0, 300.0), Vec2::new(50.0, 0.0), 80.0, traits());
        bird.energy = 50.1;
        bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert!((bird.speed() - 12.0 * 0.5).abs() < 1e-3);
    }

    #[test]
    fn wind_pushes_and_position_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(8);
        let params = still_params();
        let mut bird = Bird::with_traits(Vec2::new(799.0, 1.0), Vec2::new(5.0, -5.0), 80.0, traits());
        bird.update(&Steering::default(), &env(), Vec2::new(10.0, 0.0), &params, &mut rng);
        assert_eq!(bird.pos, Vec2::new(800.0, 0.0));
    }

    #[test]
    fn gliding_returns_to_cruising_after_lingering() {
        let mut rng = StdRng::seed_from_u64(9);
        let params = FlightParams {
            lingering_frames_min: 10,
            lingering_frames_max: 10,
            ..still_params()
        };
        let mut bird = Bird::with_traits(Vec2::new(400.0, 300.0), Vec2::new(1.0, 0.0), 50.0, traits());
        bird.state = BirdState::Gliding;

        for _ in 0..10 {
            let t = bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
            assert!(t.is_none());
        }
        let t = bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert_eq!(t, Some(Transition { from: BirdState::Gliding, to: BirdState::Cruising }));
        assert_eq!(bird.state_duration, 0);
    }

    #[test]
    fn high_cruiser_starts_gliding() {
        let mut rng = StdRng::seed_from_u64(10);
        let params = FlightParams { glide_probability: 1.0, ..still_params() };
        let mut bird = Bird::with_traits(Vec2::new(400.0, 300.0), Vec2::new(2.0, 0.0), 150.0, traits());

        let t = bird.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert_eq!(t, Some(Transition { from: BirdState::Cruising, to: BirdState::Gliding }));
        assert!((bird.altitude - 149.6).abs() < 1e-4);

        let mut low = Bird::with_traits(Vec2::new(400.0, 300.0), Vec2::new(2.0, 0.0), 100.0, traits());
        let t = low.update(&Steering::default(), &env(), Vec2::ZERO, &params, &mut rng);
        assert!(t.is_none());
    }

    #[test]
    fn perching_wins_over_a_thermal() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = FlightParams { soar_probability: 1.0, ..still_params() };
        let mut env = env();
        env.add_thermal(Vec2::new(100.0, 100.0));
        let mut bird = Bird::with_traits(Vec2::new(105.0, 100.0), Vec2::new(1.0, 0.0), 80.0, traits());
        bird.energy = 10.0;

        let t = bird.update(&Steering::default(), &env, Vec2::ZERO, &params, &mut rng);
        assert_eq!(t.map(|t| t.to), Some(BirdState::Perched));
    }

    #[test]
    fn added_perch_is_a_landing_site() {
        let mut rng = StdRng::seed_from_u64(12);
        let params = still_params();
        let mut env = env();
        assert!(!env.near_perch(Vec2::new(510.0, 400.0), params.perch_radius));
        env.add_perch(Vec2::new(500.0, 400.0));
        assert!(env.near_perch(Vec2::new(510.0, 400.0), params.perch_radius));
        assert!(!env.near_perch(Vec2::new(540.0, 400.0), params.perch_radius));

        let mut bird = Bird::with_traits(Vec2::new(510.0, 400.0), Vec2::new(1.0, 0.0), 80.0, traits());
        bird.energy = 10.0;
        let t = bird.update(&Steering::default(), &env, Vec2::ZERO, &params, &mut rng);
        assert_eq!(t.map(|t| t.to), Some(BirdState::Perched));
    }
}
