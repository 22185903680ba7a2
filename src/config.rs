//! Scenario configuration loaded from TOML.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) describes the stock 800x600 demo: five scattered birds, one greedy
//! drone starting at the centre, no wind and no thermals.

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::behavior::FlightParams;
use crate::error::ConfigError;
use crate::uav::{LearningParams, UavParams};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Formation {
    #[default]
    Scattered,
    Ring,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborStrategy {
    #[default]
    BruteForce,
    SpatialHash,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerKind {
    #[default]
    Greedy,
    Learning,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub world: WorldConfig,
    pub flock: FlockConfig,
    pub uav: UavConfig,
    pub wind: WindConfig,
    pub run: RunConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Replaces the built-in perch sites when present. Listed perches must lie
    /// inside the world; the built-in set is used as is, even where a site
    /// falls outside a small world and is never reached.
    pub perches: Option<Vec<[f32; 2]>>,
    pub thermals: Vec<[f32; 2]>,
    /// Extra thermals placed at random after the fixed ones.
    pub random_thermals: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            perches: None,
            thermals: Vec::new(),
            random_thermals: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    pub birds: usize,
    pub formation: Formation,
    pub neighbors: NeighborStrategy,
    pub swarm_drift: bool,
    pub params: FlightParams,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            birds: 5,
            formation: Formation::default(),
            neighbors: NeighborStrategy::default(),
            swarm_drift: false,
            params: FlightParams::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UavConfig {
    pub controller: ControllerKind,
    /// Starting point; the world centre when unset.
    pub start: Option<[f32; 2]>,
    pub params: UavParams,
    pub learning: LearningParams,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    pub x: f32,
    pub y: f32,
    pub gust_stddev: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub frames: u64,
    pub seed: u64,
    /// Emit a frame report every N frames; 0 disables them.
    pub report_every: u64,
    pub capture_radius: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 900,
            seed: 1,
            report_every: 30,
            capture_radius: 15.0,
        }
    }
}

impl ScenarioConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::Validation(msg));

        let (w, h) = (self.world.width, self.world.height);
        if !(w > 0.0 && h > 0.0) {
            return fail(format!("world must have positive size, got {w}x{h}"));
        }
        let inside = |p: &[f32; 2]| (0.0..=w).contains(&p[0]) && (0.0..=h).contains(&p[1]);
        if let Some(bad) = self.world.thermals.iter().find(|p| !inside(*p)) {
            return fail(format!("thermal {bad:?} lies outside the world"));
        }
        if let Some(bad) = self.world.perches.iter().flatten().find(|p| !inside(*p)) {
            return fail(format!("perch {bad:?} lies outside the world"));
        }
        if !(self.wind.gust_stddev >= 0.0) {
            return fail(format!("wind gust_stddev must be non-negative, got {}", self.wind.gust_stddev));
        }
        if !(self.run.capture_radius > 0.0) {
            return fail("run capture_radius must be positive".into());
        }

        self.flock.params.check().or_else(fail)?;
        self.uav.params.check().or_else(fail)?;
        self.uav.learning.check().or_else(fail)?;
        Ok(())
    }
}
