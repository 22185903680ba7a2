//! Headless simulation of a small drone hunting a flock of birds.
//!
//! Birds fly a five-state behavioral machine (cruising, soaring, gliding,
//! perched, taking off) driven by an energy budget, and flock boids-style
//! while cruising. A single drone picks a target among the airborne birds
//! and pursues it, either greedily or with a controller that anneals from
//! noisy exploration to lead pursuit.

pub mod behavior;
pub mod bird;
pub mod config;
pub mod error;
pub mod flock;
pub mod report;
pub mod sim;
pub mod terrain;
pub mod uav;
pub mod world;

pub use config::ScenarioConfig;
pub use error::{ConfigError, SimError};
pub use sim::Simulation;
