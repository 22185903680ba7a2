use serde::Serialize;

use crate::bird::{Bird, BirdState};
use crate::uav::UavStatus;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub cruising: usize,
    pub soaring: usize,
    pub gliding: usize,
    pub perched: usize,
    pub taking_off: usize,
}

impl StateCounts {
    pub fn tally(birds: &[Bird]) -> Self {
        let mut counts = Self::default();
        for bird in birds {
            *counts.slot(bird.state) += 1;
        }
        counts
    }

    pub fn get(&self, state: BirdState) -> usize {
        match state {
            BirdState::Cruising => self.cruising,
            BirdState::Soaring => self.soaring,
            BirdState::Gliding => self.gliding,
            BirdState::Perched => self.perched,
            BirdState::TakingOff => self.taking_off,
        }
    }

    pub fn total(&self) -> usize {
        BirdState::ALL.iter().map(|&s| self.get(s)).sum()
    }

    fn slot(&mut self, state: BirdState) -> &mut usize {
        match state {
            BirdState::Cruising => &mut self.cruising,
            BirdState::Soaring => &mut self.soaring,
            BirdState::Gliding => &mut self.gliding,
            BirdState::Perched => &mut self.perched,
            BirdState::TakingOff => &mut self.taking_off,
        }
    }
}

/// Snapshot emitted after every simulated frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub birds: usize,
    pub states: StateCounts,
    pub mean_bird_energy: Option<f32>,
    pub wind: [f32; 2],
    pub uav: UavStatus,
    /// Distance from the drone to its current target, if it has one.
    pub target_distance: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub neighbor_search: &'static str,
    /// Frames that ended with the drone inside the capture radius of its target.
    pub capture_frames: u64,
    pub closest_approach: Option<f32>,
    pub frames_with_target: u64,
    pub elapsed_ms: f64,
    pub avg_step_ms: f64,
    pub last: Option<FrameReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bird::BirdTraits;
    use macroquad::prelude::Vec2;

    #[test]
    fn tally_counts_every_bird_once() {
        let traits = BirdTraits { wingspan: 1.0, mass: 0.4, max_speed: 12.0, glide_ratio: 13.0 };
        let mut birds: Vec<Bird> = (0..5)
            .map(|i| Bird::with_traits(Vec2::splat(i as f32), Vec2::X, 100.0, traits))
            .collect();
        birds[1].state = BirdState::Perched;
        birds[2].state = BirdState::Perched;
        birds[4].state = BirdState::TakingOff;

        let counts = StateCounts::tally(&birds);
        assert_eq!(counts.cruising, 2);
        assert_eq!(counts.get(BirdState::Perched), 2);
        assert_eq!(counts.taking_off, 1);
        assert_eq!(counts.total(), 5);
    }
}
