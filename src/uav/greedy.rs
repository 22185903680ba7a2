use rand::rngs::StdRng;
use tracing::debug;

use crate::bird::Bird;
use super::{PursuitController, UavBody, UavStatus};

/// Chases the best-scoring bird in range, re-choosing only when the current
/// target escapes the search radius.
pub struct GreedyController {
    body: UavBody,
    target: Option<usize>,
}

impl GreedyController {
    pub fn new(body: UavBody) -> Self {
        Self { body, target: None }
    }
}

impl PursuitController for GreedyController {
    fn update(&mut self, birds: &[Bird], _rng: &mut StdRng) {
        self.body.consume_energy();

        if self.body.needs_target(self.target, birds) {
            let next = self.body.select_target(birds, |score| score);
            if next != self.target {
                debug!(from = ?self.target, to = ?next, "greedy target changed");
            }
            self.target = next;
        }

        match self.target.and_then(|i| birds.get(i)) {
            Some(bird) => {
                let speed = self.body.cruise_speed();
                self.body.head_towards(bird.pos, speed);
            }
            None => self.body.patrol(),
        }

        self.body.advance();
    }

    fn body(&self) -> &UavBody {
        &self.body
    }

    fn target(&self) -> Option<usize> {
        self.target
    }

    fn status(&self) -> UavStatus {
        UavStatus::of(self.name(), &self.body, self.target)
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bird::{BirdState, BirdTraits};
    use crate::uav::UavParams;
    use macroquad::prelude::Vec2;
    use rand::SeedableRng;

    fn bird(x: f32, y: f32) -> Bird {
        let traits = BirdTraits { wingspan: 1.0, mass: 0.4, max_speed: 12.0, glide_ratio: 13.0 };
        Bird::with_traits(Vec2::new(x, y), Vec2::X, 100.0, traits)
    }

    fn controller() -> GreedyController {
        let start = Vec2::new(400.0, 300.0);
        GreedyController::new(UavBody::new(start, start, UavParams::default()))
    }

    #[test]
    fn locks_on_and_closes_distance() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut uav = controller();
        let birds = vec![bird(500.0, 300.0)];

        uav.update(&birds, &mut rng);
        assert_eq!(uav.target(), Some(0));
        // Energy 99.95 scales the step just below max speed.
        assert!((uav.body().pos.x - (400.0 + 8.0 * 0.9995)).abs() < 1e-3);
        assert!((uav.body().energy - 99.95).abs() < 1e-4);
        assert!(uav.status().has_target);
    }

    #[test]
    fn keeps_chasing_a_target_that_lands() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut uav = controller();
        let mut birds = vec![bird(450.0, 300.0)];
        uav.update(&birds, &mut rng);

        birds[0].state = BirdState::Perched;
        uav.update(&birds, &mut rng);
        assert_eq!(uav.target(), Some(0));
    }

    #[test]
    fn patrols_when_nothing_is_in_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut uav = controller();
        let birds = vec![bird(50.0, 50.0)];

        uav.update(&birds, &mut rng);
        assert_eq!(uav.target(), None);
        assert!((uav.body().vel.length() - 4.0).abs() < 1e-4);
        assert_eq!(uav.status().controller, "greedy");
    }
}
