use macroquad::prelude::Vec2;

use crate::behavior::FlightParams;
use crate::bird::{Bird, Steering};
use crate::world::WorldBounds;

/// Gathers separation, alignment, cohesion and edge forces for bird `index`
/// from `near`, a list of candidate neighbour indices.
pub fn steering(
    index: usize,
    birds: &[Bird],
    near: &[usize],
    bounds: &WorldBounds,
    params: &FlightParams,
) -> Steering {
    let me = &birds[index];

    let mut separation = Vec2::ZERO;
    let mut separation_count = 0;
    let mut avg_vel = Vec2::ZERO;
    let mut center = Vec2::ZERO;
    let mut flock_count = 0;

    for &j in near {
        if j == index {
            continue;
        }
        let other = &birds[j];
        let dist = me.pos.distance(other.pos);

        if dist > 0.0 && dist < params.separation_radius {
            separation += (me.pos - other.pos) / dist;
            separation_count += 1;
        }

        if dist < params.neighbor_radius {
            avg_vel += other.vel;
            center += other.pos;
            flock_count += 1;
        }
    }

    if separation_count > 0 {
        separation /= separation_count as f32;
    }

    let (alignment, cohesion) = if flock_count > 0 {
        let inv = 1.0 / flock_count as f32;
        (
            avg_vel * inv,
            (center * inv - me.pos) * params.cohesion_factor,
        )
    } else {
        (Vec2::ZERO, Vec2::ZERO)
    };

    Steering {
        separation,
        alignment,
        cohesion,
        bounds: edge_force(me.pos, bounds, params),
    }
}

/// Linear pull back toward the interior once a bird enters the edge margin.
pub fn edge_force(pos: Vec2, bounds: &WorldBounds, params: &FlightParams) -> Vec2 {
    let margin = params.edge_margin;

    let axis = |p: f32, extent: f32| {
        if p < margin {
            margin - p
        } else if p > extent - margin {
            (extent - margin) - p
        } else {
            0.0
        }
    };

    Vec2::new(axis(pos.x, bounds.w), axis(pos.y, bounds.h)) * params.edge_force_factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bird::BirdTraits;

    const BOUNDS: WorldBounds = WorldBounds { w: 800.0, h: 600.0 };

    fn bird(pos: Vec2, vel: Vec2) -> Bird {
        let traits = BirdTraits { wingspan: 1.0, mass: 0.4, max_speed: 12.0, glide_ratio: 13.0 };
        Bird::with_traits(pos, vel, 100.0, traits)
    }

    #[test]
    fn lone_bird_in_the_middle_feels_nothing() {
        let birds = vec![bird(Vec2::new(400.0, 300.0), Vec2::X)];
        let s = steering(0, &birds, &[], &BOUNDS, &FlightParams::default());
        assert_eq!(s, Steering::default());
    }

    #[test]
    fn close_pair_pushes_apart_and_aligns() {
        let birds = vec![
            bird(Vec2::new(400.0, 300.0), Vec2::new(1.0, 0.0)),
            bird(Vec2::new(410.0, 300.0), Vec2::new(0.0, 2.0)),
        ];
        let s = steering(0, &birds, &[1], &BOUNDS, &FlightParams::default());
        assert_eq!(s.separation, Vec2::new(-1.0, 0.0));
        assert_eq!(s.alignment, Vec2::new(0.0, 2.0));
        assert!((s.cohesion - Vec2::new(0.1, 0.0)).length() < 1e-6);
    }

    #[test]
    fn coincident_birds_align_without_separating() {
        let birds = vec![
            bird(Vec2::new(400.0, 300.0), Vec2::X),
            bird(Vec2::new(400.0, 300.0), Vec2::Y),
        ];
        let s = steering(0, &birds, &[1], &BOUNDS, &FlightParams::default());
        assert_eq!(s.separation, Vec2::ZERO);
        assert_eq!(s.alignment, Vec2::Y);
    }

    #[test]
    fn edge_force_points_inward() {
        let params = FlightParams::default();
        assert_eq!(edge_force(Vec2::new(10.0, 300.0), &BOUNDS, &params), Vec2::new(4.0, 0.0));
        assert_eq!(edge_force(Vec2::new(400.0, 590.0), &BOUNDS, &params), Vec2::new(0.0, -4.0));
        assert_eq!(edge_force(Vec2::new(400.0, 300.0), &BOUNDS, &params), Vec2::ZERO);
    }
}
