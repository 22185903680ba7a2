use serde::{Deserialize, Serialize};

/// Tunables shared by every bird in a flock. All rates are per frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightParams {
    pub min_speed: f32,

    pub energy_consumption_rate: f32,
    pub gliding_consumption_factor: f32,
    pub soaring_energy_gain: f32,
    pub rest_energy_gain: f32,

    pub separation_radius: f32,
    pub neighbor_radius: f32,
    pub cohesion_factor: f32,
    pub weight_separation: f32,

    pub edge_margin: f32,
    pub edge_force_factor: f32,
    pub weight_bounds: f32,

    pub wind_factor: f32,

    pub thermal_radius: f32,
    pub perch_radius: f32,
    pub perch_energy_threshold: f32,
    pub takeoff_energy_threshold: f32,
    pub takeoff_frames: u32,
    pub soar_probability: f64,
    pub glide_probability: f64,
    pub glide_min_altitude: f32,
    pub perch_frames_min: u32,
    pub perch_frames_max: u32,
    pub lingering_frames_min: u32,
    pub lingering_frames_max: u32,

    pub soaring_speed: f32,
    pub soaring_turn_rate: f32,
    pub soaring_climb: f32,
    pub soaring_ceiling: f32,
    pub gliding_floor: f32,
    pub gliding_decay: f32,
    pub takeoff_climb: f32,
    pub takeoff_ceiling: f32,
}

impl Default for FlightParams {
    fn default() -> Self {
        Self {
            min_speed: 5.0,
            energy_consumption_rate: 0.1,
            gliding_consumption_factor: 0.3,
            soaring_energy_gain: 0.2,
            rest_energy_gain: 0.3,
            separation_radius: 25.0,
            neighbor_radius: 50.0,
            cohesion_factor: 0.01,
            weight_separation: 2.0,
            edge_margin: 50.0,
            edge_force_factor: 0.1,
            weight_bounds: 1.5,
            wind_factor: 0.1,
            thermal_radius: 50.0,
            perch_radius: 30.0,
            perch_energy_threshold: 30.0,
            takeoff_energy_threshold: 70.0,
            takeoff_frames: 30,
            soar_probability: 0.1,
            glide_probability: 0.05,
            glide_min_altitude: 100.0,
            perch_frames_min: 100,
            perch_frames_max: 200,
            lingering_frames_min: 100,
            lingering_frames_max: 200,
            soaring_speed: 3.0,
            soaring_turn_rate: 0.1,
            soaring_climb: 2.0,
            soaring_ceiling: 500.0,
            gliding_floor: 50.0,
            gliding_decay: 0.99,
            takeoff_climb: 3.0,
            takeoff_ceiling: 100.0,
        }
    }
}

impl FlightParams {
    /// Radius the neighbour search has to cover so both separation and
    /// alignment/cohesion see everything they need.
    pub fn query_radius(&self) -> f32 {
        self.neighbor_radius.max(self.separation_radius)
    }

    /// Returns a description of the first inconsistent field, if any.
    pub fn check(&self) -> Result<(), String> {
        if self.min_speed < 0.0 {
            return Err("min_speed must be non-negative".into());
        }
        if self.neighbor_radius <= 0.0 || self.separation_radius <= 0.0 {
            return Err("neighbour radii must be positive".into());
        }
        if self.perch_frames_min > self.perch_frames_max {
            return Err("perch_frames_min exceeds perch_frames_max".into());
        }
        if self.lingering_frames_min > self.lingering_frames_max {
            return Err("lingering_frames_min exceeds lingering_frames_max".into());
        }
        if self.takeoff_frames == 0 {
            return Err("takeoff_frames must be at least 1".into());
        }
        for (name, p) in [
            ("soar_probability", self.soar_probability),
            ("glide_probability", self.glide_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{name} must lie in [0, 1]"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let params = FlightParams::default();
        assert!(params.check().is_ok());
        assert_eq!(params.query_radius(), 50.0);
    }

    #[test]
    fn inverted_perch_range_is_rejected() {
        let params = FlightParams {
            perch_frames_min: 300,
            ..FlightParams::default()
        };
        assert!(params.check().is_err());
    }
}
