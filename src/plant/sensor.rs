//! sensor.rs
//! Simulated angle sensor with the bench sensor's conditioning chain:
//! additive noise, 8-sample moving average, dead zone near zero, offset,
//! clamp to the actuation domain.
//!
//! A stalled conversion on the real rig reads as 0 deg; `read_stalled`
//! reproduces that so the known engine gap (a zero reading is treated as a
//! legitimate angle) stays visible in tests.

use std::collections::VecDeque;

use rand::random_range;

const WINDOW_SIZE: usize = 8;
const DEAD_ZONE_DEG: f64 = 0.5;
const NOISE_DEG: f64 = 0.3;

/// Conditioned angle readings over a true panel angle.
#[derive(Debug, Clone)]
pub struct AngleSensor {
    window: VecDeque<f64>,
    offset_deg: f64,
}

impl AngleSensor {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_SIZE),
            offset_deg: 0.0,
        }
    }

    /// Mounting offset applied after averaging.
    pub fn set_offset(&mut self, offset_deg: f64) {
        self.offset_deg = offset_deg;
    }

    /// Sample the true angle and return the conditioned reading.
    pub fn read(&mut self, true_angle_deg: f64) -> f64 {
        let sample = true_angle_deg + random_range(-NOISE_DEG..NOISE_DEG);
        self.condition(sample)
    }

    /// Stalled conversion path: the hardware reports 0 deg on timeout.
    pub fn read_stalled(&mut self) -> f64 {
        self.condition(0.0)
    }

    fn condition(&mut self, sample: f64) -> f64 {
        if self.window.len() >= WINDOW_SIZE {
            self.window.pop_front();
        }
        self.window.push_back(sample);

        let mut angle = self.window.iter().sum::<f64>() / self.window.len() as f64;

        if angle.abs() < DEAD_ZONE_DEG {
            angle = 0.0;
        }

        (angle + self.offset_deg).clamp(-180.0, 180.0)
    }
}

impl Default for AngleSensor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averaging_tracks_a_steady_angle() {
        let mut sensor = AngleSensor::new();
        let mut reading = 0.0;
        for _ in 0..50 {
            reading = sensor.read(45.0);
        }
        assert!((reading - 45.0).abs() < 1.0, "got {}", reading);
    }

    #[test]
    fn dead_zone_flattens_near_zero() {
        let mut sensor = AngleSensor::new();
        let mut reading = 1.0;
        for _ in 0..50 {
            reading = sensor.read(0.05);
        }
        assert_eq!(reading, 0.0);
    }

    #[test]
    fn offset_is_applied_after_averaging() {
        let mut sensor = AngleSensor::new();
        sensor.set_offset(2.0);
        let mut reading = 0.0;
        for _ in 0..50 {
            reading = sensor.read(45.0);
        }
        assert!((reading - 47.0).abs() < 1.0);
    }

    #[test]
    fn stalled_sensor_reads_zero_after_window_drains() {
        let mut sensor = AngleSensor::new();
        for _ in 0..20 {
            sensor.read(90.0);
        }
        let mut reading = f64::MAX;
        for _ in 0..WINDOW_SIZE {
            reading = sensor.read_stalled();
        }
        assert_eq!(reading, 0.0);
    }
}
