//! fan.rs
//! Simulated fan pair implementing the engine's `FanDriver` seam.
//!
//! Remembers the last command per fan so the panel model (and tests) can see
//! what the router dispatched. Writes are fire-and-forget, like the real
//! PWM driver.

use crate::control::router::{FanDriver, FanId};

#[derive(Debug, Clone, Default)]
pub struct SimulatedFans {
    fan1: f64,
    fan2: f64,
}

impl SimulatedFans {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn fan1(&self) -> f64 {
        self.fan1
    }

    #[inline]
    pub fn fan2(&self) -> f64 {
        self.fan2
    }
}

impl FanDriver for SimulatedFans {
    fn drive(&mut self, fan: FanId, command: f64) {
        match fan {
            FanId::Fan1 => self.fan1 = command,
            FanId::Fan2 => self.fan2 = command,
        }
    }
}
