//! panel.rs
//! Second-order model of the hinged panel the fans push against.
//!
//! The two fans blow on the same panel face, so angular acceleration follows
//! the summed drive commands, opposed by viscous damping and a weak restoring
//! torque from the panel's weight. The model is only a host-side stand-in for
//! the bench rig; the engine never sees it directly.

/// Panel angle/velocity state, stepped once per control period.
#[derive(Debug, Clone)]
pub struct PanelModel {
    angle_deg: f64,
    velocity_dps: f64,
    thrust_gain: f64,
    damping: f64,
    restoring: f64,
}

impl PanelModel {
    pub fn new() -> Self {
        Self {
            angle_deg: 0.0,
            velocity_dps: 0.0,
            thrust_gain: 240.0, // deg/s^2 at full combined drive
            damping: 2.4,       // 1/s
            restoring: 0.35,    // deg/s^2 per deg of deflection
        }
    }

    /// Advance the dynamics by `dt` seconds under the given fan commands.
    pub fn step(&mut self, fan1: f64, fan2: f64, dt: f64) {
        let drive = (fan1 + fan2) / 2.0;
        let accel =
            self.thrust_gain * drive - self.damping * self.velocity_dps - self.restoring * self.angle_deg;

        self.velocity_dps += accel * dt;
        self.angle_deg += self.velocity_dps * dt;

        // Hard stops at the hinge limits.
        if self.angle_deg > 180.0 {
            self.angle_deg = 180.0;
            self.velocity_dps = 0.0;
        } else if self.angle_deg < -180.0 {
            self.angle_deg = -180.0;
            self.velocity_dps = 0.0;
        }
    }

    #[inline]
    pub fn angle_deg(&self) -> f64 {
        self.angle_deg
    }
}

impl Default for PanelModel {
    fn default() -> Self {
        Self::new()
    }
}
