//! router.rs
//! Mode router: maps the active control mode to the fans that receive the
//! PID command.
//!
//! Dual-fan and sequence modes drive both fans with the identical command:
//! both fans push the shared panel toward the same target, and no call site
//! in the original rig uses differential drive. A per-fan sign flip or scale
//! would slot into the match arms below if the geometry ever demands one.

use crate::control::engine::ControlMode;

/// Fan identifier on the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanId {
    Fan1,
    Fan2,
}

/// Output seam to the fan hardware (or a simulated stand-in). Writes are
/// fire-and-forget; there is no acknowledgment channel.
pub trait FanDriver {
    /// Apply a normalized drive command in [-1, 1] to one fan.
    fn drive(&mut self, fan: FanId, command: f64);
}

/// Dispatch one PID command according to the active mode. The command is
/// clamped to the normalized drive range before it reaches the driver.
pub fn dispatch(mode: ControlMode, command: f64, driver: &mut dyn FanDriver) {
    let command = command.clamp(-1.0, 1.0);

    match mode {
        ControlMode::Idle => {}
        ControlMode::SingleFan => {
            driver.drive(FanId::Fan1, command);
        }
        ControlMode::DualFan | ControlMode::Sequence => {
            driver.drive(FanId::Fan1, command);
            driver.drive(FanId::Fan2, command);
        }
    }
}

/// Command both fans to zero drive (stop side effect).
pub fn neutral(driver: &mut dyn FanDriver) {
    driver.drive(FanId::Fan1, 0.0);
    driver.drive(FanId::Fan2, 0.0);
}
