//! pid.rs
//! PID feedback law converting an angle error into a bounded fan command.
//!
//! - Conditional anti-windup: the integral accumulator is frozen on any call
//!   whose unclamped output would leave [out_min, out_max].
//! - `dt <= 0` returns the previous command unchanged (the derivative term is
//!   undefined at zero dt).
//! - `reset()` must run on every target or mode change so a stale integral or
//!   previous-error sample cannot leak into an unrelated move.

use crate::control::error::ControlError;

/// PID controller with output clamping and conditional integration.
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,

    integral: f64,
    prev_error: f64,

    out_min: f64,
    out_max: f64,

    /// Command returned by the most recent call; replayed when dt <= 0.
    last_command: f64,
}

impl PidController {
    /// Create a controller. Gains and limits must be finite and
    /// `out_min < out_max`.
    pub fn new(kp: f64, ki: f64, kd: f64, out_min: f64, out_max: f64) -> Result<Self, ControlError> {
        if !(kp.is_finite() && ki.is_finite() && kd.is_finite()) {
            return Err(ControlError::InvalidConfiguration("non-finite PID gain"));
        }
        if !(out_min.is_finite() && out_max.is_finite()) || out_min >= out_max {
            return Err(ControlError::InvalidConfiguration("bad output limits"));
        }

        Ok(Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            prev_error: 0.0,
            out_min,
            out_max,
            last_command: 0.0,
        })
    }

    /// Compute the next command from the angle error (degrees) and the
    /// elapsed time since the previous call (seconds).
    pub fn compute(&mut self, error: f64, dt: f64) -> f64 {
        if dt <= 0.0 {
            return self.last_command;
        }

        let derivative = self.kd * (error - self.prev_error) / dt;
        let unclamped = self.kp * error + self.ki * self.integral + derivative;

        // Accumulate only while the output is not saturated.
        if unclamped >= self.out_min && unclamped <= self.out_max {
            self.integral += error * dt;
        }

        let command =
            (self.kp * error + self.ki * self.integral + derivative).clamp(self.out_min, self.out_max);

        self.prev_error = error;
        self.last_command = command;
        command
    }

    /// Discard integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.last_command = 0.0;
    }

    #[inline]
    pub fn integral(&self) -> f64 {
        self.integral
    }
}
