//! engine.rs
//! Angle control engine: composes the PID controller, settling detector,
//! sequence scheduler and mode router behind one tick-driven façade.
//!
//! The engine owns all control state and is driven once per fixed period by
//! the surrounding application; it performs only arithmetic and bounded state
//! transitions per tick and never blocks. Timestamps are a wrapping u32
//! millisecond counter, so all elapsed-time math uses `wrapping_sub`.

use log::{debug, info};

use crate::control::{
    error::ControlError,
    pid::PidController,
    router::{self, FanDriver},
    sequence::{SequencePlan, SequenceStep, StepEvent},
    settling::{SettleTracker, StableCondition},
};

/// Panel actuation range in degrees; targets are clamped to this domain.
pub const ANGLE_MIN_DEG: f64 = -180.0;
pub const ANGLE_MAX_DEG: f64 = 180.0;

/// Default gains: a full-scale 180 deg error saturates the proportional term
/// alone, with gentle integral and derivative action on top.
pub const DEFAULT_KP: f64 = 0.02;
pub const DEFAULT_KI: f64 = 0.005;
pub const DEFAULT_KD: f64 = 0.01;

/// Operating mode; determines the active target source and fan fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Idle,
    SingleFan,
    DualFan,
    Sequence,
}

impl ControlMode {
    pub fn name(&self) -> &'static str {
        match self {
            ControlMode::Idle => "Idle",
            ControlMode::SingleFan => "SingleFan",
            ControlMode::DualFan => "DualFan",
            ControlMode::Sequence => "Sequence",
        }
    }
}

/// What a tick did, for tracing and the runner's status display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Engine not running; nothing computed, nothing driven.
    Inactive,
    /// Normal closed-loop tick.
    Driving { command: f64, stable: bool },
    /// Sequence advanced to a new step this tick.
    StepAdvanced { step_index: usize, command: f64 },
    /// Final sequence step finished; the engine dropped to Idle.
    SequenceFinished,
}

/// Closed-loop angle control engine.
///
/// Created once at system start (mode Idle), mutated only through these
/// methods and the per-tick update. When ticks come from a different thread
/// than the mode/target operations, wrap the engine in a mutex; every method
/// here is a short bounded critical section.
pub struct AngleControlEngine {
    mode: ControlMode,
    target_deg: f64,
    pid: PidController,
    condition: Option<StableCondition>,
    tracker: SettleTracker,
    plan: Option<SequencePlan>,
    running: bool,
    last_tick_ms: Option<u32>,
}

impl AngleControlEngine {
    /// Engine with the default gains. Idle, not running.
    pub fn new() -> Self {
        // Defaults are finite by construction.
        Self::with_gains(DEFAULT_KP, DEFAULT_KI, DEFAULT_KD)
            .expect("default PID gains are valid")
    }

    /// Engine with caller-supplied gains; rejects non-finite values.
    pub fn with_gains(kp: f64, ki: f64, kd: f64) -> Result<Self, ControlError> {
        let pid = PidController::new(kp, ki, kd, -1.0, 1.0)?;
        Ok(Self {
            mode: ControlMode::Idle,
            target_deg: 0.0,
            pid,
            condition: None,
            tracker: SettleTracker::new(),
            plan: None,
            running: false,
            last_tick_ms: None,
        })
    }

    /// Clear all control state and enter the given mode, not running.
    pub fn init(&mut self, mode: ControlMode) {
        self.target_deg = 0.0;
        self.pid.reset();
        self.condition = None;
        self.tracker.reset();
        self.plan = None;
        self.running = false;
        self.last_tick_ms = None;
        self.mode = mode;
        info!("[Engine] initialized in {:?}", mode);
    }

    /// Switch mode. Resets the PID and settling state; motion does not start
    /// until a target is set or a sequence is configured.
    pub fn set_mode(&mut self, mode: ControlMode) {
        self.pid.reset();
        self.tracker.reset();
        if mode != ControlMode::Sequence {
            self.plan = None;
        }
        self.running = false;
        self.last_tick_ms = None;
        self.mode = mode;
        debug!("[Engine] mode -> {:?}", mode);
    }

    /// Set a direct target angle. Valid only in SingleFan/DualFan modes; the
    /// angle is clamped to the actuation domain and the run starts.
    pub fn set_target(&mut self, angle_deg: f64) -> Result<(), ControlError> {
        match self.mode {
            ControlMode::SingleFan | ControlMode::DualFan => {}
            _ => return Err(ControlError::ModeMismatch),
        }
        if !angle_deg.is_finite() {
            return Err(ControlError::InvalidConfiguration("non-finite target angle"));
        }

        self.target_deg = angle_deg.clamp(ANGLE_MIN_DEG, ANGLE_MAX_DEG);
        self.pid.reset();
        self.tracker.reset();
        self.running = true;
        info!("[Engine] target set to {:.1} deg", self.target_deg);
        Ok(())
    }

    /// Update the settling condition; applies to whichever mode is active.
    pub fn set_stable_condition(&mut self, tolerance_deg: f64, dwell_ms: u32) -> Result<(), ControlError> {
        if !tolerance_deg.is_finite() || tolerance_deg <= 0.0 {
            return Err(ControlError::InvalidConfiguration("non-positive tolerance"));
        }
        self.condition = Some(StableCondition { tolerance_deg, dwell_ms });
        self.tracker.reset();
        Ok(())
    }

    /// Install a step plan and start it. Valid only in Sequence mode; an
    /// invalid plan is rejected with the previous plan and state intact.
    pub fn config_sequence(&mut self, steps: Vec<SequenceStep>) -> Result<(), ControlError> {
        if self.mode != ControlMode::Sequence {
            return Err(ControlError::ModeMismatch);
        }

        let plan = SequencePlan::new(steps)?;
        self.target_deg = plan.current_step().target_deg.clamp(ANGLE_MIN_DEG, ANGLE_MAX_DEG);
        info!(
            "[Engine] sequence of {} steps configured, first target {:.1} deg",
            plan.step_count(),
            self.target_deg
        );
        self.plan = Some(plan);
        self.pid.reset();
        self.tracker.reset();
        self.running = true;
        Ok(())
    }

    /// Stop from any state: back to Idle, fans to neutral, control state
    /// cleared.
    pub fn stop(&mut self, driver: &mut dyn FanDriver) {
        self.running = false;
        self.mode = ControlMode::Idle;
        self.plan = None;
        self.pid.reset();
        self.tracker.reset();
        self.last_tick_ms = None;
        router::neutral(driver);
        info!("[Engine] stopped");
    }

    /// One fixed-period control tick. No-op while not running.
    pub fn tick(&mut self, now_ms: u32, measured_deg: f64, driver: &mut dyn FanDriver) -> TickOutcome {
        if !self.running {
            return TickOutcome::Inactive;
        }

        // dt from the wrapping tick counter; the first tick after a start has
        // no predecessor, so dt = 0 and the PID replays its reset command.
        let dt = match self.last_tick_ms {
            Some(prev) => now_ms.wrapping_sub(prev) as f64 / 1000.0,
            None => 0.0,
        };
        self.last_tick_ms = Some(now_ms);

        let error = self.target_deg - measured_deg;
        let command = self.pid.compute(error, dt);

        // Unset condition means "never declared stable".
        let stable = match &self.condition {
            Some(condition) => self.tracker.update(error, now_ms, condition),
            None => false,
        };

        if self.mode == ControlMode::Sequence {
            if let Some(plan) = self.plan.as_mut() {
                match plan.advance_if_ready(stable, now_ms) {
                    StepEvent::Advanced => {
                        // New step: fresh target, discard PID and dwell history.
                        self.target_deg =
                            plan.current_step().target_deg.clamp(ANGLE_MIN_DEG, ANGLE_MAX_DEG);
                        let step_index = plan.step_index();
                        self.pid.reset();
                        self.tracker.reset();
                        router::dispatch(self.mode, command, driver);
                        return TickOutcome::StepAdvanced { step_index, command };
                    }
                    StepEvent::Complete => {
                        info!("[Engine] sequence complete");
                        self.stop(driver);
                        return TickOutcome::SequenceFinished;
                    }
                    StepEvent::HoldStarted | StepEvent::NoChange => {}
                }
            }
        }

        router::dispatch(self.mode, command, driver);
        TickOutcome::Driving { command, stable }
    }

    #[inline]
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target_deg
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn is_stable(&self) -> bool {
        self.tracker.is_stable()
    }

    /// Index of the active sequence step, if a plan is installed.
    #[inline]
    pub fn step_index(&self) -> Option<usize> {
        self.plan.as_ref().map(|p| p.step_index())
    }
}

impl Default for AngleControlEngine {
    fn default() -> Self {
        Self::new()
    }
}
