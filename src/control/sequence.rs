//! sequence.rs
//! Sequence scheduler: ordered (target angle, hold duration) steps.
//!
//! A step advances only after the settling detector has confirmed arrival
//! *and* the step's hold duration has elapsed since that confirmation, so a
//! single noisy in-tolerance sample cannot race the plan through its steps.

use log::debug;

use crate::control::error::ControlError;

/// One point of a multi-step angle program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceStep {
    pub target_deg: f64,
    pub hold_ms: u32,
}

/// Outcome of one scheduler update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// Still converging on, or holding at, the current step.
    NoChange,
    /// First tick at which the current step was confirmed stable.
    HoldStarted,
    /// Hold elapsed; the cursor moved to the next step.
    Advanced,
    /// Hold elapsed on the final step; the plan is finished.
    Complete,
}

/// Ordered, non-empty step list with a cursor and hold bookkeeping.
#[derive(Debug, Clone)]
pub struct SequencePlan {
    steps: Vec<SequenceStep>,
    cursor: usize,
    /// Timestamp the current step was confirmed stable; None until arrival,
    /// cleared again if stability is lost before the hold elapses.
    hold_started_at: Option<u32>,
}

impl SequencePlan {
    /// Build a plan. An empty step list or a non-finite step target is
    /// rejected and nothing is replaced.
    pub fn new(steps: Vec<SequenceStep>) -> Result<Self, ControlError> {
        if steps.is_empty() {
            return Err(ControlError::InvalidConfiguration("empty sequence plan"));
        }
        if steps.iter().any(|s| !s.target_deg.is_finite()) {
            return Err(ControlError::InvalidConfiguration("non-finite step target"));
        }

        Ok(Self {
            steps,
            cursor: 0,
            hold_started_at: None,
        })
    }

    #[inline]
    pub fn current_step(&self) -> SequenceStep {
        self.steps[self.cursor]
    }

    #[inline]
    pub fn step_index(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Called once per tick while the engine runs a sequence. `is_stable` is
    /// the settling detector's verdict for the current step's target.
    pub fn advance_if_ready(&mut self, is_stable: bool, now_ms: u32) -> StepEvent {
        if !is_stable {
            // Stability lost (or never reached): re-arm the hold timer.
            self.hold_started_at = None;
            return StepEvent::NoChange;
        }

        let Some(started) = self.hold_started_at else {
            self.hold_started_at = Some(now_ms);
            debug!("[Sequence] step {} stable, hold started", self.cursor);
            return StepEvent::HoldStarted;
        };

        if now_ms.wrapping_sub(started) < self.current_step().hold_ms {
            return StepEvent::NoChange;
        }

        // Hold satisfied. No wrapping back to step 0: past the end is done.
        self.hold_started_at = None;
        if self.cursor + 1 >= self.steps.len() {
            debug!("[Sequence] final step {} held, plan complete", self.cursor);
            StepEvent::Complete
        } else {
            self.cursor += 1;
            debug!(
                "[Sequence] advanced to step {} (target {:.1} deg)",
                self.cursor,
                self.current_step().target_deg
            );
            StepEvent::Advanced
        }
    }
}
