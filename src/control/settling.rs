//! settling.rs
//! Settling detector: reports arrival only after the angle error has stayed
//! inside a tolerance band for a minimum continuous dwell time.
//!
//! Debounces transient in-tolerance dips (sensor noise, overshoot crossings)
//! from being mistaken for arrival. Timestamps are millisecond ticks from a
//! wrapping u32 counter, so elapsed time uses `wrapping_sub`.

/// Tolerance band and minimum dwell required before declaring stable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableCondition {
    pub tolerance_deg: f64,
    pub dwell_ms: u32,
}

/// Dwell bookkeeping for one active target.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettleTracker {
    dwell_start: Option<u32>,
    stable: bool,
}

impl SettleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one error sample. Returns true exactly when the error has been
    /// continuously within tolerance for at least `condition.dwell_ms`.
    pub fn update(&mut self, error_deg: f64, now_ms: u32, condition: &StableCondition) -> bool {
        if error_deg.abs() > condition.tolerance_deg {
            // Any excursion restarts the dwell from zero.
            self.dwell_start = None;
            self.stable = false;
            return false;
        }

        match self.dwell_start {
            None => {
                // First in-tolerance sample arms the dwell; not stable yet.
                self.dwell_start = Some(now_ms);
                self.stable = false;
                false
            }
            Some(start) => {
                self.stable = now_ms.wrapping_sub(start) >= condition.dwell_ms;
                self.stable
            }
        }
    }

    /// Clear dwell state; called whenever the active target changes.
    pub fn reset(&mut self) {
        self.dwell_start = None;
        self.stable = false;
    }

    #[inline]
    pub fn is_stable(&self) -> bool {
        self.stable
    }
}
