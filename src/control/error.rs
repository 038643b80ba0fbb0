//! error.rs
//! Error taxonomy for the angle control engine.
//!
//! Every error here is synchronous and non-fatal: the offending call is
//! rejected with state unchanged and the engine keeps operating as it was.

use std::{error::Error, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// Rejected at configuration time (empty sequence plan, non-finite
    /// gain or tolerance, inverted output limits).
    InvalidConfiguration(&'static str),
    /// Operation is not valid in the current mode. Caller-programming
    /// error, surfaced rather than retried.
    ModeMismatch,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::InvalidConfiguration(reason) => {
                write!(f, "invalid configuration: {}", reason)
            }
            ControlError::ModeMismatch => write!(f, "operation not valid in current mode"),
        }
    }
}

impl Error for ControlError {}
