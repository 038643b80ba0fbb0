// Angle control engine and its sub-components:
// PID law, settling detection, sequence scheduling, mode routing.
pub mod engine;
pub mod error;
pub mod pid;
pub mod router;
pub mod sequence;
pub mod settling;
