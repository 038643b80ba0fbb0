pub mod control;
pub mod plant;
pub mod telemetry;
