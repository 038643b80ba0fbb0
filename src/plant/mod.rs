// Simulated collaborators: panel dynamics, angle sensor, fan pair.
// Host-side stand-ins for the bench rig; the engine only sees the
// FanDriver seam and a measured angle.
pub mod fan;
pub mod panel;
pub mod sensor;
