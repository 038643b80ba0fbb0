// Tick tracing: lock-free queue drained to CSV by a background thread.
pub mod recorder;
