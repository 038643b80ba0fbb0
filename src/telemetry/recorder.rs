//! recorder.rs
//! Non-blocking per-tick trace recorder with background CSV export.
//!
//! The tick thread pushes one `TickTrace` per control period onto a
//! lock-free queue and returns immediately; a background thread drains the
//! queue into a CSV file. Traces are dropped silently if the queue fills,
//! so recording can never block or delay a tick.

use std::{
    fs::File,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_queue::ArrayQueue;
use csv::Writer;
use log::error;
use serde::Serialize;

const TRACE_QUEUE_CAPACITY: usize = 16_384;
const DRAIN_POLL_MS: u64 = 10;
const FLUSH_BATCH: usize = 64;

/// One control tick as seen at the engine boundary.
#[derive(Debug, Clone, Serialize)]
pub struct TickTrace {
    pub seq: u64,
    pub ts_ms: u32,
    pub mode: &'static str,
    pub target_deg: f64,
    pub measured_deg: f64,
    pub error_deg: f64,
    pub command: f64,
    pub stable: bool,
    pub step_index: Option<usize>,
}

/// Lock-free trace queue shared between the tick thread and the exporter.
pub struct TraceRecorder {
    queue: Arc<ArrayQueue<TickTrace>>,
    shutdown: Arc<AtomicBool>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(ArrayQueue::new(TRACE_QUEUE_CAPACITY)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Append a trace (lock-free). Silently drops if the queue is full.
    #[inline]
    pub fn record(&self, trace: TickTrace) {
        let _ = self.queue.push(trace);
    }

    /// Ask the exporter to drain the remaining traces and exit.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Spawn the background thread writing traces to `output_csv`.
    pub fn start_exporter(&self, output_csv: String) -> JoinHandle<()> {
        let queue = self.queue.clone();
        let shutdown = self.shutdown.clone();

        thread::spawn(move || {
            let file = match File::create(&output_csv) {
                Ok(file) => file,
                Err(e) => {
                    error!("Failed to create trace CSV {}: {}", output_csv, e);
                    return;
                }
            };
            let mut writer = Writer::from_writer(file);
            let mut pending = 0usize;

            loop {
                match queue.pop() {
                    Some(trace) => {
                        if let Err(e) = writer.serialize(&trace) {
                            error!("Trace CSV write failed: {}", e);
                            return;
                        }
                        pending += 1;
                        if pending >= FLUSH_BATCH {
                            let _ = writer.flush();
                            pending = 0;
                        }
                    }
                    None => {
                        if shutdown.load(Ordering::Acquire) && queue.is_empty() {
                            break;
                        }
                        thread::sleep(Duration::from_millis(DRAIN_POLL_MS));
                    }
                }
            }

            let _ = writer.flush();
        })
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TraceRecorder {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}
