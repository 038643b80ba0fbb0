//! # Wind Panel Control Runner
//! Drives the angle control engine against the simulated plant at the rig's
//! fixed 10 ms control period.
//!
//! ## Modes
//! - **Single fan 45:** preset 45 deg target, 10 s run window.
//! - **Single fan any:** operator-chosen target in [0, 90] deg.
//! - **Dual fan any:** operator-chosen target in [0, 180] deg, both fans.
//! - **Sequence:** {45, 60, 90, 120, 135} deg, 3 s hold each.
//!
//! ## Concurrency
//! - Tick loop on a dedicated max-priority thread (SpinSleeper scheduling).
//! - Engine shared behind a parking_lot mutex; the main thread only polls
//!   status accessors and requests shutdown via an atomic flag.
//!
//! ## Outputs
//! - `data/ticks_<mode>.csv` — per-tick trace (target, measured, command).

use std::{
    fs::create_dir_all,
    io::{Write, stdin, stdout},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam::channel::{RecvTimeoutError, bounded};
use log::info;
use parking_lot::Mutex;
use spin_sleep::{SpinSleeper, SpinStrategy};
use thread_priority::{ThreadBuilderExt, ThreadPriority};

use wind_panel_control::control::{
    engine::{AngleControlEngine, ControlMode},
    sequence::SequenceStep,
};
use wind_panel_control::plant::{fan::SimulatedFans, panel::PanelModel, sensor::AngleSensor};
use wind_panel_control::telemetry::recorder::{TickTrace, TraceRecorder};

/// Control period of the original rig's tick timer.
const TICK_PERIOD_MS: u64 = 10;
/// Session length for the open-ended single/dual target modes.
const SESSION_SECS: u64 = 30;
/// The 45 deg preset runs on a fixed window.
const PRESET_45_SECS: u64 = 10;

fn main() {
    env_logger::init();
    info!("=== WIND PANEL CONTROL START ===");

    loop {
        let choice = prompt_menu();
        match choice.as_str() {
            "1" => run_session(SessionKind::SingleFan45),
            "2" => {
                let target = prompt_angle(90.0);
                run_session(SessionKind::SingleFanAny(target));
            }
            "3" => {
                let target = prompt_angle(180.0);
                run_session(SessionKind::DualFanAny(target));
            }
            "4" | "" => run_session(SessionKind::Sequence),
            "5" => {
                println!("Exiting. Goodbye!");
                info!("=== WIND PANEL CONTROL FINISHED ===");
                return;
            }
            other => {
                println!("Unrecognized option '{}', please try again.", other);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SessionKind {
    SingleFan45,
    SingleFanAny(f64),
    DualFanAny(f64),
    Sequence,
}

impl SessionKind {
    fn label(&self) -> &'static str {
        match self {
            SessionKind::SingleFan45 => "single45",
            SessionKind::SingleFanAny(_) => "single",
            SessionKind::DualFanAny(_) => "dual",
            SessionKind::Sequence => "sequence",
        }
    }

    fn duration(&self) -> Duration {
        match self {
            SessionKind::SingleFan45 => Duration::from_secs(PRESET_45_SECS),
            _ => Duration::from_secs(SESSION_SECS),
        }
    }
}

fn prompt_menu() -> String {
    println!("\n┌─────────────────────────────────────┐");
    println!("│       SELECT CONTROL MODE           │");
    println!("├─────────────────────────────────────┤");
    println!("│  1) Single fan, 45 deg preset       │");
    println!("│  2) Single fan, any angle           │");
    println!("│  3) Dual fan, any angle             │");
    println!("│  4) Dual fan, sequence              │");
    println!("│  5) Exit                            │");
    println!("└─────────────────────────────────────┘");
    print!("Select [1-5] (default: 4): ");
    let _ = stdout().flush();

    let mut input = String::new();
    let _ = stdin().read_line(&mut input);
    input.trim().to_string()
}

fn prompt_angle(max_deg: f64) -> f64 {
    print!("Enter target angle 0..{:.0} deg [default: 45]: ", max_deg);
    let _ = stdout().flush();
    let mut input = String::new();
    let _ = stdin().read_line(&mut input);
    input.trim().parse::<f64>().unwrap_or(45.0).clamp(0.0, max_deg)
}

/// Apply the per-mode presets from the bench configuration.
fn configure_engine(engine: &mut AngleControlEngine, kind: SessionKind) {
    match kind {
        SessionKind::SingleFan45 => {
            engine.set_mode(ControlMode::SingleFan);
            engine.set_stable_condition(5.0, 3000).expect("preset condition");
            engine.set_target(45.0).expect("preset target");
        }
        SessionKind::SingleFanAny(target) => {
            engine.set_mode(ControlMode::SingleFan);
            engine.set_stable_condition(5.0, 3000).expect("preset condition");
            engine.set_target(target).expect("target in range");
        }
        SessionKind::DualFanAny(target) => {
            engine.set_mode(ControlMode::DualFan);
            engine.set_stable_condition(3.0, 5000).expect("preset condition");
            engine.set_target(target).expect("target in range");
        }
        SessionKind::Sequence => {
            let steps: Vec<SequenceStep> = [45.0, 60.0, 90.0, 120.0, 135.0]
                .iter()
                .map(|&target_deg| SequenceStep { target_deg, hold_ms: 3000 })
                .collect();
            engine.set_mode(ControlMode::Sequence);
            engine.set_stable_condition(3.0, 3000).expect("preset condition");
            engine.config_sequence(steps).expect("non-empty plan");
        }
    }
}

fn run_session(kind: SessionKind) {
    info!("[Session] starting {:?}", kind);

    let engine = Arc::new(Mutex::new(AngleControlEngine::new()));
    configure_engine(&mut engine.lock(), kind);

    let recorder = TraceRecorder::new();
    create_dir_all("data").ok();
    let csv_path = format!("data/ticks_{}.csv", kind.label());
    let exporter = recorder.start_exporter(csv_path.clone());

    let running = Arc::new(AtomicBool::new(true));
    let (done_tx, done_rx) = bounded::<()>(1);

    let tick_handle = spawn_tick_thread(engine.clone(), recorder.clone(), running.clone(), done_tx);

    // Status polling, the original firmware's display loop. The session ends
    // when the engine goes idle (sequence complete) or the window expires.
    let deadline = Instant::now() + kind.duration();
    loop {
        match done_rx.recv_timeout(Duration::from_millis(500)) {
            Ok(()) => break,
            Err(RecvTimeoutError::Timeout) => {
                print_status(&engine);
                if Instant::now() >= deadline {
                    running.store(false, Ordering::Release);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    running.store(false, Ordering::Release);
    let _ = tick_handle.join();

    recorder.shutdown();
    let _ = exporter.join();
    println!("\nSession finished. Tick trace: {}\n", csv_path);
}

/// Fixed-period tick loop on its own max-priority thread.
fn spawn_tick_thread(
    engine: Arc<Mutex<AngleControlEngine>>,
    recorder: TraceRecorder,
    running: Arc<AtomicBool>,
    done_tx: crossbeam::channel::Sender<()>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("tick".to_string())
        .spawn_with_priority(ThreadPriority::Max, move |_| {
            let period = Duration::from_millis(TICK_PERIOD_MS);
            let sleeper = SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);

            let mut panel = PanelModel::new();
            let mut sensor = AngleSensor::new();
            let mut fans = SimulatedFans::new();

            let run_start = Instant::now();
            let mut next_deadline = run_start + period;
            let mut seq: u64 = 1;

            while running.load(Ordering::Acquire) {
                let now = Instant::now();
                if now < next_deadline {
                    sleeper.sleep(next_deadline - now);
                }

                // Wrapping millisecond clock, like the rig's tick counter.
                let now_ms = run_start.elapsed().as_millis() as u32;
                let measured = sensor.read(panel.angle_deg());

                let (target, mode, stable, step_index, active) = {
                    let mut engine = engine.lock();
                    engine.tick(now_ms, measured, &mut fans);
                    (
                        engine.target(),
                        engine.mode(),
                        engine.is_stable(),
                        engine.step_index(),
                        engine.is_running(),
                    )
                };

                recorder.record(TickTrace {
                    seq,
                    ts_ms: now_ms,
                    mode: mode.name(),
                    target_deg: target,
                    measured_deg: measured,
                    error_deg: target - measured,
                    command: fans.fan1(),
                    stable,
                    step_index,
                });

                if !active {
                    // Sequence finished (engine already dropped to Idle).
                    let _ = done_tx.try_send(());
                    break;
                }

                panel.step(fans.fan1(), fans.fan2(), TICK_PERIOD_MS as f64 / 1000.0);
                next_deadline += period;
                seq += 1;
            }

            // Leave the rig safe on the way out.
            engine.lock().stop(&mut fans);
        })
        .expect("Failed to spawn tick thread")
}

fn print_status(engine: &Arc<Mutex<AngleControlEngine>>) {
    let engine = engine.lock();
    match engine.step_index() {
        Some(index) => println!(
            "mode={} target={:.1} step={} stable={}",
            engine.mode().name(),
            engine.target(),
            index,
            engine.is_stable()
        ),
        None => println!(
            "mode={} target={:.1} stable={}",
            engine.mode().name(),
            engine.target(),
            engine.is_stable()
        ),
    }
}
