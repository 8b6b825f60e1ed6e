//! Desktop simulator for the thermo temperature/humidity logger.
//!
//! Runs the real `thermo-core` tick loop on the host with a synthetic sensor,
//! a counting allocator standing in for the device heap and a plain
//! `std::net` listener, so the HTTP endpoints can be exercised with a
//! browser or `curl`:
//!
//! ```text
//! RUST_LOG=debug cargo run -p thermo-simulator
//! curl 'http://127.0.0.1:8080/data?points=30'
//! ```
//!
//! # Environment
//!
//! | Variable            | Meaning                                           |
//! |---------------------|---------------------------------------------------|
//! | `THERMO_MODE`       | `minute` (default) or `second` bucket preset      |
//! | `THERMO_CONFIG`     | JSON settings file, replaces the preset entirely  |
//! | `THERMO_BIND`       | Listen address, default `127.0.0.1:8080`          |
//! | `THERMO_TICKS`      | Stop after this many ticks (runs forever if unset) |
//! | `THERMO_SCREEN_PNG` | Save the panel to this PNG file every tick        |

mod heap;
mod net;
mod panel;
mod sensor;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use embassy_futures::block_on;
use log::{debug, error, info};

use thermo_core::app_state::{AppError, LinkState};
use thermo_core::config::TelemetryConfig;
use thermo_core::http::{CycleOutcome, ServerState};
use thermo_core::scheduler::TelemetryLoop;

use heap::HeapStats;
use net::StdListener;
use panel::{LogIndicator, PanelSink};
use sensor::MockSensor;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Heap size the free-memory figures are reported against.
const HEAP_BUDGET_BYTES: usize = 8 * 1024 * 1024;

/// Ticks between attempts to bring a failed listener back up.
const LISTENER_RETRY_TICKS: u64 = 30;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn load_config() -> Result<TelemetryConfig, AppError> {
    if let Ok(path) = std::env::var("THERMO_CONFIG") {
        info!("Loading settings from {}", path);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| AppError::truncated(AppError::Settings, &e.to_string()))?;
        return serde_json::from_str(&text)
            .map_err(|e| AppError::truncated(AppError::Settings, &e.to_string()));
    }

    match std::env::var("THERMO_MODE").as_deref() {
        Ok("second") => Ok(TelemetryConfig::per_second()),
        Ok("minute") | Err(_) => Ok(TelemetryConfig::per_minute()),
        Ok(other) => Err(AppError::truncated(
            AppError::Settings,
            &format!("unknown THERMO_MODE {:?}", other),
        )),
    }
}

fn bind_addr() -> Result<SocketAddr, AppError> {
    let raw = std::env::var("THERMO_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    raw.parse()
        .map_err(|_| AppError::truncated(AppError::Settings, &format!("bad THERMO_BIND {:?}", raw)))
}

fn tick_limit() -> Option<u64> {
    std::env::var("THERMO_TICKS").ok()?.parse().ok()
}

// ---------------------------------------------------------------------------
// Listener bring-up
// ---------------------------------------------------------------------------

fn bring_up_listener(telemetry: &mut TelemetryLoop<StdListener>, addr: SocketAddr) {
    match StdListener::bind(addr, &telemetry.config().http) {
        Ok(listener) => {
            match listener.local_addr() {
                Ok(local) => info!("Serving on http://{}/", local),
                Err(_) => info!("Serving on http://{}/", addr),
            }
            telemetry.attach_listener(listener);
            telemetry.set_link(LinkState::Up);
        }
        Err(e) => {
            error!("Binding {} failed: {}; retrying in {} ticks", addr, e, LISTENER_RETRY_TICKS);
            telemetry.set_link(LinkState::Down);
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting thermo simulator");

    let config = load_config()?;
    let addr = bind_addr()?;
    let limit = tick_limit();
    let snapshot_path = std::env::var_os("THERMO_SCREEN_PNG").map(PathBuf::from);

    let tick_len = Duration::from_secs(config.tick_secs.max(1) as u64);
    let mut sensor = MockSensor::new(config.tick_secs);
    let mut panel = PanelSink::new(config.display_shift_ticks, snapshot_path);
    let mut indicator = LogIndicator::default();
    let heap = HeapStats::new(HEAP_BUDGET_BYTES);

    let mut telemetry: TelemetryLoop<StdListener> = TelemetryLoop::new(config)?;
    telemetry.set_link(LinkState::Connecting);

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    loop {
        let tick_start = Instant::now();
        let tick = telemetry.ticks();

        if limit.is_some_and(|limit| tick >= limit) {
            break;
        }

        if telemetry.server_state() == ServerState::Absent && tick % LISTENER_RETRY_TICKS == 0 {
            bring_up_listener(&mut telemetry, addr);
        }

        let report = block_on(telemetry.tick(&mut sensor, &heap, &mut panel, &mut indicator));

        if let Some(committed) = report.committed {
            debug!("Tick {}: committed {}", report.tick, committed);
        }
        if let Some(CycleOutcome::Failed(e)) = report.http {
            debug!("Tick {}: HTTP cycle failed: {}", report.tick, e);
        }

        // --- Pacing -------------------------------------------------------
        let elapsed = tick_start.elapsed();
        if elapsed < tick_len {
            std::thread::sleep(tick_len - elapsed);
        } else {
            debug!("Tick {} overran by {:?}", report.tick, elapsed - tick_len);
        }
    }

    info!("Simulator exiting after {} ticks", telemetry.ticks());
    Ok(())
}
