//! The per-tick control loop.
//!
//! [`TelemetryLoop`] owns all long-lived state (history, accumulator, lag
//! view, memory tracker, responder) and advances it one tick at a time.
//! Platform collaborators are passed into [`TelemetryLoop::tick`] by
//! reference so the same loop runs on the device, in the simulator and in
//! tests. Pacing between ticks is the caller's job.

use log::{debug, info, warn};

use crate::app_state::LinkState;
use crate::config::{ConfigError, TelemetryConfig, TimeBase};
use crate::display::{StatusSink, StatusView};
use crate::http::{CycleOutcome, HttpResponder, Listener, ServerState};
use crate::indicator::Indicator;
use crate::memory::{Kib, LowWaterTracker, MemoryReport, MemoryStats};
use crate::render::Snapshot;
use crate::sensors::{Sensor, SensorError};
use crate::storage::{Aggregator, LagSnapshot, Reading, RingBufferStore, RunningAverage};

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub reading: Result<Reading, SensorError>,
    /// Bucket mean committed to history this tick
    pub committed: Option<Reading>,
    /// Memory figures, when a report was due this tick
    pub memory: Option<MemoryReport>,
    /// `None` when the HTTP cycle was skipped
    pub http: Option<CycleOutcome>,
}

pub struct TelemetryLoop<L> {
    config: TelemetryConfig,
    time_base: TimeBase,
    store: RingBufferStore,
    aggregator: Aggregator,
    average: RunningAverage,
    lags: LagSnapshot,
    memory: LowWaterTracker,
    current: Option<Reading>,
    tick: u64,
    link: LinkState,
    responder: HttpResponder<L>,
}

impl<L: Listener> TelemetryLoop<L> {
    /// Build the loop from a validated configuration. Starts with empty
    /// history and no listener attached.
    pub fn new(config: TelemetryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let time_base = config.time_base()?;
        let store = RingBufferStore::new(config.capacity()?);
        let lags = LagSnapshot::compute(&store, &config.lag_offsets);

        info!(
            "Telemetry loop: {} s ticks, {} ticks per bucket, {} buckets of history",
            config.tick_secs,
            config.bucket_ticks,
            store.capacity()
        );

        Ok(Self {
            time_base,
            aggregator: Aggregator::new(time_base.bucket_ticks),
            average: RunningAverage::new(),
            lags,
            memory: LowWaterTracker::new(config.memory_report_ticks),
            current: None,
            tick: 0,
            link: LinkState::Down,
            responder: HttpResponder::new(config.http.clone()),
            store,
            config,
        })
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    pub fn store(&self) -> &RingBufferStore {
        &self.store
    }

    pub fn lags(&self) -> &LagSnapshot {
        &self.lags
    }

    pub fn current(&self) -> Option<Reading> {
        self.current
    }

    pub fn average(&self) -> Option<Reading> {
        self.average.get()
    }

    pub fn memory(&self) -> &LowWaterTracker {
        &self.memory
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn set_link(&mut self, link: LinkState) {
        if link != self.link {
            info!("Link {} -> {}", self.link.label(), link.label());
            self.link = link;
        }
    }

    pub fn attach_listener(&mut self, listener: L) -> Option<L> {
        info!("HTTP listener attached on port {}", self.config.http.port);
        self.responder.attach(listener)
    }

    pub fn detach_listener(&mut self) -> Option<L> {
        let listener = self.responder.detach();
        if listener.is_some() {
            warn!("HTTP listener detached; serving paused");
        }
        listener
    }

    pub fn server_state(&self) -> ServerState {
        self.responder.state()
    }

    pub fn responder(&self) -> &HttpResponder<L> {
        &self.responder
    }

    /// Run one tick: sample, aggregate, track memory, refresh lags, update
    /// the display and indicator, then serve at most one HTTP request.
    ///
    /// A sensor fault is logged and ends the tick early; with
    /// `serve_on_sensor_fault` the HTTP cycle still runs.
    pub async fn tick<S, M, D, I>(
        &mut self,
        sensor: &mut S,
        memory: &M,
        display: &mut D,
        indicator: &mut I,
    ) -> TickReport
    where
        S: Sensor,
        M: MemoryStats,
        D: StatusSink,
        I: Indicator,
    {
        let tick = self.tick;
        self.tick += 1;

        let reading = match sensor.measure().await {
            Ok(reading) => reading,
            Err(error) => {
                warn!("Tick {}: sensor fault: {}", tick, error);
                let http = if self.config.serve_on_sensor_fault {
                    Some(self.serve().await)
                } else {
                    None
                };
                return TickReport {
                    tick,
                    reading: Err(error),
                    committed: None,
                    memory: None,
                    http,
                };
            }
        };

        self.current = Some(reading);
        self.average.update(reading);
        let committed = self.aggregator.ingest(reading, &mut self.store);

        let report = self.memory.observe(tick, memory);
        if let Some(report) = report {
            info!(
                "Mem free: {} (allocated {}, low-water {})",
                Kib(report.free_bytes),
                Kib(report.allocated_bytes),
                Kib(report.low_water_bytes)
            );
        }

        self.lags = LagSnapshot::compute(&self.store, &self.config.lag_offsets);

        display.present(&StatusView {
            tick,
            reading: self.current,
            average: self.average.get(),
            lags: &self.lags,
            link: self.link,
            memory: self.memory.last(),
        });
        indicator.show(
            self.config
                .indicator
                .pattern_for(reading.temperature_milli_celsius),
        );

        let http = self.serve().await;
        TickReport {
            tick,
            reading: Ok(reading),
            committed,
            memory: report,
            http: Some(http),
        }
    }

    async fn serve(&mut self) -> CycleOutcome {
        let snapshot = Snapshot {
            store: &self.store,
            current: self.current,
            average: self.average.get(),
            lags: &self.lags,
            memory: self.memory.last(),
            time_base: self.time_base,
            points: self.config.http.points,
            dashboard_poll_ms: self.config.http.dashboard_poll_ms,
        };
        let outcome = self.responder.poll(&snapshot).await;
        if let CycleOutcome::Served { route, status, .. } = outcome {
            debug!("Served {:?} with {}", route, status.code());
        }
        outcome
    }
}
