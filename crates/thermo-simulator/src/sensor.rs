//! Synthetic temperature/humidity source.

use thermo_core::sensors::{Sensor, SensorError};
use thermo_core::storage::Reading;

/// Every this many measurements fails with a checksum error, so the fault
/// path gets exercised during a normal run.
const FAULT_EVERY: u64 = 97;

pub struct MockSensor {
    measurements: u64,
    elapsed_secs: f64,
    tick_secs: f64,
}

impl MockSensor {
    pub fn new(tick_secs: u32) -> Self {
        Self {
            measurements: 0,
            elapsed_secs: 0.0,
            tick_secs: tick_secs as f64,
        }
    }
}

impl Sensor for MockSensor {
    async fn measure(&mut self) -> Result<Reading, SensorError> {
        self.measurements += 1;
        self.elapsed_secs += self.tick_secs;

        if self.measurements % FAULT_EVERY == 0 {
            return Err(SensorError::Checksum { sensor: "mock" });
        }

        let t = self.elapsed_secs;
        // 20–26 °C with slow drift, 40–60 % on a different period
        let temperature = 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();
        let humidity = 50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos();

        Ok(Reading::from_celsius_percent(temperature as f32, humidity as f32))
    }
}
