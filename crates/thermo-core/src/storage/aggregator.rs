use core::num::NonZeroU32;

use log::debug;

use super::{Reading, RingBufferStore, mean_to_tenth};

/// Accumulates raw per-tick readings into one committed reading per bucket.
///
/// ## Accumulation Windows
///
/// - `bucket_ticks = 1`: every tick is committed as-is (rounded to a tenth)
/// - `bucket_ticks = 60`: one minute-averaged reading per 60 one-second ticks
///
/// Changing `bucket_ticks` changes what one ring buffer slot means; nothing
/// else in the store is aware of it.
pub struct Aggregator {
    sum_temperature: i64,
    sum_humidity: i64,
    /// Always `< bucket_ticks` between calls to [`Aggregator::ingest`]
    sample_count: u32,
    bucket_ticks: NonZeroU32,
}

impl Aggregator {
    pub const fn new(bucket_ticks: NonZeroU32) -> Self {
        Self {
            sum_temperature: 0,
            sum_humidity: 0,
            sample_count: 0,
            bucket_ticks,
        }
    }

    pub fn bucket_ticks(&self) -> NonZeroU32 {
        self.bucket_ticks
    }

    /// Number of readings accumulated towards the next commit.
    pub fn pending(&self) -> u32 {
        self.sample_count
    }

    /// Add one raw reading.
    ///
    /// When the bucket fills, the per-channel mean is committed to `store`,
    /// the accumulator is reset, and the committed reading is returned. This
    /// is the only path that advances the store's cursor.
    pub fn ingest(&mut self, reading: Reading, store: &mut RingBufferStore) -> Option<Reading> {
        self.sum_temperature += reading.temperature_milli_celsius as i64;
        self.sum_humidity += reading.humidity_milli_percent as i64;
        self.sample_count += 1;

        if self.sample_count < self.bucket_ticks.get() {
            return None;
        }

        let count = self.sample_count as i64;
        let mean = Reading::new(
            mean_to_tenth(self.sum_temperature, count),
            mean_to_tenth(self.sum_humidity, count),
        );
        store.commit(mean);
        self.reset();

        debug!(
            "Committed bucket #{}: {} (mean of {} readings)",
            store.total_writes(),
            mean,
            count
        );
        Some(mean)
    }

    fn reset(&mut self) {
        self.sum_temperature = 0;
        self.sum_humidity = 0;
        self.sample_count = 0;
    }
}

/// Halving running average over every tick's reading.
///
/// Each new reading is averaged with the previous result, so older readings
/// decay by half per tick. The first reading seeds the average directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningAverage {
    current: Option<Reading>,
}

impl RunningAverage {
    pub const fn new() -> Self {
        Self { current: None }
    }

    pub fn update(&mut self, reading: Reading) -> Reading {
        let next = match self.current {
            None => reading,
            Some(previous) => Reading::new(
                halfway(previous.temperature_milli_celsius, reading.temperature_milli_celsius),
                halfway(previous.humidity_milli_percent, reading.humidity_milli_percent),
            ),
        };
        self.current = Some(next);
        next
    }

    pub fn get(&self) -> Option<Reading> {
        self.current
    }
}

fn halfway(a: i32, b: i32) -> i32 {
    ((a as i64 + b as i64) / 2) as i32
}
