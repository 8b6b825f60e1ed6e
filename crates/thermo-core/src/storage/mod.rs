//! In-memory sample history.
//!
//! Readings are kept in fixed-point milli-units, the same way the sensors
//! report them:
//! - Temperature: 25.3°C → 25300 (milli-degrees)
//! - Humidity: 45.2% → 45200 (milli-percent)

pub mod aggregator;
pub mod lag;
pub mod ring_buffer;

pub use aggregator::{Aggregator, RunningAverage};
pub use lag::{LagEntry, LagSnapshot, MAX_LAG_OFFSETS};
pub use ring_buffer::RingBufferStore;

use core::fmt::{self, Display};

/// One paired temperature/humidity sample.
///
/// Both channels live in one value so a commit can never write one without
/// the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reading {
    pub temperature_milli_celsius: i32,
    pub humidity_milli_percent: i32,
}

impl Reading {
    pub const fn new(temperature_milli_celsius: i32, humidity_milli_percent: i32) -> Self {
        Self {
            temperature_milli_celsius,
            humidity_milli_percent,
        }
    }

    /// Build a reading from floating point sensor output, rounded to the
    /// nearest milli-unit.
    pub fn from_celsius_percent(temperature_celsius: f32, humidity_percent: f32) -> Self {
        Self {
            temperature_milli_celsius: libm::roundf(temperature_celsius * 1000.0) as i32,
            humidity_milli_percent: libm::roundf(humidity_percent * 1000.0) as i32,
        }
    }

    pub fn temperature_celsius(&self) -> f32 {
        self.temperature_milli_celsius as f32 / 1000.0
    }

    pub fn humidity_percent(&self) -> f32 {
        self.humidity_milli_percent as f32 / 1000.0
    }

    /// Round both channels to one decimal (nearest 100 milli-units).
    pub fn rounded_to_tenth(&self) -> Self {
        Self {
            temperature_milli_celsius: mean_to_tenth(self.temperature_milli_celsius as i64, 1),
            humidity_milli_percent: mean_to_tenth(self.humidity_milli_percent as i64, 1),
        }
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}°C {}%",
            Tenths(self.temperature_milli_celsius),
            Tenths(self.humidity_milli_percent)
        )
    }
}

/// Mean of `count` milli-unit values summed into `sum`, rounded half away
/// from zero to the nearest tenth of a unit.
///
/// `count` must be non-zero.
pub(crate) fn mean_to_tenth(sum: i64, count: i64) -> i32 {
    let denom = count * 100;
    let tenths = if sum >= 0 {
        (sum + denom / 2) / denom
    } else {
        (sum - denom / 2) / denom
    };
    (tenths * 100) as i32
}

/// Formats a milli-unit value with exactly one decimal, without going
/// through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenths(pub i32);

impl Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tenths = mean_to_tenth(self.0 as i64, 1) as i64 / 100;
        let sign = if tenths < 0 { "-" } else { "" };
        let abs = tenths.abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}
