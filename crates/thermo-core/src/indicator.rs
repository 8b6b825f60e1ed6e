//! RGB status light driven by temperature bands.

use serde::{Deserialize, Serialize};

/// Which of the three indicator LEDs are lit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorPattern {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl IndicatorPattern {
    pub const OFF: Self = Self::new(false, false, false);

    pub const fn new(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }
}

/// Ascending band edges in milli-degrees Celsius.
///
/// Readings below `bands[0]` show blue, then blue+green, green, green+red,
/// and red at or above `bands[3]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorThresholds {
    pub bands: [i32; 4],
}

impl Default for IndicatorThresholds {
    fn default() -> Self {
        Self {
            bands: [40_000, 45_000, 50_000, 55_000],
        }
    }
}

impl IndicatorThresholds {
    /// Edges must not decrease; equal edges just skip a band.
    pub fn is_ascending(&self) -> bool {
        self.bands.windows(2).all(|pair| pair[0] <= pair[1])
    }

    pub fn pattern_for(&self, temperature_milli_celsius: i32) -> IndicatorPattern {
        let band = self
            .bands
            .iter()
            .take_while(|&&edge| temperature_milli_celsius >= edge)
            .count();
        match band {
            0 => IndicatorPattern::new(false, false, true),
            1 => IndicatorPattern::new(false, true, true),
            2 => IndicatorPattern::new(false, true, false),
            3 => IndicatorPattern::new(true, true, false),
            _ => IndicatorPattern::new(true, false, false),
        }
    }
}

/// Sink for the per-tick indicator pattern (GPIO LEDs on hardware).
pub trait Indicator {
    fn show(&mut self, pattern: IndicatorPattern);
}
