//! Heap low-water tracking.

/// Allocator statistics supplied by the platform.
pub trait MemoryStats {
    fn current_free_bytes(&self) -> usize;
    fn allocated_bytes(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryReport {
    pub free_bytes: usize,
    pub allocated_bytes: usize,
    /// Lowest free-heap figure seen since startup
    pub low_water_bytes: usize,
}

/// Tracks the minimum free heap ever observed and decides when to report it.
///
/// The low-water mark never increases.
pub struct LowWaterTracker {
    low_water: Option<usize>,
    last: Option<MemoryReport>,
    last_report_tick: Option<u64>,
    report_every_ticks: u64,
}

impl LowWaterTracker {
    pub fn new(report_every_ticks: u32) -> Self {
        Self {
            low_water: None,
            last: None,
            last_report_tick: None,
            report_every_ticks: report_every_ticks.max(1) as u64,
        }
    }

    /// Record this tick's figures. Returns a report when one is due: on the
    /// first observation, then every `report_every_ticks` ticks.
    pub fn observe<M: MemoryStats>(&mut self, tick: u64, stats: &M) -> Option<MemoryReport> {
        let free_bytes = stats.current_free_bytes();
        let low_water_bytes = self.low_water.map_or(free_bytes, |low| low.min(free_bytes));
        self.low_water = Some(low_water_bytes);

        let report = MemoryReport {
            free_bytes,
            allocated_bytes: stats.allocated_bytes(),
            low_water_bytes,
        };
        self.last = Some(report);

        let due = self
            .last_report_tick
            .is_none_or(|last| tick.saturating_sub(last) >= self.report_every_ticks);
        if due {
            self.last_report_tick = Some(tick);
            Some(report)
        } else {
            None
        }
    }

    pub fn low_water(&self) -> Option<usize> {
        self.low_water
    }

    /// Figures from the most recent observation.
    pub fn last(&self) -> Option<MemoryReport> {
        self.last
    }
}

/// Formats a byte count as kibibytes with two decimals, e.g. "12.50KB".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kib(pub usize);

impl core::fmt::Display for Kib {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let hundredths = (self.0 as u64 * 100 + 512) / 1024;
        write!(f, "{}.{:02}KB", hundredths / 100, hundredths % 100)
    }
}
